//! Call frames: one activation record per compiled function.

use std::rc::Rc;

use crate::bytecode::value::CompiledFunction;

/// An activation record. `ip` is the byte offset of the next fetch;
/// `base` is the stack index at which this frame's local slots begin.
#[derive(Debug)]
pub struct Frame {
    function: Rc<CompiledFunction>,
    pub ip: usize,
    pub base: usize,
}

impl Frame {
    pub fn new(function: Rc<CompiledFunction>, base: usize) -> Self {
        Self {
            function,
            ip: 0,
            base,
        }
    }

    pub fn instructions(&self) -> &[u8] {
        &self.function.instructions
    }
}
