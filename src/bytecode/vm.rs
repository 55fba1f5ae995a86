//! Stack-based virtual machine for executing bytecode.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::bytecode::compiler::Bytecode;
use crate::bytecode::frame::Frame;
use crate::bytecode::instruction::{read_u16, read_u8, Opcode};
use crate::bytecode::value::{
    bool_value, false_value, null_value, true_value, CompiledFunction, HashPair, Value,
};
use crate::error::RuntimeError;

/// Maximum number of live values on the evaluation stack.
pub const STACK_SIZE: usize = 2048;
/// Number of global binding slots.
pub const GLOBALS_SIZE: usize = 65536;
/// Maximum call depth.
pub const MAX_FRAMES: usize = 1024;

/// Result type for VM operations.
pub type VMResult<T> = Result<T, RuntimeError>;

/// The virtual machine: an evaluation stack with an explicit stack
/// pointer, a globals vector, and a frame stack. The slot just above
/// the stack pointer keeps the most recently popped value, which is
/// what the REPL prints.
pub struct VM {
    constants: Vec<Rc<Value>>,
    stack: Vec<Rc<Value>>,
    sp: usize,
    globals: Vec<Rc<Value>>,
    frames: Vec<Frame>,
}

impl VM {
    /// Run the given bytecode with a fresh globals vector.
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_globals(bytecode, vec![null_value(); GLOBALS_SIZE])
    }

    /// Run the given bytecode against an existing globals vector;
    /// this is what keeps REPL lines connected.
    pub fn with_globals(bytecode: Bytecode, globals: Vec<Rc<Value>>) -> Self {
        // The top-level program runs as frame 0 with base 0.
        let main = CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        };

        Self {
            constants: bytecode.constants,
            stack: vec![null_value(); STACK_SIZE],
            sp: 0,
            globals,
            frames: vec![Frame::new(Rc::new(main), 0)],
        }
    }

    /// Hand the globals vector back to the caller.
    pub fn into_globals(self) -> Vec<Rc<Value>> {
        self.globals
    }

    /// The value most recently popped off the stack; after a normal
    /// halt this is the program's result.
    pub fn last_popped(&self) -> Rc<Value> {
        self.stack[self.sp].clone()
    }

    /// The fetch-decode-execute loop.
    pub fn run(&mut self) -> VMResult<()> {
        while self.current_frame().ip < self.current_frame().instructions().len() {
            let byte = self.read_byte();
            let op = Opcode::from_u8(byte).ok_or(RuntimeError::UndefinedOpcode(byte))?;

            match op {
                Opcode::Constant => {
                    let index = self.read_u16_operand();
                    let constant = self.constants[index].clone();
                    self.push(constant)?;
                }

                Opcode::Pop => {
                    self.pop();
                }

                Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                    self.execute_binary_operation(op)?;
                }

                Opcode::True => self.push(true_value())?,
                Opcode::False => self.push(false_value())?,
                Opcode::Null => self.push(null_value())?,

                Opcode::Equal | Opcode::NotEqual | Opcode::GreaterThan => {
                    self.execute_comparison(op)?;
                }

                Opcode::Bang => {
                    let operand = self.pop();
                    self.push(bool_value(!operand.is_truthy()))?;
                }

                Opcode::Minus => {
                    let operand = self.pop();
                    match operand.as_ref() {
                        Value::Integer(n) => self.push(Rc::new(Value::Integer(-n)))?,
                        other => {
                            return Err(RuntimeError::UnsupportedNegation(other.kind()));
                        }
                    }
                }

                Opcode::Jump => {
                    let target = self.read_u16_operand();
                    self.current_frame_mut().ip = target;
                }

                Opcode::JumpNotTruthy => {
                    let target = self.read_u16_operand();
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.current_frame_mut().ip = target;
                    }
                }

                Opcode::SetGlobal => {
                    let index = self.read_u16_operand();
                    self.globals[index] = self.pop();
                }

                Opcode::GetGlobal => {
                    let index = self.read_u16_operand();
                    let value = self.globals[index].clone();
                    self.push(value)?;
                }

                Opcode::SetLocal => {
                    let index = self.read_u8_operand();
                    let base = self.current_frame().base;
                    self.stack[base + index] = self.pop();
                }

                Opcode::GetLocal => {
                    let index = self.read_u8_operand();
                    let base = self.current_frame().base;
                    let value = self.stack[base + index].clone();
                    self.push(value)?;
                }

                Opcode::Array => {
                    let count = self.read_u16_operand();
                    let array = self.build_array(self.sp - count, self.sp);
                    self.sp -= count;
                    self.push(array)?;
                }

                Opcode::Hash => {
                    let count = self.read_u16_operand();
                    let hash = self.build_hash(self.sp - count, self.sp)?;
                    self.sp -= count;
                    self.push(hash)?;
                }

                Opcode::Index => {
                    let index = self.pop();
                    let left = self.pop();
                    self.execute_index_expression(left, index)?;
                }

                Opcode::Call => self.call_function()?,

                Opcode::ReturnValue => {
                    let value = self.pop();
                    let halted = self.return_from_frame();
                    self.push(value)?;
                    if halted {
                        self.pop();
                        return Ok(());
                    }
                }

                Opcode::Return => {
                    let halted = self.return_from_frame();
                    self.push(null_value())?;
                    if halted {
                        self.pop();
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }

    // ===== Operator helpers =====

    fn execute_binary_operation(&mut self, op: Opcode) -> VMResult<()> {
        let right = self.pop();
        let left = self.pop();

        match (left.as_ref(), right.as_ref()) {
            (Value::Integer(l), Value::Integer(r)) => {
                self.execute_binary_integer_operation(op, *l, *r)
            }
            (Value::Str(l), Value::Str(r)) => {
                // Only concatenation is defined for strings.
                if op != Opcode::Add {
                    return Err(RuntimeError::UnknownStringOperator(op as u8));
                }
                let joined = format!("{}{}", l, r);
                self.push(Rc::new(Value::Str(Rc::new(joined))))
            }
            _ => Err(RuntimeError::UnsupportedBinaryTypes {
                left: left.kind(),
                right: right.kind(),
            }),
        }
    }

    fn execute_binary_integer_operation(&mut self, op: Opcode, left: i64, right: i64) -> VMResult<()> {
        let result = match op {
            Opcode::Add => left.wrapping_add(right),
            Opcode::Sub => left.wrapping_sub(right),
            Opcode::Mul => left.wrapping_mul(right),
            Opcode::Div => {
                if right == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                left.wrapping_div(right)
            }
            _ => return Err(RuntimeError::UnknownIntegerOperator(op as u8)),
        };
        self.push(Rc::new(Value::Integer(result)))
    }

    fn execute_comparison(&mut self, op: Opcode) -> VMResult<()> {
        let right = self.pop();
        let left = self.pop();

        if let (Value::Integer(l), Value::Integer(r)) = (left.as_ref(), right.as_ref()) {
            return self.execute_integer_comparison(op, *l, *r);
        }

        // Outside the integer case, equality is pointer identity;
        // this is meaningful for the shared singletons.
        match op {
            Opcode::Equal => self.push(bool_value(Rc::ptr_eq(&left, &right))),
            Opcode::NotEqual => self.push(bool_value(!Rc::ptr_eq(&left, &right))),
            _ => Err(RuntimeError::UnknownOperator {
                op: op as u8,
                left: left.kind(),
                right: right.kind(),
            }),
        }
    }

    fn execute_integer_comparison(&mut self, op: Opcode, left: i64, right: i64) -> VMResult<()> {
        let result = match op {
            Opcode::Equal => left == right,
            Opcode::NotEqual => left != right,
            Opcode::GreaterThan => left > right,
            _ => {
                return Err(RuntimeError::UnknownOperator {
                    op: op as u8,
                    left: "INTEGER",
                    right: "INTEGER",
                })
            }
        };
        self.push(bool_value(result))
    }

    // ===== Composite values =====

    fn build_array(&self, start: usize, end: usize) -> Rc<Value> {
        let elements = self.stack[start..end].to_vec();
        Rc::new(Value::Array(elements))
    }

    fn build_hash(&self, start: usize, end: usize) -> VMResult<Rc<Value>> {
        let mut pairs = IndexMap::new();

        let mut i = start;
        while i < end {
            let key = self.stack[i].clone();
            let value = self.stack[i + 1].clone();

            let hash_key = key
                .hash_key()
                .ok_or(RuntimeError::UnusableHashKey(key.kind()))?;
            pairs.insert(hash_key, HashPair { key, value });

            i += 2;
        }

        Ok(Rc::new(Value::Hash(pairs)))
    }

    fn execute_index_expression(&mut self, left: Rc<Value>, index: Rc<Value>) -> VMResult<()> {
        match (left.as_ref(), index.as_ref()) {
            (Value::Array(elements), Value::Integer(i)) => {
                let max = elements.len() as i64 - 1;
                if *i < 0 || *i > max {
                    self.push(null_value())
                } else {
                    self.push(elements[*i as usize].clone())
                }
            }
            (Value::Hash(pairs), _) => {
                let hash_key = index
                    .hash_key()
                    .ok_or(RuntimeError::UnusableHashKey(index.kind()))?;
                match pairs.get(&hash_key) {
                    Some(pair) => self.push(pair.value.clone()),
                    None => self.push(null_value()),
                }
            }
            _ => Err(RuntimeError::IndexNotSupported(left.kind())),
        }
    }

    // ===== Calls and frames =====

    /// The callee must be a compiled function at the top of the
    /// stack. Its frame starts just above the callee, with local
    /// storage reserved in place.
    fn call_function(&mut self) -> VMResult<()> {
        let callee = self.stack[self.sp - 1].clone();
        let function = match callee.as_ref() {
            Value::CompiledFunction(function) => function.clone(),
            _ => return Err(RuntimeError::CallingNonFunction),
        };

        if self.frames.len() >= MAX_FRAMES {
            return Err(RuntimeError::StackOverflow);
        }
        if self.sp + function.num_locals > STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }

        let num_locals = function.num_locals;
        let frame = Frame::new(function, self.sp);
        self.sp += num_locals;
        self.frames.push(frame);

        Ok(())
    }

    /// Pop the current frame and discard the callee. Returns true
    /// when the current frame is the top-level program, i.e. a
    /// `return` halts the whole run.
    fn return_from_frame(&mut self) -> bool {
        if self.frames.len() == 1 {
            return true;
        }
        if let Some(frame) = self.frames.pop() {
            self.sp = frame.base - 1;
        }
        false
    }

    // ===== Fetch helpers =====

    fn read_byte(&mut self) -> u8 {
        let frame = self.current_frame_mut();
        let byte = frame.instructions()[frame.ip];
        frame.ip += 1;
        byte
    }

    fn read_u16_operand(&mut self) -> usize {
        let frame = self.current_frame_mut();
        let value = read_u16(&frame.instructions()[frame.ip..]) as usize;
        frame.ip += 2;
        value
    }

    fn read_u8_operand(&mut self) -> usize {
        let frame = self.current_frame_mut();
        let value = read_u8(&frame.instructions()[frame.ip..]) as usize;
        frame.ip += 1;
        value
    }

    fn current_frame(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        let index = self.frames.len() - 1;
        &mut self.frames[index]
    }

    // ===== Stack =====

    fn push(&mut self, value: Rc<Value>) -> VMResult<()> {
        if self.sp >= STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    /// The popped slot is deliberately left in place: `last_popped`
    /// reads it back.
    fn pop(&mut self) -> Rc<Value> {
        self.sp -= 1;
        self.stack[self.sp].clone()
    }
}
