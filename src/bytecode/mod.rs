//! Bytecode pipeline for Fern.
//!
//! - `instruction`: the opcode table and the big-endian
//!   encoder/decoder
//! - `value`: runtime values, hash keys, and the shared singletons
//! - `symbol_table`: lexically scoped name resolution
//! - `compiler`: AST to instruction stream + constants pool
//! - `frame` / `vm`: call frames and the stack machine
//! - `disassembler`: debug listings of instruction streams

pub mod compiler;
pub mod disassembler;
pub mod frame;
pub mod instruction;
pub mod symbol_table;
pub mod value;
pub mod vm;

pub use compiler::{Bytecode, Compiler};
pub use disassembler::disassemble;
pub use instruction::Opcode;
pub use symbol_table::SymbolTable;
pub use value::Value;
pub use vm::VM;
