//! Bytecode compiler: lowers the AST to a flat instruction stream
//! plus a constants pool.

use std::rc::Rc;

use crate::ast::{BinaryOp, BlockStatement, Expr, Program, Stmt, UnaryOp};
use crate::bytecode::instruction::{make, Opcode};
use crate::bytecode::symbol_table::{SymbolScope, SymbolTable};
use crate::bytecode::value::{CompiledFunction, Value};
use crate::error::CompileError;

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// The output of a compile run. The constants pool is shared with
/// the compiler so REPL lines can keep extending it.
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub instructions: Vec<u8>,
    pub constants: Vec<Rc<Value>>,
}

/// A record of one emitted instruction, kept so the compiler can
/// delete or rewrite the most recent one.
#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

/// One function body under compilation. The compiler mutates the
/// topmost scope; entering a function literal pushes a fresh one.
#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Vec<u8>,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

/// The bytecode compiler.
pub struct Compiler {
    constants: Vec<Rc<Value>>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_state(SymbolTable::new(), Vec::new())
    }

    /// Continue with a symbol table and constants pool carried over
    /// from an earlier run; this is what keeps REPL lines connected.
    pub fn with_state(symbol_table: SymbolTable, constants: Vec<Rc<Value>>) -> Self {
        Self {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    /// Hand the symbol table and constants pool back to the caller.
    pub fn into_state(self) -> (SymbolTable, Vec<Rc<Value>>) {
        (self.symbol_table, self.constants)
    }

    /// Compile a program into the active scope.
    pub fn compile(&mut self, program: &Program) -> CompileResult<()> {
        for stmt in &program.statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    /// Snapshot the outermost scope's instructions and the constants
    /// pool.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.scopes[0].instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    fn compile_statement(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.compile_expression(expr)?;
                self.emit(Opcode::Pop, &[]);
            }

            Stmt::Let { name, value } => {
                self.compile_expression(value)?;
                let symbol = self.symbol_table.define(name);
                match symbol.scope {
                    SymbolScope::Global => self.emit(Opcode::SetGlobal, &[symbol.index]),
                    SymbolScope::Local => self.emit(Opcode::SetLocal, &[symbol.index]),
                };
            }

            Stmt::Return(value) => {
                match value {
                    Some(expr) => self.compile_expression(expr)?,
                    None => {
                        self.emit(Opcode::Null, &[]);
                    }
                }
                self.emit(Opcode::ReturnValue, &[]);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> CompileResult<()> {
        for stmt in &block.statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expr) -> CompileResult<()> {
        match expr {
            Expr::Identifier(name) => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::UndefinedVariable(name.clone()))?;
                match symbol.scope {
                    SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
                    SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
                };
            }

            Expr::IntegerLiteral(value) => {
                let index = self.add_constant(Value::Integer(*value));
                self.emit(Opcode::Constant, &[index]);
            }

            Expr::StringLiteral(value) => {
                let index = self.add_constant(Value::Str(Rc::new(value.clone())));
                self.emit(Opcode::Constant, &[index]);
            }

            Expr::Boolean(true) => {
                self.emit(Opcode::True, &[]);
            }
            Expr::Boolean(false) => {
                self.emit(Opcode::False, &[]);
            }

            Expr::Prefix { operator, right } => {
                self.compile_expression(right)?;
                match operator {
                    UnaryOp::Negate => self.emit(Opcode::Minus, &[]),
                    UnaryOp::Not => self.emit(Opcode::Bang, &[]),
                };
            }

            Expr::Infix {
                left,
                operator,
                right,
            } => self.compile_infix(left, *operator, right)?,

            Expr::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref())?,

            Expr::ArrayLiteral(elements) => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Opcode::Array, &[elements.len()]);
            }

            Expr::HashLiteral(pairs) => {
                // Emission order must be deterministic: sort the keys
                // by their canonical textual form.
                let mut pairs: Vec<&(Expr, Expr)> = pairs.iter().collect();
                pairs.sort_by_key(|(key, _)| key.to_string());

                for (key, value) in &pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Opcode::Hash, &[pairs.len() * 2]);
            }

            Expr::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Opcode::Index, &[]);
            }

            Expr::FunctionLiteral { parameters, body } => {
                self.compile_function(parameters, body)?;
            }

            Expr::Call {
                function,
                arguments,
            } => {
                if !arguments.is_empty() {
                    return Err(CompileError::CallWithArguments);
                }
                self.compile_expression(function)?;
                self.emit(Opcode::Call, &[]);
            }
        }
        Ok(())
    }

    fn compile_infix(&mut self, left: &Expr, operator: BinaryOp, right: &Expr) -> CompileResult<()> {
        // There is no less-than opcode: rewrite `a < b` as `b > a`.
        if operator == BinaryOp::Lt {
            self.compile_expression(right)?;
            self.compile_expression(left)?;
            self.emit(Opcode::GreaterThan, &[]);
            return Ok(());
        }

        self.compile_expression(left)?;
        self.compile_expression(right)?;
        match operator {
            BinaryOp::Add => self.emit(Opcode::Add, &[]),
            BinaryOp::Sub => self.emit(Opcode::Sub, &[]),
            BinaryOp::Mul => self.emit(Opcode::Mul, &[]),
            BinaryOp::Div => self.emit(Opcode::Div, &[]),
            BinaryOp::Gt => self.emit(Opcode::GreaterThan, &[]),
            BinaryOp::Eq => self.emit(Opcode::Equal, &[]),
            BinaryOp::NotEq => self.emit(Opcode::NotEqual, &[]),
            BinaryOp::Lt => unreachable!("rewritten above"),
        };
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        consequence: &BlockStatement,
        alternative: Option<&BlockStatement>,
    ) -> CompileResult<()> {
        self.compile_expression(condition)?;

        // Placeholder operand, backpatched once the target is known.
        let jump_not_truthy = self.emit(Opcode::JumpNotTruthy, &[0xFFFF]);

        self.compile_block(consequence)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_pop();
        }

        let jump = self.emit(Opcode::Jump, &[0xFFFF]);

        let after_consequence = self.current_instructions().len();
        self.change_operand(jump_not_truthy, after_consequence);

        match alternative {
            None => {
                self.emit(Opcode::Null, &[]);
            }
            Some(alternative) => {
                self.compile_block(alternative)?;
                if self.last_instruction_is(Opcode::Pop) {
                    self.remove_last_pop();
                }
            }
        }

        let after_alternative = self.current_instructions().len();
        self.change_operand(jump, after_alternative);

        Ok(())
    }

    fn compile_function(&mut self, parameters: &[String], body: &BlockStatement) -> CompileResult<()> {
        self.enter_scope();

        self.compile_block(body)?;

        // The block's terminal expression becomes the return value.
        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(Opcode::ReturnValue) {
            self.emit(Opcode::Return, &[]);
        }

        let num_locals = self.symbol_table.num_definitions;
        let instructions = self.leave_scope();

        let function = CompiledFunction {
            instructions,
            num_locals,
            num_parameters: parameters.len(),
        };
        let index = self.add_constant(Value::CompiledFunction(Rc::new(function)));
        self.emit(Opcode::Constant, &[index]);

        Ok(())
    }

    // ===== Scope management =====

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Vec<u8> {
        let scope = self.scopes.pop().unwrap_or_default();
        let table = std::mem::take(&mut self.symbol_table);
        self.symbol_table = table.pop();
        scope.instructions
    }

    // ===== Bytecode emission =====

    /// Encode one instruction, append it, and record it as the scope's
    /// last emitted instruction. Returns its position.
    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let instruction = make(op, operands);
        let position = self.add_instruction(&instruction);
        self.set_last_instruction(op, position);
        position
    }

    fn add_instruction(&mut self, instruction: &[u8]) -> usize {
        let scope = self.scope_mut();
        let position = scope.instructions.len();
        scope.instructions.extend_from_slice(instruction);
        position
    }

    fn set_last_instruction(&mut self, opcode: Opcode, position: usize) {
        let scope = self.scope_mut();
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction { opcode, position });
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        self.scope()
            .last_instruction
            .is_some_and(|last| last.opcode == op)
    }

    /// Delete the trailing `OpPop` so the block's value stays on the
    /// stack.
    fn remove_last_pop(&mut self) {
        let scope = self.scope_mut();
        if let Some(last) = scope.last_instruction {
            scope.instructions.truncate(last.position);
            scope.last_instruction = scope.previous_instruction;
        }
    }

    /// Rewrite the trailing `OpPop` into `OpReturnValue` in place.
    fn replace_last_pop_with_return(&mut self) {
        if let Some(last) = self.scope().last_instruction {
            self.replace_instruction(last.position, &make(Opcode::ReturnValue, &[]));
            if let Some(last) = &mut self.scope_mut().last_instruction {
                last.opcode = Opcode::ReturnValue;
            }
        }
    }

    fn replace_instruction(&mut self, position: usize, new_instruction: &[u8]) {
        let scope = self.scope_mut();
        scope.instructions[position..position + new_instruction.len()]
            .copy_from_slice(new_instruction);
    }

    /// Backpatch the operand of the instruction at `op_position`.
    fn change_operand(&mut self, op_position: usize, operand: usize) {
        let op = Opcode::from_u8(self.scope().instructions[op_position]);
        if let Some(op) = op {
            self.replace_instruction(op_position, &make(op, &[operand]));
        }
    }

    fn current_instructions(&self) -> &[u8] {
        &self.scope().instructions
    }

    /// Append a value to the constants pool and return its index.
    /// The pool is append-only, so indices stay stable for the
    /// lifetime of the compiler.
    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(Rc::new(value));
        self.constants.len() - 1
    }

    fn scope(&self) -> &CompilationScope {
        &self.scopes[self.scopes.len() - 1]
    }

    fn scope_mut(&mut self) -> &mut CompilationScope {
        let index = self.scopes.len() - 1;
        &mut self.scopes[index]
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
