//! Fern: a small dynamically-typed, expression-oriented scripting
//! language.
//!
//! Source text is scanned into tokens, parsed with a Pratt parser,
//! lowered to bytecode, and executed on a stack-based virtual
//! machine. The interactive prompt keeps global bindings and the
//! constants pool alive across lines.

pub mod ast;
pub mod bytecode;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod repl;

use std::rc::Rc;

use bytecode::{Bytecode, Compiler, Value, VM};
use error::FernError;

/// Parse source code into an AST without executing.
pub fn parse(source: &str) -> Result<ast::Program, FernError> {
    let tokens = lexer::Scanner::new(source).scan_tokens();
    let program = parser::Parser::new(tokens).parse()?;
    Ok(program)
}

/// Compile source code to bytecode without executing.
pub fn compile(source: &str) -> Result<Bytecode, FernError> {
    let program = parse(source)?;
    let mut compiler = Compiler::new();
    compiler.compile(&program)?;
    Ok(compiler.bytecode())
}

/// Evaluate source code and return the final popped value, without
/// retaining any state between calls.
pub fn eval(source: &str) -> Result<Rc<Value>, FernError> {
    let bytecode = compile(source)?;
    let mut vm = VM::new(bytecode);
    vm.run()?;
    Ok(vm.last_popped())
}

/// Disassemble compiled bytecode to a string.
pub fn disassemble(bytecode: &Bytecode) -> String {
    bytecode::disassemble(&bytecode.instructions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_display(source: &str) -> String {
        eval(source)
            .unwrap_or_else(|e| panic!("eval failed for {:?}: {}", source, e))
            .to_string()
    }

    #[test]
    fn test_end_to_end() {
        let tests = [
            ("1 + 2", "3"),
            ("let a = 1; let b = 2; a + b", "3"),
            ("if (1 < 2) { 10 } else { 20 }", "10"),
            ("\"foo\" + \"bar\"", "foobar"),
            ("[1, 2, 3][1]", "2"),
            ("[1][5]", "null"),
            ("{ \"k\": 1 }[\"k\"]", "1"),
            ("{}[\"x\"]", "null"),
            ("let f = fn() { let x = 7; x }; f()", "7"),
            ("!(if (false) { 1 }) == !0", "false"),
            ("true == true", "true"),
            ("false == false", "true"),
            ("true == false", "false"),
        ];

        for (source, want) in tests {
            assert_eq!(eval_display(source), want, "source: {}", source);
        }
    }

    #[test]
    fn test_eval_reports_parse_errors() {
        let err = eval("let x 5;").unwrap_err();
        match err {
            FernError::Parser(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(
                    errors[0].to_string(),
                    "expected next token to be =, got INT instead"
                );
            }
            other => panic!("expected parser error, got {}", other),
        }
    }

    #[test]
    fn test_eval_reports_compile_errors() {
        let err = eval("foo").unwrap_err();
        assert!(matches!(err, FernError::Compile(_)));
        assert_eq!(err.to_string(), "undefined variable foo");
    }

    #[test]
    fn test_eval_reports_runtime_errors() {
        let err = eval("1 + \"a\"").unwrap_err();
        assert!(matches!(err, FernError::Runtime(_)));
        assert_eq!(
            err.to_string(),
            "unsupported types for binary operation: INTEGER STRING"
        );

        let err = eval("1()").unwrap_err();
        assert_eq!(err.to_string(), "calling non-function");
    }

    #[test]
    fn test_disassemble_pipeline() {
        let bytecode = compile("1 + 2").expect("compile");
        let listing = disassemble(&bytecode);
        assert_eq!(
            listing,
            "0000 OpConstant 0\n0003 OpConstant 1\n0006 OpAdd\n0007 OpPop\n"
        );
    }
}
