//! Error types for all pipeline phases.

use thiserror::Error;

/// Parser errors. Each variant carries the exact message text the
/// interactive prompt prints, one per recovered statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("expected next token to be {expected}, got {found} instead")]
    UnexpectedToken { expected: String, found: String },

    #[error("no prefix parse function for {0} found")]
    NoPrefixParseFn(String),

    #[error("could not parse {0:?} as integer")]
    InvalidInteger(String),
}

impl ParserError {
    pub fn unexpected_token(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Bytecode compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    #[error("opcode {0} undefined")]
    UndefinedOpcode(u8),

    #[error("functions with arguments are not supported")]
    CallWithArguments,
}

/// Runtime errors raised by the virtual machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("stack overflow")]
    StackOverflow,

    #[error("unsupported types for binary operation: {left} {right}")]
    UnsupportedBinaryTypes {
        left: &'static str,
        right: &'static str,
    },

    #[error("unknown integer operator: {0}")]
    UnknownIntegerOperator(u8),

    #[error("unknown string operator: {0}")]
    UnknownStringOperator(u8),

    #[error("unknown operator: {op} ({left} {right})")]
    UnknownOperator {
        op: u8,
        left: &'static str,
        right: &'static str,
    },

    #[error("unsupported type for negation: {0}")]
    UnsupportedNegation(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("calling non-function")]
    CallingNonFunction,

    #[error("unusable as hash key: {0}")]
    UnusableHashKey(&'static str),

    #[error("index operator not supported: {0}")]
    IndexNotSupported(&'static str),

    #[error("opcode {0} undefined")]
    UndefinedOpcode(u8),
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum FernError {
    #[error("{}", format_parser_errors(.0))]
    Parser(Vec<ParserError>),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Vec<ParserError>> for FernError {
    fn from(errors: Vec<ParserError>) -> Self {
        Self::Parser(errors)
    }
}

fn format_parser_errors(errors: &[ParserError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
