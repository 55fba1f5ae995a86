//! Expression AST nodes.

use std::fmt;

use crate::ast::stmt::BlockStatement;

/// All expression variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Variable reference: foo
    Identifier(String),
    /// Integer literal: 42
    IntegerLiteral(i64),
    /// Boolean literal: true, false
    Boolean(bool),
    /// String literal: "hello"
    StringLiteral(String),
    /// Array literal: [1, 2, 3]
    ArrayLiteral(Vec<Expr>),
    /// Hash literal: {"key": "value", ...}
    HashLiteral(Vec<(Expr, Expr)>),
    /// Index expression: collection[key]
    Index { left: Box<Expr>, index: Box<Expr> },
    /// Prefix operation: -x, !x
    Prefix { operator: UnaryOp, right: Box<Expr> },
    /// Infix operation: a + b
    Infix {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },
    /// Conditional: if (cond) { ... } else { ... }
    If {
        condition: Box<Expr>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    /// Function literal: fn(params) { body }
    FunctionLiteral {
        parameters: Vec<String>,
        body: BlockStatement,
    },
    /// Function call: callee(args)
    Call {
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
        };
        write!(f, "{}", op)
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{}", op)
    }
}

/// The canonical textual form. This is what hash-literal key ordering
/// sorts on, so it must stay deterministic.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::IntegerLiteral(value) => write!(f, "{}", value),
            Expr::Boolean(value) => write!(f, "{}", value),
            Expr::StringLiteral(value) => write!(f, "{}", value),
            Expr::ArrayLiteral(elements) => {
                write!(f, "[{}]", join(elements, ", "))
            }
            Expr::HashLiteral(pairs) => {
                let pairs: Vec<String> = pairs.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Expr::Index { left, index } => write!(f, "({}[{}])", left, index),
            Expr::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expr::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if{} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expr::FunctionLiteral { parameters, body } => {
                write!(f, "fn({}) {}", parameters.join(", "), body)
            }
            Expr::Call {
                function,
                arguments,
            } => write!(f, "{}({})", function, join(arguments, ", ")),
        }
    }
}

fn join(exprs: &[Expr], sep: &str) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}
