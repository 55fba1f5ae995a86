//! Statement AST nodes.

use std::fmt;

use crate::ast::expr::Expr;

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Variable binding: let name = expr;
    Let { name: String, value: Expr },
    /// Return statement: return expr;
    Return(Option<Expr>),
    /// Expression statement: expr;
    Expression(Expr),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {};", name, value),
            Stmt::Return(Some(value)) => write!(f, "return {};", value),
            Stmt::Return(None) => write!(f, "return;"),
            Stmt::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

/// A brace-delimited statement sequence, as used by conditionals and
/// function bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStatement {
    pub statements: Vec<Stmt>,
}

impl BlockStatement {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for stmt in &self.statements {
            write!(f, " {}", stmt)?;
        }
        write!(f, " }}")
    }
}

/// An ordered sequence of top-level statements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
