//! Abstract syntax tree for Fern.

pub mod expr;
pub mod stmt;

pub use expr::{BinaryOp, Expr, UnaryOp};
pub use stmt::{BlockStatement, Program, Stmt};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_let_statement_display() {
        let program = Program::new(vec![Stmt::Let {
            name: "myVar".to_string(),
            value: Expr::Identifier("anotherVar".to_string()),
        }]);
        assert_eq!(program.to_string(), "let myVar = anotherVar;");
    }

    #[test]
    fn test_nested_expression_display() {
        let expr = Expr::Infix {
            left: Box::new(Expr::IntegerLiteral(1)),
            operator: BinaryOp::Add,
            right: Box::new(Expr::Prefix {
                operator: UnaryOp::Negate,
                right: Box::new(Expr::IntegerLiteral(2)),
            }),
        };
        assert_eq!(expr.to_string(), "(1 + (-2))");
    }

    #[test]
    fn test_if_display_braces_blocks() {
        let expr = Expr::If {
            condition: Box::new(Expr::Infix {
                left: Box::new(Expr::Identifier("x".to_string())),
                operator: BinaryOp::Lt,
                right: Box::new(Expr::Identifier("y".to_string())),
            }),
            consequence: BlockStatement::new(vec![Stmt::Expression(Expr::Identifier(
                "x".to_string(),
            ))]),
            alternative: Some(BlockStatement::new(vec![Stmt::Expression(
                Expr::Identifier("y".to_string()),
            )])),
        };
        assert_eq!(expr.to_string(), "if(x < y) { x } else { y }");
    }

    #[test]
    fn test_function_literal_display() {
        let expr = Expr::FunctionLiteral {
            parameters: vec!["a".to_string(), "b".to_string()],
            body: BlockStatement::new(vec![Stmt::Expression(Expr::Infix {
                left: Box::new(Expr::Identifier("a".to_string())),
                operator: BinaryOp::Add,
                right: Box::new(Expr::Identifier("b".to_string())),
            })]),
        };
        assert_eq!(expr.to_string(), "fn(a, b) { (a + b) }");

        let empty = Expr::FunctionLiteral {
            parameters: vec![],
            body: BlockStatement::new(vec![]),
        };
        assert_eq!(empty.to_string(), "fn() { }");
    }

    #[test]
    fn test_hash_literal_display() {
        let expr = Expr::HashLiteral(vec![(
            Expr::StringLiteral("one".to_string()),
            Expr::IntegerLiteral(1),
        )]);
        assert_eq!(expr.to_string(), "{one:1}");
    }
}
