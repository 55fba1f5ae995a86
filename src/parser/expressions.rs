//! Expression parsing using Pratt precedence.

use crate::ast::{BinaryOp, BlockStatement, Expr, UnaryOp};
use crate::error::ParserError;
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser};
use super::precedence::{token_precedence, Precedence};

impl Parser {
    /// Parse one expression at the given minimum precedence. The loop
    /// stops at a statement boundary (`;`) or when the peeked operator
    /// binds no tighter than `min_precedence`.
    pub(crate) fn parse_expression(&mut self, min_precedence: Precedence) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek_token_is(&TokenKind::Semicolon) && min_precedence < self.peek_precedence()
        {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    fn peek_precedence(&self) -> Precedence {
        token_precedence(&self.peek_token().kind)
    }

    fn cur_precedence(&self) -> Precedence {
        token_precedence(&self.cur_token().kind)
    }

    /// Dispatch on the tokens that may start an expression.
    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.cur_token().kind.clone() {
            TokenKind::Ident(name) => Ok(Expr::Identifier(name)),
            TokenKind::Int(literal) => literal
                .parse::<i64>()
                .map(Expr::IntegerLiteral)
                .map_err(|_| ParserError::InvalidInteger(literal)),
            TokenKind::Str(value) => Ok(Expr::StringLiteral(value)),
            TokenKind::True => Ok(Expr::Boolean(true)),
            TokenKind::False => Ok(Expr::Boolean(false)),

            TokenKind::Bang => self.parse_prefix_expression(UnaryOp::Not),
            TokenKind::Minus => self.parse_prefix_expression(UnaryOp::Negate),

            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::LBracket => {
                let elements = self.parse_expression_list(&TokenKind::RBracket)?;
                Ok(Expr::ArrayLiteral(elements))
            }
            TokenKind::LBrace => self.parse_hash_literal(),

            TokenKind::If => self.parse_if_expression(),
            TokenKind::Function => self.parse_function_literal(),

            kind => Err(ParserError::NoPrefixParseFn(kind.to_string())),
        }
    }

    /// Dispatch on the tokens that combine with a left operand. The
    /// current token is the operator; its precedence governs the
    /// right-hand recursion, which gives left associativity.
    fn parse_infix(&mut self, left: Expr) -> ParseResult<Expr> {
        let operator = match self.cur_token().kind.clone() {
            TokenKind::LParen => return self.parse_call_expression(left),
            TokenKind::LBracket => return self.parse_index_expression(left),
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Asterisk => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Gt => BinaryOp::Gt,
            _ => return Ok(left),
        };

        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Ok(Expr::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_prefix_expression(&mut self, operator: UnaryOp) -> ParseResult<Expr> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expr::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> ParseResult<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(&TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if_expression(&mut self) -> ParseResult<Expr> {
        self.expect_peek(&TokenKind::LParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(&TokenKind::RParen)?;
        self.expect_peek(&TokenKind::LBrace)?;

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token_is(&TokenKind::Else) {
            self.next_token();
            self.expect_peek(&TokenKind::LBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expr> {
        self.expect_peek(&TokenKind::LParen)?;
        let parameters = self.parse_function_parameters()?;
        self.expect_peek(&TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Expr::FunctionLiteral { parameters, body })
    }

    fn parse_function_parameters(&mut self) -> ParseResult<Vec<String>> {
        let mut parameters = Vec::new();

        if self.peek_token_is(&TokenKind::RParen) {
            self.next_token();
            return Ok(parameters);
        }

        parameters.push(self.expect_peek_ident()?);
        while self.peek_token_is(&TokenKind::Comma) {
            self.next_token();
            parameters.push(self.expect_peek_ident()?);
        }

        self.expect_peek(&TokenKind::RParen)?;
        Ok(parameters)
    }

    fn parse_call_expression(&mut self, function: Expr) -> ParseResult<Expr> {
        let arguments = self.parse_expression_list(&TokenKind::RParen)?;
        Ok(Expr::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index_expression(&mut self, left: Expr) -> ParseResult<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(&TokenKind::RBracket)?;
        Ok(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    /// Shared list parser for call arguments and array elements; the
    /// terminator distinguishes the two.
    fn parse_expression_list(&mut self, end: &TokenKind) -> ParseResult<Vec<Expr>> {
        let mut list = Vec::new();

        if self.peek_token_is(end) {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token_is(&TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(list)
    }

    fn parse_hash_literal(&mut self) -> ParseResult<Expr> {
        let mut pairs = Vec::new();

        while !self.peek_token_is(&TokenKind::RBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(&TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_token_is(&TokenKind::RBrace) {
                self.expect_peek(&TokenKind::Comma)?;
            }
        }

        self.expect_peek(&TokenKind::RBrace)?;
        Ok(Expr::HashLiteral(pairs))
    }

    /// A failed statement is recorded and recovery happens here, so
    /// the cursor never unwinds past the block's closing brace and
    /// whatever follows the block still gets parsed.
    pub(crate) fn parse_block_statement(&mut self) -> ParseResult<BlockStatement> {
        let mut statements = Vec::new();
        self.next_token();

        while !self.cur_token_is(&TokenKind::RBrace) && !self.cur_token_is(&TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.record_error(err);
                    self.synchronize_in_block();
                    if self.cur_token_is(&TokenKind::RBrace) || self.cur_token_is(&TokenKind::Eof) {
                        break;
                    }
                }
            }
            self.next_token();
        }

        Ok(BlockStatement::new(statements))
    }
}
