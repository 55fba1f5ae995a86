//! Core parser struct and cursor helpers.

use crate::ast::Program;
use crate::error::ParserError;
use crate::lexer::{Token, TokenKind};

pub type ParseResult<T> = Result<T, ParserError>;

/// The parser for Fern. It walks a scanned token vector with a
/// current/peek cursor pair, accumulating errors and recovering at
/// statement boundaries.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParserError>,
}

impl Parser {
    /// The token vector must be terminated by an `Eof` token, as
    /// `Scanner::scan_tokens` guarantees.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parse a complete program. Statement-level failures are
    /// recorded and parsing resumes at the next `;` or end of input;
    /// the full error list is returned if anything failed.
    pub fn parse(&mut self) -> Result<Program, Vec<ParserError>> {
        let mut statements = Vec::new();

        while !self.cur_token_is(&TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
            self.next_token();
        }

        if self.errors.is_empty() {
            Ok(Program::new(statements))
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    /// Skip ahead to the next statement boundary.
    fn synchronize(&mut self) {
        while !self.cur_token_is(&TokenKind::Semicolon) && !self.cur_token_is(&TokenKind::Eof) {
            self.next_token();
        }
    }

    /// Skip ahead to the next statement boundary inside a block,
    /// stopping short of the block's closing brace so the caller can
    /// still consume it.
    pub(crate) fn synchronize_in_block(&mut self) {
        while !self.cur_token_is(&TokenKind::Semicolon)
            && !self.cur_token_is(&TokenKind::RBrace)
            && !self.cur_token_is(&TokenKind::Eof)
        {
            self.next_token();
        }
    }

    pub(crate) fn record_error(&mut self, err: ParserError) {
        self.errors.push(err);
    }

    // ===== Cursor =====

    pub(crate) fn cur_token(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub(crate) fn peek_token(&self) -> &Token {
        let index = (self.current + 1).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn next_token(&mut self) {
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
    }

    pub(crate) fn cur_token_is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.cur_token().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn peek_token_is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek_token().kind) == std::mem::discriminant(kind)
    }

    /// Advance if the peeked token matches, otherwise fail with the
    /// standard expectation message.
    pub(crate) fn expect_peek(&mut self, kind: &TokenKind) -> ParseResult<()> {
        if self.peek_token_is(kind) {
            self.next_token();
            Ok(())
        } else {
            Err(ParserError::unexpected_token(
                kind.to_string(),
                self.peek_token().kind.to_string(),
            ))
        }
    }

    /// Advance onto an identifier and return its name.
    pub(crate) fn expect_peek_ident(&mut self) -> ParseResult<String> {
        match &self.peek_token().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.next_token();
                Ok(name)
            }
            kind => Err(ParserError::unexpected_token(
                "IDENT",
                kind.to_string(),
            )),
        }
    }
}
