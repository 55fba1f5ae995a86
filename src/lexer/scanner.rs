//! Scanner for Fern source code.

use crate::lexer::token::{Token, TokenKind};

/// The scanner turns source text into tokens, one character of
/// lookahead at a time. It never fails: unrecognised input becomes
/// `Illegal` tokens and the parser reports them.
pub struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
        }
    }

    /// Scan all tokens from the source. The result always ends with
    /// exactly one `Eof` token.
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let Some(c) = self.advance() else {
            return Token::eof();
        };

        match c {
            '=' => {
                if self.match_char('=') {
                    Token::new(TokenKind::Eq)
                } else {
                    Token::new(TokenKind::Assign)
                }
            }
            '!' => {
                if self.match_char('=') {
                    Token::new(TokenKind::NotEq)
                } else {
                    Token::new(TokenKind::Bang)
                }
            }
            '+' => Token::new(TokenKind::Plus),
            '-' => Token::new(TokenKind::Minus),
            '*' => Token::new(TokenKind::Asterisk),
            '/' => Token::new(TokenKind::Slash),
            '<' => Token::new(TokenKind::Lt),
            '>' => Token::new(TokenKind::Gt),
            ',' => Token::new(TokenKind::Comma),
            ';' => Token::new(TokenKind::Semicolon),
            ':' => Token::new(TokenKind::Colon),
            '(' => Token::new(TokenKind::LParen),
            ')' => Token::new(TokenKind::RParen),
            '{' => Token::new(TokenKind::LBrace),
            '}' => Token::new(TokenKind::RBrace),
            '[' => Token::new(TokenKind::LBracket),
            ']' => Token::new(TokenKind::RBracket),
            '"' => self.scan_string(),
            c if c.is_ascii_digit() => self.scan_number(c),
            c if is_ident_start(c) => self.scan_identifier(c),
            c => Token::new(TokenKind::Illegal(c)),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_next_is('/') => {
                    while self.peek().is_some() && self.peek() != Some('\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read from the opening quote to the closing quote or end of
    /// input. There are no escape sequences.
    fn scan_string(&mut self) -> Token {
        let mut literal = String::new();
        while let Some(c) = self.advance() {
            if c == '"' {
                break;
            }
            literal.push(c);
        }
        Token::new(TokenKind::Str(literal))
    }

    fn scan_number(&mut self, first: char) -> Token {
        let mut literal = String::from(first);
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            literal.push(c);
            self.advance();
        }
        Token::new(TokenKind::Int(literal))
    }

    fn scan_identifier(&mut self, first: char) -> Token {
        let mut literal = String::from(first);
        while let Some(c) = self.peek() {
            if !is_ident_start(c) && !c.is_ascii_digit() {
                break;
            }
            literal.push(c);
            self.advance();
        }
        match TokenKind::keyword(&literal) {
            Some(kind) => Token::new(kind),
            None => Token::new(TokenKind::Ident(literal)),
        }
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_next_is(&self, c: char) -> bool {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next() == Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::token::TokenKind::*;

    #[test]
    fn test_next_token() {
        let source = r#"let five = 5;
let add = fn(x, y) { x + y; };
!-/*5;
5 < 10 > 5;
if (5 < 10) { return true; } else { return false; }
10 == 10; 10 != 9;
"foobar" "foo bar"
[1, 2];
{"foo": "bar"}
"#;

        let expected = [
            Let,
            Ident("five".to_string()),
            Assign,
            Int("5".to_string()),
            Semicolon,
            Let,
            Ident("add".to_string()),
            Assign,
            Function,
            LParen,
            Ident("x".to_string()),
            Comma,
            Ident("y".to_string()),
            RParen,
            LBrace,
            Ident("x".to_string()),
            Plus,
            Ident("y".to_string()),
            Semicolon,
            RBrace,
            Semicolon,
            Bang,
            Minus,
            Slash,
            Asterisk,
            Int("5".to_string()),
            Semicolon,
            Int("5".to_string()),
            Lt,
            Int("10".to_string()),
            Gt,
            Int("5".to_string()),
            Semicolon,
            If,
            LParen,
            Int("5".to_string()),
            Lt,
            Int("10".to_string()),
            RParen,
            LBrace,
            Return,
            True,
            Semicolon,
            RBrace,
            Else,
            LBrace,
            Return,
            False,
            Semicolon,
            RBrace,
            Int("10".to_string()),
            Eq,
            Int("10".to_string()),
            Semicolon,
            Int("10".to_string()),
            NotEq,
            Int("9".to_string()),
            Semicolon,
            Str("foobar".to_string()),
            Str("foo bar".to_string()),
            LBracket,
            Int("1".to_string()),
            Comma,
            Int("2".to_string()),
            RBracket,
            Semicolon,
            LBrace,
            Str("foo".to_string()),
            Colon,
            Str("bar".to_string()),
            RBrace,
            Eof,
        ];

        let mut scanner = Scanner::new(source);
        for (i, want) in expected.iter().enumerate() {
            let got = scanner.next_token();
            assert_eq!(&got.kind, want, "token {} mismatch", i);
        }
    }

    #[test]
    fn test_line_comments() {
        let mut scanner = Scanner::new("1; // the rest is ignored\n2;");
        let kinds: Vec<_> = scanner.scan_tokens().into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Int("1".to_string()),
                Semicolon,
                Int("2".to_string()),
                Semicolon,
                Eof
            ]
        );
    }

    #[test]
    fn test_illegal_character() {
        let mut scanner = Scanner::new("1 @ 2");
        let kinds: Vec<_> = scanner.scan_tokens().into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Int("1".to_string()),
                Illegal('@'),
                Int("2".to_string()),
                Eof
            ]
        );
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut scanner = Scanner::new("");
        assert_eq!(scanner.next_token().kind, Eof);
        assert_eq!(scanner.next_token().kind, Eof);
    }
}
