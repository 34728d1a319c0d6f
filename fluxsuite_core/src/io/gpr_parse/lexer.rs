//! Lex a GPR string into a series of tokens for later parsing

use thiserror::Error;

use crate::io::gpr_parse::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    /// Convert the source into tokens, terminated by [`Token::Eof`]
    pub fn lex(mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::Eof);
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Single Character Tokens
            '(' => self.add_token(Token::LeftParen),
            ')' => self.add_token(Token::RightParen),
            // Whitespace
            c if c.is_whitespace() => {}
            c if c.is_control() => return Err(LexerError::InvalidToken(c, self.start)),
            // Identifiers, numbers and operators
            _ => self.read_word(),
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    /// Gene ids are anything up to the next whitespace or parenthesis, since real
    /// models use ids like `HGNC:8906`, `b0001` or `YAL012W-A`
    fn read_word(&mut self) {
        while Lexer::is_word_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        if text.eq_ignore_ascii_case("and") {
            self.add_token(Token::And);
        } else if text.eq_ignore_ascii_case("or") {
            self.add_token(Token::Or);
        } else {
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => self.add_token(Token::Number { value, text }),
                _ => self.add_token(Token::Identifier(text)),
            }
        }
    }

    fn is_word_char(c: char) -> bool {
        !(c == '\0' || c == '(' || c == ')' || c.is_whitespace() || c.is_control())
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

/// Errors encountered while lexing
#[derive(Debug, Error, PartialEq, Clone)]
pub enum LexerError {
    #[error("Invalid character {0:?} at position {1}")]
    InvalidToken(char, usize),
}
