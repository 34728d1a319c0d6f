//! Lexical units of a gene protein reaction rule
use std::fmt;

/// Token produced by the [`Lexer`](super::lexer::Lexer)
///
/// Numbers only appear when a whole word parses as a finite float, so rules may
/// carry constant terms next to gene identifiers.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    /// Gene identifier, kept exactly as written
    Identifier(String),
    /// A word that parses as a finite float, with the text it was read from
    Number { value: f64, text: String },
    /// `and` in any case
    And,
    /// `or` in any case
    Or,
    LeftParen,
    RightParen,
    /// End of the rule
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(id) => write!(f, "gene '{}'", id),
            Token::Number { text, .. } => write!(f, "number {}", text),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
            Token::Eof => f.write_str("end of rule"),
        }
    }
}
