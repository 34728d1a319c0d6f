use crate::configuration::GprPrecedence;
use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gpr::{Gpr, GprOperatorType};

use thiserror::Error;
/*
GPR Grammar (split on or first, the default):
expression  -> conjunction ("OR" conjunction)* ;
conjunction -> primary ("AND" primary)* ;
primary     -> GENE | NUMBER | "(" expression ")" ;

GPR Grammar (left to right):
expression -> primary (("AND" | "OR") primary)* ;

e.g. ( Gene1 AND Gene2) OR (Gene3 AND Gene4)
 */

/// GPR Parser
pub struct GPRParser {
    /// Vector of tokens from the GPR string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
    /// How `and`/`or` bind relative to each other
    precedence: GprPrecedence,
}

impl GPRParser {
    /// Create a new GPRParser
    pub fn new(tokens: Vec<Token>, precedence: GprPrecedence) -> GPRParser {
        GPRParser {
            tokens,
            current: 0,
            precedence,
        }
    }

    // region Parsing Functions

    /// Parse the token vector into a GPR AST
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.expression()?;
        if !self.is_at_end() {
            // If entire expression has not been parsed, and error has occured
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn expression(&mut self) -> Result<Gpr, ParseError> {
        match self.precedence {
            GprPrecedence::SplitOrFirst => self.disjunction(),
            GprPrecedence::LeftToRight => self.binary(),
        }
    }

    fn disjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.conjunction()?;
        while self.match_token(Token::Or) {
            let right = self.conjunction()?;
            expr = Gpr::new_binary_operation(expr, GprOperatorType::Or, right);
        }
        Ok(expr)
    }

    fn conjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.primary()?;
        while self.match_token(Token::And) {
            let right = self.primary()?;
            expr = Gpr::new_binary_operation(expr, GprOperatorType::And, right);
        }
        Ok(expr)
    }

    fn binary(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.primary()?;

        while self.match_token(Token::And) || self.match_token(Token::Or) {
            let operator: GprOperatorType = match self.previous() {
                Token::Or => GprOperatorType::Or,
                Token::And => GprOperatorType::And,
                _ => return Err(ParseError::InvalidBinaryOperator),
            };
            let right = self.primary()?;
            expr = Gpr::new_binary_operation(expr, operator, right);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        match self.peek() {
            Token::Identifier(id) => {
                self.advance();
                Ok(Gpr::new_gene_node(&id))
            }
            Token::Number { value, text } => {
                self.advance();
                Ok(Gpr::Constant { value, text })
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(Token::RightParen, "Expect ')' after expression.")?;
                Ok(expr)
            }
            _ => Err(ParseError::ExpectedExpression),
        }
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches `token`,
    /// if it does advance [`self.current`] and return true, otherwise return false
    fn match_token(&mut self, token: Token) -> bool {
        if self.check(&token) {
            self.advance();
            return true;
        }
        false
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek() == token
    }

    /// Advance `self.current` one position unless at end of GPR Vec, then return the previous
    /// token.
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Check whether the parser is at the end of the source Vec
    fn is_at_end(&self) -> bool {
        self.peek() == Token::Eof
    }

    /// Get a copy of the current token
    fn peek(&self) -> Token {
        self.tokens.get(self.current).cloned().unwrap_or(Token::Eof)
    }

    /// Get a copy of the previous token
    fn previous(&self) -> Token {
        match self.current {
            0 => Token::Eof,
            n => self.tokens.get(n - 1).cloned().unwrap_or(Token::Eof),
        }
    }

    /// Check whether the current token matches an input token, if it matches advance to the
    /// next token, and if it doesn't return an error. Used mainly for matching parenthesis in
    /// source GPR vec.
    fn consume(&mut self, token: Token, msg: &str) -> Result<Token, ParseError> {
        if self.check(&token) {
            return Ok(self.advance());
        }

        Err(ParseError::MissingToken(format!("{} Found {}", msg, self.peek())))
    }

    // endregion parsing helper functions
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// Token was expected to be a binary operator but was not
    #[error("Invalid binary operator encountered, expected only `and` and `or`")]
    InvalidBinaryOperator,
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("No expression found, check that the GPR string is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("Parsing terminated early, check for two gene identifiers without an operator between them")]
    EarlyTermination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gpr_parse::lexer::Lexer;
    use crate::metabolic_model::gpr::GprOperation;

    fn parse(input: &str, precedence: GprPrecedence) -> Result<Gpr, ParseError> {
        let tokens = Lexer::new(input).lex().unwrap();
        GPRParser::new(tokens, precedence).parse()
    }

    fn gene(id: &str) -> Gpr {
        Gpr::new_gene_node(id)
    }

    #[test]
    fn single_gene_parse() {
        let gpr = parse("Rv1304", GprPrecedence::SplitOrFirst).unwrap();
        assert_eq!(gpr, gene("Rv1304"));
    }

    #[test]
    fn and_parse() {
        let gpr = parse("Rv1304 and Rv0023", GprPrecedence::SplitOrFirst).unwrap();
        match gpr {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_eq!(*left, gene("Rv1304"));
                assert_eq!(*right, gene("Rv0023"));
            }
            _ => panic!("Should have been an AND operation"),
        }
    }

    #[test]
    fn grouping_parse() {
        let gpr = parse("(Rv3141 or Rv0023) and Rv0018", GprPrecedence::SplitOrFirst).unwrap();
        let expected = Gpr::new_binary_operation(
            Gpr::new_binary_operation(gene("Rv3141"), GprOperatorType::Or, gene("Rv0023")),
            GprOperatorType::And,
            gene("Rv0018"),
        );
        assert_eq!(gpr, expected);
    }

    #[test]
    fn split_or_first_binds_and_tighter() {
        // a or b and c => a or (b and c)
        let gpr = parse("a or b and c", GprPrecedence::SplitOrFirst).unwrap();
        let expected = Gpr::new_binary_operation(
            gene("a"),
            GprOperatorType::Or,
            Gpr::new_binary_operation(gene("b"), GprOperatorType::And, gene("c")),
        );
        assert_eq!(gpr, expected);
    }

    #[test]
    fn left_to_right_folds_in_order() {
        // a or b and c => (a or b) and c
        let gpr = parse("a or b and c", GprPrecedence::LeftToRight).unwrap();
        let expected = Gpr::new_binary_operation(
            Gpr::new_binary_operation(gene("a"), GprOperatorType::Or, gene("b")),
            GprOperatorType::And,
            gene("c"),
        );
        assert_eq!(gpr, expected);
    }

    #[test]
    fn numeric_literal() {
        let gpr = parse("0.5 and a", GprPrecedence::SplitOrFirst).unwrap();
        let expected = Gpr::new_binary_operation(
            Gpr::new_constant("0.5", 0.5),
            GprOperatorType::And,
            gene("a"),
        );
        assert_eq!(gpr, expected);
    }

    #[test]
    fn invalid_parse() {
        assert_eq!(
            parse("Rv0001 Rv0023", GprPrecedence::SplitOrFirst),
            Err(ParseError::EarlyTermination)
        );
        assert_eq!(
            parse("", GprPrecedence::SplitOrFirst),
            Err(ParseError::ExpectedExpression)
        );
        assert_eq!(
            parse("a and", GprPrecedence::LeftToRight),
            Err(ParseError::ExpectedExpression)
        );
        assert!(matches!(
            parse("(a or b", GprPrecedence::SplitOrFirst),
            Err(ParseError::MissingToken(_))
        ));
        assert_eq!(
            parse("a or b)", GprPrecedence::SplitOrFirst),
            Err(ParseError::EarlyTermination)
        );
    }
}
