//! Module for parsing Gene Protein Reaction strings into AST values

use crate::configuration::GprPrecedence;
use crate::io::gpr_parse::lexer::LexerError;
use crate::io::gpr_parse::parser::ParseError;
use crate::metabolic_model::gpr::Gpr;
use thiserror::Error;

mod lexer;
pub mod parser;
mod token;

/// Parse a Gene Protein Reaction string into a GPR Tree
///
/// # Parameters
/// - `input`: &str representing the gene protein reaction rule
/// - `precedence`: how `and` and `or` bind relative to each other
///
/// # Returns
/// Parse result which is
/// - `Ok`: The root node of the GPR tree
/// - `Err`: Returns the GprParseError describing the issue with the GPR rule which
///     was being parsed.
///
/// # Examples
/// ```rust
/// use fluxsuite_core::configuration::GprPrecedence;
/// use fluxsuite_core::io::gpr_parse::parse_gpr;
/// let gpr_tree = parse_gpr("Rv0001 and Rv0002", GprPrecedence::SplitOrFirst).unwrap();
/// assert_eq!(gpr_tree.gene_ids(), vec!["Rv0001".to_string(), "Rv0002".to_string()]);
/// ```
pub fn parse_gpr(input: &str, precedence: GprPrecedence) -> Result<Gpr, GprParseError> {
    // Convert the GPR string into tokens
    let tokens = lexer::Lexer::new(input).lex()?;
    // Now parse those tokens into a GPR tree
    let mut parser = parser::GPRParser::new(tokens, precedence);
    let gpr = parser.parse()?;
    Ok(gpr)
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GprParseError {
    /// Lexing Error
    #[error("Error occurred during lexing (conversion of GPR string to tokens): {0}")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("Error occurred during parsing (conversion of tokens to GPR tree): {0}")]
    ParsingError(#[from] ParseError),
}
