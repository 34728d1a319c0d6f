//! Module for reading models and analysis requests
pub mod gpr_parse;
pub mod json;
pub mod request;
