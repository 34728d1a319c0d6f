//! Constraint based flux analysis of metabolic models, and a harness for checking one
//! optimizer backend against another across many published models.

pub mod analysis;
pub mod benchmark;
pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
mod utils;
