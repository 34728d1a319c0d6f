//! Module providing the Model struct for representing a metabolic model.

pub mod constraints;
pub mod gene;
pub mod gpr;
pub mod metabolite;
pub mod model;
pub mod reaction;
