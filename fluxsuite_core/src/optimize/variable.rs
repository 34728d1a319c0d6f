//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A decision variable of a [`crate::optimize::problem::Problem`]
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into))]
pub struct Variable {
    /// Id of the variable, unique within a problem
    pub(crate) id: String,
    /// Optional human readable name
    #[builder(setter(strip_option), default = "None")]
    pub(crate) name: Option<String>,
    /// Type of the variable
    #[builder(default = "VariableType::Continuous")]
    pub(crate) variable_type: VariableType,
    /// Lower bound, may be `f64::NEG_INFINITY`
    #[builder(default = "0.")]
    pub(crate) lower_bound: f64,
    /// Upper bound, may be `f64::INFINITY`
    #[builder(default = "f64::INFINITY")]
    pub(crate) upper_bound: f64,
    /// Position of the variable in the problem, set when it is added
    #[builder(setter(skip), default = "0")]
    pub(crate) index: usize,
}

impl Variable {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn variable_type(&self) -> VariableType {
        self.variable_type
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the variable must take an integral value
    pub fn is_integral(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}:{}", name, self.variable_type),
            None => write!(f, "{}:{}", self.id, self.variable_type),
        }
    }
}

/// Represents the type of variable in an optimization problem
///
/// # Notes:
/// Not all variable types are supported for all solvers, currently Clarabel only supports
/// Continuous variables, while microlp supports all types
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
    /// Binary Variable
    Binary,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
            VariableType::Binary => write!(f, "BINARY"),
        }
    }
}
