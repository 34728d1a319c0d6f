//! Provides struct for representing a constraint in an optimization problem
use std::fmt::{Display, Formatter};

/// Represents a linear constraint in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        /// Id of the constraint
        id: String,
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint, `lower_bound` <= `terms` <= `upper_bound`
    ///
    /// Either bound may be infinite to leave that side open.
    Inequality {
        /// Id of the constraint
        id: String,
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: f64,
        /// The highest value the sum of the terms can take
        upper_bound: f64,
    },
}

impl Constraint {
    /// Create a new equality constraint
    ///
    /// # Parameters
    /// - `id`: Id of the constraint
    /// - `terms`: The linear terms of the left hand side
    /// - `equals`: The right hand side of the equality
    ///
    /// # Examples
    /// ```rust
    /// use fluxsuite_core::optimize::constraint::{Constraint, ConstraintTerm};
    /// // Create a constraint representing 3*x_0 + 2*x_1 = 6
    /// let new_constraint = Constraint::new_equality(
    ///     "mass_balance",
    ///     vec![ConstraintTerm::new(0, 3.0), ConstraintTerm::new(1, 2.0)],
    ///     6.,
    /// );
    /// assert_eq!(new_constraint.id(), "mass_balance");
    /// ```
    pub fn new_equality(id: &str, terms: Vec<ConstraintTerm>, equals: f64) -> Self {
        Constraint::Equality {
            id: id.to_string(),
            terms,
            equals,
        }
    }

    /// Create a new inequality constraint
    ///
    /// # Parameters
    /// - `id`: Id of the constraint
    /// - `terms`: The linear terms of the constraint
    /// - `lower_bound`: The lowest value the constraint can take
    /// - `upper_bound`: The highest value the constraint can take
    pub fn new_inequality(
        id: &str,
        terms: Vec<ConstraintTerm>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Constraint::Inequality {
            id: id.to_string(),
            terms,
            lower_bound,
            upper_bound,
        }
    }

    /// Get the id of the constraint
    pub fn id(&self) -> &str {
        match self {
            Constraint::Equality { id, .. } | Constraint::Inequality { id, .. } => id,
        }
    }

    /// Get the terms of the constraint
    pub fn terms(&self) -> &[ConstraintTerm] {
        match self {
            Constraint::Equality { terms, .. } | Constraint::Inequality { terms, .. } => terms,
        }
    }

    /// Lower and upper value of the constraint, an equality has both equal
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Constraint::Equality { equals, .. } => (*equals, *equals),
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => (*lower_bound, *upper_bound),
        }
    }

    /// Value of the terms at the point `values`, indexed by variable index
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms()
            .iter()
            .map(|t| t.coefficient * values.get(t.variable).copied().unwrap_or(0.))
            .sum()
    }

    /// Convert a slice of terms into a String representation
    fn terms_to_string(terms: &[ConstraintTerm]) -> String {
        if terms.is_empty() {
            return "0".to_string();
        }
        terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equality { id, terms, equals } => {
                write!(f, "{}: {} = {}", id, Self::terms_to_string(terms), equals)
            }
            Constraint::Inequality {
                id,
                terms,
                lower_bound,
                upper_bound,
            } => write!(
                f,
                "{}: {} <= {} <= {}",
                id,
                lower_bound,
                Self::terms_to_string(terms),
                upper_bound
            ),
        }
    }
}

/// Represents a single term in a constraint, specifically
/// represents the multiplication of the variable at index `variable` by the `coefficient`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintTerm {
    /// Index of the variable in the problem
    pub variable: usize,
    /// The coefficient for the variable
    pub coefficient: f64,
}

impl ConstraintTerm {
    pub fn new(variable: usize, coefficient: f64) -> Self {
        ConstraintTerm {
            variable,
            coefficient,
        }
    }
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*x{}", self.coefficient, self.variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_display_and_bounds() {
        let cons = Constraint::new_equality(
            "A_c",
            vec![ConstraintTerm::new(0, -1.), ConstraintTerm::new(1, 1.)],
            0.,
        );
        assert_eq!(cons.bounds(), (0., 0.));
        assert_eq!(format!("{}", cons), "A_c: -1*x0 + 1*x1 = 0");
        assert_eq!(cons.evaluate(&[2., 5.]), 3.);
    }

    #[test]
    fn inequality_bounds() {
        let cons = Constraint::new_inequality("fix", vec![], 1., f64::INFINITY);
        assert_eq!(cons.id(), "fix");
        assert_eq!(cons.bounds(), (1., f64::INFINITY));
        assert!(cons.terms().is_empty());
    }
}
