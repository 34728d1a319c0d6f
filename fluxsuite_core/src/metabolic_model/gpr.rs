//! Gene Protein Reaction rules represented as an AST
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

use crate::metabolic_model::gene::{Gene, GeneActivity};

/// Map of gene ids to (non-negative, typically normalized) expression values
pub type ExpressionMap = IndexMap<String, f64>;

/// Representation of a Gene Protein Reaction Rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation on two sub-rules (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene Node, holding the gene id
    GeneNode(String),
    /// A word of the rule that reads as a number, kept with its text since some
    /// gene ids (Entrez `10026.1`) look numeric
    Constant { value: f64, text: String },
}

/// Possible operations on genes
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
}

/// Types of Allowed GPR Operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GprOperatorType {
    /// Or, results in active if either left or right are active
    Or,
    /// And, results in active if both left and right are active
    And,
}

impl Gpr {
    /// Create a new binary operation node
    pub fn new_binary_operation(left: Gpr, operator: GprOperatorType, right: Gpr) -> Gpr {
        let op = match operator {
            GprOperatorType::Or => GprOperation::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::And => GprOperation::And {
                left: Box::new(left),
                right: Box::new(right),
            },
        };
        Gpr::Operation(op)
    }

    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    pub fn new_constant(text: &str, value: f64) -> Gpr {
        Gpr::Constant {
            value,
            text: text.to_string(),
        }
    }

    /// Read every numeric word as a gene id
    ///
    /// Boolean evaluation has no use for literal numbers, so a model's rules treat
    /// them as genes. Expression scoring parses the rule text anew and keeps them.
    pub fn numbers_as_genes(self) -> Gpr {
        match self {
            Gpr::Operation(GprOperation::Or { left, right }) => Gpr::Operation(GprOperation::Or {
                left: Box::new(left.numbers_as_genes()),
                right: Box::new(right.numbers_as_genes()),
            }),
            Gpr::Operation(GprOperation::And { left, right }) => {
                Gpr::Operation(GprOperation::And {
                    left: Box::new(left.numbers_as_genes()),
                    right: Box::new(right.numbers_as_genes()),
                })
            }
            Gpr::Constant { text, .. } => Gpr::GeneNode(text),
            node => node,
        }
    }

    /// Score the rule against expression data
    ///
    /// `and` takes the minimum of its operands (a complex is limited by its scarcest
    /// subunit), `or` takes the maximum (isozymes). Genes missing from `expression`
    /// score 1.0.
    pub fn eval_expression(&self, expression: &ExpressionMap) -> f64 {
        match self {
            Gpr::Operation(GprOperation::Or { left, right }) => left
                .eval_expression(expression)
                .max(right.eval_expression(expression)),
            Gpr::Operation(GprOperation::And { left, right }) => left
                .eval_expression(expression)
                .min(right.eval_expression(expression)),
            Gpr::GeneNode(gene) => expression.get(gene.trim()).copied().unwrap_or(1.0),
            Gpr::Constant { value, .. } => *value,
        }
    }

    /// Evaluate whether the rule is Active or Inactive given the activity of the genes
    ///
    /// Genes absent from `genes` are treated as active.
    pub fn eval_activity(&self, genes: &IndexMap<String, Gene>) -> GeneActivity {
        match self {
            Gpr::Operation(GprOperation::Or { left, right }) => {
                if left.eval_activity(genes) == GeneActivity::Active
                    || right.eval_activity(genes) == GeneActivity::Active
                {
                    GeneActivity::Active
                } else {
                    GeneActivity::Inactive
                }
            }
            Gpr::Operation(GprOperation::And { left, right }) => {
                if left.eval_activity(genes) == GeneActivity::Active
                    && right.eval_activity(genes) == GeneActivity::Active
                {
                    GeneActivity::Active
                } else {
                    GeneActivity::Inactive
                }
            }
            Gpr::GeneNode(gene) => genes
                .get(gene)
                .map(|g| g.activity)
                .unwrap_or(GeneActivity::Active),
            Gpr::Constant { value, text } => match genes.get(text) {
                Some(gene) => gene.activity,
                None if *value > 0. => GeneActivity::Active,
                None => GeneActivity::Inactive,
            },
        }
    }

    /// Ids of all genes referenced by the rule, in order of appearance
    pub fn gene_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_gene_ids(&mut ids);
        ids
    }

    fn collect_gene_ids(&self, ids: &mut Vec<String>) {
        match self {
            Gpr::Operation(GprOperation::Or { left, right })
            | Gpr::Operation(GprOperation::And { left, right }) => {
                left.collect_gene_ids(ids);
                right.collect_gene_ids(ids);
            }
            Gpr::GeneNode(gene) => {
                if !ids.contains(gene) {
                    ids.push(gene.clone())
                }
            }
            Gpr::Constant { .. } => {}
        }
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
            },
            Gpr::GeneNode(gene_ref) => gene_ref.to_string(),
            Gpr::Constant { text, .. } => text.clone(),
        }
    }
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}
