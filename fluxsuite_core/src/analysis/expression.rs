//! Scoring reactions against gene expression data
use indexmap::IndexMap;

use crate::configuration::GprPrecedence;
use crate::io::gpr_parse::parse_gpr;
use crate::metabolic_model::gpr::ExpressionMap;
use crate::metabolic_model::model::Model;

/// Score a gene rule against expression data
///
/// `and` takes the minimum of its operands and `or` the maximum, genes missing from
/// `expression` score 1.0. A blank rule is constitutive and scores 1.0, as does a rule
/// that can't be parsed or whose score isn't finite, so the result is always usable.
///
/// # Examples
/// ```rust
/// use fluxsuite_core::analysis::expression::evaluate_gpr_expression;
/// use fluxsuite_core::configuration::GprPrecedence;
/// use fluxsuite_core::metabolic_model::gpr::ExpressionMap;
/// let mut expression = ExpressionMap::new();
/// expression.insert("a".to_string(), 0.2);
/// expression.insert("b".to_string(), 0.8);
/// expression.insert("c".to_string(), 0.5);
/// let score = evaluate_gpr_expression("(a and b) or c", &expression, GprPrecedence::SplitOrFirst);
/// assert_eq!(score, 0.5);
/// ```
pub fn evaluate_gpr_expression(
    rule: &str,
    expression: &ExpressionMap,
    precedence: GprPrecedence,
) -> f64 {
    if rule.trim().is_empty() {
        return 1.0;
    }
    match parse_gpr(rule, precedence) {
        Ok(gpr) => {
            let score = gpr.eval_expression(expression);
            if score.is_finite() {
                score
            } else {
                log::debug!("Rule {:?} scored {}, using 1.0", rule, score);
                1.0
            }
        }
        Err(err) => {
            log::debug!("Unable to score rule {:?} ({}), using 1.0", rule, err);
            1.0
        }
    }
}

/// Expression score of every reaction that has a gene rule, in model order
pub fn reaction_scores(
    model: &Model,
    expression: &ExpressionMap,
    precedence: GprPrecedence,
) -> IndexMap<String, f64> {
    model
        .reactions
        .values()
        .filter_map(|rxn| {
            rxn.gene_reaction_rule
                .as_deref()
                .filter(|_| rxn.has_gene_rule())
                .map(|rule| {
                    (
                        rxn.id.clone(),
                        evaluate_gpr_expression(rule, expression, precedence),
                    )
                })
        })
        .collect()
}
