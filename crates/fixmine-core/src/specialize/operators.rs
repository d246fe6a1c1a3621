// Operator tie-break tables.

use crate::ast::BinaryOp;
use crate::rules::Rule;

use super::Specializer;

fn is_negation(src: BinaryOp, dst: BinaryOp) -> bool {
    src.negation() == Some(dst)
}

/// Deleted operator is one of `+ - * / %`
pub struct ArithmeticOperatorDeleted;

impl Specializer for ArithmeticOperatorDeleted {
    fn name(&self) -> &'static str {
        "arithmetic-operator-deleted"
    }

    fn build(&self, base: &Rule) -> Option<Rule> {
        match base {
            Rule::BinaryOperatorDeleted { op } if op.is_arithmetic() => Some(Rule::ArithmeticOperatorDeleted),
            _ => None,
        }
    }
}

/// Both sides of the replacement are arithmetic
pub struct ArithmeticOperatorReplaced;

impl Specializer for ArithmeticOperatorReplaced {
    fn name(&self) -> &'static str {
        "arithmetic-operator-replaced"
    }

    fn build(&self, base: &Rule) -> Option<Rule> {
        match base {
            Rule::BinaryOperatorReplaced { src, dst } if src.is_arithmetic() && dst.is_arithmetic() => {
                Some(Rule::ArithmeticOperatorReplaced)
            }
            _ => None,
        }
    }
}

/// `<=` and `<`, or `>=` and `>`, in either direction
pub struct ConditionalBoundary;

impl Specializer for ConditionalBoundary {
    fn name(&self) -> &'static str {
        "conditional-boundary"
    }

    fn build(&self, base: &Rule) -> Option<Rule> {
        use BinaryOp::*;

        match base {
            Rule::BinaryOperatorReplaced { src, dst } => match (src, dst) {
                (LessEqual, LessThan) | (LessThan, LessEqual) | (GreaterEqual, GreaterThan) | (GreaterThan, GreaterEqual) => {
                    Some(Rule::ConditionalBoundary)
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Comparisons that are not each other's negation
pub struct RelationalOperatorReplaced;

impl Specializer for RelationalOperatorReplaced {
    fn name(&self) -> &'static str {
        "relational-operator-replaced"
    }

    fn build(&self, base: &Rule) -> Option<Rule> {
        match base {
            Rule::BinaryOperatorReplaced { src, dst }
                if src.is_comparison() && dst.is_comparison() && !is_negation(*src, *dst) =>
            {
                Some(Rule::RelationalOperatorReplaced)
            }
            _ => None,
        }
    }
}

/// Comparisons that negate each other (`<`/`>=`, `<=`/`>`, `==`/`!=`), or
/// an explicitly negated condition
pub struct NegatedConditional;

impl Specializer for NegatedConditional {
    fn name(&self) -> &'static str {
        "negated-conditional"
    }

    fn build(&self, base: &Rule) -> Option<Rule> {
        match base {
            Rule::ConditionalNegated => Some(Rule::NegatedConditional),
            Rule::BinaryOperatorReplaced { src, dst }
                if src.is_comparison() && dst.is_comparison() && is_negation(*src, *dst) =>
            {
                Some(Rule::NegatedConditional)
            }
            _ => None,
        }
    }
}
