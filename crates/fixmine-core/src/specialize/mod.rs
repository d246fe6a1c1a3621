/*!
# Rule Specialization

Narrows coarse structural rules into named semantic categories. Every
specializer is a pure function of one base rule; the [`Specialization`]
registry tries them in a fixed priority order and keeps the first hit, so a
base rule yields at most one specialized rule.
*/

pub mod literals;
pub mod operators;

use crate::rules::Rule;

pub use literals::{InlineConstant, InvertNegatives, NakedReceiver};
pub use operators::{
    ArithmeticOperatorDeleted, ArithmeticOperatorReplaced, ConditionalBoundary, NegatedConditional,
    RelationalOperatorReplaced,
};

/// A pure `base rule -> specialized rule` mapping
pub trait Specializer: Send + Sync {
    fn name(&self) -> &'static str;

    /// The specialized rule for `base`, or `None` when no table row applies
    fn build(&self, base: &Rule) -> Option<Rule>;
}

/// Specializers in priority order
pub struct Specialization {
    specializers: Vec<Box<dyn Specializer>>,
}

impl Specialization {
    pub fn new() -> Self {
        Self {
            specializers: vec![
                Box::new(ArithmeticOperatorDeleted),
                Box::new(ArithmeticOperatorReplaced),
                Box::new(ConditionalBoundary),
                Box::new(NegatedConditional),
                Box::new(RelationalOperatorReplaced),
                Box::new(InlineConstant),
                Box::new(InvertNegatives),
                Box::new(NakedReceiver),
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.specializers.iter().map(|s| s.name()).collect()
    }

    /// First non-`None` result in priority order. Specialized rules are
    /// never specialized again.
    pub fn specialize(&self, base: &Rule) -> Option<Rule> {
        if base.tier() == crate::rules::RuleTier::Specialized {
            return None;
        }
        self.specializers.iter().find_map(|s| s.build(base))
    }
}

impl Default for Specialization {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Literal};

    fn replaced(src: BinaryOp, dst: BinaryOp) -> Rule {
        Rule::BinaryOperatorReplaced { src, dst }
    }

    #[test]
    fn test_boundary_wins_over_relational() {
        let registry = Specialization::new();
        assert_eq!(
            registry.specialize(&replaced(BinaryOp::LessThan, BinaryOp::LessEqual)),
            Some(Rule::ConditionalBoundary)
        );
        assert_eq!(
            registry.specialize(&replaced(BinaryOp::LessThan, BinaryOp::GreaterThan)),
            Some(Rule::RelationalOperatorReplaced)
        );
        assert_eq!(
            registry.specialize(&replaced(BinaryOp::Equal, BinaryOp::NotEqual)),
            Some(Rule::NegatedConditional)
        );
        assert_eq!(
            registry.specialize(&replaced(BinaryOp::Add, BinaryOp::Modulo)),
            Some(Rule::ArithmeticOperatorReplaced)
        );
    }

    #[test]
    fn test_unspecializable_rules() {
        let registry = Specialization::new();
        assert_eq!(registry.specialize(&replaced(BinaryOp::And, BinaryOp::Or)), None);
        assert_eq!(registry.specialize(&Rule::MissingBreakInCase), None);
        assert_eq!(registry.specialize(&Rule::InlineConstant), None);
        assert_eq!(
            registry.specialize(&Rule::LiteralReplaced {
                src: Literal::String("a".to_string()),
                dst: None
            }),
            None
        );
    }

    #[test]
    fn test_at_most_one_specializer_applies_per_table() {
        // Every operator pair maps to at most one hit across the operator
        // specializers that share the replaced-operator input.
        let ops = [
            BinaryOp::Add,
            BinaryOp::Subtract,
            BinaryOp::Multiply,
            BinaryOp::Divide,
            BinaryOp::Modulo,
            BinaryOp::LessThan,
            BinaryOp::LessEqual,
            BinaryOp::GreaterThan,
            BinaryOp::GreaterEqual,
            BinaryOp::Equal,
            BinaryOp::NotEqual,
        ];
        let registry = Specialization::new();
        for src in ops {
            for dst in ops {
                let rule = replaced(src, dst);
                let hits = registry.specializers.iter().filter(|s| s.build(&rule).is_some()).count();
                let expected = registry.specialize(&rule).map_or(0, |_| 1);
                let boundary = ConditionalBoundary.build(&rule).is_some();
                // A boundary shift is also a relational replacement; the
                // registry order resolves it.
                assert_eq!(hits, expected + usize::from(boundary), "{src} -> {dst}");
            }
        }
    }
}
