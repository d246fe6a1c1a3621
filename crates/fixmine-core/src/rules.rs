/*!
# Fix Rules

The taxonomy of recognised fix idioms. Base rules come straight out of the
classifier chain and carry the payload of the edit they describe;
specialized rules are payload-free tags derived from exactly one base rule.
*/

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOp, Literal};

/// Which tier of the taxonomy a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleTier {
    Base,
    Specialized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    // Idiom detectors
    MissingBreakInCase,
    MissingReturnInCase,
    PreconditionGuardInserted { parameter: String },
    NullGuardBeforeFieldRead { field: String },
    NullGuardBeforeInvocation { signature: String },

    // Structural edits
    ConditionalNegated,
    BinaryOperatorReplaced { src: BinaryOp, dst: BinaryOp },
    BinaryOperatorDeleted { op: BinaryOp },
    LiteralReplaced { src: Literal, dst: Option<Literal> },
    ArgumentPropagated { index: usize },

    // Specialized
    ArithmeticOperatorDeleted,
    ArithmeticOperatorReplaced,
    ConditionalBoundary,
    RelationalOperatorReplaced,
    NegatedConditional,
    InlineConstant,
    InvertNegatives,
    NakedReceiver,
}

impl Rule {
    /// Every rule identifier with its tier, in declaration order
    pub const CATALOG: &'static [(&'static str, RuleTier)] = &[
        ("missing-break-in-case", RuleTier::Base),
        ("missing-return-in-case", RuleTier::Base),
        ("precondition-guard-inserted", RuleTier::Base),
        ("null-guard-before-field-read", RuleTier::Base),
        ("null-guard-before-invocation", RuleTier::Base),
        ("conditional-negated", RuleTier::Base),
        ("binary-operator-replaced", RuleTier::Base),
        ("binary-operator-deleted", RuleTier::Base),
        ("literal-replaced", RuleTier::Base),
        ("argument-propagated", RuleTier::Base),
        ("arithmetic-operator-deleted", RuleTier::Specialized),
        ("arithmetic-operator-replaced", RuleTier::Specialized),
        ("conditional-boundary", RuleTier::Specialized),
        ("relational-operator-replaced", RuleTier::Specialized),
        ("negated-conditional", RuleTier::Specialized),
        ("inline-constant", RuleTier::Specialized),
        ("invert-negatives", RuleTier::Specialized),
        ("naked-receiver", RuleTier::Specialized),
    ];

    /// Stable identifier of the rule kind, payload excluded.
    /// Statistics are keyed on this.
    pub fn id(&self) -> &'static str {
        match self {
            Rule::MissingBreakInCase => "missing-break-in-case",
            Rule::MissingReturnInCase => "missing-return-in-case",
            Rule::PreconditionGuardInserted { .. } => "precondition-guard-inserted",
            Rule::NullGuardBeforeFieldRead { .. } => "null-guard-before-field-read",
            Rule::NullGuardBeforeInvocation { .. } => "null-guard-before-invocation",
            Rule::ConditionalNegated => "conditional-negated",
            Rule::BinaryOperatorReplaced { .. } => "binary-operator-replaced",
            Rule::BinaryOperatorDeleted { .. } => "binary-operator-deleted",
            Rule::LiteralReplaced { .. } => "literal-replaced",
            Rule::ArgumentPropagated { .. } => "argument-propagated",
            Rule::ArithmeticOperatorDeleted => "arithmetic-operator-deleted",
            Rule::ArithmeticOperatorReplaced => "arithmetic-operator-replaced",
            Rule::ConditionalBoundary => "conditional-boundary",
            Rule::RelationalOperatorReplaced => "relational-operator-replaced",
            Rule::NegatedConditional => "negated-conditional",
            Rule::InlineConstant => "inline-constant",
            Rule::InvertNegatives => "invert-negatives",
            Rule::NakedReceiver => "naked-receiver",
        }
    }

    pub fn tier(&self) -> RuleTier {
        match self {
            Rule::ArithmeticOperatorDeleted
            | Rule::ArithmeticOperatorReplaced
            | Rule::ConditionalBoundary
            | Rule::RelationalOperatorReplaced
            | Rule::NegatedConditional
            | Rule::InlineConstant
            | Rule::InvertNegatives
            | Rule::NakedReceiver => RuleTier::Specialized,
            _ => RuleTier::Base,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id();
        match self {
            Rule::PreconditionGuardInserted { parameter } => write!(f, "{id}({parameter})"),
            Rule::NullGuardBeforeFieldRead { field } => write!(f, "{id}({field})"),
            Rule::NullGuardBeforeInvocation { signature } => write!(f, "{id}({signature})"),
            Rule::BinaryOperatorReplaced { src, dst } => write!(f, "{id}({src} -> {dst})"),
            Rule::BinaryOperatorDeleted { op } => write!(f, "{id}({op})"),
            Rule::LiteralReplaced { src, dst: Some(dst) } => write!(f, "{id}({src} -> {dst})"),
            Rule::LiteralReplaced { src, dst: None } => write!(f, "{id}({src} -> _)"),
            Rule::ArgumentPropagated { index } => write!(f, "{id}({index})"),
            _ => f.write_str(id),
        }
    }
}

/// One classified edit, tagged with the project it was mined from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub rule: Rule,
    pub project: String,
}

impl ClassifiedRecord {
    pub fn new(rule: Rule, project: impl Into<String>) -> Self {
        Self {
            rule,
            project: project.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_matches_ids() {
        let samples = [
            Rule::MissingBreakInCase,
            Rule::PreconditionGuardInserted { parameter: "p".to_string() },
            Rule::LiteralReplaced { src: Literal::Int(1), dst: None },
            Rule::NakedReceiver,
        ];
        for rule in samples {
            let entry = Rule::CATALOG
                .iter()
                .find(|(id, _)| *id == rule.id())
                .expect("rule id missing from catalog");
            assert_eq!(entry.1, rule.tier());
        }
    }

    #[test]
    fn test_display_includes_payload() {
        let rule = Rule::BinaryOperatorReplaced {
            src: BinaryOp::LessThan,
            dst: BinaryOp::LessEqual,
        };
        assert_eq!(rule.to_string(), "binary-operator-replaced(< -> <=)");
        assert_eq!(Rule::InlineConstant.to_string(), "inline-constant");
    }
}
