/*!
# Structural Edit Detectors

Generic detectors that name the raw shape of an edit. Their payload feeds
the specializers, which narrow them into semantic categories.
*/

use crate::ast::{Edit, EditKind, NodeKind, UnaryOp};
use crate::classifier::patterns::{NodePattern, PatternMatcher};
use crate::classifier::Classifier;
use crate::rules::Rule;

/// A `!` inserted as the condition of an `if` or `while`
pub struct NegatedConditionClassifier;

impl Classifier for NegatedConditionClassifier {
    fn name(&self) -> &'static str {
        "negated-condition"
    }

    fn accepted_kinds(&self) -> &'static [EditKind] {
        &[EditKind::Insert]
    }

    fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        let inserted = edit.inserted()?;
        if !matches!(inserted.kind(), NodeKind::UnaryOperator { op: UnaryOp::Not }) {
            return None;
        }
        let in_loop_or_branch =
            PatternMatcher::child_of(PatternMatcher::any(PatternMatcher::if_stmt(), PatternMatcher::while_stmt()));
        let is_condition = in_loop_or_branch.matches(&inserted) && inserted.index_in_parent() == Some(0);
        is_condition.then_some(Rule::ConditionalNegated)
    }
}

/// An operator swapped in place: `a < b` becomes `a <= b`
pub struct BinaryOperatorClassifier;

impl Classifier for BinaryOperatorClassifier {
    fn name(&self) -> &'static str {
        "binary-operator-replaced"
    }

    fn accepted_kinds(&self) -> &'static [EditKind] {
        &[EditKind::Update]
    }

    fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        let (before, after) = edit.pair()?;
        match (before.kind(), after.kind()) {
            (NodeKind::BinaryOperator { op: src }, NodeKind::BinaryOperator { op: dst }) if src != dst => {
                Some(Rule::BinaryOperatorReplaced { src: *src, dst: *dst })
            }
            _ => None,
        }
    }
}

/// A binary operation removed from the before-revision
pub struct BinaryOperatorDeletionClassifier;

impl Classifier for BinaryOperatorDeletionClassifier {
    fn name(&self) -> &'static str {
        "binary-operator-deleted"
    }

    fn accepted_kinds(&self) -> &'static [EditKind] {
        &[EditKind::Delete]
    }

    fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        match edit.deleted()?.kind() {
            NodeKind::BinaryOperator { op } => Some(Rule::BinaryOperatorDeleted { op: *op }),
            _ => None,
        }
    }
}

/// A literal updated to another literal, or to something that is not a
/// literal at all
pub struct LiteralClassifier;

impl Classifier for LiteralClassifier {
    fn name(&self) -> &'static str {
        "literal-replaced"
    }

    fn accepted_kinds(&self) -> &'static [EditKind] {
        &[EditKind::Update]
    }

    fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        let (before, after) = edit.pair()?;
        let NodeKind::Literal { value: src } = before.kind() else {
            return None;
        };
        match after.kind() {
            NodeKind::Literal { value: dst } if dst == src => None,
            NodeKind::Literal { value: dst } => Some(Rule::LiteralReplaced {
                src: src.clone(),
                dst: Some(dst.clone()),
            }),
            _ => Some(Rule::LiteralReplaced {
                src: src.clone(),
                dst: None,
            }),
        }
    }
}

/// A call replaced by one of its operands: the operand moves out of the
/// invocation into a position that is not an operand of any call
pub struct ArgumentPropagationClassifier;

impl Classifier for ArgumentPropagationClassifier {
    fn name(&self) -> &'static str {
        "argument-propagated"
    }

    fn accepted_kinds(&self) -> &'static [EditKind] {
        &[EditKind::Move]
    }

    fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        let (before, after) = edit.pair()?;
        let operand = PatternMatcher::child_of(PatternMatcher::invocation());
        // Landing inside any call, the same one or another, is a rewrap.
        let outside_calls = PatternMatcher::not(PatternMatcher::child_of(PatternMatcher::invocation()));
        if !(operand.matches(&before) && outside_calls.matches(&after)) {
            return None;
        }
        Some(Rule::ArgumentPropagated {
            index: before.index_in_parent()?,
        })
    }
}
