/*!
# Case Fallthrough

A `break` or `return` inserted directly into a `switch` case arm ends an
unintended fallthrough into the next arm.
*/

use crate::ast::{Edit, EditKind, NodeKind};
use crate::classifier::patterns::{NodePattern, PatternMatcher};
use crate::classifier::Classifier;
use crate::rules::Rule;

pub struct CaseFallthroughClassifier;

impl Classifier for CaseFallthroughClassifier {
    fn name(&self) -> &'static str {
        "case-fallthrough"
    }

    fn accepted_kinds(&self) -> &'static [EditKind] {
        &[EditKind::Insert]
    }

    fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        let inserted = edit.inserted()?;
        let exit_in_case = PatternMatcher::all(
            PatternMatcher::any(PatternMatcher::break_stmt(), PatternMatcher::return_stmt()),
            PatternMatcher::child_of(PatternMatcher::case_arm()),
        );
        if !exit_in_case.matches(&inserted) {
            return None;
        }

        match inserted.kind() {
            NodeKind::Break => Some(Rule::MissingBreakInCase),
            _ => Some(Rule::MissingReturnInCase),
        }
    }
}
