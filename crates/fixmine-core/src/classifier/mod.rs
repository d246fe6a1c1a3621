/*!
# Classifier Chain

Ordered chain of fix detectors. Each detector declares the edit kinds it
accepts and a structural predicate over the touched nodes; the first
detector that recognises an edit names its rule and the chain stops.

## Architecture

- `Classifier`: trait implemented by every detector
- `ClassifierChain`: immutable ordered list of detectors
- `fix_rules`: the idiom detectors and the generic structural fallbacks
- `patterns`: node matchers and structural queries shared by detectors

Ordering is significant: a specific detector must be registered before a
general one that would also match the same edit.
*/

pub mod fix_rules;
pub mod patterns;

use tracing::trace;

use crate::ast::{Edit, EditKind, FileDiff};
use crate::rules::Rule;

pub use fix_rules::{
    ArgumentPropagationClassifier, BinaryOperatorClassifier, BinaryOperatorDeletionClassifier,
    CaseFallthroughClassifier, LiteralClassifier, NegatedConditionClassifier, NullDereferenceGuardClassifier,
    PreconditionGuardClassifier,
};
pub use patterns::{NodePattern, NodeWalker, PatternMatcher};

/// Core trait for fix detectors
pub trait Classifier: Send + Sync {
    /// Human-readable name for this detector
    fn name(&self) -> &'static str;

    /// Edit kinds this detector inspects. The chain never calls
    /// [`Classifier::classify`] with any other kind.
    fn accepted_kinds(&self) -> &'static [EditKind];

    /// Structural predicate: the rule this edit exhibits, if any
    fn classify(&self, edit: &Edit<'_>) -> Option<Rule>;

    fn accepts(&self, kind: EditKind) -> bool {
        self.accepted_kinds().contains(&kind)
    }
}

/// Immutable, ordered chain of detectors
pub struct ClassifierChain {
    classifiers: Vec<Box<dyn Classifier>>,
}

impl ClassifierChain {
    pub fn builder() -> ClassifierChainBuilder {
        ClassifierChainBuilder::default()
    }

    /// The standard detector order: idiom detectors first, generic
    /// structural fallbacks last
    pub fn standard() -> Self {
        Self::builder()
            .with(CaseFallthroughClassifier)
            .with(PreconditionGuardClassifier)
            .with(NullDereferenceGuardClassifier)
            .with(NegatedConditionClassifier)
            .with(BinaryOperatorClassifier)
            .with(BinaryOperatorDeletionClassifier)
            .with(LiteralClassifier)
            .with(ArgumentPropagationClassifier)
            .build()
    }

    /// Names of the registered detectors, in chain order
    pub fn names(&self) -> Vec<&'static str> {
        self.classifiers.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Run one edit through the chain. `None` means no detector matched,
    /// which is not an error.
    pub fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        self.classifiers
            .iter()
            .filter(|classifier| classifier.accepts(edit.kind))
            .find_map(|classifier| {
                let rule = classifier.classify(edit)?;
                trace!(classifier = classifier.name(), %rule, "edit classified");
                Some(rule)
            })
    }

    /// Classify every edit of a diff in script order, one slot per edit
    pub fn classify_diff(&self, diff: &FileDiff) -> Vec<Option<Rule>> {
        diff.edits().map(|edit| self.classify(&edit)).collect()
    }
}

impl Default for ClassifierChain {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Default)]
pub struct ClassifierChainBuilder {
    classifiers: Vec<Box<dyn Classifier>>,
}

impl ClassifierChainBuilder {
    /// Append a detector after every detector added so far
    pub fn with<C: Classifier + 'static>(mut self, classifier: C) -> Self {
        self.classifiers.push(Box::new(classifier));
        self
    }

    pub fn build(self) -> ClassifierChain {
        ClassifierChain {
            classifiers: self.classifiers,
        }
    }
}
