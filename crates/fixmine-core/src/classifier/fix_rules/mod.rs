/*!
# Fix Detectors

Idiom detectors recognise specific bug-fix shapes; structural detectors
name the generic edit when nothing more specific applies.
*/

pub mod case_fallthrough;
pub mod guards;
pub mod structural;

pub use case_fallthrough::CaseFallthroughClassifier;
pub use guards::{NullDereferenceGuardClassifier, PreconditionGuardClassifier};
pub use structural::{
    ArgumentPropagationClassifier, BinaryOperatorClassifier, BinaryOperatorDeletionClassifier, LiteralClassifier,
    NegatedConditionClassifier,
};
