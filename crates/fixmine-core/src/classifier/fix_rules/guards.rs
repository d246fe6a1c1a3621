/*!
# Guard Insertion Detectors

Fixes that add an `if` in front of code that used to fail:

- precondition guards: `if (param == null) return ...;` at the top of a method
- null-dereference guards: a null test with one returning branch protecting a
  field read or method call on the tested expression
*/

use crate::ast::{BinaryOp, Edit, EditKind, NodeKind, NodeRef};
use crate::classifier::patterns::{
    find_dereference, find_dereference_after, null_test, reaches_return, Dereference, NodePattern, PatternMatcher,
};
use crate::classifier::Classifier;
use crate::rules::Rule;

/// The `if` an insert added, split into condition and branches
struct InsertedIf<'a> {
    node: NodeRef<'a>,
    condition: NodeRef<'a>,
    then_branch: NodeRef<'a>,
    else_branch: Option<NodeRef<'a>>,
}

impl<'a> InsertedIf<'a> {
    fn from_edit(edit: &Edit<'a>) -> Option<Self> {
        let node = edit.inserted()?;
        if !PatternMatcher::if_stmt().matches(&node) {
            return None;
        }
        Some(Self {
            node,
            condition: node.child(0)?,
            then_branch: node.child(1)?,
            else_branch: node.child(2),
        })
    }
}

pub struct PreconditionGuardClassifier;

impl Classifier for PreconditionGuardClassifier {
    fn name(&self) -> &'static str {
        "precondition-guard"
    }

    fn accepted_kinds(&self) -> &'static [EditKind] {
        &[EditKind::Insert]
    }

    fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        let guard = InsertedIf::from_edit(edit)?;
        let (tested, op) = null_test(guard.condition)?;
        if op != BinaryOp::Equal || !reaches_return(guard.then_branch) {
            return None;
        }

        let NodeKind::VariableRead { name } = tested.kind() else {
            return None;
        };
        let executable = guard.node.enclosing_executable()?;
        executable
            .kind()
            .parameters()
            .contains(name)
            .then(|| Rule::PreconditionGuardInserted { parameter: name.clone() })
    }
}

pub struct NullDereferenceGuardClassifier;

impl Classifier for NullDereferenceGuardClassifier {
    fn name(&self) -> &'static str {
        "null-dereference-guard"
    }

    fn accepted_kinds(&self) -> &'static [EditKind] {
        &[EditKind::Insert]
    }

    fn classify(&self, edit: &Edit<'_>) -> Option<Rule> {
        let guard = InsertedIf::from_edit(edit)?;
        let (tested, _) = null_test(guard.condition)?;

        // Exactly one branch may return; the other is where the guarded
        // code keeps running.
        let then_returns = reaches_return(guard.then_branch);
        let else_returns = guard.else_branch.is_some_and(reaches_return);
        let open_branch = match (then_returns, else_returns) {
            (true, false) => guard.else_branch,
            (false, true) => Some(guard.then_branch),
            _ => return None,
        };

        let dereference = find_dereference_after(&guard.node, &tested)
            .or_else(|| open_branch.and_then(|branch| find_dereference(branch, &tested)))?;

        Some(match dereference {
            Dereference::FieldRead(field) => Rule::NullGuardBeforeFieldRead { field },
            Dereference::Invocation(signature) => Rule::NullGuardBeforeInvocation { signature },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstTree, EditOperation, FileDiff, Literal, NodeId};

    /// `void m(<params>) { if (<name> <op> null) { return; } <tail> }`
    struct Fixture {
        tree: AstTree,
        body: NodeId,
        guard: NodeId,
        then_branch: NodeId,
    }

    impl Fixture {
        fn new(params: &[&str], name: &str, op: BinaryOp) -> Self {
            let mut tree = AstTree::new();
            let method = tree.add_root(NodeKind::Method {
                name: "m".to_string(),
                parameters: params.iter().map(|p| p.to_string()).collect(),
            });
            let body = tree.add_child(method, NodeKind::Block);
            let guard = tree.add_child(body, NodeKind::If);
            let cmp = tree.add_child(guard, NodeKind::BinaryOperator { op });
            tree.add_child(cmp, NodeKind::VariableRead { name: name.to_string() });
            tree.add_child(cmp, NodeKind::Literal { value: Literal::Null });
            let then_branch = tree.add_child(guard, NodeKind::Block);
            Self {
                tree,
                body,
                guard,
                then_branch,
            }
        }

        fn returning(mut self) -> Self {
            self.tree.add_child(self.then_branch, NodeKind::Return);
            self
        }

        fn then_dereference(mut self, name: &str, kind: NodeKind) -> Self {
            let deref = self.tree.add_child(self.body, kind);
            self.tree.add_child(deref, NodeKind::VariableRead { name: name.to_string() });
            self
        }

        fn classify(self, classifier: &dyn Classifier) -> Option<Rule> {
            let mut diff = FileDiff::new("G.java", AstTree::new(), self.tree);
            diff.push(EditOperation::Insert { node: self.guard });
            let edit = diff.edits().next()?;
            classifier.classify(&edit)
        }
    }

    #[test]
    fn test_precondition_on_parameter() {
        let rule = Fixture::new(&["input"], "input", BinaryOp::Equal)
            .returning()
            .classify(&PreconditionGuardClassifier);
        assert_eq!(
            rule,
            Some(Rule::PreconditionGuardInserted {
                parameter: "input".to_string()
            })
        );
    }

    #[test]
    fn test_precondition_requires_parameter_and_return() {
        let local = Fixture::new(&["input"], "other", BinaryOp::Equal)
            .returning()
            .classify(&PreconditionGuardClassifier);
        assert_eq!(local, None);

        let no_return = Fixture::new(&["input"], "input", BinaryOp::Equal).classify(&PreconditionGuardClassifier);
        assert_eq!(no_return, None);

        let not_equal = Fixture::new(&["input"], "input", BinaryOp::NotEqual)
            .returning()
            .classify(&PreconditionGuardClassifier);
        assert_eq!(not_equal, None);
    }

    #[test]
    fn test_null_guard_before_field_read() {
        let rule = Fixture::new(&[], "conf", BinaryOp::Equal)
            .returning()
            .then_dereference("conf", NodeKind::FieldRead {
                field: "Config.timeout".to_string(),
            })
            .classify(&NullDereferenceGuardClassifier);
        assert_eq!(
            rule,
            Some(Rule::NullGuardBeforeFieldRead {
                field: "Config.timeout".to_string()
            })
        );
    }

    #[test]
    fn test_null_guard_before_invocation() {
        let rule = Fixture::new(&[], "conn", BinaryOp::Equal)
            .returning()
            .then_dereference("conn", NodeKind::Invocation {
                signature: "Connection#close()".to_string(),
            })
            .classify(&NullDereferenceGuardClassifier);
        assert_eq!(
            rule,
            Some(Rule::NullGuardBeforeInvocation {
                signature: "Connection#close()".to_string()
            })
        );
    }

    #[test]
    fn test_null_guard_searches_open_branch() {
        // if (conn != null) { conn.close(); } else { return; }
        let mut fixture = Fixture::new(&[], "conn", BinaryOp::NotEqual);
        let call = fixture.tree.add_child(fixture.then_branch, NodeKind::Invocation {
            signature: "Connection#close()".to_string(),
        });
        fixture.tree.add_child(call, NodeKind::VariableRead { name: "conn".to_string() });
        let else_branch = fixture.tree.add_child(fixture.guard, NodeKind::Block);
        fixture.tree.add_child(else_branch, NodeKind::Return);

        assert_eq!(
            fixture.classify(&NullDereferenceGuardClassifier),
            Some(Rule::NullGuardBeforeInvocation {
                signature: "Connection#close()".to_string()
            })
        );
    }

    #[test]
    fn test_null_guard_prefers_enclosing_block_over_open_branch() {
        // if (conn != null) { conn.m(); } else { return; } conn.f;
        let mut fixture = Fixture::new(&[], "conn", BinaryOp::NotEqual);
        let call = fixture.tree.add_child(fixture.then_branch, NodeKind::Invocation {
            signature: "m()".to_string(),
        });
        fixture.tree.add_child(call, NodeKind::VariableRead { name: "conn".to_string() });
        let else_branch = fixture.tree.add_child(fixture.guard, NodeKind::Block);
        fixture.tree.add_child(else_branch, NodeKind::Return);

        let rule = fixture
            .then_dereference("conn", NodeKind::FieldRead { field: "C.f".to_string() })
            .classify(&NullDereferenceGuardClassifier);
        assert_eq!(
            rule,
            Some(Rule::NullGuardBeforeFieldRead {
                field: "C.f".to_string()
            })
        );
    }

    #[test]
    fn test_null_guard_needs_dereference_of_same_expression() {
        let rule = Fixture::new(&[], "conn", BinaryOp::Equal)
            .returning()
            .then_dereference("other", NodeKind::Invocation {
                signature: "Connection#close()".to_string(),
            })
            .classify(&NullDereferenceGuardClassifier);
        assert_eq!(rule, None);
    }

    #[test]
    fn test_null_guard_rejects_both_or_neither_returning() {
        let neither = Fixture::new(&[], "conn", BinaryOp::Equal)
            .then_dereference("conn", NodeKind::FieldRead { field: "C.f".to_string() })
            .classify(&NullDereferenceGuardClassifier);
        assert_eq!(neither, None);

        let mut both = Fixture::new(&[], "conn", BinaryOp::Equal)
            .returning()
            .then_dereference("conn", NodeKind::FieldRead { field: "C.f".to_string() });
        let else_branch = both.tree.add_child(both.guard, NodeKind::Block);
        both.tree.add_child(else_branch, NodeKind::Return);
        assert_eq!(both.classify(&NullDereferenceGuardClassifier), None);
    }
}
