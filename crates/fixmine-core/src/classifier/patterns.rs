/*!
# AST Pattern Matching Utilities

Composable node matchers and the structural queries the fix detectors are
built from: null tests, return reachability and dereference search.
*/

use crate::ast::{BinaryOp, NodeKind, NodeRef};

/// Pattern matcher for AST nodes
pub trait NodePattern {
    /// Check if this pattern matches the given node
    fn matches(&self, node: &NodeRef<'_>) -> bool;
}

/// Pattern matcher constructors
pub struct PatternMatcher;

impl PatternMatcher {
    /// Match any node satisfying a predicate on its kind
    pub fn kind<F>(predicate: F) -> impl NodePattern
    where
        F: Fn(&NodeKind) -> bool,
    {
        KindMatcher { predicate }
    }

    pub fn return_stmt() -> impl NodePattern {
        KindMatcher {
            predicate: |kind: &NodeKind| matches!(kind, NodeKind::Return),
        }
    }

    pub fn break_stmt() -> impl NodePattern {
        KindMatcher {
            predicate: |kind: &NodeKind| matches!(kind, NodeKind::Break),
        }
    }

    pub fn if_stmt() -> impl NodePattern {
        KindMatcher {
            predicate: |kind: &NodeKind| matches!(kind, NodeKind::If),
        }
    }

    pub fn case_arm() -> impl NodePattern {
        KindMatcher {
            predicate: |kind: &NodeKind| matches!(kind, NodeKind::Case),
        }
    }

    pub fn while_stmt() -> impl NodePattern {
        KindMatcher {
            predicate: |kind: &NodeKind| matches!(kind, NodeKind::While),
        }
    }

    /// Any method call, whatever its signature
    pub fn invocation() -> impl NodePattern {
        KindMatcher {
            predicate: |kind: &NodeKind| matches!(kind, NodeKind::Invocation { .. }),
        }
    }

    /// Match a node whose parent matches `parent`
    pub fn child_of<P: NodePattern>(parent: P) -> ChildOfPattern<P> {
        ChildOfPattern { parent }
    }

    /// Combine patterns with AND logic
    pub fn all<P1: NodePattern, P2: NodePattern>(p1: P1, p2: P2) -> AndPattern<P1, P2> {
        AndPattern { p1, p2 }
    }

    /// Combine patterns with OR logic
    pub fn any<P1: NodePattern, P2: NodePattern>(p1: P1, p2: P2) -> OrPattern<P1, P2> {
        OrPattern { p1, p2 }
    }

    /// Negate a pattern
    pub fn not<P: NodePattern>(pattern: P) -> NotPattern<P> {
        NotPattern { pattern }
    }
}

struct KindMatcher<F>
where
    F: Fn(&NodeKind) -> bool,
{
    predicate: F,
}

impl<F> NodePattern for KindMatcher<F>
where
    F: Fn(&NodeKind) -> bool,
{
    fn matches(&self, node: &NodeRef<'_>) -> bool {
        (self.predicate)(node.kind())
    }
}

pub struct ChildOfPattern<P: NodePattern> {
    parent: P,
}

impl<P: NodePattern> NodePattern for ChildOfPattern<P> {
    fn matches(&self, node: &NodeRef<'_>) -> bool {
        node.parent().is_some_and(|parent| self.parent.matches(&parent))
    }
}

/// AND pattern combinator
pub struct AndPattern<P1: NodePattern, P2: NodePattern> {
    p1: P1,
    p2: P2,
}

impl<P1: NodePattern, P2: NodePattern> NodePattern for AndPattern<P1, P2> {
    fn matches(&self, node: &NodeRef<'_>) -> bool {
        self.p1.matches(node) && self.p2.matches(node)
    }
}

/// OR pattern combinator
pub struct OrPattern<P1: NodePattern, P2: NodePattern> {
    p1: P1,
    p2: P2,
}

impl<P1: NodePattern, P2: NodePattern> NodePattern for OrPattern<P1, P2> {
    fn matches(&self, node: &NodeRef<'_>) -> bool {
        self.p1.matches(node) || self.p2.matches(node)
    }
}

/// NOT pattern combinator
pub struct NotPattern<P: NodePattern> {
    pattern: P,
}

impl<P: NodePattern> NodePattern for NotPattern<P> {
    fn matches(&self, node: &NodeRef<'_>) -> bool {
        !self.pattern.matches(node)
    }
}

/// Subtree search that does not descend into nested executables or classes,
/// so a `return` inside a lambda is never attributed to the enclosing method.
pub struct NodeWalker;

impl NodeWalker {
    /// Find the first node in pre-order matching a pattern
    pub fn find_first<'a, P: NodePattern>(root: NodeRef<'a>, pattern: &P) -> Option<NodeRef<'a>> {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if pattern.matches(&node) {
                return Some(node);
            }
            stack.extend(Self::descend(node).into_iter().rev());
        }
        None
    }

    /// Find every node in pre-order matching a pattern
    pub fn find_all<'a, P: NodePattern>(root: NodeRef<'a>, pattern: &P) -> Vec<NodeRef<'a>> {
        let mut matches = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if pattern.matches(&node) {
                matches.push(node);
            }
            stack.extend(Self::descend(node).into_iter().rev());
        }
        matches
    }

    fn descend(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
        node.children()
            .filter(|child| !child.kind().is_executable() && !matches!(child.kind(), NodeKind::Class { .. }))
            .collect()
    }
}

/// `expr == null`, `null == expr`, `expr != null` or `null != expr`.
/// Returns the tested expression and the operator.
pub fn null_test<'a>(node: NodeRef<'a>) -> Option<(NodeRef<'a>, BinaryOp)> {
    let op = match node.kind() {
        NodeKind::BinaryOperator { op: op @ (BinaryOp::Equal | BinaryOp::NotEqual) } => *op,
        _ => return None,
    };
    let left = node.child(0)?;
    let right = node.child(1)?;
    match (left.kind().is_null_literal(), right.kind().is_null_literal()) {
        (false, true) => Some((left, op)),
        (true, false) => Some((right, op)),
        _ => None,
    }
}

/// Whether a `return` is reachable inside `node`, directly or through
/// nested control flow
pub fn reaches_return(node: NodeRef<'_>) -> bool {
    NodeWalker::find_first(node, &PatternMatcher::return_stmt()).is_some()
}

/// How a guarded expression is dereferenced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dereference {
    FieldRead(String),
    Invocation(String),
}

/// First field read or invocation inside `scope` whose receiver is
/// structurally the same expression as `expr`
pub fn find_dereference(scope: NodeRef<'_>, expr: &NodeRef<'_>) -> Option<Dereference> {
    let receiver_matches = |node: &NodeRef<'_>| node.child(0).is_some_and(|receiver| receiver.same_structure(expr));

    NodeWalker::find_all(scope, &PatternMatcher::kind(|kind| {
        matches!(kind, NodeKind::FieldRead { .. } | NodeKind::Invocation { .. })
    }))
    .into_iter()
    .filter(|node| receiver_matches(node))
    .find_map(|node| match node.kind() {
        NodeKind::FieldRead { field } => Some(Dereference::FieldRead(field.clone())),
        NodeKind::Invocation { signature } => Some(Dereference::Invocation(signature.clone())),
        _ => None,
    })
}

/// Like [`find_dereference`] but only over the siblings that follow `anchor`
/// in its parent
pub fn find_dereference_after(anchor: &NodeRef<'_>, expr: &NodeRef<'_>) -> Option<Dereference> {
    let parent = anchor.parent()?;
    let position = anchor.index_in_parent()?;
    parent
        .children()
        .skip(position + 1)
        .find_map(|sibling| find_dereference(sibling, expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstTree, Literal};

    #[test]
    fn test_null_test_either_side() {
        let mut tree = AstTree::new();
        let cmp = tree.add_root(NodeKind::BinaryOperator { op: BinaryOp::NotEqual });
        tree.add_child(cmp, NodeKind::Literal { value: Literal::Null });
        let var = tree.add_child(cmp, NodeKind::VariableRead { name: "x".to_string() });

        let (expr, op) = null_test(tree.node(cmp).unwrap()).unwrap();
        assert_eq!(expr.id(), var);
        assert_eq!(op, BinaryOp::NotEqual);
    }

    #[test]
    fn test_null_test_rejects_other_comparisons() {
        let mut tree = AstTree::new();
        let cmp = tree.add_root(NodeKind::BinaryOperator { op: BinaryOp::LessThan });
        tree.add_child(cmp, NodeKind::VariableRead { name: "x".to_string() });
        tree.add_child(cmp, NodeKind::Literal { value: Literal::Null });
        assert!(null_test(tree.node(cmp).unwrap()).is_none());
    }

    #[test]
    fn test_reaches_return_skips_lambdas() {
        let mut tree = AstTree::new();
        let block = tree.add_root(NodeKind::Block);
        let lambda = tree.add_child(block, NodeKind::Lambda { parameters: vec![] });
        tree.add_child(lambda, NodeKind::Return);
        assert!(!reaches_return(tree.node(block).unwrap()));

        let nested = tree.add_child(block, NodeKind::While);
        tree.add_child(nested, NodeKind::Return);
        assert!(reaches_return(tree.node(block).unwrap()));
    }

    #[test]
    fn test_combinators() {
        let mut tree = AstTree::new();
        let case = tree.add_root(NodeKind::Case);
        let brk = tree.add_child(case, NodeKind::Break);
        let node = tree.node(brk).unwrap();

        let in_case = PatternMatcher::all(
            PatternMatcher::break_stmt(),
            PatternMatcher::child_of(PatternMatcher::case_arm()),
        );
        assert!(in_case.matches(&node));
        assert!(!PatternMatcher::not(in_case).matches(&node));
        assert!(PatternMatcher::any(PatternMatcher::return_stmt(), PatternMatcher::break_stmt()).matches(&node));
    }
}
