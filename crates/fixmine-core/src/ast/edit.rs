// Edit operations reported by a tree differencer between two revisions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{AstTree, NodeId, NodeRef};
use crate::source::SourceError;

/// The four primitive changes a tree diff reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditKind {
    Insert,
    Delete,
    Update,
    Move,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditKind::Insert => "insert",
            EditKind::Delete => "delete",
            EditKind::Update => "update",
            EditKind::Move => "move",
        };
        f.write_str(name)
    }
}

/// One edit, referring to nodes by id.
///
/// `Insert` points into the after-revision, `Delete` into the
/// before-revision; `Update` and `Move` carry the node on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditOperation {
    Insert { node: NodeId },
    Delete { node: NodeId },
    Update { before: NodeId, after: NodeId },
    Move { before: NodeId, after: NodeId },
}

impl EditOperation {
    pub fn kind(&self) -> EditKind {
        match self {
            EditOperation::Insert { .. } => EditKind::Insert,
            EditOperation::Delete { .. } => EditKind::Delete,
            EditOperation::Update { .. } => EditKind::Update,
            EditOperation::Move { .. } => EditKind::Move,
        }
    }

    pub fn before_node(&self) -> Option<NodeId> {
        match self {
            EditOperation::Delete { node } => Some(*node),
            EditOperation::Update { before, .. } | EditOperation::Move { before, .. } => Some(*before),
            EditOperation::Insert { .. } => None,
        }
    }

    pub fn after_node(&self) -> Option<NodeId> {
        match self {
            EditOperation::Insert { node } => Some(*node),
            EditOperation::Update { after, .. } | EditOperation::Move { after, .. } => Some(*after),
            EditOperation::Delete { .. } => None,
        }
    }
}

/// Both revisions of one compared file plus the edit script between them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    #[serde(default)]
    pub path: PathBuf,
    pub before: AstTree,
    pub after: AstTree,
    pub operations: Vec<EditOperation>,
}

impl FileDiff {
    pub fn new(path: impl Into<PathBuf>, before: AstTree, after: AstTree) -> Self {
        Self {
            path: path.into(),
            before,
            after,
            operations: Vec::new(),
        }
    }

    pub fn push(&mut self, operation: EditOperation) {
        self.operations.push(operation);
    }

    /// Reject trees with broken links and operations naming missing nodes
    pub fn validate(&self) -> Result<(), SourceError> {
        let malformed = |reason: String| SourceError::MalformedDiff {
            path: self.path.clone(),
            reason,
        };

        self.before.validate().map_err(|e| malformed(format!("before tree: {e}")))?;
        self.after.validate().map_err(|e| malformed(format!("after tree: {e}")))?;

        for (index, operation) in self.operations.iter().enumerate() {
            if let Some(id) = operation.before_node() {
                if !self.before.contains(id) {
                    return Err(malformed(format!("operation {index} names missing before-node {id}")));
                }
            }
            if let Some(id) = operation.after_node() {
                if !self.after.contains(id) {
                    return Err(malformed(format!("operation {index} names missing after-node {id}")));
                }
            }
        }
        Ok(())
    }

    /// Resolve every operation into a navigable [`Edit`], in script order.
    /// Operations naming missing nodes are skipped; call
    /// [`FileDiff::validate`] first to treat them as an error instead.
    pub fn edits(&self) -> impl Iterator<Item = Edit<'_>> + '_ {
        self.operations.iter().filter_map(move |operation| self.resolve(operation))
    }

    pub fn resolve(&self, operation: &EditOperation) -> Option<Edit<'_>> {
        let before = match operation.before_node() {
            Some(id) => Some(self.before.node(id)?),
            None => None,
        };
        let after = match operation.after_node() {
            Some(id) => Some(self.after.node(id)?),
            None => None,
        };
        Some(Edit {
            kind: operation.kind(),
            before,
            after,
        })
    }
}

/// An edit operation with its nodes resolved against both revisions
#[derive(Debug, Clone, Copy)]
pub struct Edit<'a> {
    pub kind: EditKind,
    pub before: Option<NodeRef<'a>>,
    pub after: Option<NodeRef<'a>>,
}

impl<'a> Edit<'a> {
    /// The node an insert added, or `None` for other kinds
    pub fn inserted(&self) -> Option<NodeRef<'a>> {
        match self.kind {
            EditKind::Insert => self.after,
            _ => None,
        }
    }

    /// The node a delete removed, or `None` for other kinds
    pub fn deleted(&self) -> Option<NodeRef<'a>> {
        match self.kind {
            EditKind::Delete => self.before,
            _ => None,
        }
    }

    /// Before and after node of an update or move
    pub fn pair(&self) -> Option<(NodeRef<'a>, NodeRef<'a>)> {
        match (self.kind, self.before, self.after) {
            (EditKind::Update | EditKind::Move, Some(before), Some(after)) => Some((before, after)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn test_resolve_insert_and_update() {
        let mut before = AstTree::new();
        let old = before.add_root(NodeKind::Block);
        let mut after = AstTree::new();
        let new = after.add_root(NodeKind::Block);
        let inserted = after.add_child(new, NodeKind::Break);

        let mut diff = FileDiff::new("A.java", before, after);
        diff.push(EditOperation::Insert { node: inserted });
        diff.push(EditOperation::Update { before: old, after: new });

        let edits: Vec<_> = diff.edits().collect();
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].kind, EditKind::Insert);
        assert_eq!(edits[0].inserted().unwrap().kind(), &NodeKind::Break);
        assert!(edits[0].before.is_none());
        assert!(edits[1].pair().is_some());
    }

    #[test]
    fn test_validate_rejects_missing_nodes() {
        let mut diff = FileDiff::new("B.java", AstTree::new(), AstTree::new());
        diff.push(EditOperation::Delete { node: NodeId(3) });

        let err = diff.validate().unwrap_err();
        assert!(err.to_string().contains("missing before-node"));
        assert_eq!(diff.edits().count(), 0);
    }
}
