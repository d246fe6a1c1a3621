// Typed AST shared by every stage of the miner.
// Trees are produced by an external differencer, one arena per revision,
// and are read-only to classification.

pub mod edit;
pub use edit::{Edit, EditKind, EditOperation, FileDiff};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a node inside one revision's [`AstTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Binary operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // Comparison
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equal,
    NotEqual,

    // Logical
    And,
    Or,

    // Bitwise and shifts
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,

    InstanceOf,
}

impl BinaryOp {
    /// `+ - * / %`
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo
        )
    }

    /// `< <= > >= == !=`
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::LessThan
                | BinaryOp::LessEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterEqual
                | BinaryOp::Equal
                | BinaryOp::NotEqual
        )
    }

    /// The comparison that holds exactly when this one does not
    pub fn negation(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::LessThan => Some(BinaryOp::GreaterEqual),
            BinaryOp::GreaterEqual => Some(BinaryOp::LessThan),
            BinaryOp::LessEqual => Some(BinaryOp::GreaterThan),
            BinaryOp::GreaterThan => Some(BinaryOp::LessEqual),
            BinaryOp::Equal => Some(BinaryOp::NotEqual),
            BinaryOp::NotEqual => Some(BinaryOp::Equal),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::LessThan => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::UnsignedShiftRight => ">>>",
            BinaryOp::InstanceOf => "instanceof",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Negate,
    Complement,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

/// Typed literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Boolean(bool),
    String(String),
    Null,
}

impl Literal {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Literal::Byte(_)
                | Literal::Short(_)
                | Literal::Int(_)
                | Literal::Long(_)
                | Literal::Float(_)
                | Literal::Double(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Byte(n) => write!(f, "(byte){n}"),
            Literal::Short(n) => write!(f, "(short){n}"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Long(n) => write!(f, "{n}L"),
            Literal::Float(n) => write!(f, "{n}f"),
            Literal::Double(n) => write!(f, "{n}d"),
            Literal::Char(c) => write!(f, "'{c}'"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::String(s) => write!(f, "\"{s}\""),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// Node kinds with their kind-specific attributes.
///
/// Positional children carry the rest of the structure:
/// - `If`: condition, then-branch, optional else-branch
/// - `Switch`: selector, then one `Case` per arm
/// - `BinaryOperator`: left, right
/// - `FieldRead` / `FieldWrite`: receiver
/// - `Invocation`: receiver, then arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // Declarations
    CompilationUnit,
    Class { name: String },
    Method { name: String, parameters: Vec<String> },
    Constructor { parameters: Vec<String> },
    Lambda { parameters: Vec<String> },
    LocalVariable { name: String },

    // Statements
    Block,
    If,
    Switch,
    Case,
    While,
    For,
    Return,
    Break,
    Continue,
    Throw,
    Assignment,

    // Expressions
    BinaryOperator { op: BinaryOp },
    UnaryOperator { op: UnaryOp },
    Literal { value: Literal },
    VariableRead { name: String },
    FieldRead { field: String },
    FieldWrite { field: String },
    Invocation { signature: String },
    ThisAccess,
    TypeAccess { name: String },

    // Anything the differencer reports that the miner does not inspect
    Other { label: String },
}

impl NodeKind {
    /// Methods, constructors and lambdas
    pub fn is_executable(&self) -> bool {
        matches!(
            self,
            NodeKind::Method { .. } | NodeKind::Constructor { .. } | NodeKind::Lambda { .. }
        )
    }

    /// Parameter names of an executable, empty for anything else
    pub fn parameters(&self) -> &[String] {
        match self {
            NodeKind::Method { parameters, .. }
            | NodeKind::Constructor { parameters }
            | NodeKind::Lambda { parameters } => parameters,
            _ => &[],
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, NodeKind::Literal { value: Literal::Null })
    }

    /// Statements that leave the enclosing executable
    pub fn is_exit(&self) -> bool {
        matches!(self, NodeKind::Return | NodeKind::Throw)
    }

    /// Short label used in logs
    pub fn label(&self) -> String {
        match self {
            NodeKind::Class { name } => format!("class {name}"),
            NodeKind::Method { name, .. } => format!("method {name}"),
            NodeKind::LocalVariable { name } => format!("local {name}"),
            NodeKind::BinaryOperator { op } => format!("binop {op}"),
            NodeKind::UnaryOperator { op } => format!("unop {op:?}"),
            NodeKind::Literal { value } => format!("literal {value}"),
            NodeKind::VariableRead { name } => format!("read {name}"),
            NodeKind::FieldRead { field } => format!("field-read {field}"),
            NodeKind::FieldWrite { field } => format!("field-write {field}"),
            NodeKind::Invocation { signature } => format!("call {signature}"),
            NodeKind::TypeAccess { name } => format!("type {name}"),
            NodeKind::Other { label } => label.clone(),
            other => format!("{other:?}"),
        }
    }
}

/// One node of the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

/// Arena holding every node of one file revision.
///
/// Parent and child links are ids into the same arena, so the tree can be
/// navigated in both directions without shared ownership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AstTree {
    nodes: Vec<Node>,
}

impl AstTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parentless node
    pub fn add_root(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append a node as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.contains(id).then_some(NodeRef { tree: self, id })
    }

    /// Check that every link points inside the arena, that parent and child
    /// links agree, and that the links form a forest without cycles.
    /// Deserialized trees are not trusted otherwise.
    pub fn validate(&self) -> Result<(), String> {
        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index as u32);
            if let Some(parent) = node.parent {
                if !self.contains(parent) {
                    return Err(format!("{id} has dangling parent {parent}"));
                }
                if !self.nodes[parent.index()].children.contains(&id) {
                    return Err(format!("{id} is not listed among the children of {parent}"));
                }
            }
            for child in &node.children {
                if !self.contains(*child) {
                    return Err(format!("{id} has dangling child {child}"));
                }
                if self.nodes[child.index()].parent != Some(id) {
                    return Err(format!("{child} does not point back to parent {id}"));
                }
            }
        }

        // Every node must be reached exactly once from the parentless roots;
        // cycles are unreachable from any root.
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = (0..self.nodes.len())
            .filter(|&index| self.nodes[index].parent.is_none())
            .map(|index| NodeId(index as u32))
            .collect();
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                return Err(format!("{id} is listed more than once"));
            }
            stack.extend(self.nodes[id.index()].children.iter().rev().copied());
        }
        match seen.iter().position(|reached| !reached) {
            Some(index) => Err(format!("{} is part of a cycle", NodeId(index as u32))),
            None => Ok(()),
        }
    }
}

/// Borrowed view of one node together with its arena
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a AstTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a AstTree {
        self.tree
    }

    fn data(&self) -> &'a Node {
        &self.tree.nodes[self.id.index()]
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.data().kind
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.and_then(|id| self.tree.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .filter_map(move |id| tree.node(*id))
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        self.data()
            .children
            .get(index)
            .and_then(|id| self.tree.node(*id))
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// Position of this node among its parent's children
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.data().parent?;
        self.tree.nodes[parent.index()]
            .children
            .iter()
            .position(|id| *id == self.id)
    }

    /// Parent, grandparent, ... up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// Pre-order traversal of the subtree rooted here, including this node
    pub fn walk(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Nearest method, constructor or lambda around this node
    pub fn enclosing_executable(&self) -> Option<NodeRef<'a>> {
        self.ancestors().find(|node| node.kind().is_executable())
    }

    /// Structural equality of two subtrees: same kinds, same attributes,
    /// same children in the same order. The trees may differ.
    pub fn same_structure(&self, other: &NodeRef<'_>) -> bool {
        self.kind() == other.kind()
            && self.child_count() == other.child_count()
            && self
                .children()
                .zip(other.children())
                .all(|(a, b)| a.same_structure(&b))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.kind().label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method_with_call() -> (AstTree, NodeId, NodeId) {
        let mut tree = AstTree::new();
        let method = tree.add_root(NodeKind::Method {
            name: "run".to_string(),
            parameters: vec!["input".to_string()],
        });
        let body = tree.add_child(method, NodeKind::Block);
        let call = tree.add_child(body, NodeKind::Invocation {
            signature: "trim()".to_string(),
        });
        let receiver = tree.add_child(call, NodeKind::VariableRead {
            name: "input".to_string(),
        });
        (tree, call, receiver)
    }

    #[test]
    fn test_navigation() {
        let (tree, call, receiver) = method_with_call();
        let receiver = tree.node(receiver).unwrap();

        assert_eq!(receiver.parent().unwrap().id(), call);
        assert_eq!(receiver.index_in_parent(), Some(0));
        assert_eq!(receiver.ancestors().count(), 3);

        let executable = receiver.enclosing_executable().unwrap();
        assert_eq!(executable.kind().parameters(), &["input".to_string()]);
    }

    #[test]
    fn test_walk_is_preorder() {
        let (tree, _, _) = method_with_call();
        let root = tree.node(NodeId(0)).unwrap();
        let ids: Vec<_> = root.walk().iter().map(|n| n.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_same_structure_across_trees() {
        let (left, call_left, _) = method_with_call();
        let (right, call_right, receiver_right) = method_with_call();

        let a = left.node(call_left).unwrap();
        let b = right.node(call_right).unwrap();
        assert!(a.same_structure(&b));
        assert!(!a.same_structure(&right.node(receiver_right).unwrap()));
    }

    #[test]
    fn test_validate_rejects_dangling_links() {
        let (mut tree, _, _) = method_with_call();
        assert!(tree.validate().is_ok());

        tree.nodes[1].children.push(NodeId(99));
        assert!(tree.validate().is_err());

        // 0: If { parent 2 } <-> 2: Block { parent 0 }, no root reaches them
        let mut cyclic = AstTree::new();
        let guard = cyclic.add_root(NodeKind::If);
        let cmp = cyclic.add_child(guard, NodeKind::BinaryOperator { op: BinaryOp::Equal });
        let block = cyclic.add_child(guard, NodeKind::Block);
        cyclic.add_child(cmp, NodeKind::VariableRead { name: "x".to_string() });
        cyclic.add_child(cmp, NodeKind::Literal { value: Literal::Null });
        let ret = cyclic.add_child(block, NodeKind::Return);
        assert!(cyclic.validate().is_ok());
        cyclic.nodes[guard.index()].parent = Some(block);
        cyclic.nodes[block.index()].children = vec![ret, guard];
        let err = cyclic.validate().unwrap_err();
        assert!(err.contains("cycle"), "{err}");

        let mut looped = AstTree::new();
        let root = looped.add_root(NodeKind::Block);
        looped.nodes[root.index()].parent = Some(root);
        looped.nodes[root.index()].children.push(root);
        assert!(looped.validate().is_err());

        let mut doubled = AstTree::new();
        let root = doubled.add_root(NodeKind::Block);
        let leaf = doubled.add_child(root, NodeKind::Return);
        doubled.nodes[root.index()].children.push(leaf);
        assert!(doubled.validate().is_err());
    }

    #[test]
    fn test_negation_pairs() {
        assert_eq!(BinaryOp::LessThan.negation(), Some(BinaryOp::GreaterEqual));
        assert_eq!(BinaryOp::GreaterThan.negation(), Some(BinaryOp::LessEqual));
        assert_eq!(BinaryOp::Equal.negation(), Some(BinaryOp::NotEqual));
        assert_eq!(BinaryOp::Add.negation(), None);
    }
}
