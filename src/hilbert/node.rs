use crate::arena::NodeId;
use rindex_types::grid::GridRect;

/// A stored `(rectangle, payload)` association keyed by the Hilbert
/// index of the rectangle's center.
#[derive(Debug)]
pub(crate) struct LeafEntry<T> {
    pub rect: GridRect,
    pub key: i64,
    pub payload: T,
}

/// Node contents: leaf entries sorted by key, or child ids sorted by
/// the children's LHV.
#[derive(Debug)]
pub(crate) enum NodeKind<T> {
    Leaf(Vec<LeafEntry<T>>),
    Internal(Vec<NodeId>),
}

/// A tree node.
///
/// `lhv` is the largest Hilbert value among the leaf entries of the
/// subtree; `mbr` is the tight cover of the children. `prev`/`next`
/// link nodes sharing the same parent, in child-list order; both are
/// `None` at the ends of a chain.
#[derive(Debug)]
pub(crate) struct Node<T> {
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub mbr: Option<GridRect>,
    pub lhv: i64,
    pub kind: NodeKind<T>,
}

/// A pooled entry during sibling redistribution.
#[derive(Debug)]
pub(crate) enum Entry<T> {
    Leaf(LeafEntry<T>),
    Child(NodeId),
}

impl<T> Node<T> {
    pub fn leaf() -> Self {
        Self {
            parent: None,
            prev: None,
            next: None,
            mbr: None,
            lhv: i64::MIN,
            kind: NodeKind::Leaf(Vec::new()),
        }
    }

    pub fn internal() -> Self {
        Self {
            parent: None,
            prev: None,
            next: None,
            mbr: None,
            lhv: i64::MIN,
            kind: NodeKind::Internal(Vec::new()),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Number of direct entries (leaf entries or children).
    pub fn count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(entries) => entries.len(),
            NodeKind::Internal(children) => children.len(),
        }
    }
}
