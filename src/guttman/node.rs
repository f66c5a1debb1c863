use crate::arena::NodeId;
use rindex_types::rect::Rect;

/// A stored `(rectangle, payload)` association.
#[derive(Debug)]
pub(crate) struct LeafEntry<T> {
    pub rect: Rect,
    pub payload: T,
}

/// Node contents: leaves hold entries, internal nodes hold child ids.
#[derive(Debug)]
pub(crate) enum NodeKind<T> {
    Leaf(Vec<LeafEntry<T>>),
    Internal(Vec<NodeId>),
}

/// A tree node with its cached tight bounding rectangle.
///
/// `mbr` always equals the union of the children's rectangles; it is
/// refreshed after every structural mutation.
#[derive(Debug)]
pub(crate) struct Node<T> {
    pub parent: Option<NodeId>,
    pub mbr: Rect,
    pub kind: NodeKind<T>,
}

impl<T> Node<T> {
    pub fn leaf(entries: Vec<LeafEntry<T>>, mbr: Rect) -> Self {
        Self {
            parent: None,
            mbr,
            kind: NodeKind::Leaf(entries),
        }
    }

    pub fn internal(children: Vec<NodeId>, mbr: Rect) -> Self {
        Self {
            parent: None,
            mbr,
            kind: NodeKind::Internal(children),
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
