use super::node::{Entry, LeafEntry, Node, NodeKind};
use crate::arena::{Arena, NodeId};
use crate::curve::HilbertCurve;
use rindex_types::error::{IndexError, Result};
use rindex_types::grid::GridRect;
use rustc_hash::FxHashSet;

/// Cooperation order `s` of the split policy: an overflowing node pools
/// entries with `s - 1` siblings, giving the classic 2-to-3 split.
const COOPERATING_SIBLINGS: usize = 2;

/// An R-tree ordered by the Hilbert index of entry centroids, after
/// Kamel and Faloutsos.
///
/// Leaf entries are kept sorted by their Hilbert key and children by
/// their largest Hilbert value (LHV). Overflowing and underflowing
/// nodes first redistribute entries among cooperating siblings, so the
/// tree splits and merges far less often than a Guttman tree.
///
/// # Examples
///
/// ```
/// use rindex::{GridRect, HilbertTree};
///
/// let mut tree = HilbertTree::new(2, 5, 2, 8)?;
/// tree.insert(GridRect::new(vec![0, 0], vec![10, 10])?, "a")?;
/// tree.insert(GridRect::new(vec![20, 20], vec![30, 30])?, "b")?;
///
/// let hits = tree.search(&GridRect::new(vec![5, 5], vec![25, 25])?);
/// assert_eq!(hits.len(), 2);
/// # Ok::<(), rindex::IndexError>(())
/// ```
#[derive(Debug)]
pub struct HilbertTree<T> {
    arena: Arena<Node<T>>,
    root: Option<NodeId>,
    min_entries: usize,
    max_entries: usize,
    curve: HilbertCurve,
    len: usize,
}

impl<T> HilbertTree<T> {
    /// Create an empty tree over a `dims`-dimensional grid with `bits`
    /// bits per coordinate and node fill bounds
    /// `[min_entries, max_entries]`.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` unless `0 < min_entries <= max_entries / 2`,
    /// `dims >= 1`, `bits >= 1` and `bits * dims <= 63`.
    pub fn new(min_entries: usize, max_entries: usize, dims: usize, bits: usize) -> Result<Self> {
        if min_entries == 0 || min_entries > max_entries / 2 {
            return Err(IndexError::InvalidParameters(format!(
                "the minimum number of entries in a node must be in 1..={}",
                max_entries / 2
            )));
        }
        if bits > 63 {
            return Err(IndexError::InvalidParameters(format!(
                "bits per dimension must be at most 63, got {bits}"
            )));
        }
        let curve = HilbertCurve::new(bits as u32, dims)?;
        Ok(Self {
            arena: Arena::new(),
            root: None,
            min_entries,
            max_entries,
            curve,
            len: 0,
        })
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The curve used to key entries.
    pub fn curve(&self) -> &HilbertCurve {
        &self.curve
    }

    /// Insert a `(rectangle, payload)` association.
    ///
    /// The entry is keyed by the Hilbert index of the rectangle's
    /// center; center coordinates must lie within the curve's grid.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the rectangle's dimension differs from
    /// the tree's; the tree is left unchanged.
    pub fn insert(&mut self, rect: GridRect, payload: T) -> Result<()> {
        if rect.dims() != self.curve.dims() {
            return Err(IndexError::DimensionMismatch {
                expected: self.curve.dims(),
                actual: rect.dims(),
            });
        }
        let key = self.curve.index(&rect.center());
        let entry = LeafEntry { rect, key, payload };

        let root = match self.root {
            Some(root) => root,
            None => {
                let id = self.arena.alloc(Node::leaf());
                self.root = Some(id);
                id
            }
        };
        let leaf = self.choose_leaf(root, key);

        let mut siblings = Vec::new();
        let new_node = if self.arena[leaf].count() < self.max_entries {
            if let NodeKind::Leaf(entries) = &mut self.arena[leaf].kind {
                let pos = entries.partition_point(|e| e.key <= entry.key);
                entries.insert(pos, entry);
            }
            self.refresh_node(leaf);
            siblings.push(leaf);
            None
        } else {
            self.handle_overflow(leaf, Entry::Leaf(entry), &mut siblings)
        };
        self.adjust_tree(leaf, new_node, siblings);
        self.len += 1;
        Ok(())
    }

    /// Collect every payload whose rectangle intersects `query`.
    ///
    /// Touching on a face counts as an intersection. Returns an empty
    /// vector on an empty tree or a dimension mismatch; no particular
    /// order is guaranteed.
    pub fn search(&self, query: &GridRect) -> Vec<&T> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };
        if query.dims() != self.curve.dims() {
            log::warn!(
                "Rejecting search with mismatched dimensions: expected {}, got {}",
                self.curve.dims(),
                query.dims()
            );
            return out;
        }

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            match &node.mbr {
                Some(mbr) if mbr.intersects(query) => {}
                _ => continue,
            }
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    for entry in entries {
                        if entry.rect.intersects(query) {
                            out.push(&entry.payload);
                        }
                    }
                }
                NodeKind::Internal(children) => stack.extend_from_slice(children),
            }
        }
        out
    }

    /// Remove one entry whose rectangle equals `rect` exactly.
    ///
    /// Duplicates are removed one per call; removing an absent rectangle
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the rectangle's dimension differs from
    /// the tree's.
    pub fn remove(&mut self, rect: &GridRect) -> Result<()> {
        if rect.dims() != self.curve.dims() {
            return Err(IndexError::DimensionMismatch {
                expected: self.curve.dims(),
                actual: rect.dims(),
            });
        }
        let Some(root) = self.root else {
            return Ok(());
        };
        let Some(leaf) = self.exact_search(root, rect) else {
            return Ok(());
        };

        if let NodeKind::Leaf(entries) = &mut self.arena[leaf].kind {
            if let Some(pos) = entries.iter().position(|e| e.rect == *rect) {
                entries.remove(pos);
                self.len -= 1;
            } else {
                return Ok(());
            }
        }
        self.refresh_node(leaf);

        let mut siblings = Vec::new();
        let mut deleted = None;
        if self.root != Some(leaf) && self.arena[leaf].count() < self.min_entries {
            deleted = self.handle_underflow(leaf, &mut siblings);
        } else {
            siblings.push(leaf);
        }
        self.condense_tree(leaf, deleted, siblings);
        Ok(())
    }

    /// Descend to the leaf holding the insertion key: at each level take
    /// the first child whose LHV is at least `key`, or the last child
    /// when every LHV is smaller.
    fn choose_leaf(&self, root: NodeId, key: i64) -> NodeId {
        let mut current = root;
        loop {
            let children = match &self.arena[current].kind {
                NodeKind::Leaf(_) => return current,
                NodeKind::Internal(children) => children,
            };
            let mut chosen = None;
            for &child in children {
                if self.arena[child].lhv >= key {
                    chosen = Some(child);
                    break;
                }
            }
            current = match chosen.or_else(|| children.last().copied()) {
                Some(child) => child,
                None => return current,
            };
        }
    }

    /// Containment-driven descent to the leaf holding an exact match.
    fn exact_search(&self, node: NodeId, rect: &GridRect) -> Option<NodeId> {
        match &self.arena[node].kind {
            NodeKind::Leaf(entries) => entries.iter().any(|e| e.rect == *rect).then_some(node),
            NodeKind::Internal(children) => {
                for &child in children {
                    let covers = match &self.arena[child].mbr {
                        Some(mbr) => mbr.contains(rect),
                        None => false,
                    };
                    if covers {
                        if let Some(found) = self.exact_search(child, rect) {
                            return Some(found);
                        }
                    }
                }
                None
            }
        }
    }

    /// Resolve an overfull node by pooling its entries with the next
    /// cooperating sibling and the incoming entry.
    ///
    /// When the pool still fits the gathered nodes they are refilled
    /// evenly and no node is created. Otherwise a new sibling is linked
    /// into the chain just before `target` and the pool spreads over
    /// `s + 1` nodes. Returns the new node, not yet attached to a
    /// parent; `out_siblings` receives every refilled node.
    fn handle_overflow(
        &mut self,
        target: NodeId,
        entry: Entry<T>,
        out_siblings: &mut Vec<NodeId>,
    ) -> Option<NodeId> {
        let is_leaf = self.arena[target].is_leaf();
        let group = self.collect_next_siblings(target, COOPERATING_SIBLINGS);

        let key = match &entry {
            Entry::Leaf(leaf) => leaf.key,
            Entry::Child(child) => self.arena[*child].lhv,
        };
        let mut pool = vec![(key, entry)];
        for &node in &group {
            self.drain_entries(node, &mut pool);
        }
        pool.sort_by_key(|(key, _)| *key);

        let mut nodes = group;
        let new_node = if pool.len() > nodes.len() * self.max_entries {
            let id = self
                .arena
                .alloc(if is_leaf { Node::leaf() } else { Node::internal() });
            let prev = self.arena[target].prev;
            self.arena[id].prev = prev;
            self.arena[id].next = Some(target);
            if let Some(prev) = prev {
                self.arena[prev].next = Some(id);
            }
            self.arena[target].prev = Some(id);
            nodes.insert(0, id);
            Some(id)
        } else {
            None
        };

        self.redistribute(pool, &nodes);
        out_siblings.extend_from_slice(&nodes);
        new_node
    }

    /// Resolve an underfull node by pooling its entries with up to `s`
    /// next siblings (falling back to previous siblings at the end of a
    /// chain).
    ///
    /// When the pool cannot fill every gathered node to the minimum, the
    /// leftmost node of the group is emptied, unlinked from the chain
    /// and returned for removal by `condense_tree`.
    fn handle_underflow(&mut self, target: NodeId, out_siblings: &mut Vec<NodeId>) -> Option<NodeId> {
        let mut group = self.collect_cooperating(target, COOPERATING_SIBLINGS + 1);

        let mut pool = Vec::new();
        for &node in &group {
            self.drain_entries(node, &mut pool);
        }
        pool.sort_by_key(|(key, _)| *key);

        let mut removed = None;
        if group.len() > 1
            && pool.len() < group.len() * self.min_entries
            && self.arena[target].parent.is_some()
        {
            let dropped = group.remove(0);
            let prev = self.arena[dropped].prev;
            let next = self.arena[dropped].next;
            if let Some(prev) = prev {
                self.arena[prev].next = next;
            }
            if let Some(next) = next {
                self.arena[next].prev = prev;
            }
            self.arena[dropped].prev = None;
            self.arena[dropped].next = None;
            log::debug!("underflow merged a node into its siblings");
            removed = Some(dropped);
        }

        self.redistribute(pool, &group);
        out_siblings.extend_from_slice(&group);
        removed
    }

    /// Propagate an insertion upward: install new nodes into parents,
    /// cascading overflow, and refresh the MBR, LHV and child order of
    /// every touched ancestor. Grows a new root when the old one splits.
    fn adjust_tree(&mut self, mut node: NodeId, mut new_node: Option<NodeId>, mut siblings: Vec<NodeId>) {
        loop {
            let mut parents = FxHashSet::default();
            for &sibling in &siblings {
                if let Some(parent) = self.arena[sibling].parent {
                    parents.insert(parent);
                }
            }
            for &parent in &parents {
                self.refresh_parent(parent);
            }

            let parent = self.arena[node].parent;
            match parent {
                None => {
                    if let Some(sibling) = new_node {
                        let new_root = self.arena.alloc(Node::internal());
                        self.insert_child(new_root, node);
                        self.insert_child(new_root, sibling);
                        self.refresh_node(new_root);
                        self.root = Some(new_root);
                        log::debug!("root split; tree height increased");
                    } else {
                        self.refresh_parent(node);
                    }
                    return;
                }
                Some(parent) => {
                    let mut next_siblings = Vec::new();
                    let mut propagated = None;
                    if let Some(sibling) = new_node {
                        if self.arena[parent].count() < self.max_entries {
                            self.insert_child(parent, sibling);
                            self.refresh_node(parent);
                            next_siblings.push(parent);
                        } else {
                            propagated =
                                self.handle_overflow(parent, Entry::Child(sibling), &mut next_siblings);
                        }
                    } else {
                        next_siblings.push(parent);
                    }
                    node = parent;
                    new_node = propagated;
                    siblings = next_siblings;
                }
            }
        }
    }

    /// Propagate a deletion upward: remove emptied nodes from their
    /// parents, cascading underflow, and refresh the MBR, LHV and child
    /// order of every touched ancestor. Shrinks the root at the top.
    fn condense_tree(&mut self, mut node: NodeId, mut deleted: Option<NodeId>, mut siblings: Vec<NodeId>) {
        loop {
            let parent = self.arena[node].parent;
            match parent {
                None => {
                    self.refresh_parent(node);
                    self.collapse_root();
                    return;
                }
                Some(parent) => {
                    let mut next_siblings = Vec::new();
                    let mut next_deleted = None;
                    if let Some(dead) = deleted {
                        if let Some(dead_parent) = self.arena[dead].parent {
                            self.remove_child(dead_parent, dead);
                            let _ = self.arena.free(dead);
                            self.refresh_parent(dead_parent);
                            if self.root != Some(dead_parent)
                                && self.arena[dead_parent].count() < self.min_entries
                            {
                                next_deleted =
                                    self.handle_underflow(dead_parent, &mut next_siblings);
                            } else {
                                next_siblings.push(dead_parent);
                            }
                        }
                    }
                    next_siblings.push(parent);

                    let mut parents = FxHashSet::default();
                    for &sibling in &siblings {
                        if let Some(p) = self.arena[sibling].parent {
                            parents.insert(p);
                        }
                    }
                    for &p in &parents {
                        self.refresh_parent(p);
                    }

                    node = parent;
                    deleted = next_deleted;
                    siblings = next_siblings;
                }
            }
        }
    }

    /// Shrink the root: a single-child internal root pulls its child up,
    /// an empty root tears the tree down.
    fn collapse_root(&mut self) {
        while let Some(root) = self.root {
            enum Action {
                Promote(NodeId),
                TearDown,
                Done,
            }
            let action = match &self.arena[root].kind {
                NodeKind::Internal(children) if children.len() == 1 => Action::Promote(children[0]),
                NodeKind::Internal(children) if children.is_empty() => Action::TearDown,
                NodeKind::Leaf(entries) if entries.is_empty() => Action::TearDown,
                _ => Action::Done,
            };
            match action {
                Action::Promote(child) => {
                    let _ = self.arena.free(root);
                    let node = &mut self.arena[child];
                    node.parent = None;
                    node.prev = None;
                    node.next = None;
                    self.root = Some(child);
                    log::debug!("root collapsed; tree height decreased");
                }
                Action::TearDown => {
                    let _ = self.arena.free(root);
                    self.root = None;
                }
                Action::Done => return,
            }
        }
    }

    /// `target` plus up to `want - 1` next siblings, in chain order.
    fn collect_next_siblings(&self, target: NodeId, want: usize) -> Vec<NodeId> {
        let mut group = vec![target];
        let mut cursor = self.arena[target].next;
        while group.len() < want {
            match cursor {
                Some(node) => {
                    group.push(node);
                    cursor = self.arena[node].next;
                }
                None => break,
            }
        }
        group
    }

    /// Like [`collect_next_siblings`](Self::collect_next_siblings), but
    /// tops the group up with previous siblings when the chain ends.
    fn collect_cooperating(&self, target: NodeId, want: usize) -> Vec<NodeId> {
        let mut group = self.collect_next_siblings(target, want);
        let mut cursor = self.arena[target].prev;
        while group.len() < want {
            match cursor {
                Some(node) => {
                    group.insert(0, node);
                    cursor = self.arena[node].prev;
                }
                None => break,
            }
        }
        group
    }

    /// Move a node's entries into `pool`, leaving the node empty.
    fn drain_entries(&mut self, node: NodeId, pool: &mut Vec<(i64, Entry<T>)>) {
        enum Taken<T> {
            Leaves(Vec<LeafEntry<T>>),
            Children(Vec<NodeId>),
        }
        let taken = match &mut self.arena[node].kind {
            NodeKind::Leaf(entries) => Taken::Leaves(std::mem::take(entries)),
            NodeKind::Internal(children) => Taken::Children(std::mem::take(children)),
        };
        self.arena[node].lhv = i64::MIN;
        self.arena[node].mbr = None;
        match taken {
            Taken::Leaves(entries) => {
                pool.extend(entries.into_iter().map(|e| (e.key, Entry::Leaf(e))));
            }
            Taken::Children(children) => {
                for child in children {
                    pool.push((self.arena[child].lhv, Entry::Child(child)));
                }
            }
        }
    }

    /// Spread a key-sorted pool evenly over `nodes` in chain order,
    /// then refresh each node and rebuild its children's sibling links.
    fn redistribute(&mut self, pool: Vec<(i64, Entry<T>)>, nodes: &[NodeId]) {
        let base = pool.len() / nodes.len();
        let extra = pool.len() % nodes.len();
        let mut entries = pool.into_iter();

        for (slot, &node) in nodes.iter().enumerate() {
            let share = base + usize::from(slot < extra);
            for _ in 0..share {
                let Some((_, entry)) = entries.next() else {
                    break;
                };
                match entry {
                    Entry::Leaf(leaf) => {
                        if let NodeKind::Leaf(list) = &mut self.arena[node].kind {
                            list.push(leaf);
                        }
                    }
                    Entry::Child(child) => {
                        self.arena[child].parent = Some(node);
                        if let NodeKind::Internal(children) = &mut self.arena[node].kind {
                            children.push(child);
                        }
                    }
                }
            }
            self.refresh_node(node);
        }
        for &node in nodes {
            self.relink_children(node);
        }
    }

    /// Recompute a node's LHV and tight MBR from its entries.
    fn refresh_node(&mut self, node: NodeId) {
        let (lhv, mbr) = match &self.arena[node].kind {
            NodeKind::Leaf(entries) => {
                let lhv = entries.iter().map(|e| e.key).max();
                let mut mbr: Option<GridRect> = None;
                for entry in entries {
                    match &mut mbr {
                        None => mbr = Some(entry.rect.clone()),
                        Some(m) => m.expand_to_include(&entry.rect),
                    }
                }
                (lhv, mbr)
            }
            NodeKind::Internal(children) => {
                let mut lhv = None;
                let mut mbr: Option<GridRect> = None;
                for &child in children {
                    let child_lhv = self.arena[child].lhv;
                    lhv = Some(lhv.map_or(child_lhv, |x: i64| x.max(child_lhv)));
                    if let Some(child_mbr) = &self.arena[child].mbr {
                        match &mut mbr {
                            None => mbr = Some(child_mbr.clone()),
                            Some(m) => m.expand_to_include(child_mbr),
                        }
                    }
                }
                (lhv, mbr)
            }
        };
        self.arena[node].lhv = lhv.unwrap_or(i64::MIN);
        self.arena[node].mbr = mbr;
    }

    /// Restore a parent's sorted child order, sibling links, MBR and
    /// LHV after its children changed.
    fn refresh_parent(&mut self, parent: NodeId) {
        self.reorder_children(parent);
        self.refresh_node(parent);
    }

    /// Sort a node's children by LHV and rebuild their sibling chain.
    fn reorder_children(&mut self, parent: NodeId) {
        let mut children = match &self.arena[parent].kind {
            NodeKind::Internal(children) => children.clone(),
            NodeKind::Leaf(_) => return,
        };
        children.sort_by_key(|&child| self.arena[child].lhv);
        if let NodeKind::Internal(slot) = &mut self.arena[parent].kind {
            *slot = children;
        }
        self.relink_children(parent);
    }

    /// Rebuild the prev/next links of a node's children from the child
    /// list. Chains never cross parents.
    fn relink_children(&mut self, parent: NodeId) {
        let children = match &self.arena[parent].kind {
            NodeKind::Internal(children) => children.clone(),
            NodeKind::Leaf(_) => return,
        };
        let mut prev: Option<NodeId> = None;
        for &child in &children {
            self.arena[child].prev = prev;
            self.arena[child].next = None;
            if let Some(prev) = prev {
                self.arena[prev].next = Some(child);
            }
            prev = Some(child);
        }
    }

    /// Insert `child` into `parent`'s child list at its LHV-sorted
    /// position and rebuild the sibling chain.
    fn insert_child(&mut self, parent: NodeId, child: NodeId) {
        let child_lhv = self.arena[child].lhv;
        let pos = match &self.arena[parent].kind {
            NodeKind::Internal(children) => {
                children.partition_point(|&c| self.arena[c].lhv <= child_lhv)
            }
            NodeKind::Leaf(_) => 0,
        };
        self.arena[child].parent = Some(parent);
        if let NodeKind::Internal(children) = &mut self.arena[parent].kind {
            children.insert(pos, child);
        }
        self.relink_children(parent);
    }

    /// Remove `child` from `parent`'s child list and rebuild the chain.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if let NodeKind::Internal(children) = &mut self.arena[parent].kind {
            children.retain(|&c| c != child);
        }
        let node = &mut self.arena[child];
        node.parent = None;
        node.prev = None;
        node.next = None;
        self.relink_children(parent);
    }
}

#[cfg(test)]
impl<T> HilbertTree<T> {
    /// Assert the structural invariants of the whole tree.
    fn check_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0);
            return;
        };
        assert!(self.arena[root].parent.is_none());
        let mut entries = 0;
        self.check_node(root, true, &mut entries);
        assert_eq!(entries, self.len);
    }

    fn check_node(&self, id: NodeId, is_root: bool, entries: &mut usize) -> usize {
        let node = &self.arena[id];
        match &node.kind {
            NodeKind::Leaf(leaf_entries) => {
                if is_root {
                    assert!(!leaf_entries.is_empty());
                }
                assert!(leaf_entries.len() <= self.max_entries);
                assert!(leaf_entries.windows(2).all(|w| w[0].key <= w[1].key));

                let lhv = leaf_entries.iter().map(|e| e.key).max();
                assert_eq!(node.lhv, lhv.unwrap_or(i64::MIN));

                let mut union: Option<GridRect> = None;
                for entry in leaf_entries {
                    match &mut union {
                        None => union = Some(entry.rect.clone()),
                        Some(m) => m.expand_to_include(&entry.rect),
                    }
                }
                assert_eq!(node.mbr, union);
                *entries += leaf_entries.len();
                0
            }
            NodeKind::Internal(children) => {
                assert!(!children.is_empty());
                assert!(children.len() <= self.max_entries);
                if is_root {
                    assert!(children.len() >= 2);
                }
                assert!(children
                    .windows(2)
                    .all(|w| self.arena[w[0]].lhv <= self.arena[w[1]].lhv));

                let mut union: Option<GridRect> = None;
                let mut lhv = i64::MIN;
                let mut depth = None;
                for (slot, &child) in children.iter().enumerate() {
                    let child_node = &self.arena[child];
                    assert_eq!(child_node.parent, Some(id));

                    let expected_prev = if slot > 0 { Some(children[slot - 1]) } else { None };
                    let expected_next = children.get(slot + 1).copied();
                    assert_eq!(child_node.prev, expected_prev);
                    assert_eq!(child_node.next, expected_next);

                    lhv = lhv.max(child_node.lhv);
                    if let Some(child_mbr) = &child_node.mbr {
                        match &mut union {
                            None => union = Some(child_mbr.clone()),
                            Some(m) => m.expand_to_include(child_mbr),
                        }
                    }
                    let child_height = self.check_node(child, false, entries);
                    match depth {
                        None => depth = Some(child_height),
                        Some(d) => assert_eq!(d, child_height),
                    }
                }
                assert_eq!(node.lhv, lhv);
                assert_eq!(node.mbr, union);
                depth.map_or(1, |d| d + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(lo: [i64; 2], hi: [i64; 2]) -> GridRect {
        GridRect::new(lo.to_vec(), hi.to_vec()).unwrap()
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(
            HilbertTree::<i32>::new(3, 5, 2, 8),
            Err(IndexError::InvalidParameters(_))
        ));
        assert!(matches!(
            HilbertTree::<i32>::new(2, 4, 0, 8),
            Err(IndexError::InvalidParameters(_))
        ));
        assert!(matches!(
            HilbertTree::<i32>::new(2, 4, 2, 0),
            Err(IndexError::InvalidParameters(_))
        ));
        assert!(matches!(
            HilbertTree::<i32>::new(2, 4, 2, 32),
            Err(IndexError::InvalidParameters(_))
        ));
        assert!(HilbertTree::<i32>::new(2, 4, 2, 16).is_ok());
    }

    #[test]
    fn test_insert_and_search_single() {
        let mut tree = HilbertTree::new(2, 5, 2, 8).unwrap();
        tree.insert(rect([0, 0], [10, 10]), 42).unwrap();

        assert_eq!(tree.search(&rect([0, 0], [10, 10])), vec![&42]);
        assert!(tree.search(&rect([50, 50], [60, 60])).is_empty());
        tree.check_invariants();
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut tree = HilbertTree::new(2, 4, 2, 8).unwrap();
        let three_d = GridRect::new(vec![0, 0, 0], vec![1, 1, 1]).unwrap();
        assert!(matches!(
            tree.insert(three_d.clone(), 1),
            Err(IndexError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            tree.remove(&three_d),
            Err(IndexError::DimensionMismatch { .. })
        ));
        assert!(tree.search(&three_d).is_empty());
    }

    #[test]
    fn test_overflow_splits_and_keeps_order() {
        let mut tree = HilbertTree::new(2, 4, 2, 8).unwrap();
        for i in 0..20i64 {
            let base = i * 10;
            tree.insert(rect([base, base], [base + 5, base + 5]), i)
                .unwrap();
            tree.check_invariants();
        }
        assert_eq!(tree.len(), 20);
        assert_eq!(tree.search(&rect([0, 0], [255, 255])).len(), 20);
    }

    #[test]
    fn test_remove_merges_and_keeps_invariants() {
        let mut tree = HilbertTree::new(2, 4, 2, 8).unwrap();
        let mut rects = Vec::new();
        for i in 0..30i64 {
            let base = i * 8;
            let r = rect([base, base], [base + 4, base + 4]);
            rects.push(r.clone());
            tree.insert(r, i).unwrap();
        }
        for r in rects.iter().step_by(2) {
            tree.remove(r).unwrap();
            tree.check_invariants();
        }
        assert_eq!(tree.len(), 15);
        assert_eq!(tree.search(&rect([0, 0], [255, 255])).len(), 15);
    }

    #[test]
    fn test_remove_everything_tears_down_root() {
        let mut tree = HilbertTree::new(2, 4, 2, 8).unwrap();
        let mut rects = Vec::new();
        for i in 0..12i64 {
            let r = rect([i * 20, 0], [i * 20 + 10, 10]);
            rects.push(r.clone());
            tree.insert(r, i).unwrap();
        }
        for r in &rects {
            tree.remove(r).unwrap();
            tree.check_invariants();
        }
        assert!(tree.is_empty());

        tree.insert(rect([0, 0], [1, 1]), 99).unwrap();
        assert_eq!(tree.search(&rect([0, 0], [1, 1])), vec![&99]);
    }

    #[test]
    fn test_duplicates_removed_one_per_call() {
        let mut tree = HilbertTree::new(2, 4, 2, 8).unwrap();
        let shared = rect([5, 5], [10, 10]);
        for i in 0..5 {
            tree.insert(shared.clone(), i).unwrap();
        }
        assert_eq!(tree.search(&shared).len(), 5);

        tree.remove(&shared).unwrap();
        assert_eq!(tree.search(&shared).len(), 4);
        tree.check_invariants();
    }

    #[test]
    fn test_zero_area_rectangle() {
        let mut tree = HilbertTree::new(2, 4, 2, 8).unwrap();
        let point = rect([7, 7], [7, 7]);
        tree.insert(point.clone(), 1).unwrap();
        assert_eq!(tree.search(&point), vec![&1]);
    }
}
