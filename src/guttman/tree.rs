use super::node::{LeafEntry, Node, NodeKind};
use crate::arena::{Arena, NodeId};
use rindex_types::error::{IndexError, Result};
use rindex_types::rect::{approx_eq, Rect};

/// An R-tree with quadratic node splitting, after Guttman.
///
/// Entries are `(rectangle, payload)` pairs; payloads are opaque to the
/// tree and returned by reference from [`search`](Self::search).
/// Rectangle equality on [`remove`](Self::remove) uses the relative
/// epsilon of [`Rect::approx_eq`], since MBRs are recomputed many times.
///
/// # Examples
///
/// ```
/// use rindex::{GuttmanTree, Rect};
///
/// let mut tree = GuttmanTree::new(2, 5)?;
/// tree.insert(Rect::new(vec![0.0, 0.0], vec![1.0, 1.0])?, 42)?;
///
/// let hits = tree.search(&Rect::new(vec![0.0, 0.0], vec![1.0, 1.0])?);
/// assert_eq!(hits, vec![&42]);
/// # Ok::<(), rindex::IndexError>(())
/// ```
#[derive(Debug)]
pub struct GuttmanTree<T> {
    arena: Arena<Node<T>>,
    root: Option<NodeId>,
    min_entries: usize,
    max_entries: usize,
    dims: Option<usize>,
    len: usize,
}

impl<T> GuttmanTree<T> {
    /// Create an empty tree with node fill bounds `[min_entries, max_entries]`.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` unless `0 < min_entries <= max_entries / 2`.
    pub fn new(min_entries: usize, max_entries: usize) -> Result<Self> {
        if min_entries == 0 || min_entries > max_entries / 2 {
            return Err(IndexError::InvalidParameters(format!(
                "the minimum number of entries in a node must be in 1..={}",
                max_entries / 2
            )));
        }
        Ok(Self {
            arena: Arena::new(),
            root: None,
            min_entries,
            max_entries,
            dims: None,
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

    /// Insert a `(rectangle, payload)` association.
    ///
    /// The first insert fixes the tree's dimensionality.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the rectangle's dimension differs from
    /// previously inserted ones; the tree is left unchanged.
    pub fn insert(&mut self, rect: Rect, payload: T) -> Result<()> {
        match self.dims {
            None => self.dims = Some(rect.dims()),
            Some(dims) if dims != rect.dims() => {
                return Err(IndexError::DimensionMismatch {
                    expected: dims,
                    actual: rect.dims(),
                });
            }
            Some(_) => {}
        }
        self.insert_entry(LeafEntry { rect, payload });
        self.len += 1;
        Ok(())
    }

    /// Collect every payload whose rectangle intersects `query`.
    ///
    /// Touching on a face counts as an intersection. Returns an empty
    /// vector on an empty tree or a dimension mismatch; no particular
    /// order is guaranteed.
    pub fn search(&self, query: &Rect) -> Vec<&T> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };
        if self.dims.is_some_and(|d| d != query.dims()) {
            log::warn!(
                "Rejecting search with mismatched dimensions: expected {:?}, got {}",
                self.dims,
                query.dims()
            );
            return out;
        }

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            if !node.mbr.intersects(query) {
                continue;
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

    /// Remove one entry whose rectangle is epsilon-equal to `rect`.
    ///
    /// Duplicates are removed one per call; removing an absent rectangle
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the rectangle's dimension differs from
    /// the tree's.
    pub fn remove(&mut self, rect: &Rect) -> Result<()> {
        if self.dims.is_some_and(|d| d != rect.dims()) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims.unwrap_or(rect.dims()),
                actual: rect.dims(),
            });
        }
        let Some(root) = self.root else {
            return Ok(());
        };
        let Some(leaf) = self.find_leaf(root, rect) else {
            return Ok(());
        };

        if let NodeKind::Leaf(entries) = &mut self.arena[leaf].kind {
            if let Some(pos) = entries.iter().position(|e| e.rect.approx_eq(rect)) {
                entries.remove(pos);
                self.len -= 1;
            } else {
                return Ok(());
            }
        }

        self.condense_tree(leaf);
        self.collapse_root();
        Ok(())
    }

    /// Descend to the leaf that holds an epsilon-equal rectangle.
    fn find_leaf(&self, root: NodeId, rect: &Rect) -> Option<NodeId> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            if !node.mbr.intersects(rect) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    if entries.iter().any(|e| e.rect.approx_eq(rect)) {
                        return Some(id);
                    }
                }
                NodeKind::Internal(children) => stack.extend_from_slice(children),
            }
        }
        None
    }

    /// Insert a leaf entry, splitting and propagating as needed.
    fn insert_entry(&mut self, entry: LeafEntry<T>) {
        let Some(root) = self.root else {
            let mbr = entry.rect.clone();
            let id = self.arena.alloc(Node::leaf(vec![entry], mbr));
            self.root = Some(id);
            return;
        };

        let leaf = self.choose_leaf(root, &entry.rect);
        if let NodeKind::Leaf(entries) = &mut self.arena[leaf].kind {
            entries.push(entry);
        }
        let split = if self.arena[leaf].count() > self.max_entries {
            Some(self.split_node(leaf))
        } else {
            None
        };
        self.adjust_tree(leaf, split);
    }

    /// Pick the leaf requiring minimal enlargement to cover `rect`.
    ///
    /// Ties break by smaller current area, then first in child order.
    fn choose_leaf(&self, root: NodeId, rect: &Rect) -> NodeId {
        let mut current = root;
        loop {
            let children = match &self.arena[current].kind {
                NodeKind::Leaf(_) => return current,
                NodeKind::Internal(children) => children,
            };

            let mut best = children[0];
            let mut best_enlargement = f64::INFINITY;
            let mut best_area = f64::INFINITY;
            for &child in children {
                let mbr = &self.arena[child].mbr;
                let enlargement = mbr.enlargement(rect);
                let area = mbr.area();
                let better = enlargement < best_enlargement
                    || (approx_eq(enlargement, best_enlargement) && area < best_area);
                if better {
                    best = child;
                    best_enlargement = enlargement;
                    best_area = area;
                }
            }
            current = best;
        }
    }

    /// Walk from `node` to the root refreshing MBRs, installing `split`
    /// siblings into parents and splitting further on overflow.
    fn adjust_tree(&mut self, mut node: NodeId, mut split: Option<NodeId>) {
        loop {
            self.refresh_mbr(node);
            match self.arena[node].parent {
                None => {
                    if let Some(sibling) = split {
                        self.refresh_mbr(sibling);
                        self.grow_root(node, sibling);
                    }
                    return;
                }
                Some(parent) => {
                    if let Some(sibling) = split {
                        self.refresh_mbr(sibling);
                        self.arena[sibling].parent = Some(parent);
                        if let NodeKind::Internal(children) = &mut self.arena[parent].kind {
                            children.push(sibling);
                        }
                        split = if self.arena[parent].count() > self.max_entries {
                            Some(self.split_node(parent))
                        } else {
                            None
                        };
                    }
                    node = parent;
                }
            }
        }
    }

    /// Replace the root with a new internal node over two halves.
    fn grow_root(&mut self, left: NodeId, right: NodeId) {
        let mut mbr = self.arena[left].mbr.clone();
        mbr.expand_to_include(&self.arena[right].mbr);
        let new_root = self.arena.alloc(Node::internal(vec![left, right], mbr));
        self.arena[left].parent = Some(new_root);
        self.arena[right].parent = Some(new_root);
        self.root = Some(new_root);
        log::debug!("root split; tree height increased");
    }

    /// Split an overfull node in two with the quadratic strategy and
    /// return the new sibling. The sibling is not yet attached to a
    /// parent.
    fn split_node(&mut self, node: NodeId) -> NodeId {
        let parent = self.arena[node].parent;
        match std::mem::replace(
            &mut self.arena[node].kind,
            NodeKind::Internal(Vec::new()),
        ) {
            NodeKind::Leaf(mut entries) => {
                let rects: Vec<Rect> = entries.iter().map(|e| e.rect.clone()).collect();
                let (keep, give) = quadratic_partition(&rects, self.min_entries);

                let mut kept = Vec::with_capacity(keep.len());
                let mut given = Vec::with_capacity(give.len());
                for (i, entry) in entries.drain(..).enumerate() {
                    if keep.contains(&i) {
                        kept.push(entry);
                    } else {
                        given.push(entry);
                    }
                }

                let given_mbr = mbr_of_entries(&given);
                self.arena[node].kind = NodeKind::Leaf(kept);
                self.refresh_mbr(node);

                let sibling = self.arena.alloc(Node::leaf(given, given_mbr));
                self.arena[sibling].parent = parent;
                sibling
            }
            NodeKind::Internal(children) => {
                let rects: Vec<Rect> = children
                    .iter()
                    .map(|&c| self.arena[c].mbr.clone())
                    .collect();
                let (keep, give) = quadratic_partition(&rects, self.min_entries);

                let mut kept = Vec::with_capacity(keep.len());
                let mut given = Vec::with_capacity(give.len());
                for (i, child) in children.into_iter().enumerate() {
                    if keep.contains(&i) {
                        kept.push(child);
                    } else {
                        given.push(child);
                    }
                }

                let mut given_mbr = self.arena[given[0]].mbr.clone();
                for &c in &given[1..] {
                    let child_mbr = self.arena[c].mbr.clone();
                    given_mbr.expand_to_include(&child_mbr);
                }
                self.arena[node].kind = NodeKind::Internal(kept);
                self.refresh_mbr(node);

                let sibling = self.arena.alloc(Node::internal(given, given_mbr));
                self.arena[sibling].parent = parent;
                let moved = match &self.arena[sibling].kind {
                    NodeKind::Internal(children) => children.clone(),
                    NodeKind::Leaf(_) => Vec::new(),
                };
                for child in moved {
                    self.arena[child].parent = Some(sibling);
                }
                sibling
            }
        }
    }

    /// Recompute the tight cover of a node's children.
    ///
    /// No-op on an empty node; empty nodes only occur transiently on the
    /// way to being torn down.
    fn refresh_mbr(&mut self, node: NodeId) {
        let mbr = match &self.arena[node].kind {
            NodeKind::Leaf(entries) => {
                let mut it = entries.iter();
                it.next().map(|first| {
                    let mut mbr = first.rect.clone();
                    for entry in it {
                        mbr.expand_to_include(&entry.rect);
                    }
                    mbr
                })
            }
            NodeKind::Internal(children) => {
                let mut it = children.iter();
                it.next().map(|&first| {
                    let mut mbr = self.arena[first].mbr.clone();
                    for &child in it {
                        let child_mbr = self.arena[child].mbr.clone();
                        mbr.expand_to_include(&child_mbr);
                    }
                    mbr
                })
            }
        };
        if let Some(mbr) = mbr {
            self.arena[node].mbr = mbr;
        }
    }

    /// Upward pass after a deletion: detach underfull nodes as orphans,
    /// refresh MBRs along the path, then re-home the orphaned entries.
    fn condense_tree(&mut self, leaf: NodeId) {
        let mut orphans = Vec::new();
        let mut node = leaf;
        while let Some(parent) = self.arena[node].parent {
            if self.arena[node].count() < self.min_entries {
                self.detach_child(parent, node);
                orphans.push(node);
            } else {
                self.refresh_mbr(node);
            }
            node = parent;
        }
        self.refresh_mbr(node);

        if !orphans.is_empty() {
            log::debug!("condense detached {} orphan node(s)", orphans.len());
        }
        for orphan in orphans {
            self.reinsert_orphan(orphan);
        }
    }

    /// Remove `child` from `parent`'s child list.
    fn detach_child(&mut self, parent: NodeId, child: NodeId) {
        if let NodeKind::Internal(children) = &mut self.arena[parent].kind {
            children.retain(|&c| c != child);
        }
        self.arena[child].parent = None;
    }

    /// Re-home a detached node: leaf orphans re-insert their entries,
    /// internal orphans are grafted back as whole subtrees.
    fn reinsert_orphan(&mut self, orphan: NodeId) {
        if self.arena[orphan].count() == 0 {
            let _ = self.arena.free(orphan);
            return;
        }
        if self.arena[orphan].is_leaf() {
            if let Some(Node {
                kind: NodeKind::Leaf(entries),
                ..
            }) = self.arena.free(orphan)
            {
                for entry in entries {
                    self.insert_entry(entry);
                }
            }
        } else {
            self.insert_subtree(orphan);
        }
    }

    /// Graft a subtree at the level matching its height, choosing the
    /// attachment point by minimal enlargement. A subtree at least as
    /// tall as the root is broken down one level and re-grafted.
    fn insert_subtree(&mut self, orphan: NodeId) {
        let Some(root) = self.root else {
            return;
        };
        let root_height = self.height(root);
        let orphan_height = self.height(orphan);

        if orphan_height >= root_height {
            match self.arena.free(orphan).map(|n| n.kind) {
                Some(NodeKind::Leaf(entries)) => {
                    for entry in entries {
                        self.insert_entry(entry);
                    }
                }
                Some(NodeKind::Internal(children)) => {
                    for child in children {
                        self.arena[child].parent = None;
                        self.insert_subtree(child);
                    }
                }
                None => {}
            }
            return;
        }

        let orphan_mbr = self.arena[orphan].mbr.clone();
        let mut target = root;
        for _ in 0..(root_height - orphan_height - 1) {
            let children = match &self.arena[target].kind {
                NodeKind::Internal(children) => children,
                NodeKind::Leaf(_) => break,
            };
            let mut best = children[0];
            let mut best_enlargement = f64::INFINITY;
            let mut best_area = f64::INFINITY;
            for &child in children {
                let mbr = &self.arena[child].mbr;
                let enlargement = mbr.enlargement(&orphan_mbr);
                let area = mbr.area();
                let better = enlargement < best_enlargement
                    || (approx_eq(enlargement, best_enlargement) && area < best_area);
                if better {
                    best = child;
                    best_enlargement = enlargement;
                    best_area = area;
                }
            }
            target = best;
        }

        self.arena[orphan].parent = Some(target);
        if let NodeKind::Internal(children) = &mut self.arena[target].kind {
            children.push(orphan);
        }
        let split = if self.arena[target].count() > self.max_entries {
            Some(self.split_node(target))
        } else {
            None
        };
        self.adjust_tree(target, split);
    }

    /// Distance from a node down to its leaves.
    fn height(&self, mut node: NodeId) -> usize {
        let mut height = 0;
        loop {
            match &self.arena[node].kind {
                NodeKind::Leaf(_) => return height,
                NodeKind::Internal(children) => {
                    node = children[0];
                    height += 1;
                }
            }
        }
    }

    /// Shrink the root: a single-child internal root is replaced by its
    /// child, an empty root tears the tree down.
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
                    self.arena[child].parent = None;
                    self.root = Some(child);
                }
                Action::TearDown => {
                    let _ = self.arena.free(root);
                    self.root = None;
                }
                Action::Done => return,
            }
        }
    }
}

/// Union of the rectangles of a non-empty entry slice.
fn mbr_of_entries<T>(entries: &[LeafEntry<T>]) -> Rect {
    let mut mbr = entries[0].rect.clone();
    for entry in &entries[1..] {
        mbr.expand_to_include(&entry.rect);
    }
    mbr
}

/// Quadratic split of `rects` into two index groups, each holding at
/// least `min` members.
///
/// Seeds are the pair wasting the most area when covered together; the
/// rest are assigned greedily by the largest difference in enlargement
/// cost, then donated between groups to restore minimum fill.
fn quadratic_partition(rects: &[Rect], min: usize) -> (Vec<usize>, Vec<usize>) {
    let n = rects.len();
    debug_assert!(n >= 2);

    let (mut seed_a, mut seed_b) = (0, 1);
    let mut worst_waste = f64::NEG_INFINITY;
    for i in 0..n {
        for j in (i + 1)..n {
            let mut cover = rects[i].clone();
            cover.expand_to_include(&rects[j]);
            let waste = cover.area() - rects[i].area() - rects[j].area();
            if waste > worst_waste {
                worst_waste = waste;
                seed_a = i;
                seed_b = j;
            }
        }
    }

    let mut group_a = vec![seed_a];
    let mut group_b = vec![seed_b];
    let mut mbr_a = rects[seed_a].clone();
    let mut mbr_b = rects[seed_b].clone();

    let mut remaining: Vec<usize> = (0..n).filter(|&i| i != seed_a && i != seed_b).collect();
    while !remaining.is_empty() {
        let mut pick = 0;
        let mut best_diff = f64::NEG_INFINITY;
        for (slot, &i) in remaining.iter().enumerate() {
            let diff = (mbr_a.enlargement(&rects[i]) - mbr_b.enlargement(&rects[i])).abs();
            if diff > best_diff {
                best_diff = diff;
                pick = slot;
            }
        }
        let i = remaining.swap_remove(pick);

        let cost_a = mbr_a.enlargement(&rects[i]);
        let cost_b = mbr_b.enlargement(&rects[i]);
        let to_a = if !approx_eq(cost_a, cost_b) {
            cost_a < cost_b
        } else if !approx_eq(mbr_a.area(), mbr_b.area()) {
            mbr_a.area() < mbr_b.area()
        } else {
            group_a.len() <= group_b.len()
        };
        if to_a {
            group_a.push(i);
            mbr_a.expand_to_include(&rects[i]);
        } else {
            group_b.push(i);
            mbr_b.expand_to_include(&rects[i]);
        }
    }

    donate_until_filled(&mut group_b, &mut group_a, &mut mbr_a, rects, min);
    donate_until_filled(&mut group_a, &mut group_b, &mut mbr_b, rects, min);

    (group_a, group_b)
}

/// Move the cheapest entries of `from` into `to` until `to` reaches the
/// minimum fill.
fn donate_until_filled(
    from: &mut Vec<usize>,
    to: &mut Vec<usize>,
    to_mbr: &mut Rect,
    rects: &[Rect],
    min: usize,
) {
    while to.len() < min {
        let mut pick = 0;
        let mut best_cost = f64::INFINITY;
        for (slot, &i) in from.iter().enumerate() {
            let cost = to_mbr.enlargement(&rects[i]);
            if cost < best_cost {
                best_cost = cost;
                pick = slot;
            }
        }
        let i = from.swap_remove(pick);
        to_mbr.expand_to_include(&rects[i]);
        to.push(i);
    }
}

#[cfg(test)]
impl<T> GuttmanTree<T> {
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

    /// Returns the node height; checks fill bounds, tight MBRs, parent
    /// pointers and uniform leaf depth below `id`.
    fn check_node(&self, id: NodeId, is_root: bool, entries: &mut usize) -> usize {
        let node = &self.arena[id];
        match &node.kind {
            NodeKind::Leaf(leaf_entries) => {
                if is_root {
                    assert!(!leaf_entries.is_empty());
                } else {
                    assert!(leaf_entries.len() >= self.min_entries);
                }
                assert!(leaf_entries.len() <= self.max_entries);
                assert!(node.mbr.approx_eq(&mbr_of_entries(leaf_entries)));
                *entries += leaf_entries.len();
                0
            }
            NodeKind::Internal(children) => {
                if is_root {
                    assert!(children.len() >= 2);
                } else {
                    assert!(children.len() >= self.min_entries);
                }
                assert!(children.len() <= self.max_entries);

                let mut union = self.arena[children[0]].mbr.clone();
                let mut depth = None;
                for &child in children {
                    assert_eq!(self.arena[child].parent, Some(id));
                    union.expand_to_include(&self.arena[child].mbr);
                    let child_height = self.check_node(child, false, entries);
                    match depth {
                        None => depth = Some(child_height),
                        Some(d) => assert_eq!(d, child_height),
                    }
                }
                assert!(node.mbr.approx_eq(&union));
                depth.map_or(1, |d| d + 1)
            }
        }
    }
}
