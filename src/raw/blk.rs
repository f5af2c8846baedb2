use smallvec::SmallVec;
use static_assertions::const_assert;

use super::arena::Handle;
use crate::compare::Compare;

/// Maximum number of node slots in a block.
pub(crate) const MAX_NBLK: usize = 16;
/// Minimum occupancy of every block except the root.
pub(crate) const MIN_NBLK: usize = MAX_NBLK / 2;

// Two minimum blocks must merge without overflowing one block.
const_assert!(2 * MIN_NBLK <= MAX_NBLK);

/// What a node slot points at.
///
/// The variant mirrors the owning block's `leaf` flag: every node of a leaf
/// is `Data`, every node of an internal block is `Child`.
#[derive(Clone, Copy, Debug)]
pub(crate) enum NodePtr {
    /// Root of the child subtree whose maximum key is this node's key.
    Child(Handle),
    /// User data slot for this node's key.
    Data(Handle),
}

/// One node slot: a key plus the child block or data it leads to.
#[derive(Clone, Debug)]
pub(crate) struct Node<K> {
    key: K,
    ptr: NodePtr,
}

impl<K> Node<K> {
    pub(crate) const fn new(key: K, ptr: NodePtr) -> Self {
        Self { key, ptr }
    }

    #[inline]
    pub(crate) const fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn set_key(&mut self, key: K) {
        self.key = key;
    }

    /// Returns the child block handle, panicking on a leaf node.
    #[inline]
    pub(crate) fn child(&self) -> Handle {
        match self.ptr {
            NodePtr::Child(handle) => handle,
            NodePtr::Data(_) => panic!("expected child node"),
        }
    }

    /// Returns the data handle, panicking on an internal node.
    #[inline]
    pub(crate) fn data(&self) -> Handle {
        match self.ptr {
            NodePtr::Data(handle) => handle,
            NodePtr::Child(_) => panic!("expected data node"),
        }
    }
}

/// A fixed-capacity tree block.
///
/// Blocks are both tree vertices (internal blocks hold separator/child
/// nodes) and, at the bottom level, members of the doubly linked leaf chain.
/// Splits thread `prev`/`next` at every level as a by-product, but only the
/// leaf-level chain is traversed.
#[derive(Clone)]
pub(crate) struct Blk<K> {
    prev: Option<Handle>,
    next: Option<Handle>,
    leaf: bool,
    // Contiguous storage; occupancy is the length.
    nodes: SmallVec<[Node<K>; MAX_NBLK]>,
}

impl<K> Blk<K> {
    pub(crate) fn new(leaf: bool) -> Self {
        Self {
            prev: None,
            next: None,
            leaf,
            nodes: SmallVec::new(),
        }
    }

    /// Occupancy of this block.
    #[inline]
    pub(crate) fn n(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) const fn is_leaf(&self) -> bool {
        self.leaf
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.nodes.len() == MAX_NBLK
    }

    /// Returns true if this block can give a node away and stay above the
    /// occupancy floor.
    #[inline]
    pub(crate) fn can_lend(&self) -> bool {
        self.nodes.len() > MIN_NBLK
    }

    pub(crate) fn prev(&self) -> Option<Handle> {
        self.prev
    }

    pub(crate) fn set_prev(&mut self, prev: Option<Handle>) {
        self.prev = prev;
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn node(&self, i: usize) -> &Node<K> {
        &self.nodes[i]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, i: usize) -> &mut Node<K> {
        &mut self.nodes[i]
    }

    pub(crate) fn nodes(&self) -> &[Node<K>] {
        &self.nodes
    }

    /// Key of the last node, the maximum this block holds.
    pub(crate) fn last_key(&self) -> &K {
        self.nodes.last().expect("empty block has no last key").key()
    }

    /// Smallest index whose key is not less than `key` under `compar`;
    /// `self.n()` if every key is less.
    #[inline]
    pub(crate) fn lower_bound_index<C: Compare<K>>(&self, key: &K, compar: &C) -> usize {
        self.nodes().partition_point(|node| compar.less(node.key(), key))
    }

    pub(crate) fn insert_node(&mut self, i: usize, node: Node<K>) {
        debug_assert!(!self.is_full());
        self.nodes.insert(i, node);
    }

    pub(crate) fn remove_node(&mut self, i: usize) -> Node<K> {
        self.nodes.remove(i)
    }

    pub(crate) fn push_node(&mut self, node: Node<K>) {
        debug_assert!(!self.is_full());
        self.nodes.push(node);
    }

    pub(crate) fn push_node_front(&mut self, node: Node<K>) {
        debug_assert!(!self.is_full());
        self.nodes.insert(0, node);
    }

    pub(crate) fn pop_node(&mut self) -> Option<Node<K>> {
        self.nodes.pop()
    }

    pub(crate) fn pop_node_front(&mut self) -> Option<Node<K>> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(self.nodes.remove(0))
        }
    }

    /// Detaches the upper half of the nodes (`n / 2` of them) for a split.
    pub(crate) fn split_upper_half(&mut self) -> SmallVec<[Node<K>; MAX_NBLK]> {
        let keep = self.nodes.len() - self.nodes.len() / 2;
        self.nodes.drain(keep..).collect()
    }

    /// Installs the node set of a freshly split-off block.
    pub(crate) fn adopt_nodes(&mut self, nodes: SmallVec<[Node<K>; MAX_NBLK]>) {
        debug_assert!(self.nodes.is_empty());
        self.nodes = nodes;
    }

    /// Appends `right`'s nodes and takes over its forward link.
    ///
    /// The caller fixes the back-link of the block after `right` and retires
    /// `right`'s slot.
    pub(crate) fn merge_with_right(&mut self, mut right: Blk<K>) {
        debug_assert_eq!(self.leaf, right.leaf);
        self.nodes.append(&mut right.nodes);
        self.next = right.next;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::compare::OrdCompare;

    fn leaf_with_keys(keys: &[i64]) -> Blk<i64> {
        let mut blk = Blk::new(true);
        for &k in keys {
            blk.push_node(Node::new(k, NodePtr::Data(Handle::from_index(0))));
        }
        blk
    }

    #[test]
    fn lower_bound_index_finds_first_not_less() {
        let blk = leaf_with_keys(&[10, 20, 30]);
        assert_eq!(blk.lower_bound_index(&5, &OrdCompare), 0);
        assert_eq!(blk.lower_bound_index(&10, &OrdCompare), 0);
        assert_eq!(blk.lower_bound_index(&11, &OrdCompare), 1);
        assert_eq!(blk.lower_bound_index(&30, &OrdCompare), 2);
        assert_eq!(blk.lower_bound_index(&31, &OrdCompare), 3);
    }

    #[test]
    fn split_moves_upper_half() {
        let mut blk = leaf_with_keys(&[1, 2, 3, 4, 5]);
        let moved = blk.split_upper_half();
        assert_eq!(blk.n(), 3);
        assert_eq!(moved.len(), 2);
        assert_eq!(*blk.last_key(), 3);
        assert_eq!(*moved[0].key(), 4);
    }

    #[test]
    #[should_panic(expected = "expected child node")]
    fn data_node_is_not_a_child() {
        let blk = leaf_with_keys(&[1]);
        let _ = blk.node(0).child();
    }
}
