use super::arena::{Arena, Handle};
use super::blk::{Blk, MAX_NBLK, MIN_NBLK, Node, NodePtr};
use crate::compare::Compare;
use crate::error::OutOfMemory;

/// The core keyed-skip-list tree backing `KslMap`.
///
/// Rebalancing is proactive and strictly top-down: `insert` splits every full
/// block it passes through and `remove` refills every minimum block before
/// entering it, so neither ever needs an upward fix-up pass, a recursion
/// stack, or a parent pointer.
///
/// A position in the tree is a `(Handle, usize)` pair naming a leaf block and
/// a node index within it; `index == n` of the rightmost leaf is the end
/// position.
pub(crate) struct RawKsl<K, V, C> {
    /// All tree blocks.
    blks: Arena<Blk<K>>,
    /// User data, kept out of the blocks so searches touch only keys.
    data: Arena<V>,
    /// Root block. Always present, even when the tree is empty.
    head: Handle,
    /// Leftmost leaf.
    front: Handle,
    /// Rightmost leaf.
    back: Handle,
    /// Total number of keys stored.
    n: usize,
    /// Ordering shared by every structural operation.
    compar: C,
}

impl<K: Clone, V: Clone, C: Clone> Clone for RawKsl<K, V, C> {
    fn clone(&self) -> Self {
        // Handles are arena indices, so cloning the arenas wholesale keeps
        // every link valid.
        Self {
            blks: self.blks.clone(),
            data: self.data.clone(),
            head: self.head,
            front: self.front,
            back: self.back,
            n: self.n,
            compar: self.compar.clone(),
        }
    }
}

impl<K, V, C> RawKsl<K, V, C> {
    /// Creates an empty tree: a single empty leaf that is root, front, and
    /// back at once.
    pub(crate) fn new(compar: C) -> Self {
        let mut blks = Arena::new();
        let head = blks.alloc(Blk::new(true));
        Self {
            blks,
            data: Arena::new(),
            head,
            front: head,
            back: head,
            n: 0,
            compar,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.n
    }

    /// Drops every entry and resets to a single empty leaf root.
    pub(crate) fn clear(&mut self) {
        self.blks.clear();
        self.data.clear();
        let head = self.blks.alloc(Blk::new(true));
        self.head = head;
        self.front = head;
        self.back = head;
        self.n = 0;
    }

    /// Position of the first entry; equals [`end`](Self::end) when empty.
    pub(crate) fn begin(&self) -> (Handle, usize) {
        (self.front, 0)
    }

    /// One-past-the-last position.
    pub(crate) fn end(&self) -> (Handle, usize) {
        (self.back, self.blks.get(self.back).n())
    }

    pub(crate) fn key_at(&self, blk: Handle, i: usize) -> &K {
        self.blks.get(blk).node(i).key()
    }

    pub(crate) fn value_at(&self, blk: Handle, i: usize) -> &V {
        self.data.get(self.blks.get(blk).node(i).data())
    }

    pub(crate) fn value_at_mut(&mut self, blk: Handle, i: usize) -> &mut V {
        self.data.get_mut(self.blks.get(blk).node(i).data())
    }

    pub(crate) fn is_end(&self, blk: Handle, i: usize) -> bool {
        let b = self.blks.get(blk);
        i == b.n() && b.next().is_none()
    }

    pub(crate) fn is_begin(&self, blk: Handle, i: usize) -> bool {
        i == 0 && self.blks.get(blk).prev().is_none()
    }

    /// Advances a position by one, hopping to the next leaf at a boundary.
    ///
    /// Panics when called on the end position.
    pub(crate) fn step_next(&self, blk: Handle, i: usize) -> (Handle, usize) {
        assert!(!self.is_end(blk, i), "stepped past the end of the tree");
        let b = self.blks.get(blk);
        let i = i + 1;
        if i == b.n()
            && let Some(next) = b.next()
        {
            return (next, 0);
        }
        (blk, i)
    }

    /// Steps a position back by one, hopping to the previous leaf at a
    /// boundary.
    ///
    /// Panics when called on the begin position.
    pub(crate) fn step_prev(&self, blk: Handle, i: usize) -> (Handle, usize) {
        assert!(!self.is_begin(blk, i), "stepped before the beginning of the tree");
        if i == 0 {
            let prev = self.blks.get(blk).prev().expect("begin check guarantees a previous leaf");
            return (prev, self.blks.get(prev).n() - 1);
        }
        (blk, i - 1)
    }
}

impl<K: Clone, V, C: Compare<K>> RawKsl<K, V, C> {
    /// Splits `blk` in half, allocating and returning its new right sibling.
    ///
    /// The upper half of `blk`'s nodes moves into the new block, which is
    /// spliced into the sibling chain directly after `blk`. The new block is
    /// allocated before any node moves, so a failure mutates nothing.
    fn split_blk(&mut self, blk_h: Handle) -> Result<Handle, OutOfMemory> {
        let src = self.blks.get(blk_h);
        let leaf = src.is_leaf();
        let old_next = src.next();

        let rblk_h = self.blks.try_alloc(Blk::new(leaf))?;

        let rblk = self.blks.get_mut(rblk_h);
        rblk.set_prev(Some(blk_h));
        rblk.set_next(old_next);

        if let Some(next_h) = old_next {
            self.blks.get_mut(next_h).set_prev(Some(rblk_h));
        } else if self.back == blk_h {
            self.back = rblk_h;
        }

        let src = self.blks.get_mut(blk_h);
        src.set_next(Some(rblk_h));
        let moved = src.split_upper_half();
        self.blks.get_mut(rblk_h).adopt_nodes(moved);

        debug_assert!(self.blks.get(blk_h).n() >= MIN_NBLK);
        debug_assert!(self.blks.get(rblk_h).n() >= MIN_NBLK);

        Ok(rblk_h)
    }

    /// Splits the child at position `i` of `blk` into two adjacent children,
    /// inserting the right half at `i + 1` and refreshing both separators.
    ///
    /// `blk` must have a free slot.
    fn split_node(&mut self, blk_h: Handle, i: usize) -> Result<(), OutOfMemory> {
        debug_assert!(!self.blks.get(blk_h).is_full());

        let lblk_h = self.blks.get(blk_h).node(i).child();
        let rblk_h = self.split_blk(lblk_h)?;

        let lmax = self.blks.get(lblk_h).last_key().clone();
        let rmax = self.blks.get(rblk_h).last_key().clone();

        let blk = self.blks.get_mut(blk_h);
        blk.insert_node(i + 1, Node::new(rmax, NodePtr::Child(rblk_h)));
        blk.node_mut(i).set_key(lmax);

        Ok(())
    }

    /// Splits a full root, growing the tree by one level.
    ///
    /// The new root is allocated before the split: a failure after the split
    /// could not be rolled back.
    fn split_head(&mut self) -> Result<(), OutOfMemory> {
        let nhead_h = self.blks.try_alloc(Blk::new(false))?;

        let lblk_h = self.head;
        let rblk_h = match self.split_blk(lblk_h) {
            Ok(handle) => handle,
            Err(err) => {
                self.blks.free(nhead_h);
                return Err(err);
            }
        };

        let lmax = self.blks.get(lblk_h).last_key().clone();
        let rmax = self.blks.get(rblk_h).last_key().clone();

        let nhead = self.blks.get_mut(nhead_h);
        nhead.push_node(Node::new(lmax, NodePtr::Child(lblk_h)));
        nhead.push_node(Node::new(rmax, NodePtr::Child(rblk_h)));
        self.head = nhead_h;

        Ok(())
    }

    /// Writes a new leaf entry at `(blk, i)`.
    fn insert_at_leaf(&mut self, blk_h: Handle, i: usize, key: K, value: V) -> Result<(Handle, usize), OutOfMemory> {
        debug_assert!(self.blks.get(blk_h).is_leaf());
        debug_assert!(
            i == self.blks.get(blk_h).n() || !self.compar.equiv(self.blks.get(blk_h).node(i).key(), &key),
            "insert with a key that is already present"
        );

        let data_h = self.data.try_alloc(value)?;
        self.blks.get_mut(blk_h).insert_node(i, Node::new(key, NodePtr::Data(data_h)));
        self.n += 1;
        Ok((blk_h, i))
    }

    /// Inserts `(key, value)` and returns the position of the new entry.
    ///
    /// The descent splits every full block it passes through, so each block
    /// it lands in is guaranteed a free slot. A failed insert leaves any
    /// completed splits in place; they preserve every tree invariant and the
    /// key count.
    ///
    /// `key` must not be comparator-equal to a stored key.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<(Handle, usize), OutOfMemory> {
        debug_assert_eq!(self.data.len(), self.n, "data arena out of step with the key count");

        if self.blks.get(self.head).is_full() {
            self.split_head()?;
        }

        let mut blk_h = self.head;
        loop {
            let blk = self.blks.get(blk_h);
            let i = blk.lower_bound_index(&key, &self.compar);

            if blk.is_leaf() {
                return self.insert_at_leaf(blk_h, i, key, value);
            }

            if i == blk.n() {
                return self.insert_right_spine(blk_h, key, value);
            }

            let child_h = blk.node(i).child();
            if self.blks.get(child_h).is_full() {
                self.split_node(blk_h, i)?;

                // Descend right of the split if the key now exceeds the left
                // half's separator; bump the right separator if it trails
                // the key (possible only under a non-strict comparator).
                let blk = self.blks.get(blk_h);
                let mut i = i;
                if self.compar.less(blk.node(i).key(), &key) {
                    i += 1;
                    if self.compar.less(blk.node(i).key(), &key) {
                        self.blks.get_mut(blk_h).node_mut(i).set_key(key.clone());
                    }
                }
                blk_h = self.blks.get(blk_h).node(i).child();
            } else {
                blk_h = child_h;
            }
        }
    }

    /// Inserts a key greater than every key in the subtree under `blk`:
    /// walks the rightmost spine down to the leaf, rewriting each separator
    /// to the new maximum (splitting full children on the way).
    fn insert_right_spine(&mut self, blk_h: Handle, key: K, value: V) -> Result<(Handle, usize), OutOfMemory> {
        let mut blk_h = blk_h;
        loop {
            let last = self.blks.get(blk_h).n() - 1;
            let child_h = self.blks.get(blk_h).node(last).child();
            if self.blks.get(child_h).is_full() {
                self.split_node(blk_h, last)?;
            }

            let blk = self.blks.get_mut(blk_h);
            let last = blk.n() - 1;
            let node = blk.node_mut(last);
            node.set_key(key.clone());
            let child_h = node.child();

            if self.blks.get(child_h).is_leaf() {
                let i = self.blks.get(child_h).n();
                return self.insert_at_leaf(child_h, i, key, value);
            }
            blk_h = child_h;
        }
    }

    /// Moves the first node of child `i` to the tail of child `i - 1` and
    /// rewrites the left separator to match.
    fn shift_left(&mut self, blk_h: Handle, i: usize) {
        debug_assert!(i > 0);
        let lblk_h = self.blks.get(blk_h).node(i - 1).child();
        let rblk_h = self.blks.get(blk_h).node(i).child();
        debug_assert!(!self.blks.get(lblk_h).is_full());
        debug_assert!(self.blks.get(rblk_h).can_lend());

        let moved = self.blks.get_mut(rblk_h).pop_node_front().expect("lending block is not empty");
        let lmax = moved.key().clone();
        self.blks.get_mut(lblk_h).push_node(moved);
        self.blks.get_mut(blk_h).node_mut(i - 1).set_key(lmax);
    }

    /// Moves the last node of child `i` to the front of child `i + 1` and
    /// rewrites the left separator to match.
    fn shift_right(&mut self, blk_h: Handle, i: usize) {
        debug_assert!(i + 1 < self.blks.get(blk_h).n());
        let lblk_h = self.blks.get(blk_h).node(i).child();
        let rblk_h = self.blks.get(blk_h).node(i + 1).child();
        debug_assert!(self.blks.get(lblk_h).can_lend());
        debug_assert!(!self.blks.get(rblk_h).is_full());

        let moved = self.blks.get_mut(lblk_h).pop_node().expect("lending block is not empty");
        self.blks.get_mut(rblk_h).push_node_front(moved);
        let lmax = self.blks.get(lblk_h).last_key().clone();
        self.blks.get_mut(blk_h).node_mut(i).set_key(lmax);
    }

    /// Merges children `i` and `i + 1` of `blk`, returning the surviving
    /// (left) block.
    ///
    /// When `blk` is the root and holds exactly these two children, the
    /// merged block becomes the new root and the height shrinks by one;
    /// otherwise the absorbed slot is removed from `blk` and the surviving
    /// separator refreshed.
    fn merge_node(&mut self, blk_h: Handle, i: usize) -> Handle {
        debug_assert!(i + 1 < self.blks.get(blk_h).n());
        let lblk_h = self.blks.get(blk_h).node(i).child();
        let rblk_h = self.blks.get(blk_h).node(i + 1).child();
        debug_assert!(self.blks.get(lblk_h).n() + self.blks.get(rblk_h).n() <= MAX_NBLK);

        let rblk = self.blks.take(rblk_h);
        let new_next = rblk.next();
        self.blks.get_mut(lblk_h).merge_with_right(rblk);
        if let Some(next_h) = new_next {
            self.blks.get_mut(next_h).set_prev(Some(lblk_h));
        } else if self.back == rblk_h {
            self.back = lblk_h;
        }

        if blk_h == self.head && self.blks.get(blk_h).n() == 2 {
            self.blks.free(blk_h);
            self.head = lblk_h;
        } else {
            self.blks.get_mut(blk_h).remove_node(i + 1);
            let lmax = self.blks.get(lblk_h).last_key().clone();
            self.blks.get_mut(blk_h).node_mut(i).set_key(lmax);
        }

        lblk_h
    }

    /// Removes the entry comparator-equal to `key`, returning its value and
    /// the position of its successor (the end position when none).
    ///
    /// Every minimum-occupancy block on the way down is refilled before it
    /// is entered, so the leaf deletion can never underflow an ancestor.
    ///
    /// Panics if `key` is not present.
    pub(crate) fn remove(&mut self, key: &K) -> (V, (Handle, usize)) {
        let mut blk_h = self.head;

        // Height shrinks in exactly one place: a root with two minimum
        // children merges before the descent begins.
        let head = self.blks.get(self.head);
        if !head.is_leaf()
            && head.n() == 2
            && self.blks.get(head.node(0).child()).n() == MIN_NBLK
            && self.blks.get(head.node(1).child()).n() == MIN_NBLK
        {
            blk_h = self.merge_node(self.head, 0);
        }

        loop {
            let blk = self.blks.get(blk_h);
            let i = blk.lower_bound_index(key, &self.compar);
            assert!(i < blk.n(), "removal of a key that is not present");

            if blk.is_leaf() {
                assert!(
                    self.compar.equiv(blk.node(i).key(), key),
                    "removal of a key that is not present"
                );
                let node = self.blks.get_mut(blk_h).remove_node(i);
                let value = self.data.take(node.data());
                self.n -= 1;

                let blk = self.blks.get(blk_h);
                let succ = if i == blk.n()
                    && let Some(next) = blk.next()
                {
                    (next, 0)
                } else {
                    (blk_h, i)
                };
                return (value, succ);
            }

            let child_h = blk.node(i).child();
            if self.blks.get(child_h).n() > MIN_NBLK {
                blk_h = child_h;
                continue;
            }

            let blk = self.blks.get(blk_h);
            let left_lends = i > 0 && self.blks.get(blk.node(i - 1).child()).can_lend();
            let right_lends = i + 1 < blk.n() && self.blks.get(blk.node(i + 1).child()).can_lend();

            if left_lends {
                self.shift_right(blk_h, i - 1);
            } else if right_lends {
                self.shift_left(blk_h, i + 1);
            } else if i > 0 {
                blk_h = self.merge_node(blk_h, i - 1);
            } else {
                blk_h = self.merge_node(blk_h, i);
            }
        }
    }

    /// Position of the first entry whose key is not less than `key` under
    /// the container's own order.
    pub(crate) fn lower_bound(&self, key: &K) -> (Handle, usize) {
        self.lower_bound_by(key, &self.compar)
    }

    /// Position of the first entry whose key is not less than `key` under
    /// `compar`, which may differ from the container's order.
    pub(crate) fn lower_bound_by<C2: Compare<K>>(&self, key: &K, compar: &C2) -> (Handle, usize) {
        let mut blk_h = self.head;
        loop {
            let blk = self.blks.get(blk_h);
            let i = blk.lower_bound_index(key, compar);

            if blk.is_leaf() {
                if i == blk.n()
                    && let Some(next) = blk.next()
                {
                    return (next, 0);
                }
                return (blk_h, i);
            }

            if i == blk.n() {
                // Every separator here is less than the key, but under a
                // non-strict comparator a descendant can still match: fast
                // forward to the last leaf of this subtree and answer with
                // its successor.
                let mut cur = blk_h;
                while !self.blks.get(cur).is_leaf() {
                    let b = self.blks.get(cur);
                    cur = b.node(b.n() - 1).child();
                }
                let leaf = self.blks.get(cur);
                if let Some(next) = leaf.next() {
                    return (next, 0);
                }
                return (cur, leaf.n());
            }

            blk_h = blk.node(i).child();
        }
    }

    /// Position of the entry comparator-equal to `key`, if present.
    pub(crate) fn find(&self, key: &K) -> Option<(Handle, usize)> {
        let (blk_h, i) = self.lower_bound(key);
        let blk = self.blks.get(blk_h);
        if i < blk.n() && self.compar.equiv(blk.node(i).key(), key) {
            Some((blk_h, i))
        } else {
            None
        }
    }

    /// Replaces the key of the entry comparator-equal to `old` with `new`,
    /// rewriting the separators along the descent to match.
    ///
    /// The caller guarantees `new` occupies the same position in the order
    /// as `old` did. Panics if `old` is not present.
    pub(crate) fn update_key(&mut self, old: &K, new: K) {
        let mut blk_h = self.head;
        loop {
            let blk = self.blks.get(blk_h);
            let i = blk.lower_bound_index(old, &self.compar);
            assert!(i < blk.n(), "update of a key that is not present");

            if blk.is_leaf() {
                assert!(
                    self.compar.equiv(blk.node(i).key(), old),
                    "update of a key that is not present"
                );
                self.blks.get_mut(blk_h).node_mut(i).set_key(new);
                return;
            }

            // The separator is rewritten when it named the old key, or when
            // the new key extends this subtree's maximum.
            let node = blk.node(i);
            let rewrite = self.compar.equiv(node.key(), old) || self.compar.less(node.key(), &new);
            let child_h = node.child();
            if rewrite {
                self.blks.get_mut(blk_h).node_mut(i).set_key(new.clone());
            }
            blk_h = child_h;
        }
    }
}
