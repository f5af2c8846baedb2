/// A strict weak order over keys of type `K`.
///
/// The single primitive is [`less`](Compare::less); equivalence is derived
/// from it, so implementations never need a three-way comparison. A
/// comparator is stored in the container at construction time and shared by
/// every structural operation.
///
/// Unlike an [`Ord`] bound, a comparator may treat distinct keys as
/// equivalent. [`RangeExclusiveCompare`](crate::RangeExclusiveCompare) relies
/// on this to resolve a point probe to the stored range that covers it.
///
/// # Examples
///
/// ```
/// use ksl_tree::Compare;
///
/// /// Orders `u64` keys by their low 32 bits.
/// struct LowBits;
///
/// impl Compare<u64> for LowBits {
///     fn less(&self, a: &u64, b: &u64) -> bool {
///         (a & 0xffff_ffff) < (b & 0xffff_ffff)
///     }
/// }
///
/// assert!(LowBits.less(&0xf_0000_0001, &2));
/// assert!(LowBits.equiv(&0xa_0000_0007, &0xb_0000_0007));
/// ```
pub trait Compare<K> {
    /// Returns `true` iff `a` is ordered strictly before `b`.
    fn less(&self, a: &K, b: &K) -> bool;

    /// Returns `true` iff `a` and `b` are equivalent under this order.
    fn equiv(&self, a: &K, b: &K) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }
}

/// The default comparator: the key type's own [`Ord`].
///
/// # Examples
///
/// ```
/// use ksl_tree::{Compare, OrdCompare};
///
/// assert!(OrdCompare.less(&1, &2));
/// assert!(!OrdCompare.less(&2, &2));
/// assert!(OrdCompare.equiv(&2, &2));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct OrdCompare;

impl<K: Ord> Compare<K> for OrdCompare {
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        a < b
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ord_compare_matches_ord(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(OrdCompare.less(&a, &b), a < b);
            prop_assert_eq!(OrdCompare.equiv(&a, &b), a == b);
        }
    }
}
