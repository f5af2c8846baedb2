use crate::compare::Compare;

/// A half-open interval `[begin, end)` of `u64` offsets.
///
/// This is the key type the HTTP/3 layers above the container use for byte
/// ranges and packet-number spans. The container itself treats it as an
/// opaque key; the two shipped comparators give it an order.
///
/// # Examples
///
/// ```
/// use ksl_tree::KeyRange;
///
/// let r = KeyRange::new(10, 20);
/// assert_eq!(r.len(), 10);
/// assert!(r.overlaps(&KeyRange::new(15, 16)));
/// assert!(!r.overlaps(&KeyRange::new(20, 30)));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct KeyRange {
    /// First offset covered by the range.
    pub begin: u64,
    /// First offset past the range.
    pub end: u64,
}

impl KeyRange {
    /// Creates the range `[begin, end)`.
    #[must_use]
    pub const fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    /// Returns the number of offsets the range covers.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.begin
    }

    /// Returns `true` if the range covers nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Returns `true` if `self` and `other` share at least one offset.
    #[must_use]
    pub const fn overlaps(&self, other: &KeyRange) -> bool {
        let begin = if self.begin > other.begin { self.begin } else { other.begin };
        let end = if self.end < other.end { self.end } else { other.end };
        begin < end
    }
}

/// Orders ranges by `begin` alone.
///
/// Ranges sharing a `begin` are equivalent, whatever their `end`; callers
/// that store non-overlapping ranges use this as the container order.
///
/// # Examples
///
/// ```
/// use ksl_tree::{Compare, KeyRange, RangeCompare};
///
/// let a = KeyRange::new(0, 10);
/// let b = KeyRange::new(10, 20);
/// assert!(RangeCompare.less(&a, &b));
/// assert!(RangeCompare.equiv(&a, &KeyRange::new(0, 99)));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RangeCompare;

impl Compare<KeyRange> for RangeCompare {
    #[inline]
    fn less(&self, a: &KeyRange, b: &KeyRange) -> bool {
        a.begin < b.begin
    }
}

/// Orders ranges by `begin`, treating any two overlapping ranges as
/// equivalent.
///
/// Probing a tree of disjoint ranges with a point-sized range under this
/// comparator resolves to the stored range covering the point. This is not a
/// total order; it is only meaningful against a set of mutually disjoint
/// ranges.
///
/// # Examples
///
/// ```
/// use ksl_tree::{Compare, KeyRange, RangeExclusiveCompare};
///
/// let stored = KeyRange::new(10, 20);
/// let probe = KeyRange::new(15, 16);
/// assert!(RangeExclusiveCompare.equiv(&stored, &probe));
/// assert!(RangeExclusiveCompare.less(&KeyRange::new(0, 10), &probe));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RangeExclusiveCompare;

impl Compare<KeyRange> for RangeExclusiveCompare {
    #[inline]
    fn less(&self, a: &KeyRange, b: &KeyRange) -> bool {
        a.begin < b.begin && !a.overlaps(b)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn range_len() {
        assert_eq!(KeyRange::new(3, 10).len(), 7);
        assert!(KeyRange::new(5, 5).is_empty());
    }

    #[test]
    fn exclusive_compar_resolves_overlap() {
        let stored = KeyRange::new(10, 20);
        assert!(RangeExclusiveCompare.equiv(&stored, &KeyRange::new(15, 16)));
        assert!(RangeExclusiveCompare.equiv(&stored, &KeyRange::new(10, 11)));
        assert!(RangeExclusiveCompare.equiv(&stored, &KeyRange::new(19, 20)));
        assert!(RangeExclusiveCompare.less(&stored, &KeyRange::new(20, 21)));
        assert!(!RangeExclusiveCompare.less(&stored, &KeyRange::new(9, 10)));
    }

    fn range_strategy() -> impl Strategy<Value = KeyRange> {
        (0u64..1_000, 1u64..100).prop_map(|(begin, len)| KeyRange::new(begin, begin + len))
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in range_strategy(), b in range_strategy()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        /// Overlapping ranges must compare equivalent in both directions under
        /// the exclusive comparator.
        #[test]
        fn exclusive_equiv_covers_overlap(a in range_strategy(), b in range_strategy()) {
            if a.overlaps(&b) {
                prop_assert!(RangeExclusiveCompare.equiv(&a, &b));
            } else {
                prop_assert_eq!(RangeExclusiveCompare.less(&a, &b), a.begin < b.begin);
            }
        }
    }
}
