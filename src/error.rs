use core::fmt;

/// The error returned when the tree cannot allocate another slot.
///
/// This is the only failure the container surfaces, and only
/// [`insert`](crate::KslMap::insert) can report it: every other operation
/// either reads, or shrinks the tree. It corresponds to exhausting the
/// handle space of the backing arenas.
///
/// # Examples
///
/// ```
/// use ksl_tree::KslMap;
///
/// let mut map: KslMap<u64, &str> = KslMap::new();
/// assert!(map.insert(3, "stream").is_ok());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OutOfMemory;

impl fmt::Display for OutOfMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("keyed skip list is out of memory")
    }
}

impl core::error::Error for OutOfMemory {}
