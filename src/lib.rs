//! Keyed-skip-list collections for Rust.
//!
//! This crate provides [`KslMap`], an ordered associative container shaped
//! like a B+tree and tuned for the bookkeeping a QUIC/HTTP3 stack does:
//! small-to-medium sets of stream ids, byte ranges, and packet numbers that
//! need fast lookup, ordered range iteration, insertion, deletion, and
//! in-place key updates.
//!
//! # Example
//!
//! ```
//! use ksl_tree::KslMap;
//!
//! let mut offsets: KslMap<u64, &str> = KslMap::new();
//! offsets.insert(100, "headers").unwrap();
//! offsets.insert(0, "settings").unwrap();
//! offsets.insert(250, "body").unwrap();
//!
//! // First frame at or past offset 50.
//! let it = offsets.lower_bound(&50);
//! assert_eq!(*it.key(), 100);
//! assert_eq!(*it.value(), "headers");
//!
//! let (removed, successor) = offsets.remove(&100);
//! assert_eq!(removed, "headers");
//! assert_eq!(*successor.key(), 250);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library
//!   dependency
//! - **Comparator-driven** - Ordering comes from a [`Compare`] instance, not
//!   an [`Ord`] bound, so overlap-equivalent range orders like
//!   [`RangeExclusiveCompare`] are expressible
//! - **O(1) ordered stepping** - Leaves form a doubly linked chain, so
//!   cursors and iterators never re-descend the tree
//! - **Single-pass mutations** - Inserts split full blocks and removals
//!   refill minimum blocks on the way down; no operation needs an upward
//!   rebalance pass
//!
//! # Implementation
//!
//! Blocks are fixed-capacity node arrays stored in a handle-based arena, with
//! user data in a second arena so searches touch only keys. Internal blocks
//! hold separator keys equal to the maximum key of the child subtree, which
//! makes separator maintenance a purely top-down affair. The only fallible
//! operation is [`KslMap::insert`], which reports [`OutOfMemory`] when the
//! arenas run out of handle space.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod compare;
mod error;
mod range;
mod raw;

pub mod ksl_map;

pub use compare::{Compare, OrdCompare};
pub use error::OutOfMemory;
pub use ksl_map::KslMap;
pub use range::{KeyRange, RangeCompare, RangeExclusiveCompare};
