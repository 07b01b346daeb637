#![deny(clippy::uninlined_format_args)]
#![deny(clippy::to_string_in_format_args)]
//! A tiered in-memory ordered set.
//!
//! Members (byte strings or numbers) map to numeric scores and are kept in
//! `(score, member)` order. Small sets live in one packed byte buffer, medium
//! sets in two, and large sets in a hash index plus a list of sorted runs
//! that may be zstd-compressed and may store members through an interning
//! pool.
//!
//! ```
//! use flexzset::{OrderedSet, RangeSpec};
//!
//! let mut set = OrderedSet::new();
//! set.add(1.0, "a");
//! set.add(2.0, "b");
//! assert_eq!(set.get_rank("b"), Some(1));
//! assert_eq!(set.count_by_score(&RangeSpec::inclusive(0, 1)), 1);
//! ```

pub mod algebra;
pub mod compare;
pub mod config;
pub mod entries;
pub mod error;
pub mod flex;
pub mod format;
mod full;
pub mod iter;
mod medium;
mod member_index;
pub mod mflex;
pub mod pool;
pub mod sample;
pub mod scalar;
pub mod set;
mod small;
mod tier;

pub use algebra::{difference, intersect, intersect_card, union, Aggregate};
pub use compare::{compare, RangeSpec};
pub use config::{Config, PoolKind, SizeLimit};
pub use entries::Entry;
pub use error::{Error, Result};
pub use iter::Iter;
pub use pool::{shared_pool, InternPool, PoolBackend, SharedPool};
pub use scalar::{Scalar, ScalarRef};
pub use set::{OrderedSet, Policy, RunSummary, Stats, TierKind};
