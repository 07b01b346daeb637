//! `(score, member)` pairs laid out as two consecutive flex elements.
//!
//! Shared by every tier. A run stores members either as given or, in the
//! full tier with a pool, as `Ptr(id)`; a [`Resolve`] turns the stored form
//! back into the member so ordering always follows the real member value.

use std::cmp::Ordering;

use crate::compare::{compare, compare_entry, RangeSpec};
use crate::error::Error;
use crate::flex::{Cursor, Flex, Probe};
use crate::pool::InternPool;
use crate::scalar::{Scalar, ScalarRef};

/// Flex elements per entry.
pub const PER_ENTRY: usize = 2;

/// One entry handed back to callers. Always an owned copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub member: Scalar,
    pub score: Scalar,
}

impl Entry {
    pub fn new(member: impl Into<Scalar>, score: impl Into<Scalar>) -> Self {
        Self {
            member: member.into(),
            score: score.into(),
        }
    }
}

pub trait Resolve {
    fn resolve<'a>(&'a self, stored: ScalarRef<'a>) -> ScalarRef<'a>;
}

/// Members stored as themselves.
pub struct Direct;

impl Resolve for Direct {
    #[inline]
    fn resolve<'a>(&'a self, stored: ScalarRef<'a>) -> ScalarRef<'a> {
        stored
    }
}

impl Resolve for dyn InternPool + Send {
    #[inline]
    fn resolve<'a>(&'a self, stored: ScalarRef<'a>) -> ScalarRef<'a> {
        match stored {
            ScalarRef::Ptr(id) => match self.lookup(id) {
                Some(bytes) => ScalarRef::Bytes(bytes),
                None => panic!("member id {id} is not in the intern pool"),
            },
            other => other,
        }
    }
}

/// Resolves through the pool when there is one.
impl<P: Resolve + ?Sized> Resolve for Option<&P> {
    #[inline]
    fn resolve<'a>(&'a self, stored: ScalarRef<'a>) -> ScalarRef<'a> {
        match self {
            Some(pool) => pool.resolve(stored),
            None => stored,
        }
    }
}

/// Cached cursor to the middle entry of a run, with its element position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Middle {
    pub index: usize,
    pub cursor: Cursor,
}

impl Middle {
    pub fn of(flex: &Flex) -> Option<Middle> {
        flex.middle(PER_ENTRY).map(|cursor| Middle {
            index: flex.middle_position(PER_ENTRY),
            cursor,
        })
    }

    #[inline]
    fn hint(middle: Option<Middle>) -> Option<(usize, Cursor)> {
        middle.map(|m| (m.index, m.cursor))
    }
}

/// Maps a possibly negative rank onto `0..count`.
#[inline]
pub fn normalize_rank(rank: i64, count: usize) -> Option<usize> {
    let rank = if rank < 0 { count as i64 + rank } else { rank };
    (rank >= 0 && (rank as usize) < count).then_some(rank as usize)
}

#[inline]
pub fn entries(flex: &Flex) -> usize {
    flex.count() / PER_ENTRY
}

#[inline]
fn member_cursor(flex: &Flex, c: Cursor) -> Cursor {
    match flex.next(c) {
        Some(m) => m,
        None => panic!("flex holds a score without a member at {}", c.offset()),
    }
}

/// Score and stored member of the entry at `c`.
#[inline]
pub fn pair(flex: &Flex, c: Cursor) -> (ScalarRef<'_>, ScalarRef<'_>) {
    (flex.get(c), flex.get(member_cursor(flex, c)))
}

#[inline]
pub fn score_at(flex: &Flex, c: Cursor) -> ScalarRef<'_> {
    flex.get(c)
}

pub fn entry_at<R: Resolve + ?Sized>(flex: &Flex, c: Cursor, r: &R) -> Entry {
    let (score, stored) = pair(flex, c);
    Entry {
        member: r.resolve(stored).to_owned(),
        score: score.to_owned(),
    }
}

#[inline]
pub fn next_entry(flex: &Flex, c: Cursor) -> Option<Cursor> {
    flex.next(member_cursor(flex, c))
}

#[inline]
pub fn prev_entry(flex: &Flex, c: Cursor) -> Option<Cursor> {
    flex.step(c, -(PER_ENTRY as isize))
}

#[inline]
pub fn head(flex: &Flex) -> Option<Cursor> {
    flex.head()
}

#[inline]
pub fn tail(flex: &Flex) -> Option<Cursor> {
    flex.index(-(PER_ENTRY as isize))
}

/// Cursor of the entry at `rank` (already normalized).
pub fn cursor_at_rank(flex: &Flex, rank: usize, middle: Option<Middle>) -> Option<Cursor> {
    flex.index_near((rank * PER_ENTRY) as isize, Middle::hint(middle))
}

/// Linear scan for `member`; returns its rank and cursor.
pub fn find_member<R: Resolve + ?Sized>(
    flex: &Flex,
    member: ScalarRef<'_>,
    r: &R,
) -> Option<(usize, Cursor)> {
    let mut cur = flex.head();
    let mut rank = 0;
    while let Some(c) = cur {
        let m = member_cursor(flex, c);
        if compare(r.resolve(flex.get(m)), member) == Ordering::Equal {
            return Some((rank, c));
        }
        rank += 1;
        cur = flex.next(m);
    }
    None
}

/// Sorted search for the exact `(score, member)` entry or its insert point.
pub fn probe<R: Resolve + ?Sized>(
    flex: &Flex,
    middle: Option<Middle>,
    score: ScalarRef<'_>,
    member: ScalarRef<'_>,
    r: &R,
) -> Probe {
    flex.find_sorted_with_middle(PER_ENTRY, middle.map(|m| m.cursor), |c| {
        let (s, stored) = pair(flex, c);
        compare_entry(s, r.resolve(stored), score, member)
    })
}

/// Rank of the exact `(score, member)` entry within `flex`.
pub fn rank_of<R: Resolve + ?Sized>(
    flex: &Flex,
    middle: Option<Middle>,
    score: ScalarRef<'_>,
    member: ScalarRef<'_>,
    r: &R,
) -> Option<usize> {
    let cmp = |c: Cursor| {
        let (s, stored) = pair(flex, c);
        compare_entry(s, r.resolve(stored), score, member)
    };
    let (mut rank, mut cur) = match middle {
        Some(m) if cmp(m.cursor) != Ordering::Greater => (m.index / PER_ENTRY, Some(m.cursor)),
        _ => (0, flex.head()),
    };
    while let Some(c) = cur {
        match cmp(c) {
            Ordering::Less => {}
            Ordering::Equal => return Some(rank),
            Ordering::Greater => return None,
        }
        rank += 1;
        cur = next_entry(flex, c);
    }
    None
}

/// Inserts `(score, stored)` in sorted position; `member` is the resolved
/// form of `stored` used for ordering.
pub fn insert<R: Resolve + ?Sized>(
    flex: &mut Flex,
    middle: Option<Middle>,
    score: ScalarRef<'_>,
    stored: ScalarRef<'_>,
    member: ScalarRef<'_>,
    r: &R,
) -> Result<Cursor, Error> {
    match probe(flex, middle, score, member, r) {
        Probe::Found(c) | Probe::Before(c) => flex.insert_before(c, &[score, stored]),
        Probe::End => flex.push_back(&[score, stored]),
    }
}

/// Deletes the entry at `c`; returns the cursor of the following entry.
#[inline]
pub fn delete(flex: &mut Flex, c: Cursor) -> Option<Cursor> {
    flex.delete_count(c, PER_ENTRY)
}

/// First entry whose score is not below `range`'s minimum, with its rank.
pub fn first_in_range(flex: &Flex, range: &RangeSpec, middle: Option<Middle>) -> Option<(usize, Cursor)> {
    let below = |c: Cursor| !range.above_min(score_at(flex, c));
    let (mut rank, mut cur) = match middle {
        Some(m) if below(m.cursor) => (m.index / PER_ENTRY, Some(m.cursor)),
        _ => (0, flex.head()),
    };
    while let Some(c) = cur {
        if !below(c) {
            return range.below_max(score_at(flex, c)).then_some((rank, c));
        }
        rank += 1;
        cur = next_entry(flex, c);
    }
    None
}

/// First entry with score `>= score`, with its rank.
pub fn first_at_score(flex: &Flex, score: ScalarRef<'_>, middle: Option<Middle>) -> Option<(usize, Cursor)> {
    let range = RangeSpec {
        min: score.to_owned(),
        max: Scalar::F64(f64::NAN),
        min_exclusive: false,
        max_exclusive: false,
    };
    first_in_range(flex, &range, middle)
}

/// Number of consecutive in-range entries starting at `c`.
pub fn run_length_in_range(flex: &Flex, mut c: Cursor, range: &RangeSpec) -> usize {
    let mut n = 0;
    loop {
        if !range.below_max(score_at(flex, c)) {
            return n;
        }
        n += 1;
        match next_entry(flex, c) {
            Some(next) => c = next,
            None => return n,
        }
    }
}

pub fn count_in_range(flex: &Flex, range: &RangeSpec, middle: Option<Middle>) -> usize {
    match first_in_range(flex, range, middle) {
        Some((_, c)) => run_length_in_range(flex, c, range),
        None => 0,
    }
}

/// Appends every entry of `flex` to `out` in order.
pub fn collect<R: Resolve + ?Sized>(flex: &Flex, r: &R, out: &mut Vec<Entry>) {
    let mut cur = flex.head();
    while let Some(c) = cur {
        out.push(entry_at(flex, c, r));
        cur = next_entry(flex, c);
    }
}
