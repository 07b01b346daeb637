//! Small tier: one sorted flex of `(score, member)` pairs.

use crate::compare::RangeSpec;
use crate::entries::{self, Direct, Entry, Middle};
use crate::error::Error;
use crate::flex::{encoded_len, Cursor, Flex};
use crate::scalar::{Scalar, ScalarRef};
use crate::tier::TierOps;

#[derive(Clone, Debug, Default)]
pub struct Small {
    map: Flex,
    middle: Option<Middle>,
}

impl Small {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_flex(map: Flex) -> Self {
        let middle = Middle::of(&map);
        Self { map, middle }
    }

    #[inline]
    pub(crate) fn flex(&self) -> &Flex {
        &self.map
    }

    pub(crate) fn into_flex(self) -> Flex {
        self.map
    }

    #[inline]
    fn refresh(&mut self) {
        self.middle = Middle::of(&self.map);
    }

    /// Makes sure one more pair fits without reallocating.
    pub(crate) fn reserve_pair(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<(), Error> {
        self.map.try_reserve(encoded_len(score) + encoded_len(member))
    }

    /// Head entry, used by the medium tier to route inserts.
    pub(crate) fn head(&self) -> Option<(ScalarRef<'_>, ScalarRef<'_>)> {
        entries::head(&self.map).map(|c| entries::pair(&self.map, c))
    }

    fn find(&self, member: ScalarRef<'_>) -> Option<(usize, Cursor)> {
        entries::find_member(&self.map, member, &Direct)
    }

    /// Splits at the middle entry into a lower and an upper half.
    pub(crate) fn split(mut self) -> (Small, Small) {
        let upper = match self.middle {
            Some(m) => self.map.split_off(m.cursor),
            None => Flex::new(),
        };
        (Small::from_flex(self.map), Small::from_flex(upper))
    }

    pub(crate) fn describe(&self) -> String {
        format!("flex bytes={} entries={}", self.map.bytes(), self.count())
    }
}

impl TierOps for Small {
    #[inline]
    fn count(&self) -> usize {
        entries::entries(&self.map)
    }

    #[inline]
    fn bytes(&self) -> usize {
        self.map.bytes()
    }

    fn get_score(&self, member: ScalarRef<'_>) -> Option<Scalar> {
        let (_, c) = self.find(member)?;
        Some(entries::score_at(&self.map, c).to_owned())
    }

    fn insert_new(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<(), Error> {
        entries::insert(&mut self.map, self.middle, score, member, member, &Direct)?;
        self.refresh();
        Ok(())
    }

    fn replace(&mut self, member: ScalarRef<'_>, _old: &Scalar, new: ScalarRef<'_>) -> Result<(), Error> {
        self.reserve_pair(new, member)?;
        if let Some((_, c)) = self.find(member) {
            entries::delete(&mut self.map, c);
            self.refresh();
        }
        self.insert_new(new, member)
    }

    fn take(&mut self, member: ScalarRef<'_>) -> Option<Scalar> {
        let (_, c) = self.find(member)?;
        let score = entries::score_at(&self.map, c).to_owned();
        entries::delete(&mut self.map, c);
        self.refresh();
        Some(score)
    }

    fn get_rank(&self, member: ScalarRef<'_>) -> Option<usize> {
        self.find(member).map(|(rank, _)| rank)
    }

    fn entry_at(&self, rank: usize) -> Option<Entry> {
        let c = entries::cursor_at_rank(&self.map, rank, self.middle)?;
        Some(entries::entry_at(&self.map, c, &Direct))
    }

    fn entries_between(&self, start: usize, stop: usize) -> Vec<Entry> {
        let mut out = Vec::with_capacity(stop.saturating_sub(start) + 1);
        let mut cur = entries::cursor_at_rank(&self.map, start, self.middle);
        while let Some(c) = cur {
            if out.len() > stop - start {
                break;
            }
            out.push(entries::entry_at(&self.map, c, &Direct));
            cur = entries::next_entry(&self.map, c);
        }
        out
    }

    fn rank_at_score(&self, score: ScalarRef<'_>) -> Option<usize> {
        entries::first_at_score(&self.map, score, self.middle).map(|(rank, _)| rank)
    }

    fn count_by_score(&self, range: &RangeSpec) -> usize {
        if range.is_empty() {
            return 0;
        }
        entries::count_in_range(&self.map, range, self.middle)
    }

    fn remove_range_by_score(&mut self, range: &RangeSpec) -> usize {
        if range.is_empty() {
            return 0;
        }
        let Some((_, c)) = entries::first_in_range(&self.map, range, self.middle) else {
            return 0;
        };
        let n = entries::run_length_in_range(&self.map, c, range);
        self.map.delete_count(c, n * entries::PER_ENTRY);
        self.refresh();
        n
    }

    fn remove_ranks(&mut self, start: usize, stop: usize) -> usize {
        let Some(c) = entries::cursor_at_rank(&self.map, start, self.middle) else {
            return 0;
        };
        let n = (stop - start + 1).min(self.count() - start);
        self.map.delete_count(c, n * entries::PER_ENTRY);
        self.refresh();
        n
    }

    fn reset(&mut self) {
        self.map.clear();
        self.middle = None;
    }
}
