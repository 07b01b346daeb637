//! Medium tier: two sorted runs, every entry of the lower run ordered before
//! every entry of the upper run.

use std::cmp::Ordering;

use crate::compare::{compare_entry, RangeSpec};
use crate::entries::Entry;
use crate::error::Error;
use crate::flex::Flex;
use crate::scalar::{Scalar, ScalarRef};
use crate::small::Small;
use crate::tier::TierOps;

#[derive(Clone, Debug, Default)]
pub struct Medium {
    runs: [Small; 2],
}

impl Medium {
    /// Splits a small tier at its middle entry.
    pub(crate) fn from_small(small: Small) -> Self {
        let (lo, hi) = small.split();
        Self { runs: [lo, hi] }
    }

    pub(crate) fn runs(&self) -> [&Flex; 2] {
        [self.runs[0].flex(), self.runs[1].flex()]
    }

    pub(crate) fn into_runs(self) -> [Flex; 2] {
        let [lo, hi] = self.runs;
        [lo.into_flex(), hi.into_flex()]
    }

    /// Run a new entry belongs to: the lower one unless it sorts at or after
    /// the head of the upper run.
    fn route(&self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> usize {
        match self.runs[1].head() {
            Some((s, m)) if compare_entry(score, member, s, m) != Ordering::Less => 1,
            _ => 0,
        }
    }

    fn owner(&self, member: ScalarRef<'_>) -> Option<usize> {
        (0..2).find(|&i| self.runs[i].exists(member))
    }

    pub(crate) fn describe(&self) -> Vec<String> {
        self.runs.iter().map(Small::describe).collect()
    }
}

impl TierOps for Medium {
    #[inline]
    fn count(&self) -> usize {
        self.runs[0].count() + self.runs[1].count()
    }

    #[inline]
    fn bytes(&self) -> usize {
        self.runs[0].bytes() + self.runs[1].bytes()
    }

    fn get_score(&self, member: ScalarRef<'_>) -> Option<Scalar> {
        self.runs[0]
            .get_score(member)
            .or_else(|| self.runs[1].get_score(member))
    }

    fn insert_new(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<(), Error> {
        let i = self.route(score, member);
        self.runs[i].insert_new(score, member)
    }

    fn replace(&mut self, member: ScalarRef<'_>, _old: &Scalar, new: ScalarRef<'_>) -> Result<(), Error> {
        // Either run may receive the entry once the old one is gone.
        self.runs[0].reserve_pair(new, member)?;
        self.runs[1].reserve_pair(new, member)?;
        if let Some(i) = self.owner(member) {
            self.runs[i].take(member);
        }
        self.insert_new(new, member)
    }

    fn take(&mut self, member: ScalarRef<'_>) -> Option<Scalar> {
        self.runs[0].take(member).or_else(|| self.runs[1].take(member))
    }

    fn get_rank(&self, member: ScalarRef<'_>) -> Option<usize> {
        self.runs[0]
            .get_rank(member)
            .or_else(|| Some(self.runs[0].count() + self.runs[1].get_rank(member)?))
    }

    fn entry_at(&self, rank: usize) -> Option<Entry> {
        let lo = self.runs[0].count();
        if rank < lo {
            self.runs[0].entry_at(rank)
        } else {
            self.runs[1].entry_at(rank - lo)
        }
    }

    fn entries_between(&self, start: usize, stop: usize) -> Vec<Entry> {
        let lo = self.runs[0].count();
        let mut out = Vec::new();
        if start < lo {
            out = self.runs[0].entries_between(start, stop.min(lo - 1));
        }
        if stop >= lo {
            out.extend(self.runs[1].entries_between(start.max(lo) - lo, stop - lo));
        }
        out
    }

    fn rank_at_score(&self, score: ScalarRef<'_>) -> Option<usize> {
        self.runs[0]
            .rank_at_score(score)
            .or_else(|| Some(self.runs[0].count() + self.runs[1].rank_at_score(score)?))
    }

    fn count_by_score(&self, range: &RangeSpec) -> usize {
        self.runs[0].count_by_score(range) + self.runs[1].count_by_score(range)
    }

    fn remove_range_by_score(&mut self, range: &RangeSpec) -> usize {
        self.runs[0].remove_range_by_score(range) + self.runs[1].remove_range_by_score(range)
    }

    fn remove_ranks(&mut self, start: usize, stop: usize) -> usize {
        let lo = self.runs[0].count();
        let mut removed = 0;
        // Upper run first so the lower run's ranks stay put.
        if stop >= lo {
            removed += self.runs[1].remove_ranks(start.max(lo) - lo, stop - lo);
        }
        if start < lo {
            removed += self.runs[0].remove_ranks(start, stop.min(lo - 1));
        }
        removed
    }

    fn reset(&mut self) {
        self.runs[0].reset();
        self.runs[1].reset();
    }
}
