//! Contract every tier implements.
//!
//! Tiers provide the storage primitives; the update rules (`add` and its
//! NX/XX/previous-score variants, `incr_by`, pops) are written once here in
//! terms of those primitives so the three layouts cannot drift apart.

use std::cmp::Ordering;

use crate::compare::{compare, RangeSpec};
use crate::entries::Entry;
use crate::error::Error;
use crate::scalar::{add_scores, Scalar, ScalarRef};

pub(crate) trait TierOps {
    fn count(&self) -> usize;
    fn bytes(&self) -> usize;

    fn get_score(&self, member: ScalarRef<'_>) -> Option<Scalar>;
    /// Inserts a member known to be absent.
    fn insert_new(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<(), Error>;
    /// Moves a present member from `old` to `new`.
    fn replace(&mut self, member: ScalarRef<'_>, old: &Scalar, new: ScalarRef<'_>) -> Result<(), Error>;
    /// Removes a member, returning its score.
    fn take(&mut self, member: ScalarRef<'_>) -> Option<Scalar>;

    fn get_rank(&self, member: ScalarRef<'_>) -> Option<usize>;
    /// Entry at a rank already mapped onto `0..count`.
    fn entry_at(&self, rank: usize) -> Option<Entry>;
    /// Entries of ranks `start..=stop`, in order.
    fn entries_between(&self, start: usize, stop: usize) -> Vec<Entry>;
    /// Rank of the first entry with score `>= score`.
    fn rank_at_score(&self, score: ScalarRef<'_>) -> Option<usize>;

    fn count_by_score(&self, range: &RangeSpec) -> usize;
    fn remove_range_by_score(&mut self, range: &RangeSpec) -> usize;
    /// Removes ranks `start..=stop`; both already normalized.
    fn remove_ranks(&mut self, start: usize, stop: usize) -> usize;
    /// Empties the tier without changing its layout.
    fn reset(&mut self);

    #[inline]
    fn exists(&self, member: ScalarRef<'_>) -> bool {
        self.get_score(member).is_some()
    }

    /// Returns whether `member` was already present.
    fn add(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<bool, Error> {
        Ok(self.add_get_previous(score, member)?.is_some())
    }

    fn add_get_previous(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<Option<Scalar>, Error> {
        match self.get_score(member) {
            Some(old) => {
                if compare(old.as_ref(), score) != Ordering::Equal {
                    self.replace(member, &old, score)?;
                }
                Ok(Some(old))
            }
            None => {
                self.insert_new(score, member)?;
                Ok(None)
            }
        }
    }

    /// Inserts only when absent; true when inserted.
    fn add_nx(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<bool, Error> {
        if self.exists(member) {
            return Ok(false);
        }
        self.insert_new(score, member)?;
        Ok(true)
    }

    /// Updates only when present; true when updated.
    fn add_xx(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<bool, Error> {
        match self.get_score(member) {
            Some(old) => {
                if compare(old.as_ref(), score) != Ordering::Equal {
                    self.replace(member, &old, score)?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// `Ok(None)` when the current score or `delta` is not numeric.
    fn incr_by(&mut self, delta: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<Option<Scalar>, Error> {
        if !delta.is_numeric() {
            return Ok(None);
        }
        match self.get_score(member) {
            Some(old) => {
                let Some(new) = add_scores(old.as_ref(), delta) else {
                    return Ok(None);
                };
                if compare(old.as_ref(), new.as_ref()) != Ordering::Equal {
                    self.replace(member, &old, new.as_ref())?;
                }
                Ok(Some(new))
            }
            None => {
                self.insert_new(delta, member)?;
                Ok(Some(delta.to_owned()))
            }
        }
    }

    fn pop_min(&mut self, n: usize) -> Vec<Entry> {
        let n = n.min(self.count());
        if n == 0 {
            return Vec::new();
        }
        let out = self.entries_between(0, n - 1);
        self.remove_ranks(0, n - 1);
        out
    }

    /// Highest entry first.
    fn pop_max(&mut self, n: usize) -> Vec<Entry> {
        let count = self.count();
        let n = n.min(count);
        if n == 0 {
            return Vec::new();
        }
        let mut out = self.entries_between(count - n, count - 1);
        self.remove_ranks(count - n, count - 1);
        out.reverse();
        out
    }
}
