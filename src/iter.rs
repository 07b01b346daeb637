//! Forward and reverse iteration over any tier.
//!
//! The iterator walks the runs of a tier in order and hands out owned
//! [`Entry`] copies. Compressed runs are inflated one at a time as the
//! iterator reaches them. A shared pool is locked per step, never for the
//! iterator's whole life.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::entries::{self, Direct, Entry, PER_ENTRY};
use crate::flex::{Cursor, Flex};
use crate::mflex::MFlex;
use crate::pool::PoolHandle;

pub(crate) enum Runs<'a> {
    Flat(SmallVec<[&'a Flex; 2]>),
    Packed(&'a [MFlex]),
}

impl<'a> Runs<'a> {
    fn len(&self) -> usize {
        match self {
            Runs::Flat(flat) => flat.len(),
            Runs::Packed(runs) => runs.len(),
        }
    }

    fn entries(&self, i: usize) -> usize {
        match self {
            Runs::Flat(flat) => entries::entries(flat[i]),
            Runs::Packed(runs) => runs[i].count() / PER_ENTRY,
        }
    }

    fn load(&self, i: usize) -> Cow<'a, Flex> {
        match *self {
            Runs::Flat(ref flat) => Cow::Borrowed(flat[i]),
            Runs::Packed(runs) => runs[i].view(),
        }
    }
}

pub struct Iter<'a> {
    runs: Runs<'a>,
    pool: Option<&'a PoolHandle>,
    forward: bool,
    run: usize,
    current: Option<Cow<'a, Flex>>,
    cursor: Option<Cursor>,
    remaining: usize,
}

impl<'a> Iter<'a> {
    /// Starts at `rank` (already normalized); `None` yields nothing.
    pub(crate) fn new(runs: Runs<'a>, pool: Option<&'a PoolHandle>, rank: Option<usize>, forward: bool) -> Self {
        let mut it = Iter {
            runs,
            pool,
            forward,
            run: 0,
            current: None,
            cursor: None,
            remaining: 0,
        };
        let Some(rank) = rank else {
            return it;
        };
        let mut local = rank;
        let mut offset = 0;
        for i in 0..it.runs.len() {
            let n = it.runs.entries(i);
            if local < n {
                let flex = it.runs.load(i);
                it.cursor = entries::cursor_at_rank(&flex, local, None);
                it.current = Some(flex);
                it.run = i;
                let total: usize = (0..it.runs.len()).map(|j| it.runs.entries(j)).sum();
                let rank = offset + local;
                it.remaining = if forward { total - rank } else { rank + 1 };
                break;
            }
            local -= n;
            offset += n;
        }
        it
    }

    fn advance_run(&mut self) -> bool {
        if self.forward {
            if self.run + 1 >= self.runs.len() {
                return false;
            }
            self.run += 1;
        } else {
            if self.run == 0 {
                return false;
            }
            self.run -= 1;
        }
        let flex = self.runs.load(self.run);
        self.cursor = if self.forward {
            entries::head(&flex)
        } else {
            entries::tail(&flex)
        };
        self.current = Some(flex);
        true
    }
}

impl Iterator for Iter<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let flex = self.current.as_deref()?;
            if let Some(c) = self.cursor {
                let entry = match self.pool {
                    Some(pool) => entries::entry_at(flex, c, &*pool.read()),
                    None => entries::entry_at(flex, c, &Direct),
                };
                self.cursor = if self.forward {
                    entries::next_entry(flex, c)
                } else {
                    entries::prev_entry(flex, c)
                };
                self.remaining = self.remaining.saturating_sub(1);
                return Some(entry);
            }
            if !self.advance_run() {
                self.current = None;
                return None;
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::{Scalar, ScalarRef};

    fn run(scores: std::ops::Range<i64>) -> Flex {
        let mut f = Flex::new();
        for s in scores {
            let m = format!("m{s}");
            f.push_back(&[ScalarRef::I64(s), ScalarRef::Bytes(m.as_bytes())]).unwrap();
        }
        f
    }

    fn scores(it: Iter<'_>) -> Vec<i64> {
        it.map(|e| match e.score {
            Scalar::I64(v) => v,
            other => panic!("unexpected {other:?}"),
        })
        .collect()
    }

    #[test]
    fn crosses_runs_both_ways() {
        let (a, b) = (run(0..3), run(3..5));
        let flat = || Runs::Flat(SmallVec::from_slice(&[&a, &b]));
        assert_eq!(scores(Iter::new(flat(), None, Some(0), true)), vec![0, 1, 2, 3, 4]);
        assert_eq!(scores(Iter::new(flat(), None, Some(4), false)), vec![4, 3, 2, 1, 0]);
        assert_eq!(scores(Iter::new(flat(), None, Some(2), true)), vec![2, 3, 4]);
        assert_eq!(scores(Iter::new(flat(), None, Some(3), false)), vec![3, 2, 1, 0]);
        assert_eq!(Iter::new(flat(), None, Some(1), true).len(), 4);
        assert!(Iter::new(flat(), None, Some(5), true).next().is_none());
        assert!(Iter::new(flat(), None, None, true).next().is_none());
    }

    #[test]
    fn skips_empty_runs() {
        let (a, empty, b) = (run(0..2), Flex::new(), run(2..4));
        let flat = Runs::Flat(SmallVec::from_slice(&[&a, &empty, &b]));
        assert_eq!(scores(Iter::new(flat, None, Some(0), true)), vec![0, 1, 2, 3]);
    }

    #[test]
    fn inflates_packed_runs() {
        let mut packed = MFlex::from(run(0..200));
        packed.close(true);
        assert!(packed.is_compressed());
        let runs = vec![MFlex::from(run(-2..0)), packed];
        let got = scores(Iter::new(Runs::Packed(&runs), None, Some(0), true));
        assert_eq!(got, (-2..200).collect::<Vec<_>>());
    }
}
