//! Full tier: a member → score index next to a list of sorted runs.
//!
//! Runs are disjoint and ordered: every entry of `runs[i]` sorts before every
//! entry of `runs[i + 1]`. Each run carries a [`RunMeta`] with its score
//! bounds, entry count and middle cursor so lookups binary-search the run list
//! and start in-run scans halfway. A run that outgrows the run capacity is
//! split in half; a run that empties is dropped unless it is the last one.
//!
//! With a pool, byte members are interned and runs hold `Ptr(id)` in their
//! place. The index always keys by the real member.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::compare::{compare, compare_entry, RangeSpec};
use crate::entries::{self, Entry, Middle, Resolve};
use crate::error::Error;
use crate::flex::{Flex, Probe};
use crate::member_index::MemberIndex;
use crate::mflex::MFlex;
use crate::pool::{AtomId, InternPool, PoolHandle};
use crate::scalar::{Scalar, ScalarRef};
use crate::tier::TierOps;

#[derive(Clone, Debug)]
pub struct RunMeta {
    pub min: Scalar,
    pub max: Scalar,
    pub count: usize,
    middle: Option<Middle>,
}

impl RunMeta {
    fn of(flex: &Flex) -> Self {
        let (min, max) = match (entries::head(flex), entries::tail(flex)) {
            (Some(h), Some(t)) => (
                entries::score_at(flex, h).to_owned(),
                entries::score_at(flex, t).to_owned(),
            ),
            _ => (Scalar::Null, Scalar::Null),
        };
        Self {
            min,
            max,
            count: entries::entries(flex),
            middle: Middle::of(flex),
        }
    }
}

fn fatal(e: Error) -> ! {
    panic!("full tier: {e}")
}

fn reserve_err(bytes: usize) -> Error {
    Error::AllocationFailed { bytes }
}

#[derive(Clone, Debug)]
struct Runs {
    runs: Vec<MFlex>,
    meta: Vec<RunMeta>,
    cap: usize,
    depth: usize,
}

impl Runs {
    fn new(cap: usize, depth: u8) -> Self {
        Self {
            runs: vec![MFlex::default()],
            meta: vec![RunMeta::of(&Flex::new())],
            cap,
            depth: depth as usize,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.runs.len()
    }

    fn bytes(&self) -> usize {
        self.runs.iter().map(MFlex::bytes).sum()
    }

    #[inline]
    fn view(&self, i: usize) -> Cow<'_, Flex> {
        self.runs[i].view()
    }

    fn prefix(&self, i: usize) -> usize {
        self.meta[..i].iter().map(|m| m.count).sum()
    }

    /// Run and in-run rank for a global rank.
    fn seek(&self, mut rank: usize) -> Option<(usize, usize)> {
        for (i, m) in self.meta.iter().enumerate() {
            if rank < m.count {
                return Some((i, rank));
            }
            rank -= m.count;
        }
        None
    }

    /// Interior runs, `depth` away from both ends, are kept compressed.
    #[inline]
    fn compressible(&self, i: usize) -> bool {
        self.depth > 0 && i >= self.depth && i + self.depth < self.runs.len()
    }

    fn recompress(&mut self) -> Result<(), Error> {
        if self.depth == 0 {
            return Ok(());
        }
        for i in 0..self.runs.len() {
            if self.compressible(i) {
                self.runs[i].close(true);
            } else if self.runs[i].is_compressed() {
                self.runs[i].open()?;
            }
        }
        Ok(())
    }

    /// True when every entry of run `i` sorts before `(score, member)`.
    fn run_below<R: Resolve + ?Sized>(
        &self,
        i: usize,
        score: ScalarRef<'_>,
        member: ScalarRef<'_>,
        r: &R,
    ) -> bool {
        match compare(self.meta[i].max.as_ref(), score) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => {
                let flex = self.view(i);
                let Some(t) = entries::tail(&flex) else {
                    return true;
                };
                let (s, stored) = entries::pair(&flex, t);
                compare_entry(s, r.resolve(stored), score, member) == Ordering::Less
            }
        }
    }

    /// Run that holds, or should receive, `(score, member)`.
    fn locate<R: Resolve + ?Sized>(&self, score: ScalarRef<'_>, member: ScalarRef<'_>, r: &R) -> usize {
        let (mut lo, mut hi) = (0, self.runs.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.run_below(mid, score, member, r) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo.min(self.runs.len() - 1)
    }

    /// First run whose upper bound reaches `score`.
    fn first_reaching(&self, score: ScalarRef<'_>) -> usize {
        self.meta
            .partition_point(|m| m.count > 0 && compare(m.max.as_ref(), score) == Ordering::Less)
    }

    /// Opens run `i`, applies `f`, then refreshes, splits, drops or
    /// recompresses it.
    fn edit<T>(
        &mut self,
        i: usize,
        f: impl FnOnce(&mut Flex, Option<Middle>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let middle = self.meta[i].middle;
        let out = f(self.runs[i].open()?, middle);
        self.meta[i] = RunMeta::of(&self.runs[i].view());
        self.settle(i)?;
        out
    }

    fn settle(&mut self, i: usize) -> Result<(), Error> {
        if self.meta[i].count == 0 && self.runs.len() > 1 {
            self.runs.remove(i);
            self.meta.remove(i);
            tracing::debug!(run = i, runs = self.runs.len(), "dropped empty run");
            return self.recompress();
        }
        if self.split_oversized(i)? {
            return self.recompress();
        }
        let compress = self.compressible(i);
        self.runs[i].close(compress);
        Ok(())
    }

    /// Halves run `i` until every piece fits the capacity; true if it split.
    fn split_oversized(&mut self, i: usize) -> Result<bool, Error> {
        if self.runs[i].raw_bytes() <= self.cap || self.meta[i].count < 2 {
            return Ok(false);
        }
        let Some(mid) = self.meta[i].middle else {
            return Ok(false);
        };
        self.runs
            .try_reserve(1)
            .map_err(|_| reserve_err(std::mem::size_of::<MFlex>()))?;
        self.meta
            .try_reserve(1)
            .map_err(|_| reserve_err(std::mem::size_of::<RunMeta>()))?;
        let upper = self.runs[i].open()?.split_off(mid.cursor);
        tracing::debug!(
            run = i,
            lower = self.runs[i].raw_bytes(),
            upper = upper.bytes(),
            runs = self.runs.len() + 1,
            "split run"
        );
        let upper_meta = RunMeta::of(&upper);
        self.runs.insert(i + 1, MFlex::Live(upper));
        self.meta.insert(i + 1, upper_meta);
        self.meta[i] = RunMeta::of(&self.runs[i].view());
        self.split_oversized(i + 1)?;
        self.split_oversized(i)?;
        Ok(true)
    }

    fn insert<R: Resolve + ?Sized>(
        &mut self,
        score: ScalarRef<'_>,
        stored: ScalarRef<'_>,
        member: ScalarRef<'_>,
        r: &R,
    ) -> Result<(), Error> {
        let i = self.locate(score, member, r);
        self.edit(i, |flex, middle| entries::insert(flex, middle, score, stored, member, r))
            .map(drop)
    }

    /// Deletes `(score, member)`; returns its stored member form.
    fn remove<R: Resolve + ?Sized>(
        &mut self,
        score: ScalarRef<'_>,
        member: ScalarRef<'_>,
        r: &R,
    ) -> Result<Option<Scalar>, Error> {
        let i = self.locate(score, member, r);
        self.edit(i, |flex, middle| {
            Ok(match entries::probe(flex, middle, score, member, r) {
                Probe::Found(c) => {
                    let stored = entries::pair(flex, c).1.to_owned();
                    entries::delete(flex, c);
                    Some(stored)
                }
                Probe::Before(_) | Probe::End => None,
            })
        })
    }

    /// Deletes `n` entries of run `i` from in-run rank `start`; returns their
    /// stored member forms.
    fn drain(&mut self, i: usize, start: usize, n: usize) -> Result<Vec<Scalar>, Error> {
        self.edit(i, |flex, middle| {
            let mut stored = Vec::with_capacity(n);
            let Some(first) = entries::cursor_at_rank(flex, start, middle) else {
                return Ok(stored);
            };
            let mut cur = Some(first);
            while let Some(c) = cur {
                if stored.len() == n {
                    break;
                }
                stored.push(entries::pair(flex, c).1.to_owned());
                cur = entries::next_entry(flex, c);
            }
            flex.delete_count(first, stored.len() * entries::PER_ENTRY);
            Ok(stored)
        })
    }

    /// Every pool ID stored in the runs.
    fn stored_ids(&self) -> Vec<AtomId> {
        let mut ids = Vec::new();
        for i in 0..self.runs.len() {
            let flex = self.view(i);
            let mut cur = entries::head(&flex);
            while let Some(c) = cur {
                if let ScalarRef::Ptr(id) = entries::pair(&flex, c).1 {
                    ids.push(id);
                }
                cur = entries::next_entry(&flex, c);
            }
        }
        ids
    }
}

/// Drops index entries (and pool references) for removed stored members.
fn forget(index: &mut MemberIndex, pool: Option<&mut (dyn InternPool + Send + 'static)>, stored: Vec<Scalar>) {
    match pool {
        Some(pool) => {
            for s in stored {
                if let Scalar::Ptr(id) = s {
                    if let Some(bytes) = pool.lookup(id) {
                        index.remove(ScalarRef::Bytes(bytes));
                    }
                    pool.release(id);
                } else {
                    index.remove(s.as_ref());
                }
            }
        }
        None => {
            for s in stored {
                index.remove(s.as_ref());
            }
        }
    }
}

#[derive(Debug)]
pub struct Full {
    index: MemberIndex,
    store: Runs,
    pool: Option<PoolHandle>,
}

impl Full {
    pub(crate) fn new(pool: Option<PoolHandle>, run_cap: usize, depth: u8) -> Self {
        Self {
            index: MemberIndex::new(),
            store: Runs::new(run_cap, depth),
            pool,
        }
    }

    /// Builds the tier from copies of already ordered, disjoint runs. The
    /// source runs are left untouched so a failed build loses nothing.
    pub(crate) fn from_runs(
        runs: &[&Flex],
        pool: Option<PoolHandle>,
        run_cap: usize,
        depth: u8,
    ) -> Result<Self, Error> {
        let mut full = Full::new(pool, run_cap, depth);
        full.store.runs.clear();
        full.store.meta.clear();
        for &flex in runs {
            if flex.is_empty() {
                continue;
            }
            let flex = full.adopt(flex)?;
            full.store.meta.push(RunMeta::of(&flex));
            full.store.runs.push(MFlex::Live(flex));
        }
        if full.store.runs.is_empty() {
            full.store.runs.push(MFlex::default());
            full.store.meta.push(RunMeta::of(&Flex::new()));
        }
        for i in (0..full.store.len()).rev() {
            full.store.split_oversized(i)?;
        }
        full.store.recompress()?;
        Ok(full)
    }

    /// Indexes the entries of `flex`, interning byte members when pooled.
    fn adopt(&mut self, flex: &Flex) -> Result<Flex, Error> {
        self.index.try_reserve(entries::entries(flex))?;
        let mut pool = self.pool.as_mut().map(PoolHandle::write);
        let mut rewritten = pool.as_ref().map(|_| Flex::new());
        let mut interned = Vec::new();
        let mut cur = entries::head(flex);
        while let Some(c) = cur {
            let (score, member) = entries::pair(flex, c);
            self.index.insert(member, score.to_owned());
            if let Some(out) = rewritten.as_mut() {
                let stored = match (pool.as_deref_mut(), member) {
                    (Some(p), ScalarRef::Bytes(b)) => {
                        let id = p.intern(b);
                        interned.push(id);
                        ScalarRef::Ptr(id)
                    }
                    _ => member,
                };
                if let Err(e) = out.push_back(&[score, stored]) {
                    if let Some(p) = pool.as_deref_mut() {
                        for id in interned {
                            p.release(id);
                        }
                    }
                    return Err(e);
                }
            }
            cur = entries::next_entry(flex, c);
        }
        Ok(rewritten.unwrap_or_else(|| flex.clone()))
    }

    pub(crate) fn runs(&self) -> &[MFlex] {
        &self.store.runs
    }

    pub(crate) fn run_meta(&self) -> &[RunMeta] {
        &self.store.meta
    }

    pub(crate) fn pool(&self) -> Option<&PoolHandle> {
        self.pool.as_ref()
    }

    pub(crate) fn describe(&self) -> Vec<String> {
        self.store
            .runs
            .iter()
            .zip(&self.store.meta)
            .map(|(run, meta)| {
                format!(
                    "run bytes={} entries={} packed={} min={} max={}",
                    run.bytes(),
                    meta.count,
                    run.is_compressed(),
                    crate::format::fmt_scalar(meta.min.as_ref()),
                    crate::format::fmt_scalar(meta.max.as_ref()),
                )
            })
            .collect()
    }

    /// Empties the tier in place, dropping this set's pool references.
    pub(crate) fn clear(&mut self) {
        match self.pool.as_mut() {
            Some(PoolHandle::Owned(pool)) => pool.reset(),
            Some(shared @ PoolHandle::Shared(_)) => {
                let ids = self.store.stored_ids();
                let mut pool = shared.write();
                for id in ids {
                    pool.release(id);
                }
            }
            None => {}
        }
        self.index.clear();
        self.store = Runs::new(self.store.cap, self.store.depth as u8);
    }
}

impl Clone for Full {
    fn clone(&self) -> Self {
        let mut copy = Full {
            index: self.index.clone(),
            store: self.store.clone(),
            pool: self.pool.as_ref().map(PoolHandle::duplicate),
        };
        // The copy holds its own reference to every ID in a shared pool.
        if let Some(shared @ PoolHandle::Shared(_)) = copy.pool.as_mut() {
            let ids = copy.store.stored_ids();
            let mut pool = shared.write();
            for id in ids {
                pool.retain(id);
            }
        }
        copy
    }
}

impl Drop for Full {
    fn drop(&mut self) {
        if let Some(shared @ PoolHandle::Shared(_)) = self.pool.as_mut() {
            let ids = self.store.stored_ids();
            let mut pool = shared.write();
            for id in ids {
                pool.release(id);
            }
        }
    }
}

impl TierOps for Full {
    #[inline]
    fn count(&self) -> usize {
        self.index.len()
    }

    fn bytes(&self) -> usize {
        let pool = match &self.pool {
            Some(p @ PoolHandle::Owned(_)) => p.read().bytes(),
            _ => 0,
        };
        self.store.bytes() + self.index.bytes() + pool
    }

    fn get_score(&self, member: ScalarRef<'_>) -> Option<Scalar> {
        self.index.get(member).cloned()
    }

    #[inline]
    fn exists(&self, member: ScalarRef<'_>) -> bool {
        self.index.contains(member)
    }

    fn insert_new(&mut self, score: ScalarRef<'_>, member: ScalarRef<'_>) -> Result<(), Error> {
        self.index.try_reserve(1)?;
        let mut pool = self.pool.as_mut().map(PoolHandle::write);
        let stored = match (pool.as_deref_mut(), member) {
            (Some(p), ScalarRef::Bytes(b)) => ScalarRef::Ptr(p.intern(b)),
            _ => member,
        };
        let r = pool.as_deref();
        if let Err(e) = self.store.insert(score, stored, member, &r) {
            if let (Some(p), ScalarRef::Ptr(id)) = (pool.as_deref_mut(), stored) {
                p.release(id);
            }
            return Err(e);
        }
        self.index.insert(member, score.to_owned());
        Ok(())
    }

    fn replace(&mut self, member: ScalarRef<'_>, old: &Scalar, new: ScalarRef<'_>) -> Result<(), Error> {
        let pool = self.pool.as_ref().map(PoolHandle::read);
        let r = pool.as_deref();
        let stored = match self.store.remove(old.as_ref(), member, &r)? {
            Some(stored) => stored,
            None => panic!("full tier: indexed member {member:?} missing from its run"),
        };
        if let Err(e) = self.store.insert(new, stored.as_ref(), member, &r) {
            // The run the entry came from just shrank, so it fits again.
            self.store.insert(old.as_ref(), stored.as_ref(), member, &r)?;
            return Err(e);
        }
        self.index.insert(member, new.to_owned());
        Ok(())
    }

    fn take(&mut self, member: ScalarRef<'_>) -> Option<Scalar> {
        let score = self.index.get(member)?.clone();
        let mut pool = self.pool.as_mut().map(PoolHandle::write);
        let stored = match self.store.remove(score.as_ref(), member, &pool.as_deref()) {
            Ok(Some(stored)) => stored,
            Ok(None) => panic!("full tier: indexed member {member:?} missing from its run"),
            Err(e) => fatal(e),
        };
        self.index.remove(member);
        if let (Some(p), Scalar::Ptr(id)) = (pool.as_deref_mut(), stored) {
            p.release(id);
        }
        Some(score)
    }

    fn get_rank(&self, member: ScalarRef<'_>) -> Option<usize> {
        let score = self.index.get(member)?;
        let pool = self.pool.as_ref().map(PoolHandle::read);
        let r = pool.as_deref();
        let i = self.store.locate(score.as_ref(), member, &r);
        let flex = self.store.view(i);
        let local = entries::rank_of(&flex, self.store.meta[i].middle, score.as_ref(), member, &r)?;
        Some(self.store.prefix(i) + local)
    }

    fn entry_at(&self, rank: usize) -> Option<Entry> {
        let (i, local) = self.store.seek(rank)?;
        let flex = self.store.view(i);
        let c = entries::cursor_at_rank(&flex, local, self.store.meta[i].middle)?;
        let pool = self.pool.as_ref().map(PoolHandle::read);
        Some(entries::entry_at(&flex, c, &pool.as_deref()))
    }

    fn entries_between(&self, start: usize, stop: usize) -> Vec<Entry> {
        let mut out = Vec::with_capacity(stop.saturating_sub(start) + 1);
        let Some((first, mut local)) = self.store.seek(start) else {
            return out;
        };
        let pool = self.pool.as_ref().map(PoolHandle::read);
        let r = pool.as_deref();
        let want = stop - start + 1;
        for i in first..self.store.len() {
            let flex = self.store.view(i);
            let mut cur = entries::cursor_at_rank(&flex, local, self.store.meta[i].middle);
            while let Some(c) = cur {
                if out.len() == want {
                    return out;
                }
                out.push(entries::entry_at(&flex, c, &r));
                cur = entries::next_entry(&flex, c);
            }
            local = 0;
        }
        out
    }

    fn rank_at_score(&self, score: ScalarRef<'_>) -> Option<usize> {
        let i = self.store.first_reaching(score);
        if i == self.store.len() {
            return None;
        }
        let flex = self.store.view(i);
        let (local, _) = entries::first_at_score(&flex, score, self.store.meta[i].middle)?;
        Some(self.store.prefix(i) + local)
    }

    fn count_by_score(&self, range: &RangeSpec) -> usize {
        if range.is_empty() {
            return 0;
        }
        let mut total = 0;
        for (i, meta) in self.store.meta.iter().enumerate() {
            if meta.count == 0 || !range.above_min(meta.max.as_ref()) {
                continue;
            }
            if !range.below_max(meta.min.as_ref()) {
                break;
            }
            if range.above_min(meta.min.as_ref()) && range.below_max(meta.max.as_ref()) {
                total += meta.count;
            } else {
                total += entries::count_in_range(&self.store.view(i), range, meta.middle);
            }
        }
        total
    }

    fn remove_range_by_score(&mut self, range: &RangeSpec) -> usize {
        if range.is_empty() {
            return 0;
        }
        // (run, in-run start, length), gathered before touching anything.
        let mut plan = Vec::new();
        for (i, meta) in self.store.meta.iter().enumerate() {
            if meta.count == 0 || !range.above_min(meta.max.as_ref()) {
                continue;
            }
            if !range.below_max(meta.min.as_ref()) {
                break;
            }
            if range.above_min(meta.min.as_ref()) && range.below_max(meta.max.as_ref()) {
                plan.push((i, 0, meta.count));
            } else {
                let flex = self.store.view(i);
                if let Some((start, c)) = entries::first_in_range(&flex, range, meta.middle) {
                    plan.push((i, start, entries::run_length_in_range(&flex, c, range)));
                }
            }
        }
        self.apply(plan)
    }

    fn remove_ranks(&mut self, start: usize, stop: usize) -> usize {
        let mut plan = Vec::new();
        let mut offset = 0;
        for (i, meta) in self.store.meta.iter().enumerate() {
            let end = offset + meta.count;
            if start < end && stop >= offset && meta.count > 0 {
                let from = start.max(offset) - offset;
                let to = stop.min(end - 1) - offset;
                plan.push((i, from, to - from + 1));
            }
            if end > stop {
                break;
            }
            offset = end;
        }
        self.apply(plan)
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl Full {
    /// Drains planned `(run, start, len)` slices, last run first so earlier
    /// run indices stay valid when runs are dropped.
    fn apply(&mut self, plan: Vec<(usize, usize, usize)>) -> usize {
        let mut removed = 0;
        let mut pool = self.pool.as_mut().map(PoolHandle::write);
        for (i, start, n) in plan.into_iter().rev() {
            let stored = self.store.drain(i, start, n).unwrap_or_else(|e| fatal(e));
            removed += stored.len();
            forget(&mut self.index, pool.as_deref_mut(), stored);
        }
        removed
    }
}
