//! The public ordered set.
//!
//! An [`OrderedSet`] starts in the small tier and moves up as it grows: past
//! the size limit it becomes medium, past three times the limit it becomes
//! full. It never moves back down. Every operation is routed to the active
//! tier through `dispatch!`.

use std::fmt::Write as _;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use smallvec::{smallvec, SmallVec};

use crate::compare::RangeSpec;
use crate::config::{Config, PoolKind, SizeLimit, DEFAULT_SEED};
use crate::entries::{normalize_rank, Entry};
use crate::error::Error;
use crate::format::fmt_scalar;
use crate::full::Full;
use crate::iter::{Iter, Runs};
use crate::medium::Medium;
use crate::pool::{PoolBackend, PoolHandle};
use crate::sample;
use crate::scalar::{Scalar, ScalarRef};
use crate::small::Small;
use crate::tier::TierOps;

/// The two per-set policy fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Policy {
    /// Runs kept live at each end of a full set; 0 disables compression.
    pub depth: u8,
    pub limit: SizeLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TierKind {
    Small = 1,
    Medium = 2,
    Full = 3,
}

impl TierKind {
    pub fn name(self) -> &'static str {
        match self {
            TierKind::Small => "small",
            TierKind::Medium => "medium",
            TierKind::Full => "full",
        }
    }
}

#[derive(Clone, Debug)]
enum Tier {
    Small(Small),
    Medium(Medium),
    Full(Full),
}

macro_rules! dispatch {
    ($tier:expr, $t:ident => $body:expr) => {
        match $tier {
            Tier::Small($t) => $body,
            Tier::Medium($t) => $body,
            Tier::Full($t) => $body,
        }
    };
}

/// Size summary of a set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stats {
    pub tier: TierKind,
    pub count: usize,
    pub bytes: usize,
    pub runs: usize,
    pub compressed_runs: usize,
    /// Strings held by the pool the set stores members through.
    pub pool_strings: Option<usize>,
}

/// One run as seen from outside: entry count, bytes held and score bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub entries: usize,
    pub bytes: usize,
    pub compressed: bool,
    pub min: Option<Scalar>,
    pub max: Option<Scalar>,
}

#[derive(Clone, Debug)]
pub struct OrderedSet {
    policy: Policy,
    tier: Tier,
    run_capacity: usize,
    pool: PoolKind,
    rng: SmallRng,
}

impl Default for OrderedSet {
    fn default() -> Self {
        Self::new()
    }
}

#[track_caller]
fn check_score(score: ScalarRef<'_>) {
    if !score.is_numeric() {
        panic!("ordered set scores must be numeric, got {}", score.type_name());
    }
}

#[track_caller]
fn check_member(member: ScalarRef<'_>) {
    if !member.is_member() {
        panic!(
            "ordered set members must be numbers or bytes, got {}",
            member.type_name()
        );
    }
}

/// Logs a failed update; the set is unchanged when this returns `None`.
fn report<T>(op: &'static str, res: Result<T, Error>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!(op, error = %e, "ordered set update failed");
            None
        }
    }
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::from_parts(Config::default())
    }

    pub fn with_limit(limit: SizeLimit) -> Self {
        Self::from_parts(Config::default().size_limit(limit))
    }

    /// Like [`OrderedSet::with_limit`], keeping interior runs of a full set
    /// compressed.
    pub fn with_compression(limit: SizeLimit) -> Self {
        Self::from_parts(Config::default().size_limit(limit).compression_depth(1))
    }

    pub fn with_config(config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: Config) -> Self {
        Self {
            policy: Policy {
                depth: config.compression_depth,
                limit: config.size_limit,
            },
            tier: Tier::Small(Small::new()),
            run_capacity: config.run_capacity,
            pool: config.pool,
            rng: SmallRng::seed_from_u64(config.seed),
        }
    }

    #[inline]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn tier(&self) -> TierKind {
        match self.tier {
            Tier::Small(_) => TierKind::Small,
            Tier::Medium(_) => TierKind::Medium,
            Tier::Full(_) => TierKind::Full,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        dispatch!(&self.tier, t => t.count())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn bytes(&self) -> usize {
        dispatch!(&self.tier, t => t.bytes())
    }

    // -----------------------------------------------------------------------
    // promotion

    fn promote(&mut self) {
        let limit = self.policy.limit.bytes();
        let (from, count, bytes) = match &self.tier {
            Tier::Small(s) if s.bytes() > limit && s.count() >= 2 => ("small", s.count(), s.bytes()),
            Tier::Medium(m) if m.bytes() > limit * 3 && m.count() >= 2 => ("medium", m.count(), m.bytes()),
            _ => return,
        };
        if let Tier::Small(s) = &mut self.tier {
            let small = std::mem::take(s);
            self.tier = Tier::Medium(Medium::from_small(small));
        } else if let Tier::Medium(m) = &self.tier {
            let runs = m.runs();
            let built = Full::from_runs(&runs, self.pool_handle(), self.run_capacity, self.policy.depth);
            let Some(full) = report("promote", built) else {
                return;
            };
            self.tier = Tier::Full(full);
        }
        tracing::debug!(from, to = self.tier().name(), count, bytes, "promoted ordered set");
    }

    fn pool_handle(&self) -> Option<PoolHandle> {
        match &self.pool {
            PoolKind::None => None,
            PoolKind::Hash => Some(PoolHandle::owned(PoolBackend::Hash)),
            PoolKind::Tree => Some(PoolHandle::owned(PoolBackend::Tree)),
            PoolKind::Shared(p) => Some(PoolHandle::Shared(p.clone())),
        }
    }

    // -----------------------------------------------------------------------
    // insertion / update

    /// Sets `member`'s score, inserting it if needed. Returns whether the
    /// member was already present.
    pub fn add<'a>(&mut self, score: impl Into<ScalarRef<'a>>, member: impl Into<ScalarRef<'a>>) -> bool {
        let (score, member) = (score.into(), member.into());
        check_score(score);
        check_member(member);
        let existed = report("add", dispatch!(&mut self.tier, t => t.add(score, member)));
        self.promote();
        existed.unwrap_or(false)
    }

    /// Inserts only when `member` is absent; true when it was inserted.
    pub fn add_nx<'a>(&mut self, score: impl Into<ScalarRef<'a>>, member: impl Into<ScalarRef<'a>>) -> bool {
        let (score, member) = (score.into(), member.into());
        check_score(score);
        check_member(member);
        let inserted = report("add_nx", dispatch!(&mut self.tier, t => t.add_nx(score, member)));
        self.promote();
        inserted.unwrap_or(false)
    }

    /// Updates only when `member` is present; true when it was. Never
    /// promotes.
    pub fn add_xx<'a>(&mut self, score: impl Into<ScalarRef<'a>>, member: impl Into<ScalarRef<'a>>) -> bool {
        let (score, member) = (score.into(), member.into());
        check_score(score);
        check_member(member);
        report("add_xx", dispatch!(&mut self.tier, t => t.add_xx(score, member))).unwrap_or(false)
    }

    /// Like [`OrderedSet::add`], returning the previous score.
    pub fn add_get_previous<'a>(
        &mut self,
        score: impl Into<ScalarRef<'a>>,
        member: impl Into<ScalarRef<'a>>,
    ) -> Option<Scalar> {
        let (score, member) = (score.into(), member.into());
        check_score(score);
        check_member(member);
        let previous = report(
            "add_get_previous",
            dispatch!(&mut self.tier, t => t.add_get_previous(score, member)),
        );
        self.promote();
        previous.flatten()
    }

    /// Adds `delta` to `member`'s score, inserting it with score `delta` when
    /// absent. Returns the new score, or `None` when the current score or
    /// `delta` is not numeric.
    pub fn incr_by<'a>(&mut self, delta: impl Into<ScalarRef<'a>>, member: impl Into<ScalarRef<'a>>) -> Option<Scalar> {
        let (delta, member) = (delta.into(), member.into());
        check_member(member);
        let result = report("incr_by", dispatch!(&mut self.tier, t => t.incr_by(delta, member)));
        self.promote();
        result.flatten()
    }

    // -----------------------------------------------------------------------
    // deletion

    pub fn remove<'a>(&mut self, member: impl Into<ScalarRef<'a>>) -> bool {
        self.remove_get_score(member).is_some()
    }

    pub fn remove_get_score<'a>(&mut self, member: impl Into<ScalarRef<'a>>) -> Option<Scalar> {
        let member = member.into();
        dispatch!(&mut self.tier, t => t.take(member))
    }

    pub fn remove_range_by_score(&mut self, range: &RangeSpec) -> usize {
        dispatch!(&mut self.tier, t => t.remove_range_by_score(range))
    }

    /// Removes ranks `start..=stop`. Negative ranks count from the end; both
    /// must land inside the set and `start` must not pass `stop`.
    pub fn remove_range_by_rank(&mut self, start: i64, stop: i64) -> usize {
        let count = self.count();
        match (normalize_rank(start, count), normalize_rank(stop, count)) {
            (Some(start), Some(stop)) if start <= stop => {
                dispatch!(&mut self.tier, t => t.remove_ranks(start, stop))
            }
            _ => 0,
        }
    }

    /// Removes and returns up to `n` lowest entries, lowest first.
    pub fn pop_min(&mut self, n: usize) -> Vec<Entry> {
        dispatch!(&mut self.tier, t => t.pop_min(n))
    }

    /// Removes and returns up to `n` highest entries, highest first.
    pub fn pop_max(&mut self, n: usize) -> Vec<Entry> {
        dispatch!(&mut self.tier, t => t.pop_max(n))
    }

    // -----------------------------------------------------------------------
    // lookup

    pub fn exists<'a>(&self, member: impl Into<ScalarRef<'a>>) -> bool {
        let member = member.into();
        dispatch!(&self.tier, t => t.exists(member))
    }

    pub fn get_score<'a>(&self, member: impl Into<ScalarRef<'a>>) -> Option<Scalar> {
        let member = member.into();
        dispatch!(&self.tier, t => t.get_score(member))
    }

    pub fn get_rank<'a>(&self, member: impl Into<ScalarRef<'a>>) -> Option<usize> {
        let member = member.into();
        dispatch!(&self.tier, t => t.get_rank(member))
    }

    pub fn get_reverse_rank<'a>(&self, member: impl Into<ScalarRef<'a>>) -> Option<usize> {
        let rank = self.get_rank(member)?;
        Some(self.count() - 1 - rank)
    }

    /// Entry at `rank`; negative ranks count from the end.
    pub fn get_by_rank(&self, rank: i64) -> Option<Entry> {
        let rank = normalize_rank(rank, self.count())?;
        dispatch!(&self.tier, t => t.entry_at(rank))
    }

    pub fn first(&self) -> Option<Entry> {
        self.get_by_rank(0)
    }

    pub fn last(&self) -> Option<Entry> {
        self.get_by_rank(-1)
    }

    pub fn count_by_score(&self, range: &RangeSpec) -> usize {
        dispatch!(&self.tier, t => t.count_by_score(range))
    }

    // -----------------------------------------------------------------------
    // iteration

    fn iter_at(&self, rank: Option<usize>, forward: bool) -> Iter<'_> {
        let (runs, pool) = match &self.tier {
            Tier::Small(s) => (Runs::Flat(smallvec![s.flex()]), None),
            Tier::Medium(m) => (Runs::Flat(SmallVec::from_buf(m.runs())), None),
            Tier::Full(f) => (Runs::Packed(f.runs()), f.pool()),
        };
        Iter::new(runs, pool, rank, forward)
    }

    /// Entries in ascending `(score, member)` order.
    pub fn iter(&self) -> Iter<'_> {
        self.iter_at(normalize_rank(0, self.count()), true)
    }

    pub fn iter_rev(&self) -> Iter<'_> {
        self.iter_at(normalize_rank(-1, self.count()), false)
    }

    /// Starts at the first entry whose score is `>= score`, walking in either
    /// direction from there. `None` when no such entry exists.
    pub fn iter_from_score<'a>(&self, score: impl Into<ScalarRef<'a>>, forward: bool) -> Option<Iter<'_>> {
        let score = score.into();
        let rank = dispatch!(&self.tier, t => t.rank_at_score(score))?;
        Some(self.iter_at(Some(rank), forward))
    }

    /// Starts at `rank`; negative ranks count from the end.
    pub fn iter_from_rank(&self, rank: i64, forward: bool) -> Option<Iter<'_>> {
        let rank = normalize_rank(rank, self.count())?;
        Some(self.iter_at(Some(rank), forward))
    }

    // -----------------------------------------------------------------------
    // random access

    /// Samples entries with the set's own generator. See
    /// [`OrderedSet::random_members_with`].
    pub fn random_members(&mut self, n: i64) -> Vec<Entry> {
        let ranks = sample::pick(self.count(), n, &mut self.rng);
        self.entries_at(ranks)
    }

    /// A negative `n` samples `|n|` entries with replacement, at most
    /// [`sample::MAX_REPEATED_DRAWS`]; otherwise up to `n` distinct entries.
    pub fn random_members_with<R: Rng + ?Sized>(&self, n: i64, rng: &mut R) -> Vec<Entry> {
        let ranks = sample::pick(self.count(), n, rng);
        self.entries_at(ranks)
    }

    fn entries_at(&self, ranks: Vec<usize>) -> Vec<Entry> {
        ranks
            .into_iter()
            .filter_map(|r| dispatch!(&self.tier, t => t.entry_at(r)))
            .collect()
    }

    /// Reseeds the generator used by [`OrderedSet::random_members`].
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    // -----------------------------------------------------------------------
    // lifecycle

    /// Structurally independent copy. A shared pool stays shared.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Drops every entry. The set keeps its tier and policy.
    pub fn reset(&mut self) {
        dispatch!(&mut self.tier, t => t.reset());
        self.rng = SmallRng::seed_from_u64(DEFAULT_SEED);
    }

    pub fn stats(&self) -> Stats {
        let runs = self.run_summaries();
        let pool_strings = match &self.tier {
            Tier::Full(f) => f.pool().map(|p| p.read().count()),
            _ => None,
        };
        Stats {
            tier: self.tier(),
            count: self.count(),
            bytes: self.bytes(),
            runs: runs.len(),
            compressed_runs: runs.iter().filter(|r| r.compressed).count(),
            pool_strings,
        }
    }

    /// Per-run layout, lowest run first.
    pub fn run_summaries(&self) -> Vec<RunSummary> {
        match &self.tier {
            Tier::Small(s) => vec![flat_summary(s.flex())],
            Tier::Medium(m) => m.runs().into_iter().map(flat_summary).collect(),
            Tier::Full(f) => f
                .runs()
                .iter()
                .zip(f.run_meta())
                .map(|(run, meta)| RunSummary {
                    entries: meta.count,
                    bytes: run.bytes(),
                    compressed: run.is_compressed(),
                    min: (meta.count > 0).then(|| meta.min.clone()),
                    max: (meta.count > 0).then(|| meta.max.clone()),
                })
                .collect(),
        }
    }

    /// Multi-line dump of the layout and every entry.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "OrderedSet {{ tier: {}, count: {}, bytes: {}, depth: {}, limit: {} }}",
            self.tier().name(),
            self.count(),
            self.bytes(),
            self.policy.depth,
            self.policy.limit.bytes(),
        );
        let layout = match &self.tier {
            Tier::Small(s) => vec![s.describe()],
            Tier::Medium(m) => m.describe(),
            Tier::Full(f) => f.describe(),
        };
        for (i, line) in layout.iter().enumerate() {
            let _ = writeln!(out, "  run[{i}]: {line}");
        }
        for (i, e) in self.iter().enumerate() {
            let _ = writeln!(
                out,
                "    [{i}] score={} member={}",
                fmt_scalar(e.score.as_ref()),
                fmt_scalar(e.member.as_ref()),
            );
        }
        out
    }
}

fn flat_summary(flex: &crate::flex::Flex) -> RunSummary {
    let entries = crate::entries::entries(flex);
    let bound = |c: Option<crate::flex::Cursor>| c.map(|c| crate::entries::score_at(flex, c).to_owned());
    RunSummary {
        entries,
        bytes: flex.bytes(),
        compressed: false,
        min: bound(crate::entries::head(flex)),
        max: bound(crate::entries::tail(flex)),
    }
}

impl<'a> IntoIterator for &'a OrderedSet {
    type Item = Entry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(set: &OrderedSet) -> Vec<Scalar> {
        set.iter().map(|e| e.member).collect()
    }

    #[test]
    fn empty_set() {
        let set = OrderedSet::new();
        assert_eq!(set.count(), 0);
        assert!(!set.exists("x"));
        assert!(set.first().is_none());
        assert!(set.last().is_none());
        assert_eq!(set.iter().count(), 0);
        assert_eq!(set.tier(), TierKind::Small);
    }

    #[test]
    fn basic_ranks() {
        let mut set = OrderedSet::new();
        assert!(!set.add(1.0, "a"));
        assert!(!set.add(2.0, "b"));
        assert!(!set.add(3.0, "c"));
        assert_eq!(set.count(), 3);
        assert_eq!(set.get_rank("b"), Some(1));
        assert_eq!(set.get_reverse_rank("a"), Some(2));
        assert_eq!(set.first(), Some(Entry::new("a", 1.0)));
        assert_eq!(set.last(), Some(Entry::new("c", 3.0)));
        assert_eq!(set.get_by_rank(-3), Some(Entry::new("a", 1.0)));
        assert!(set.get_by_rank(-4).is_none());
        assert!(set.get_by_rank(3).is_none());
    }

    #[test]
    fn promotes_small_medium_full() {
        let mut set = OrderedSet::with_limit(SizeLimit::L64);
        let mut seen = vec![set.tier()];
        for i in 0..100i64 {
            set.add(i, format!("m{i}").as_str());
            if seen.last() != Some(&set.tier()) {
                seen.push(set.tier());
            }
        }
        assert_eq!(seen, vec![TierKind::Small, TierKind::Medium, TierKind::Full]);
        let scores: Vec<_> = set.iter().map(|e| e.score).collect();
        assert_eq!(scores, (0..100i64).map(Scalar::I64).collect::<Vec<_>>());
    }

    #[test]
    fn add_xx_does_not_promote() {
        let mut set = OrderedSet::with_limit(SizeLimit::L64);
        let wide = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        set.add(1, wide);
        assert_eq!(set.tier(), TierKind::Small);
        // A 128-bit score pushes the run past the limit, but updates alone
        // never promote.
        assert!(set.add_xx(i128::MAX, wide));
        assert!(set.bytes() > 64);
        assert_eq!(set.tier(), TierKind::Small);
        set.add(3, "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        assert_eq!(set.tier(), TierKind::Medium);
    }

    #[test]
    fn iterators_from_score_and_rank() {
        let mut set = OrderedSet::new();
        for i in 0..10i64 {
            set.add(i * 10, format!("m{i}").as_str());
        }
        let fwd: Vec<_> = set.iter_from_score(35, true).unwrap().map(|e| e.score).collect();
        assert_eq!(fwd, vec![Scalar::I64(40), Scalar::I64(50), Scalar::I64(60), Scalar::I64(70), Scalar::I64(80), Scalar::I64(90)]);
        let back: Vec<_> = set.iter_from_score(35, false).unwrap().map(|e| e.score).collect();
        assert_eq!(back, vec![Scalar::I64(40), Scalar::I64(30), Scalar::I64(20), Scalar::I64(10), Scalar::I64(0)]);
        assert!(set.iter_from_score(91, true).is_none());
        let tail: Vec<_> = set.iter_from_rank(-2, true).unwrap().map(|e| e.member).collect();
        assert_eq!(tail, vec![Scalar::from("m8"), Scalar::from("m9")]);
        assert!(set.iter_from_rank(10, true).is_none());
        assert_eq!(set.iter_rev().next(), Some(Entry::new("m9", 90i64)));
    }

    #[test]
    fn rank_range_removal_needs_ordered_bounds() {
        let mut set = OrderedSet::new();
        for i in 0..5i64 {
            set.add(i, format!("m{i}").as_str());
        }
        assert_eq!(set.remove_range_by_rank(3, 1), 0);
        assert_eq!(set.remove_range_by_rank(0, 9), 0);
        assert_eq!(set.remove_range_by_rank(-2, -1), 2);
        assert_eq!(members(&set), vec![Scalar::from("m0"), Scalar::from("m1"), Scalar::from("m2")]);
    }

    #[test]
    fn copies_are_independent() {
        let mut set = OrderedSet::with_limit(SizeLimit::L64);
        for i in 0..50i64 {
            set.add(i, i * 3);
        }
        let copy = set.copy();
        set.remove(3i64);
        set.add(-1, 3i64);
        assert_eq!(copy.get_score(3i64), Some(Scalar::I64(1)));
        assert_eq!(copy.count(), 50);
        assert_eq!(copy.tier(), set.tier());
    }

    #[test]
    fn reset_keeps_tier_and_policy() {
        let mut set = OrderedSet::with_config(
            Config::default()
                .size_limit(SizeLimit::L64)
                .pool(PoolKind::Hash),
        )
        .unwrap();
        for i in 0..100 {
            set.add(i, format!("member-{i}").as_str());
        }
        assert_eq!(set.tier(), TierKind::Full);
        assert_eq!(set.stats().pool_strings, Some(100));
        set.reset();
        assert!(set.is_empty());
        assert_eq!(set.tier(), TierKind::Full);
        assert_eq!(set.stats().pool_strings, Some(0));
        assert_eq!(set.policy().limit, SizeLimit::L64);
        set.add(1, "again");
        assert_eq!(set.first(), Some(Entry::new("again", 1i64)));
    }

    #[test]
    fn random_members_are_reproducible() {
        let config = Config::default().seed(7);
        let mut a = OrderedSet::with_config(config.clone()).unwrap();
        let mut b = OrderedSet::with_config(config).unwrap();
        for i in 0..40i64 {
            a.add(i, i);
            b.add(i, i);
        }
        assert_eq!(a.random_members(5), b.random_members(5));
        assert_eq!(a.random_members(100).len(), 40);
        assert_eq!(a.random_members(-100).len(), 100);
        let mut rng = SmallRng::seed_from_u64(1);
        let picked = a.random_members_with(3, &mut rng);
        assert_eq!(picked.len(), 3);
        assert!(picked.iter().all(|e| a.exists(&e.member)));
    }

    #[test]
    fn huge_repeated_draws_are_capped() {
        let mut set = OrderedSet::new();
        set.add(1, "only");
        let picked = set.random_members(-(1 << 40));
        assert_eq!(picked.len(), sample::MAX_REPEATED_DRAWS);
        assert!(picked.iter().all(|e| e.member == Scalar::bytes("only")));
    }

    #[test]
    fn repr_and_stats() {
        let mut set = OrderedSet::with_config(
            Config::default()
                .size_limit(SizeLimit::L64)
                .pool(PoolKind::Tree),
        )
        .unwrap();
        for i in 0..30i64 {
            set.add(i as f64 + 0.5, format!("k{i}").as_str());
        }
        let stats = set.stats();
        assert_eq!(stats.count, 30);
        assert_eq!(stats.runs, set.run_summaries().len());
        assert_eq!(stats.tier, TierKind::Full);
        assert_eq!(stats.pool_strings, Some(30));
        let text = set.repr();
        assert!(text.starts_with("OrderedSet { tier: full"));
        assert!(text.contains("score=0.5 member=k0"));
    }

    #[test]
    #[should_panic(expected = "scores must be numeric")]
    fn non_numeric_score_panics() {
        OrderedSet::new().add("nope", "member");
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            OrderedSet::with_config(Config::default().compression_depth(9)),
            Err(Error::InvalidCompressionDepth(9))
        ));
    }
}
