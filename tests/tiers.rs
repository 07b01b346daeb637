mod helpers;

use flexzset::{Config, Entry, OrderedSet, RangeSpec, Scalar, SizeLimit, TierKind};
use helpers::{check_invariants, grown_to, members};
use rand::{rngs::SmallRng, SeedableRng};

fn config(limit: SizeLimit) -> Config {
    Config::default().size_limit(limit).run_capacity(256)
}

#[test]
fn promotion_keeps_every_entry_and_rank() {
    let mut set = OrderedSet::with_config(config(SizeLimit::L128)).unwrap();
    let mut last_tier = set.tier();
    let mut snapshot: Vec<Entry> = Vec::new();
    for i in 0..600u64 {
        set.add(i.wrapping_mul(7919) % 1000, format!("k{i}").as_str());
        if set.tier() != last_tier {
            // everything inserted before the last add is still there, in order
            let now: Vec<_> = set.iter().collect();
            let without_new: Vec<_> = now
                .iter()
                .filter(|e| e.member != Scalar::bytes(format!("k{i}")))
                .cloned()
                .collect();
            assert_eq!(without_new, snapshot);
            last_tier = set.tier();
        }
        snapshot = set.iter().collect();
    }
    assert_eq!(set.tier(), TierKind::Full);
    assert!(set.stats().runs > 1);
    check_invariants(&set);
}

#[test]
fn add_xx_never_promotes() {
    let (a, b) = ("aaaaaaaaaa", "bbbbbbbbbb");
    let mut set = OrderedSet::with_limit(SizeLimit::L64);
    set.add(0, a);
    set.add(1, b);
    assert!(set.bytes() <= 64);
    assert!(set.add_xx(i128::MAX, a));
    assert!(set.add_xx(u128::MAX, b));
    assert!(set.bytes() > 64);
    assert_eq!(set.tier(), TierKind::Small);
    set.add(2, "c");
    assert_ne!(set.tier(), TierKind::Small);
}

#[test]
fn removal_never_demotes() {
    let mut set = grown_to(OrderedSet::with_config(config(SizeLimit::L64)).unwrap(), TierKind::Full);
    let n = set.count();
    assert_eq!(set.pop_min(n - 1).len(), n - 1);
    assert_eq!(set.tier(), TierKind::Full);
    assert_eq!(set.count(), 1);
    check_invariants(&set);
}

#[test]
fn reset_keeps_tier_and_policy() {
    for tier in [TierKind::Small, TierKind::Medium, TierKind::Full] {
        let mut set = grown_to(OrderedSet::with_compression(SizeLimit::L256), tier);
        let policy = set.policy();
        set.reset();
        assert!(set.is_empty());
        assert_eq!(set.tier(), tier);
        assert_eq!(set.policy(), policy);
        set.add(1, "again");
        assert_eq!(set.first(), Some(Entry::new("again", 1)));
    }
}

#[test]
fn every_tier_answers_the_same_queries() {
    let limits = [SizeLimit::L65536, SizeLimit::L256, SizeLimit::L0];
    let sets: Vec<_> = limits
        .iter()
        .map(|&limit| {
            let mut set = OrderedSet::with_config(config(limit)).unwrap();
            for i in 0..120i64 {
                set.add((i % 40) - 20, format!("{:03}", 119 - i).as_str());
            }
            set
        })
        .collect();
    assert_eq!(sets[0].tier(), TierKind::Small);
    assert_eq!(sets[2].tier(), TierKind::Full);
    let range = RangeSpec::new(-5, true, 10, false);
    for set in &sets[1..] {
        assert_eq!(members(set), members(&sets[0]));
        assert_eq!(set.count_by_score(&range), sets[0].count_by_score(&range));
        assert_eq!(set.get_by_rank(57), sets[0].get_by_rank(57));
        assert_eq!(set.get_rank("050"), sets[0].get_rank("050"));
        let tail: Vec<_> = set.iter_from_score(15, true).unwrap().collect();
        let expected: Vec<_> = sets[0].iter_from_score(15, true).unwrap().collect();
        assert_eq!(tail, expected);
        let back: Vec<_> = set.iter_from_rank(-3, false).unwrap().collect();
        assert_eq!(back.len(), 118);
        assert_eq!(back, sets[0].iter_rev().skip(2).collect::<Vec<_>>());
        check_invariants(set);
    }
    assert!(sets[2].iter_from_score(20, true).is_none());
}

#[test]
fn compressed_interior_runs() {
    let cfg = Config::default()
        .size_limit(SizeLimit::L64)
        .compression_depth(1)
        .run_capacity(1024);
    let mut set = OrderedSet::with_config(cfg).unwrap();
    for i in 0..1000u64 {
        set.add(i, format!("compressible-member-{i:08}").as_str());
    }
    let stats = set.stats();
    assert_eq!(stats.tier, TierKind::Full);
    assert!(stats.compressed_runs > 0, "{stats:?}");
    let runs = set.run_summaries();
    assert!(!runs[0].compressed);
    assert!(!runs[runs.len() - 1].compressed);
    check_invariants(&set);

    // reads and writes in the middle go through compressed runs
    let mid = set.get_by_rank(250).unwrap();
    assert!(set.remove(&mid.member));
    assert!(set.add_nx(-1, &mid.member));
    assert_eq!(set.get_rank(&mid.member), Some(0));
    check_invariants(&set);
}

#[test]
fn random_members_sample_the_set() {
    let mut set = grown_to(OrderedSet::new(), TierKind::Full);
    let n = set.count();

    let picked = set.random_members(10);
    assert_eq!(picked.len(), 10);
    let mut distinct: Vec<_> = picked.iter().map(|e| e.member.clone()).collect();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), 10);
    assert!(picked.iter().all(|e| set.get_score(&e.member).as_ref() == Some(&e.score)));

    assert_eq!(set.random_members(n as i64 + 5).len(), n);
    assert_eq!(set.random_members(-(n as i64) * 2).len(), n * 2);
    assert!(set.random_members(0).is_empty());

    let mut a = SmallRng::seed_from_u64(7);
    let mut b = SmallRng::seed_from_u64(7);
    assert_eq!(set.random_members_with(25, &mut a), set.random_members_with(25, &mut b));

    set.reseed(99);
    let first = set.random_members(5);
    set.reseed(99);
    assert_eq!(set.random_members(5), first);
}

#[test]
fn numeric_members_sort_by_value() {
    let mut set = OrderedSet::with_limit(SizeLimit::L0);
    for m in [10u64, 2, 33, 4] {
        set.add(0, m);
    }
    set.add(0, "text");
    let got: Vec<_> = set.iter().map(|e| e.member).collect();
    assert_eq!(got[..4], [Scalar::U64(2), Scalar::U64(4), Scalar::U64(10), Scalar::U64(33)]);
    assert_eq!(got[4], Scalar::bytes("text"));
    check_invariants(&set);
}

#[test]
fn repr_lists_layout_and_entries() {
    let mut set = OrderedSet::new();
    set.add(1.5, "x");
    set.add(2, "y");
    let repr = set.repr();
    assert!(repr.starts_with("OrderedSet { tier: small, count: 2"));
    assert!(repr.contains("[0] score=1.5 member=x"));
    assert!(repr.contains("[1] score=2 member=y"));
}
