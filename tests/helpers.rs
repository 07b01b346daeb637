#![allow(dead_code)]

use flexzset::{OrderedSet, Scalar, TierKind};

pub fn member(s: &str) -> Scalar {
    Scalar::bytes(s)
}

pub fn members(set: &OrderedSet) -> Vec<Scalar> {
    set.iter().map(|e| e.member).collect()
}

pub fn scores(entries: impl IntoIterator<Item = flexzset::Entry>) -> Vec<f64> {
    entries.into_iter().map(|e| e.score.to_f64().unwrap()).collect()
}

/// Set filled with `m{i}` at score `i` until it reaches `tier`.
pub fn grown_to(mut set: OrderedSet, tier: TierKind) -> OrderedSet {
    let mut i = 0u64;
    while set.tier() < tier {
        set.add(i, format!("member:{i:05}").as_str());
        i += 1;
        assert!(i < 1_000_000, "set never reached {}", tier.name());
    }
    set
}

/// Walks the set checking ordering, counts, ranks and run bounds.
pub fn check_invariants(set: &OrderedSet) {
    let entries: Vec<_> = set.iter().collect();
    assert_eq!(entries.len(), set.count());
    for pair in entries.windows(2) {
        let a = (&pair[0].score, &pair[0].member);
        let b = (&pair[1].score, &pair[1].member);
        assert!(a < b, "{a:?} !< {b:?}");
    }
    for (rank, e) in entries.iter().enumerate() {
        assert_eq!(set.get_rank(&e.member), Some(rank));
        assert_eq!(set.get_reverse_rank(&e.member), Some(set.count() - 1 - rank));
        assert_eq!(set.get_score(&e.member).as_ref(), Some(&e.score));
    }
    let runs = set.run_summaries();
    assert_eq!(runs.iter().map(|r| r.entries).sum::<usize>(), set.count());
    let bounds: Vec<_> = runs.iter().filter(|r| r.entries > 0).collect();
    for pair in bounds.windows(2) {
        assert!(pair[0].max <= pair[1].min);
    }
    let stats = set.stats();
    assert_eq!(stats.count, set.count());
    assert_eq!(stats.runs, runs.len());
}
