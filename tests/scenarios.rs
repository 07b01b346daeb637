mod helpers;

use flexzset::{intersect, union, Aggregate, Entry, OrderedSet, RangeSpec, Scalar, SizeLimit, TierKind};
use helpers::{check_invariants, grown_to, member, members, scores};

fn abc() -> OrderedSet {
    let mut set = OrderedSet::new();
    set.add(1.0, "a");
    set.add(2.0, "b");
    set.add(3.0, "c");
    set
}

fn tens() -> OrderedSet {
    let mut set = OrderedSet::new();
    for i in 0..10 {
        set.add(i * 10, format!("m{i}").as_str());
    }
    set
}

#[test]
fn empty_set_finds_nothing() {
    let set = OrderedSet::new();
    assert_eq!(set.count(), 0);
    assert!(!set.exists("x"));
    assert!(set.first().is_none());
    assert!(set.last().is_none());
    assert!(set.get_by_rank(0).is_none());
    assert!(set.get_by_rank(-1).is_none());
}

#[test]
fn ranks_and_ends() {
    let set = abc();
    assert_eq!(set.count(), 3);
    for (m, rank) in [("a", 0), ("b", 1), ("c", 2)] {
        assert_eq!(set.get_rank(m), Some(rank));
        assert_eq!(set.get_reverse_rank(m), Some(2 - rank));
    }
    assert_eq!(set.first(), Some(Entry::new("a", 1.0)));
    assert_eq!(set.last(), Some(Entry::new("c", 3.0)));
    assert_eq!(set.first(), set.get_by_rank(0));
    assert_eq!(set.last(), set.get_by_rank(set.count() as i64 - 1));
}

#[test]
fn update_replaces_score() {
    let mut set = OrderedSet::new();
    assert!(!set.add(1.0, "x"));
    assert!(set.add(5.0, "x"));
    assert_eq!(set.count(), 1);
    assert_eq!(set.get_score("x"), Some(Scalar::F64(5.0)));
}

#[test]
fn repeated_add_is_idempotent() {
    let mut set = abc();
    assert!(set.add(2.0, "b"));
    let before: Vec<_> = set.iter().collect();
    assert!(set.add(2.0, "b"));
    assert_eq!(set.iter().collect::<Vec<_>>(), before);
}

#[test]
fn add_nx_only_inserts() {
    let mut set = abc();
    assert!(!set.add_nx(9.0, "a"));
    assert_eq!(set.get_score("a"), Some(Scalar::F64(1.0)));
    assert!(set.add_nx(9.0, "z"));
    assert_eq!(set.get_score("z"), Some(Scalar::F64(9.0)));
    assert_eq!(set.count(), 4);
}

#[test]
fn add_xx_only_updates() {
    let mut set = abc();
    assert!(!set.add_xx(9.0, "z"));
    assert!(!set.exists("z"));
    assert!(set.add_xx(9.0, "a"));
    assert_eq!(set.get_rank("a"), Some(2));
}

#[test]
fn count_by_score_bounds() {
    let set = tens();
    assert_eq!(set.count_by_score(&RangeSpec::inclusive(20, 50)), 4);
    assert_eq!(set.count_by_score(&RangeSpec::exclusive(20, 50)), 2);
    assert_eq!(set.count_by_score(&RangeSpec::exclusive(30, 30)), 0);
    assert_eq!(set.count_by_score(&RangeSpec::new(30, true, 30, false)), 0);
    assert_eq!(set.count_by_score(&RangeSpec::inclusive(30, 30)), 1);
    assert_eq!(set.count_by_score(&RangeSpec::all()), 10);
}

#[test]
fn pops_from_both_ends() {
    let mut set = tens();
    assert_eq!(scores(set.pop_min(2)), [0.0, 10.0]);
    assert_eq!(scores(set.pop_max(1)), [90.0]);
    assert_eq!(set.count(), 6);
    assert_eq!(set.pop_min(100).len(), 6);
    assert!(set.is_empty());
    assert!(set.pop_max(1).is_empty());
}

#[test]
fn negative_ranks() {
    let set = tens();
    assert_eq!(set.get_by_rank(-1), set.last());
    assert_eq!(set.get_by_rank(-10), set.first());
    assert!(set.get_by_rank(-11).is_none());
    assert!(set.get_by_rank(10).is_none());
}

#[test]
fn remove_twice() {
    let mut set = abc();
    assert!(set.remove("b"));
    assert!(!set.exists("b"));
    assert_eq!(set.count(), 2);
    assert!(!set.remove("b"));
    assert_eq!(set.count(), 2);
    assert_eq!(set.remove_get_score("c"), Some(Scalar::F64(3.0)));
    assert_eq!(set.remove_get_score("c"), None);
}

#[test]
fn small_limit_promotes_and_keeps_order() {
    let mut set = OrderedSet::with_limit(SizeLimit::L64);
    for i in 0..100u64 {
        set.add(i, format!("m{i}").as_str());
    }
    assert_ne!(set.tier(), TierKind::Small);
    let expected: Vec<_> = (0..100).map(|i| member(&format!("m{i}"))).collect();
    assert_eq!(members(&set), expected);
    check_invariants(&set);
}

#[test]
fn union_sums_scores() {
    let mut a = OrderedSet::new();
    a.add(1, "a");
    a.add(2, "b");
    let mut b = OrderedSet::new();
    b.add(3, "b");
    b.add(4, "c");
    let u = union(&[&a, &b], Some(&[1.0, 1.0][..]), Aggregate::Sum);
    let got: Vec<_> = u.iter().collect();
    assert_eq!(
        got,
        [Entry::new("a", 1.0), Entry::new("c", 4.0), Entry::new("b", 5.0)]
    );
}

#[test]
fn intersect_sums_scores() {
    let a = abc();
    let mut b = OrderedSet::new();
    b.add(10, "b");
    b.add(20, "c");
    let i = intersect(&[&a, &b], Some(&[1.0, 1.0][..]), Aggregate::Sum);
    let got: Vec<_> = i.iter().collect();
    assert_eq!(got, [Entry::new("b", 12.0), Entry::new("c", 23.0)]);
}

#[test]
fn integers_past_f64_precision_stay_distinct() {
    let base = 1u64 << 53;
    let mut set = OrderedSet::new();
    for (i, score) in [base + 2, base, base - 1, base + 1].into_iter().enumerate() {
        set.add(score, format!("p{i}").as_str());
    }
    let ordered: Vec<_> = set.iter().map(|e| e.score).collect();
    assert_eq!(
        ordered,
        [
            Scalar::U64(base - 1),
            Scalar::U64(base),
            Scalar::U64(base + 1),
            Scalar::U64(base + 2)
        ]
    );
    assert_eq!(set.get_rank("p0"), Some(3));
    assert_eq!(set.get_rank("p2"), Some(0));
}

#[test]
fn mixed_numeric_scores_sort_by_value() {
    let mut set = OrderedSet::new();
    set.add(u64::MAX, "umax");
    set.add(i64::MIN, "imin");
    set.add(-0.5, "neg");
    set.add(i128::MAX, "wide");
    set.add(0u64, "zero");
    set.add(1.5f32, "f32");
    let order: Vec<_> = members(&set);
    let expected: Vec<_> = ["imin", "neg", "zero", "f32", "umax", "wide"]
        .into_iter()
        .map(member)
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn copies_do_not_share_state() {
    for tier in [TierKind::Small, TierKind::Medium, TierKind::Full] {
        let mut set = grown_to(OrderedSet::new(), tier);
        let copy = set.copy();
        let before: Vec<_> = copy.iter().collect();
        set.add(-1, "new");
        set.pop_max(3);
        assert_eq!(copy.iter().collect::<Vec<_>>(), before);
        check_invariants(&copy);
        check_invariants(&set);
    }
}

#[test]
fn incr_by_accumulates() {
    let mut set = OrderedSet::new();
    assert_eq!(set.incr_by(5, "a"), Some(Scalar::I64(5)));
    assert_eq!(set.incr_by(2.5, "a"), Some(Scalar::F64(7.5)));
    assert_eq!(set.get_score("a"), Some(Scalar::F64(7.5)));
    set.add(1, "b");
    assert_eq!(set.get_rank("b"), Some(0));
}

#[test]
fn ranges_removed_by_score_and_rank() {
    let mut set = tens();
    assert_eq!(set.remove_range_by_score(&RangeSpec::new(10, false, 40, true)), 3);
    assert_eq!(set.count(), 7);
    assert_eq!(set.remove_range_by_rank(-2, -1), 2);
    assert_eq!(scores(set.iter()), [0.0, 40.0, 50.0, 60.0, 70.0]);
    assert_eq!(set.remove_range_by_rank(3, 1), 0);
    assert_eq!(set.remove_range_by_rank(0, 100), 0);
    assert_eq!(set.remove_range_by_rank(0, -1), 5);
    assert!(set.is_empty());
}
