mod helpers;

use flexzset::pool::{new_pool, HashPool, TreePool};
use flexzset::{shared_pool, Config, InternPool, OrderedSet, PoolBackend, PoolKind, SizeLimit, TierKind};
use helpers::{check_invariants, grown_to, members};

fn pooled(pool: PoolKind) -> OrderedSet {
    let config = Config::default()
        .size_limit(SizeLimit::L64)
        .run_capacity(256)
        .pool(pool);
    OrderedSet::with_config(config).unwrap()
}

fn exercise(pool: &mut dyn InternPool) {
    let a = pool.intern(b"alpha");
    let b = pool.intern(b"beta");
    assert_ne!(a, b);
    assert_eq!(pool.intern(b"alpha"), a);
    assert_eq!(pool.refcount(a), 2);
    assert_eq!(pool.lookup(a), Some(&b"alpha"[..]));
    assert_eq!(pool.get_id(b"beta"), Some(b));
    assert!(pool.exists(b"beta"));
    assert_eq!(pool.count(), 2);

    pool.retain(b);
    assert!(!pool.release(b));
    assert!(pool.release(b));
    assert!(!pool.exists(b"beta"));
    assert_eq!(pool.lookup(b), None);
    assert_eq!(pool.count(), 1);

    pool.reset();
    assert_eq!(pool.count(), 0);
    assert!(!pool.exists(b"alpha"));
}

#[test]
fn both_backends_share_one_contract() {
    exercise(&mut HashPool::default());
    exercise(&mut TreePool::default());
    for kind in [PoolBackend::Hash, PoolBackend::Tree] {
        let mut pool = new_pool(kind);
        assert_eq!(pool.kind(), kind);
        exercise(pool.as_mut());
    }
}

#[test]
fn pooled_sets_behave_like_plain_ones() {
    for kind in [PoolKind::Hash, PoolKind::Tree] {
        let mut plain = pooled(PoolKind::None);
        let mut set = pooled(kind);
        for i in 0..400u64 {
            let m = format!("member-{:04}", (i * 37) % 400);
            plain.add(i % 50, m.as_str());
            set.add(i % 50, m.as_str());
        }
        assert_eq!(set.tier(), TierKind::Full);
        assert_eq!(members(&set), members(&plain));
        assert_eq!(set.stats().pool_strings, Some(400));
        assert_eq!(plain.stats().pool_strings, None);
        check_invariants(&set);

        for i in 0..100u64 {
            set.remove(format!("member-{i:04}").as_str());
        }
        assert_eq!(set.stats().pool_strings, Some(300));
        set.pop_max(50);
        assert_eq!(set.stats().pool_strings, Some(250));
        check_invariants(&set);

        set.reset();
        assert_eq!(set.stats().pool_strings, Some(0));
    }
}

#[test]
fn shared_pool_counts_every_holder() {
    let pool = shared_pool(PoolBackend::Hash);
    let mut a = grown_to(pooled(PoolKind::Shared(pool.clone())), TierKind::Full);
    let mut b = grown_to(pooled(PoolKind::Shared(pool.clone())), TierKind::Full);
    let n = a.count().max(b.count());
    // both sets grow through the same member names
    assert_eq!(pool.lock().unwrap().count(), n);

    let copy = a.copy();
    a.reset();
    b.reset();
    assert_eq!(pool.lock().unwrap().count(), copy.count());
    check_invariants(&copy);

    drop(copy);
    assert_eq!(pool.lock().unwrap().count(), 0);
}

#[test]
fn numeric_members_skip_the_pool() {
    let mut set = pooled(PoolKind::Tree);
    for i in 0..200u64 {
        set.add(0, i);
    }
    set.add(0, "only-string");
    assert_eq!(set.tier(), TierKind::Full);
    assert_eq!(set.stats().pool_strings, Some(1));
    assert_eq!(set.get_rank("only-string"), Some(200));
}

#[test]
fn churn_keeps_pool_memory_bounded() {
    for kind in [PoolBackend::Hash, PoolBackend::Tree] {
        let mut pool = new_pool(kind);
        let keep: Vec<_> = (0..1000)
            .map(|i| pool.intern(format!("keep-{i}").as_bytes()))
            .collect();
        let mut peak = 0;
        for i in 0..200_000 {
            let id = pool.intern(format!("churn-{i:08}").as_bytes());
            assert!(pool.release(id));
            peak = peak.max(pool.bytes());
        }
        assert!(peak < 1 << 20, "{kind:?} grew to {peak} bytes");
        assert_eq!(pool.count(), keep.len());
        for (i, id) in keep.iter().enumerate() {
            let name = format!("keep-{i}");
            assert_eq!(pool.lookup(*id), Some(name.as_bytes()));
            assert_eq!(pool.get_id(name.as_bytes()), Some(*id));
            assert_eq!(pool.refcount(*id), 1);
        }
    }
}

#[test]
fn pooled_set_survives_member_churn() {
    let mut set = pooled(PoolKind::Hash);
    for i in 0..100u64 {
        set.add(i, format!("stable-{i:03}").as_str());
    }
    let stable = members(&set);
    for i in 0..20_000u64 {
        let m = format!("churn-{i:06}");
        set.add(50, m.as_str());
        assert!(set.remove(m.as_str()));
    }
    assert_eq!(members(&set), stable);
    assert_eq!(set.stats().pool_strings, Some(100));
    assert_eq!(set.get_rank("stable-042"), Some(42));
    check_invariants(&set);
}
