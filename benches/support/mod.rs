#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use flexzset::{Config, OrderedSet, PoolKind};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

static RNG_COUNTER: AtomicU64 = AtomicU64::new(0);

fn base_seed() -> u64 {
    std::env::var("FLEXZSET_BENCH_SEED")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x7d11_5eed_f065_cafe)
}

pub fn usize_env(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

pub fn duration_env(name: &str, default_secs: f64) -> Duration {
    let secs = std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(default_secs);
    Duration::from_secs_f64(secs)
}

#[inline]
pub fn seeded_rng() -> StdRng {
    let n = RNG_COUNTER.fetch_add(1, Ordering::Relaxed);
    StdRng::seed_from_u64(base_seed().wrapping_add(n))
}

pub fn unique_increasing(n: usize) -> Vec<(f64, String)> {
    (0..n).map(|i| (i as f64, format!("member:{i}"))).collect()
}

pub fn uniform_random(n: usize, score_range: f64) -> Vec<(f64, String)> {
    let mut rng = seeded_rng();
    (0..n)
        .map(|i| (rng.gen_range(0.0..score_range), format!("rand:{i}")))
        .collect()
}

pub fn same_score(n: usize, score: f64) -> Vec<(f64, String)> {
    (0..n).map(|i| (score, format!("same:{i}"))).collect()
}

pub fn shuffled(mut entries: Vec<(f64, String)>) -> Vec<(f64, String)> {
    entries.shuffle(&mut seeded_rng());
    entries
}

pub fn config(pool: PoolKind, depth: u8) -> Config {
    Config::default().pool(pool).compression_depth(depth)
}

pub fn build_set(entries: &[(f64, String)], config: Config) -> OrderedSet {
    let mut set = OrderedSet::with_config(config).expect("bench config");
    for (score, member) in entries {
        set.add(*score, member);
    }
    set
}

pub fn pick_existing(entries: &[(f64, String)], k: usize) -> Vec<String> {
    let mut rng = seeded_rng();
    let mut names: Vec<_> = entries.iter().map(|(_, m)| m.clone()).collect();
    names.shuffle(&mut rng);
    names.truncate(names.len().min(k));
    names
}
