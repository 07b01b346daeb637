use criterion::{black_box, criterion_group, criterion_main, Criterion, SamplingMode, Throughput};
use flexzset::{difference, intersect, intersect_card, union, Aggregate, OrderedSet, PoolKind};

mod support;

fn bench_algebra(c: &mut Criterion) {
    let size = support::usize_env("FLEXZSET_BENCH_ALGEBRA_SIZE", 50_000);
    let overlap_cases = [("0pct", 0.0), ("50pct", 0.5), ("90pct", 0.9)];

    let mut group = c.benchmark_group("algebra");
    group.measurement_time(support::duration_env("FLEXZSET_BENCH_MEASUREMENT_SECS", 10.0));
    group.warm_up_time(support::duration_env("FLEXZSET_BENCH_WARMUP_SECS", 3.0));
    group.sample_size(support::usize_env("FLEXZSET_BENCH_SAMPLE_SIZE", 10));
    group.sampling_mode(SamplingMode::Flat);
    for (label, ratio) in overlap_cases {
        let (a, b) = two_sets_with_overlap(size, ratio);
        let sets = [&a, &b];
        group.throughput(Throughput::Elements((a.len() + b.len()) as u64));
        group.bench_function(format!("union/2sets/{label}"), |bch| {
            bch.iter(|| black_box(union(&sets, None, Aggregate::Sum).count()));
        });
        group.bench_function(format!("inter/2sets/{label}"), |bch| {
            bch.iter(|| black_box(intersect(&sets, None, Aggregate::Sum).count()));
        });
        group.bench_function(format!("diff/2sets/{label}"), |bch| {
            bch.iter(|| black_box(difference(&sets).count()));
        });
        group.bench_function(format!("intercard/2sets/{label}"), |bch| {
            bch.iter(|| black_box(intersect_card(&sets, None)));
        });
    }
    group.finish();
}

fn two_sets_with_overlap(size: usize, ratio: f64) -> (OrderedSet, OrderedSet) {
    let entries_a = support::unique_increasing(size);
    let overlap = ((size as f64) * ratio).round() as usize;
    let mut entries_b = Vec::with_capacity(size);
    for (score, member) in entries_a.iter().take(overlap) {
        entries_b.push((score + 0.5, member.clone()));
    }
    let mut extra_idx = 0usize;
    while entries_b.len() < size {
        entries_b.push((size as f64 + extra_idx as f64, format!("b_extra:{ratio:.2}:{extra_idx}")));
        extra_idx += 1;
    }
    let config = || support::config(PoolKind::None, 0);
    (support::build_set(&entries_a, config()), support::build_set(&entries_b, config()))
}

criterion_group!(benches, bench_algebra);
criterion_main!(benches);
