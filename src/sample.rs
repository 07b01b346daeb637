//! Picks ranks for `random_members`.

use rand::Rng;
use rustc_hash::FxHashSet;

/// Upper bound on draws with replacement in one call.
pub const MAX_REPEATED_DRAWS: usize = 1 << 20;

/// Ranks to sample from a set of `total` entries.
///
/// A negative `n` draws `|n|` ranks with replacement, capped at
/// [`MAX_REPEATED_DRAWS`]. Otherwise up to `n` distinct ranks are returned:
/// sparse draws use rejection sampling, dense draws a single
/// selection-sampling pass, which yields ranks in order.
pub fn pick<R: Rng + ?Sized>(total: usize, n: i64, rng: &mut R) -> Vec<usize> {
    if total == 0 || n == 0 {
        return Vec::new();
    }
    if n < 0 {
        let asked = n.unsigned_abs();
        let draws = usize::try_from(asked).map_or(MAX_REPEATED_DRAWS, |d| d.min(MAX_REPEATED_DRAWS));
        if (draws as u64) < asked {
            tracing::warn!(asked, draws, "repeated draws capped");
        }
        return (0..draws).map(|_| rng.gen_range(0..total)).collect();
    }
    let want = (n as u64).min(total as u64) as usize;
    if want == total {
        return (0..total).collect();
    }
    if want <= total / 4 {
        rejection(total, want, rng)
    } else {
        selection(total, want, rng)
    }
}

fn rejection<R: Rng + ?Sized>(total: usize, want: usize, rng: &mut R) -> Vec<usize> {
    let mut seen = FxHashSet::default();
    seen.reserve(want);
    let mut out = Vec::with_capacity(want);
    while out.len() < want {
        let r = rng.gen_range(0..total);
        if seen.insert(r) {
            out.push(r);
        }
    }
    out
}

fn selection<R: Rng + ?Sized>(total: usize, want: usize, rng: &mut R) -> Vec<usize> {
    let mut out = Vec::with_capacity(want);
    for i in 0..total {
        let remaining = total - i;
        let needed = want - out.len();
        if needed == 0 {
            break;
        }
        if rng.gen_range(0..remaining) < needed {
            out.push(i);
        }
    }
    out
}
