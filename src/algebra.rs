//! Union, intersection and difference over ordered sets.
//!
//! Weighted scores are combined in `f64`, so integer scores past 2^53 lose
//! precision here. Results are fresh sets with default policy, except
//! [`difference`], which copies the first input.

use std::str::FromStr;

use crate::entries::Entry;
use crate::scalar::Scalar;
use crate::set::OrderedSet;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregate {
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Aggregate::Sum => a + b,
            Aggregate::Min => {
                if a < b {
                    a
                } else {
                    b
                }
            }
            Aggregate::Max => {
                if a > b {
                    a
                } else {
                    b
                }
            }
        }
    }
}

impl FromStr for Aggregate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregate::Sum),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            other => Err(format!("unknown aggregate `{other}`")),
        }
    }
}

#[inline]
fn weight(weights: Option<&[f64]>, i: usize) -> f64 {
    weights.and_then(|w| w.get(i)).copied().unwrap_or(1.0)
}

#[inline]
fn as_f64(score: &Scalar) -> f64 {
    score.to_f64().unwrap_or(0.0)
}

/// Every member of any input. A member's score is its weighted score in the
/// first set holding it, folded with `aggregate` over the later ones.
pub fn union(sets: &[&OrderedSet], weights: Option<&[f64]>, aggregate: Aggregate) -> OrderedSet {
    let mut result = OrderedSet::new();
    for (i, set) in sets.iter().enumerate() {
        let w = weight(weights, i);
        for Entry { member, score } in set.iter() {
            let weighted = as_f64(&score) * w;
            let combined = match result.get_score(&member) {
                Some(existing) => aggregate.apply(as_f64(&existing), weighted),
                None => weighted,
            };
            result.add(combined, &member);
        }
    }
    result
}

/// Members present in every input. Fewer than two inputs give an empty set.
pub fn intersect(sets: &[&OrderedSet], weights: Option<&[f64]>, aggregate: Aggregate) -> OrderedSet {
    let mut result = OrderedSet::new();
    if sets.len() < 2 {
        return result;
    }
    let smallest = smallest(sets);
    'members: for Entry { member, score } in sets[smallest].iter() {
        let mut combined = as_f64(&score) * weight(weights, smallest);
        for (i, other) in sets.iter().enumerate() {
            if i == smallest {
                continue;
            }
            match other.get_score(&member) {
                Some(s) => combined = aggregate.apply(combined, as_f64(&s) * weight(weights, i)),
                None => continue 'members,
            }
        }
        result.add(combined, &member);
    }
    result
}

/// Number of members present in every input, stopping at `limit` when given.
pub fn intersect_card(sets: &[&OrderedSet], limit: Option<usize>) -> usize {
    if sets.len() < 2 {
        return 0;
    }
    let smallest = smallest(sets);
    let mut count = 0;
    for e in sets[smallest].iter() {
        let in_all = sets
            .iter()
            .enumerate()
            .all(|(i, s)| i == smallest || s.exists(&e.member));
        if in_all {
            count += 1;
            if limit.is_some_and(|l| count >= l) {
                break;
            }
        }
    }
    count
}

/// The first input minus every member of the others.
pub fn difference(sets: &[&OrderedSet]) -> OrderedSet {
    let Some((first, rest)) = sets.split_first() else {
        return OrderedSet::new();
    };
    let mut result = first.copy();
    for set in rest {
        for e in set.iter() {
            result.remove(&e.member);
        }
    }
    result
}

fn smallest(sets: &[&OrderedSet]) -> usize {
    let mut best = 0;
    for (i, s) in sets.iter().enumerate().skip(1) {
        if s.count() < sets[best].count() {
            best = i;
        }
    }
    best
}
