//! Total order over scalars.
//!
//! Numbers sort by mathematical value across all six numeric variants without
//! lossy coercion, then byte strings (unsigned lexicographic), then the
//! singletons `False < Null < True < Ptr`. NaN sorts after every other number.

use ordered_float::OrderedFloat;
use std::cmp::Ordering;

use crate::scalar::{Scalar, ScalarRef};

const TWO_127: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
const TWO_128: f64 = 2.0 * TWO_127;

#[derive(Clone, Copy)]
enum Num {
    Int(i128),
    /// Unsigned values above `i128::MAX`.
    Big(u128),
    Float(f64),
}

#[inline]
fn class(v: ScalarRef<'_>) -> u8 {
    match v {
        ScalarRef::I64(_)
        | ScalarRef::U64(_)
        | ScalarRef::I128(_)
        | ScalarRef::U128(_)
        | ScalarRef::F32(_)
        | ScalarRef::F64(_) => 0,
        ScalarRef::Bytes(_) => 1,
        ScalarRef::False => 2,
        ScalarRef::Null => 3,
        ScalarRef::True => 4,
        ScalarRef::Ptr(_) => 5,
    }
}

#[inline]
fn num(v: ScalarRef<'_>) -> Num {
    match v {
        ScalarRef::I64(v) => Num::Int(v as i128),
        ScalarRef::U64(v) => Num::Int(v as i128),
        ScalarRef::I128(v) => Num::Int(v),
        ScalarRef::U128(v) => match i128::try_from(v) {
            Ok(v) => Num::Int(v),
            Err(_) => Num::Big(v),
        },
        ScalarRef::F32(v) => Num::Float(v as f64),
        ScalarRef::F64(v) => Num::Float(v),
        _ => unreachable!("num() called on non-numeric scalar"),
    }
}

fn int_float(i: i128, f: f64) -> Ordering {
    if f.is_nan() || f >= TWO_127 {
        return Ordering::Less;
    }
    if f < -TWO_127 {
        return Ordering::Greater;
    }
    let t = f.trunc();
    match i.cmp(&(t as i128)) {
        Ordering::Equal => {
            if f > t {
                Ordering::Less
            } else if f < t {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        o => o,
    }
}

fn big_float(u: u128, f: f64) -> Ordering {
    if f.is_nan() || f >= TWO_128 {
        return Ordering::Less;
    }
    if f < TWO_127 {
        return Ordering::Greater;
    }
    // Floats this large have no fractional part.
    u.cmp(&(f as u128))
}

fn compare_numbers(a: Num, b: Num) -> Ordering {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => a.cmp(&b),
        (Num::Big(a), Num::Big(b)) => a.cmp(&b),
        (Num::Big(_), Num::Int(_)) => Ordering::Greater,
        (Num::Int(_), Num::Big(_)) => Ordering::Less,
        (Num::Float(a), Num::Float(b)) => OrderedFloat(a).cmp(&OrderedFloat(b)),
        (Num::Int(a), Num::Float(b)) => int_float(a, b),
        (Num::Float(a), Num::Int(b)) => int_float(b, a).reverse(),
        (Num::Big(a), Num::Float(b)) => big_float(a, b),
        (Num::Float(a), Num::Big(b)) => big_float(b, a).reverse(),
    }
}

/// Compares two scalars under the set's total order.
pub fn compare(a: ScalarRef<'_>, b: ScalarRef<'_>) -> Ordering {
    let (ca, cb) = (class(a), class(b));
    if ca != cb {
        return ca.cmp(&cb);
    }
    match (a, b) {
        (ScalarRef::Bytes(a), ScalarRef::Bytes(b)) => a.cmp(b),
        (ScalarRef::Ptr(a), ScalarRef::Ptr(b)) => a.cmp(&b),
        _ if ca == 0 => compare_numbers(num(a), num(b)),
        _ => Ordering::Equal,
    }
}

/// Orders `(score, member)` pairs: score first, member breaks ties.
#[inline]
pub fn compare_entry(
    score_a: ScalarRef<'_>,
    member_a: ScalarRef<'_>,
    score_b: ScalarRef<'_>,
    member_b: ScalarRef<'_>,
) -> Ordering {
    compare(score_a, score_b).then_with(|| compare(member_a, member_b))
}

/// Score interval used by range queries and range removal.
#[derive(Clone, Debug)]
pub struct RangeSpec {
    pub min: Scalar,
    pub max: Scalar,
    pub min_exclusive: bool,
    pub max_exclusive: bool,
}

impl RangeSpec {
    pub fn new(
        min: impl Into<Scalar>,
        min_exclusive: bool,
        max: impl Into<Scalar>,
        max_exclusive: bool,
    ) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            min_exclusive,
            max_exclusive,
        }
    }

    pub fn inclusive(min: impl Into<Scalar>, max: impl Into<Scalar>) -> Self {
        Self::new(min, false, max, false)
    }

    pub fn exclusive(min: impl Into<Scalar>, max: impl Into<Scalar>) -> Self {
        Self::new(min, true, max, true)
    }

    /// Every representable score, NaN included.
    pub fn all() -> Self {
        Self::new(f64::NEG_INFINITY, false, f64::NAN, false)
    }

    /// True when no score can satisfy the range.
    pub fn is_empty(&self) -> bool {
        match compare(self.min.as_ref(), self.max.as_ref()) {
            Ordering::Greater => true,
            Ordering::Equal => self.min_exclusive || self.max_exclusive,
            Ordering::Less => false,
        }
    }

    #[inline]
    pub fn above_min(&self, score: ScalarRef<'_>) -> bool {
        match compare(score, self.min.as_ref()) {
            Ordering::Greater => true,
            Ordering::Equal => !self.min_exclusive,
            Ordering::Less => false,
        }
    }

    #[inline]
    pub fn below_max(&self, score: ScalarRef<'_>) -> bool {
        match compare(score, self.max.as_ref()) {
            Ordering::Less => true,
            Ordering::Equal => !self.max_exclusive,
            Ordering::Greater => false,
        }
    }

    #[inline]
    pub fn contains(&self, score: ScalarRef<'_>) -> bool {
        self.above_min(score) && self.below_max(score)
    }
}
