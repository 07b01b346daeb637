//! Typed scalars stored in a set: scores, members and the raw values a flex
//! holds.
//!
//! [`Scalar`] owns its payload; [`ScalarRef`] borrows byte payloads from a
//! flex or an intern pool. Short byte strings stay inline in the `SmallVec`
//! and spill to the heap past [`EMBED_MAX`].

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::compare;

/// Largest byte payload kept inline in a [`Scalar`].
pub const EMBED_MAX: usize = 16;

pub type InlineBytes = SmallVec<[u8; EMBED_MAX]>;

#[derive(Clone)]
pub enum Scalar {
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F32(f32),
    F64(f64),
    Bytes(InlineBytes),
    True,
    False,
    Null,
    /// Opaque handle; never interpreted by the set.
    Ptr(u64),
}

#[derive(Clone, Copy)]
pub enum ScalarRef<'a> {
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F32(f32),
    F64(f64),
    Bytes(&'a [u8]),
    True,
    False,
    Null,
    Ptr(u64),
}

impl Scalar {
    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Scalar::Bytes(SmallVec::from_slice(b.as_ref()))
    }

    #[inline]
    pub fn as_ref(&self) -> ScalarRef<'_> {
        match self {
            Scalar::I64(v) => ScalarRef::I64(*v),
            Scalar::U64(v) => ScalarRef::U64(*v),
            Scalar::I128(v) => ScalarRef::I128(*v),
            Scalar::U128(v) => ScalarRef::U128(*v),
            Scalar::F32(v) => ScalarRef::F32(*v),
            Scalar::F64(v) => ScalarRef::F64(*v),
            Scalar::Bytes(b) => ScalarRef::Bytes(b.as_slice()),
            Scalar::True => ScalarRef::True,
            Scalar::False => ScalarRef::False,
            Scalar::Null => ScalarRef::Null,
            Scalar::Ptr(p) => ScalarRef::Ptr(*p),
        }
    }

    /// True when a byte payload lives inline rather than on the heap.
    pub fn is_inline(&self) -> bool {
        match self {
            Scalar::Bytes(b) => !b.spilled(),
            _ => true,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.as_ref().is_numeric()
    }

    #[inline]
    pub fn is_member(&self) -> bool {
        self.as_ref().is_member()
    }

    #[inline]
    pub fn to_f64(&self) -> Option<f64> {
        self.as_ref().to_f64()
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Scalar::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

impl<'a> ScalarRef<'a> {
    pub fn to_owned(self) -> Scalar {
        match self {
            ScalarRef::I64(v) => Scalar::I64(v),
            ScalarRef::U64(v) => Scalar::U64(v),
            ScalarRef::I128(v) => Scalar::I128(v),
            ScalarRef::U128(v) => Scalar::U128(v),
            ScalarRef::F32(v) => Scalar::F32(v),
            ScalarRef::F64(v) => Scalar::F64(v),
            ScalarRef::Bytes(b) => Scalar::Bytes(SmallVec::from_slice(b)),
            ScalarRef::True => Scalar::True,
            ScalarRef::False => Scalar::False,
            ScalarRef::Null => Scalar::Null,
            ScalarRef::Ptr(p) => Scalar::Ptr(p),
        }
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ScalarRef::I64(_)
                | ScalarRef::U64(_)
                | ScalarRef::I128(_)
                | ScalarRef::U128(_)
                | ScalarRef::F32(_)
                | ScalarRef::F64(_)
        )
    }

    /// Members are restricted to numbers and byte strings.
    #[inline]
    pub fn is_member(self) -> bool {
        self.is_numeric() || matches!(self, ScalarRef::Bytes(_))
    }

    /// Lossy conversion used by score arithmetic.
    pub fn to_f64(self) -> Option<f64> {
        match self {
            ScalarRef::I64(v) => Some(v as f64),
            ScalarRef::U64(v) => Some(v as f64),
            ScalarRef::I128(v) => Some(v as f64),
            ScalarRef::U128(v) => Some(v as f64),
            ScalarRef::F32(v) => Some(v as f64),
            ScalarRef::F64(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, ScalarRef::F32(_) | ScalarRef::F64(_))
    }

    pub fn as_bytes(self) -> Option<&'a [u8]> {
        match self {
            ScalarRef::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub(crate) fn type_name(self) -> &'static str {
        match self {
            ScalarRef::I64(_) => "i64",
            ScalarRef::U64(_) => "u64",
            ScalarRef::I128(_) => "i128",
            ScalarRef::U128(_) => "u128",
            ScalarRef::F32(_) => "f32",
            ScalarRef::F64(_) => "f64",
            ScalarRef::Bytes(_) => "bytes",
            ScalarRef::True => "true",
            ScalarRef::False => "false",
            ScalarRef::Null => "null",
            ScalarRef::Ptr(_) => "ptr",
        }
    }
}

/// Adds `delta` to `base`.
///
/// Integer operands stay integers while the sum fits in 128 bits: same-type
/// sums keep their variant, mixed or overflowing 64-bit sums widen. A float on
/// either side, or a sum past the 128-bit range, makes the result an `F64`.
/// Returns `None` when either side is not numeric.
pub fn add_scores(base: ScalarRef<'_>, delta: ScalarRef<'_>) -> Option<Scalar> {
    if !base.is_numeric() || !delta.is_numeric() {
        return None;
    }
    if base.is_float() || delta.is_float() {
        return Some(Scalar::F64(base.to_f64()? + delta.to_f64()?));
    }
    let same = match (base, delta) {
        (ScalarRef::I64(a), ScalarRef::I64(b)) => a.checked_add(b).map(Scalar::I64),
        (ScalarRef::U64(a), ScalarRef::U64(b)) => a.checked_add(b).map(Scalar::U64),
        (ScalarRef::U128(a), ScalarRef::U128(b)) => a.checked_add(b).map(Scalar::U128),
        _ => None,
    };
    let exact = same.or_else(|| wide_add(base, delta));
    exact.or_else(|| Some(Scalar::F64(base.to_f64()? + delta.to_f64()?)))
}

fn wide_add(a: ScalarRef<'_>, b: ScalarRef<'_>) -> Option<Scalar> {
    let narrow = !matches!(a, ScalarRef::I128(_) | ScalarRef::U128(_))
        && !matches!(b, ScalarRef::I128(_) | ScalarRef::U128(_));
    let sum = as_i128(a)?.checked_add(as_i128(b)?)?;
    if narrow {
        if let Ok(v) = i64::try_from(sum) {
            return Some(Scalar::I64(v));
        }
        if let Ok(v) = u64::try_from(sum) {
            return Some(Scalar::U64(v));
        }
    }
    Some(Scalar::I128(sum))
}

fn as_i128(v: ScalarRef<'_>) -> Option<i128> {
    match v {
        ScalarRef::I64(v) => Some(v as i128),
        ScalarRef::U64(v) => Some(v as i128),
        ScalarRef::I128(v) => Some(v),
        ScalarRef::U128(v) => i128::try_from(v).ok(),
        _ => None,
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        compare::compare(self.as_ref(), other.as_ref()) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        compare::compare(self.as_ref(), other.as_ref())
    }
}

impl PartialEq for ScalarRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        compare::compare(*self, *other) == Ordering::Equal
    }
}

impl Eq for ScalarRef<'_> {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ref().hash(state)
    }
}

// Numerically equal values compare equal across variants, so they must hash
// the same: integral values hash as i128 (or u128 past i128::MAX), other
// floats by their f64 bits.
impl Hash for ScalarRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match *self {
            ScalarRef::I64(v) => hash_int(v as i128, state),
            ScalarRef::U64(v) => hash_int(v as i128, state),
            ScalarRef::I128(v) => hash_int(v, state),
            ScalarRef::U128(v) => match i128::try_from(v) {
                Ok(v) => hash_int(v, state),
                Err(_) => {
                    state.write_u8(1);
                    state.write_u128(v);
                }
            },
            ScalarRef::F32(v) => hash_float(v as f64, state),
            ScalarRef::F64(v) => hash_float(v, state),
            ScalarRef::Bytes(b) => {
                state.write_u8(3);
                state.write(b);
            }
            ScalarRef::True => state.write_u8(4),
            ScalarRef::False => state.write_u8(5),
            ScalarRef::Null => state.write_u8(6),
            ScalarRef::Ptr(p) => {
                state.write_u8(7);
                state.write_u64(p);
            }
        }
    }
}

#[inline]
fn hash_int<H: Hasher>(v: i128, state: &mut H) {
    state.write_u8(0);
    state.write_i128(v);
}

fn hash_float<H: Hasher>(v: f64, state: &mut H) {
    const TWO_127: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
    const TWO_128: f64 = 2.0 * TWO_127;
    if v.is_nan() {
        state.write_u8(2);
        state.write_u64(f64::NAN.to_bits());
    } else if v.fract() == 0.0 && v >= -TWO_127 && v < TWO_127 {
        hash_int(v as i128, state);
    } else if v.fract() == 0.0 && (TWO_127..TWO_128).contains(&v) {
        state.write_u8(1);
        state.write_u128(v as u128);
    } else {
        state.write_u8(2);
        state.write_u64(v.to_bits());
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl fmt::Debug for ScalarRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarRef::I64(v) => write!(f, "I64({v})"),
            ScalarRef::U64(v) => write!(f, "U64({v})"),
            ScalarRef::I128(v) => write!(f, "I128({v})"),
            ScalarRef::U128(v) => write!(f, "U128({v})"),
            ScalarRef::F32(v) => write!(f, "F32({v})"),
            ScalarRef::F64(v) => write!(f, "F64({v})"),
            ScalarRef::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "Bytes({s:?})"),
                Err(_) => write!(f, "Bytes({b:?})"),
            },
            ScalarRef::True => f.write_str("True"),
            ScalarRef::False => f.write_str("False"),
            ScalarRef::Null => f.write_str("Null"),
            ScalarRef::Ptr(p) => write!(f, "Ptr({p:#x})"),
        }
    }
}

macro_rules! scalar_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Scalar {
                #[inline]
                fn from(v: $t) -> Self {
                    Scalar::$variant(v)
                }
            }
        )*
    };
}

scalar_from!(i64 => I64, u64 => U64, i128 => I128, u128 => U128, f32 => F32, f64 => F64);

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::I64(v as i64)
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::U64(v as u64)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        if v {
            Scalar::True
        } else {
            Scalar::False
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::bytes(v)
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::bytes(v)
    }
}

impl From<&[u8]> for Scalar {
    fn from(v: &[u8]) -> Self {
        Scalar::bytes(v)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Scalar::Bytes(SmallVec::from_vec(v))
    }
}

impl<'a> From<&'a Scalar> for ScalarRef<'a> {
    fn from(v: &'a Scalar) -> Self {
        v.as_ref()
    }
}

macro_rules! scalar_ref_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for ScalarRef<'_> {
                #[inline]
                fn from(v: $t) -> Self {
                    ScalarRef::$variant(v.into())
                }
            }
        )*
    };
}

scalar_ref_from!(
    i64 => I64, i32 => I64, u64 => U64, u32 => U64,
    i128 => I128, u128 => U128, f32 => F32, f64 => F64,
);

impl<'a> From<&'a str> for ScalarRef<'a> {
    fn from(v: &'a str) -> Self {
        ScalarRef::Bytes(v.as_bytes())
    }
}

impl<'a> From<&'a String> for ScalarRef<'a> {
    fn from(v: &'a String) -> Self {
        ScalarRef::Bytes(v.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for ScalarRef<'a> {
    fn from(v: &'a [u8]) -> Self {
        ScalarRef::Bytes(v)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ScalarRef<'a> {
    fn from(v: &'a [u8; N]) -> Self {
        ScalarRef::Bytes(v)
    }
}
