//! Score formatting for diagnostics.

use ryu::Buffer;
use std::cell::RefCell;

use crate::scalar::ScalarRef;

#[inline]
pub fn fmt_f64(buf: &mut Buffer, score: f64) -> &str {
    if score.is_nan() {
        return "nan";
    }
    if score.is_infinite() {
        return if score > 0.0 { "inf" } else { "-inf" };
    }
    let formatted = buf.format_finite(score);
    formatted.strip_suffix(".0").unwrap_or(formatted)
}

thread_local! {
    static FMT_BUF: RefCell<Buffer> = RefCell::new(Buffer::new());
}

#[inline]
pub fn with_fmt_buf<F, R>(f: F) -> R
where
    F: FnOnce(&mut Buffer) -> R,
{
    FMT_BUF.with(|b| f(&mut b.borrow_mut()))
}

/// Renders any scalar the way `repr` prints it. Byte strings are shown
/// lossily as UTF-8.
pub fn fmt_scalar(value: ScalarRef<'_>) -> String {
    match value {
        ScalarRef::I64(v) => v.to_string(),
        ScalarRef::U64(v) => v.to_string(),
        ScalarRef::I128(v) => v.to_string(),
        ScalarRef::U128(v) => v.to_string(),
        ScalarRef::F32(v) => with_fmt_buf(|b| fmt_f64(b, v as f64).to_owned()),
        ScalarRef::F64(v) => with_fmt_buf(|b| fmt_f64(b, v).to_owned()),
        ScalarRef::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        ScalarRef::True => "true".to_owned(),
        ScalarRef::False => "false".to_owned(),
        ScalarRef::Null => "null".to_owned(),
        ScalarRef::Ptr(id) => format!("ptr:{id}"),
    }
}
