//! Packed sequence of scalars in one contiguous buffer.
//!
//! Layout: an 8 byte header (`u32` total bytes, `u32` element count, both
//! little endian), the elements, then a `0xFF` terminator. Every element is a
//! tag byte, its payload, and a reverse-readable varint holding the size of
//! tag + payload so traversal works in both directions.
//!
//! A [`Cursor`] is a byte offset to the first byte of an element. Mutating
//! calls shift the bytes after the edit point, so any cursor taken before a
//! mutation is stale; the mutating calls hand back the cursor to continue
//! with.

use std::cmp::Ordering;

use crate::error::Error;
use crate::scalar::{Scalar, ScalarRef};

pub const HEADER_SIZE: usize = 8;
pub const EMPTY_SIZE: usize = HEADER_SIZE + 1;
const TERMINATOR: u8 = 0xFF;

const T_FALSE: u8 = 0x01;
const T_TRUE: u8 = 0x02;
const T_NULL: u8 = 0x03;
const T_PTR: u8 = 0x04;
const T_I64: u8 = 0x10;
const T_U64: u8 = 0x11;
const T_I128: u8 = 0x12;
const T_U128: u8 = 0x13;
const T_F32: u8 = 0x14;
const T_F64: u8 = 0x15;
const T_BYTES: u8 = 0x20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(usize);

impl Cursor {
    #[inline]
    pub fn offset(self) -> usize {
        self.0
    }

    /// Rebuilds a cursor from a cached offset (see the tiers' `middle`).
    #[inline]
    pub fn from_offset(offset: usize) -> Self {
        Cursor(offset)
    }
}

/// Outcome of a sorted probe over fixed-width entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// An entry comparing equal to the key.
    Found(Cursor),
    /// The first entry greater than the key.
    Before(Cursor),
    /// Every entry is smaller than the key.
    End,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Flex {
    buf: Vec<u8>,
}

impl Default for Flex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Flex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flex")
            .field("bytes", &self.bytes())
            .field("count", &self.count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// varints

#[inline]
fn varint_len(mut v: u64) -> usize {
    let mut n = 1;
    while v >= 0x80 {
        v >>= 7;
        n += 1;
    }
    n
}

fn put_varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8 & 0x7f) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn get_varint(buf: &[u8]) -> (u64, usize) {
    let mut v = 0u64;
    let mut shift = 0;
    for (i, b) in buf.iter().enumerate() {
        v |= ((b & 0x7f) as u64) << shift;
        if b & 0x80 == 0 {
            return (v, i + 1);
        }
        shift += 7;
    }
    panic!("flex: truncated varint");
}

/// Writes `v` so that it decodes walking backwards from the byte after it.
fn put_backlen(out: &mut Vec<u8>, v: usize) {
    let n = varint_len(v as u64);
    for i in (0..n).rev() {
        let group = ((v >> (7 * i)) & 0x7f) as u8;
        // Every group but the highest (written first) has the continuation bit.
        out.push(if i + 1 < n { group | 0x80 } else { group });
    }
}

/// Decodes a backlen ending right before `end`; returns `(value, size)`.
fn get_backlen(buf: &[u8], end: usize) -> (usize, usize) {
    let mut v = 0usize;
    let mut shift = 0;
    let mut i = end;
    loop {
        i -= 1;
        let b = buf[i];
        v |= ((b & 0x7f) as usize) << shift;
        if b & 0x80 == 0 {
            return (v, end - i);
        }
        shift += 7;
    }
}

#[inline]
fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

#[inline]
fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

// ---------------------------------------------------------------------------
// element codec

fn encode_into(out: &mut Vec<u8>, v: ScalarRef<'_>) {
    let start = out.len();
    match v {
        ScalarRef::False => out.push(T_FALSE),
        ScalarRef::True => out.push(T_TRUE),
        ScalarRef::Null => out.push(T_NULL),
        ScalarRef::Ptr(p) => {
            out.push(T_PTR);
            out.extend_from_slice(&p.to_le_bytes());
        }
        ScalarRef::I64(v) => {
            out.push(T_I64);
            put_varint(out, zigzag(v));
        }
        ScalarRef::U64(v) => {
            out.push(T_U64);
            put_varint(out, v);
        }
        ScalarRef::I128(v) => {
            out.push(T_I128);
            out.extend_from_slice(&v.to_le_bytes());
        }
        ScalarRef::U128(v) => {
            out.push(T_U128);
            out.extend_from_slice(&v.to_le_bytes());
        }
        ScalarRef::F32(v) => {
            out.push(T_F32);
            out.extend_from_slice(&v.to_le_bytes());
        }
        ScalarRef::F64(v) => {
            out.push(T_F64);
            out.extend_from_slice(&v.to_le_bytes());
        }
        ScalarRef::Bytes(b) => {
            out.push(T_BYTES);
            put_varint(out, b.len() as u64);
            out.extend_from_slice(b);
        }
    }
    let len = out.len() - start;
    put_backlen(out, len);
}

/// Encoded size of `v` including its backlen.
pub fn encoded_len(v: ScalarRef<'_>) -> usize {
    let body = 1 + match v {
        ScalarRef::False | ScalarRef::True | ScalarRef::Null => 0,
        ScalarRef::Ptr(_) | ScalarRef::F64(_) => 8,
        ScalarRef::I64(v) => varint_len(zigzag(v)),
        ScalarRef::U64(v) => varint_len(v),
        ScalarRef::I128(_) | ScalarRef::U128(_) => 16,
        ScalarRef::F32(_) => 4,
        ScalarRef::Bytes(b) => varint_len(b.len() as u64) + b.len(),
    };
    body + varint_len(body as u64)
}

impl Flex {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(EMPTY_SIZE);
        buf.extend_from_slice(&(EMPTY_SIZE as u32).to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.push(TERMINATOR);
        Self { buf }
    }

    /// Adopts a buffer previously taken from [`Flex::into_bytes`].
    pub fn from_bytes(buf: Vec<u8>) -> Result<Self, Error> {
        if buf.len() < EMPTY_SIZE
            || buf[buf.len() - 1] != TERMINATOR
            || u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize != buf.len()
        {
            return Err(Error::Corrupt("flex header does not match buffer"));
        }
        Ok(Self { buf })
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Total encoded size, header and terminator included.
    #[inline]
    pub fn bytes(&self) -> usize {
        self.buf.len()
    }

    /// Number of elements (not entries).
    #[inline]
    pub fn count(&self) -> usize {
        u32::from_le_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    fn end(&self) -> usize {
        self.buf.len() - 1
    }

    fn set_header(&mut self, count: usize) {
        debug_assert!(self.buf.len() <= u32::MAX as usize);
        let total = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&total.to_le_bytes());
        self.buf[4..8].copy_from_slice(&(count as u32).to_le_bytes());
    }

    #[inline]
    pub fn head(&self) -> Option<Cursor> {
        (self.count() > 0).then_some(Cursor(HEADER_SIZE))
    }

    #[inline]
    pub fn tail(&self) -> Option<Cursor> {
        if self.count() == 0 {
            return None;
        }
        self.prev_offset(self.end())
    }

    /// Size of the element body (tag + payload) starting at `at`.
    fn body_len(&self, at: usize) -> usize {
        let tag = self.buf[at];
        1 + match tag {
            T_FALSE | T_TRUE | T_NULL => 0,
            T_PTR | T_F64 => 8,
            T_I64 | T_U64 => get_varint(&self.buf[at + 1..]).1,
            T_I128 | T_U128 => 16,
            T_F32 => 4,
            T_BYTES => {
                let (len, n) = get_varint(&self.buf[at + 1..]);
                n + len as usize
            }
            _ => panic!("flex: unknown element tag {tag:#x} at {at}"),
        }
    }

    #[inline]
    fn elem_len(&self, at: usize) -> usize {
        let body = self.body_len(at);
        body + varint_len(body as u64)
    }

    #[inline]
    pub fn next(&self, c: Cursor) -> Option<Cursor> {
        let n = c.0 + self.elem_len(c.0);
        (n < self.end()).then_some(Cursor(n))
    }

    #[inline]
    fn prev_offset(&self, at: usize) -> Option<Cursor> {
        if at <= HEADER_SIZE {
            return None;
        }
        let (body, size) = get_backlen(&self.buf, at);
        Some(Cursor(at - size - body))
    }

    #[inline]
    pub fn prev(&self, c: Cursor) -> Option<Cursor> {
        self.prev_offset(c.0)
    }

    /// Moves `steps` elements forward (or backward when negative).
    pub fn step(&self, mut c: Cursor, steps: isize) -> Option<Cursor> {
        if steps >= 0 {
            for _ in 0..steps {
                c = self.next(c)?;
            }
        } else {
            for _ in 0..steps.unsigned_abs() {
                c = self.prev(c)?;
            }
        }
        Some(c)
    }

    /// Decodes the element at `c`.
    pub fn get(&self, c: Cursor) -> ScalarRef<'_> {
        let at = c.0;
        let p = &self.buf[at + 1..];
        match self.buf[at] {
            T_FALSE => ScalarRef::False,
            T_TRUE => ScalarRef::True,
            T_NULL => ScalarRef::Null,
            T_PTR => ScalarRef::Ptr(u64::from_le_bytes(fixed(p))),
            T_I64 => ScalarRef::I64(unzigzag(get_varint(p).0)),
            T_U64 => ScalarRef::U64(get_varint(p).0),
            T_I128 => ScalarRef::I128(i128::from_le_bytes(fixed(p))),
            T_U128 => ScalarRef::U128(u128::from_le_bytes(fixed(p))),
            T_F32 => ScalarRef::F32(f32::from_le_bytes(fixed(p))),
            T_F64 => ScalarRef::F64(f64::from_le_bytes(fixed(p))),
            T_BYTES => {
                let (len, n) = get_varint(p);
                ScalarRef::Bytes(&p[n..n + len as usize])
            }
            tag => panic!("flex: unknown element tag {tag:#x} at {at}"),
        }
    }

    /// Element at position `i`; negative positions count from the tail.
    pub fn index(&self, i: isize) -> Option<Cursor> {
        self.index_near(i, None)
    }

    /// Like [`Flex::index`], starting the walk from whichever of head, tail
    /// or the `(position, cursor)` hint is closest.
    pub fn index_near(&self, i: isize, hint: Option<(usize, Cursor)>) -> Option<Cursor> {
        let count = self.count();
        let i = if i < 0 { count as isize + i } else { i };
        if i < 0 || i as usize >= count {
            return None;
        }
        let i = i as usize;
        let mut best = (i, self.head()?, 0isize);
        let from_tail = count - 1 - i;
        if from_tail < best.0 {
            best = (from_tail, self.tail()?, -(from_tail as isize));
        }
        if let Some((pos, c)) = hint {
            if pos < count {
                let dist = pos.abs_diff(i);
                if dist < best.0 {
                    best = (dist, c, i as isize - pos as isize);
                }
            }
        }
        let (dist, start, dir) = best;
        if dist == 0 {
            return Some(start);
        }
        self.step(start, if dir < 0 { dir } else { dist as isize })
    }

    /// Cursor to the first element of the middle entry when the flex holds
    /// entries of `per_entry` elements.
    pub fn middle(&self, per_entry: usize) -> Option<Cursor> {
        let entries = self.count() / per_entry;
        if entries == 0 {
            return None;
        }
        self.index(((entries / 2) * per_entry) as isize)
    }

    /// Element position of the cursor returned by [`Flex::middle`].
    #[inline]
    pub fn middle_position(&self, per_entry: usize) -> usize {
        (self.count() / per_entry / 2) * per_entry
    }

    /// Reserves room for `extra` more bytes, failing instead of aborting.
    pub fn try_reserve(&mut self, extra: usize) -> Result<(), Error> {
        self.buf
            .try_reserve(extra)
            .map_err(|_| Error::AllocationFailed { bytes: self.buf.len() + extra })
    }

    fn splice_in(&mut self, at: usize, values: &[ScalarRef<'_>]) -> Result<Cursor, Error> {
        let mut encoded = Vec::new();
        for v in values {
            encode_into(&mut encoded, *v);
        }
        self.try_reserve(encoded.len())?;
        self.buf.splice(at..at, encoded);
        let count = self.count() + values.len();
        self.set_header(count);
        Ok(Cursor(at))
    }

    /// Inserts `values` in order before `c`; returns the cursor of the first
    /// inserted element.
    pub fn insert_before(&mut self, c: Cursor, values: &[ScalarRef<'_>]) -> Result<Cursor, Error> {
        self.splice_in(c.0, values)
    }

    /// Inserts `values` in order after `c`.
    pub fn insert_after(&mut self, c: Cursor, values: &[ScalarRef<'_>]) -> Result<Cursor, Error> {
        let at = c.0 + self.elem_len(c.0);
        self.splice_in(at, values)
    }

    pub fn push_back(&mut self, values: &[ScalarRef<'_>]) -> Result<Cursor, Error> {
        let end = self.end();
        self.splice_in(end, values)
    }

    pub fn push_front(&mut self, values: &[ScalarRef<'_>]) -> Result<Cursor, Error> {
        self.splice_in(HEADER_SIZE, values)
    }

    /// Removes up to `n` elements starting at `c`; returns the cursor of the
    /// element that followed them, if any.
    pub fn delete_count(&mut self, c: Cursor, n: usize) -> Option<Cursor> {
        let mut end = c.0;
        let mut removed = 0;
        while removed < n && end < self.end() {
            end += self.elem_len(end);
            removed += 1;
        }
        self.buf.drain(c.0..end);
        let count = self.count() - removed;
        self.set_header(count);
        (c.0 < self.end()).then_some(c)
    }

    /// Moves every element from `at` onwards into a new flex.
    pub fn split_off(&mut self, at: Cursor) -> Flex {
        let mut moved = 0;
        let mut p = at.0;
        while p < self.end() {
            p += self.elem_len(p);
            moved += 1;
        }
        let end = self.end();
        let mut tail = Flex::new();
        tail.buf.splice(HEADER_SIZE..HEADER_SIZE, self.buf.drain(at.0..end));
        tail.set_header(moved);
        let count = self.count() - moved;
        self.set_header(count);
        tail
    }

    /// Appends every element of `other`.
    pub fn append(&mut self, other: &Flex) -> Result<(), Error> {
        let raw = &other.buf[HEADER_SIZE..other.end()];
        self.try_reserve(raw.len())?;
        let end = self.end();
        self.buf.splice(end..end, raw.iter().copied());
        let count = self.count() + other.count();
        self.set_header(count);
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Flex::new();
    }

    /// Scans entries of `stride` elements in sorted order for the first one
    /// not below the key, as judged by `cmp(entry_cursor)` (ordering of the
    /// entry relative to the key). When `middle` is given and the middle
    /// entry is still below the key, the scan starts there.
    ///
    /// This is a linear walk: the middle hint halves it, so a lookup costs
    /// O(entries) comparisons, not O(log entries).
    pub fn find_sorted_with_middle<F>(&self, stride: usize, middle: Option<Cursor>, mut cmp: F) -> Probe
    where
        F: FnMut(Cursor) -> Ordering,
    {
        let mut cur = match (self.head(), middle) {
            (None, _) => return Probe::End,
            (Some(head), Some(mid)) if mid.0 < self.end() => match cmp(mid) {
                Ordering::Less => Some(mid),
                Ordering::Equal => return Probe::Found(mid),
                Ordering::Greater => Some(head),
            },
            (Some(head), _) => Some(head),
        };
        while let Some(c) = cur {
            match cmp(c) {
                Ordering::Less => {}
                Ordering::Equal => return Probe::Found(c),
                Ordering::Greater => return Probe::Before(c),
            }
            cur = self.step(c, stride as isize);
        }
        Probe::End
    }

    pub fn iter(&self) -> FlexIter<'_> {
        FlexIter {
            flex: self,
            front: self.head(),
            remaining: self.count(),
        }
    }

    pub fn to_vec(&self) -> Vec<Scalar> {
        self.iter().map(ScalarRef::to_owned).collect()
    }
}

#[inline]
fn fixed<const N: usize>(p: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&p[..N]);
    out
}

pub struct FlexIter<'a> {
    flex: &'a Flex,
    front: Option<Cursor>,
    remaining: usize,
}

impl<'a> Iterator for FlexIter<'a> {
    type Item = ScalarRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.front?;
        self.front = self.flex.next(c);
        self.remaining -= 1;
        Some(self.flex.get(c))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for FlexIter<'_> {}
