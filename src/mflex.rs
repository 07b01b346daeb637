//! A flex that may be held zstd-compressed.
//!
//! Readers get a [`Cow`]: borrowed when the flex is live, an inflated copy
//! when it is packed. Writers `open` (inflate in place), mutate, then `close`
//! to recompress if the holder is still eligible.

use std::borrow::Cow;

use crate::error::Error;
use crate::flex::Flex;

/// Flexes smaller than this are never compressed.
pub const MIN_COMPRESS_BYTES: usize = 256;
const LEVEL: i32 = 3;

#[derive(Clone, Debug)]
pub enum MFlex {
    Live(Flex),
    Packed {
        data: Vec<u8>,
        raw_len: usize,
        count: usize,
    },
}

impl Default for MFlex {
    fn default() -> Self {
        MFlex::Live(Flex::new())
    }
}

impl From<Flex> for MFlex {
    fn from(f: Flex) -> Self {
        MFlex::Live(f)
    }
}

impl MFlex {
    #[inline]
    pub fn is_compressed(&self) -> bool {
        matches!(self, MFlex::Packed { .. })
    }

    /// Bytes held right now (compressed size when packed).
    pub fn bytes(&self) -> usize {
        match self {
            MFlex::Live(f) => f.bytes(),
            MFlex::Packed { data, .. } => data.len(),
        }
    }

    /// Size of the flex once inflated.
    pub fn raw_bytes(&self) -> usize {
        match self {
            MFlex::Live(f) => f.bytes(),
            MFlex::Packed { raw_len, .. } => *raw_len,
        }
    }

    /// Element count, available without inflating.
    pub fn count(&self) -> usize {
        match self {
            MFlex::Live(f) => f.count(),
            MFlex::Packed { count, .. } => *count,
        }
    }

    pub fn try_view(&self) -> Result<Cow<'_, Flex>, Error> {
        match self {
            MFlex::Live(f) => Ok(Cow::Borrowed(f)),
            MFlex::Packed { data, raw_len, .. } => {
                let raw = zstd::bulk::decompress(data, *raw_len)?;
                Ok(Cow::Owned(Flex::from_bytes(raw)?))
            }
        }
    }

    /// Read access to the flex.
    ///
    /// # Panics
    ///
    /// When the packed bytes no longer inflate; they are only ever produced by
    /// [`MFlex::close`], so this means memory corruption.
    pub fn view(&self) -> Cow<'_, Flex> {
        match self.try_view() {
            Ok(f) => f,
            Err(e) => panic!("mflex: packed run does not inflate: {e}"),
        }
    }

    /// Inflates in place and hands out the live flex.
    pub fn open(&mut self) -> Result<&mut Flex, Error> {
        if let MFlex::Packed { .. } = self {
            let flex = self.try_view()?.into_owned();
            tracing::trace!(bytes = flex.bytes(), "mflex open");
            *self = MFlex::Live(flex);
        }
        match self {
            MFlex::Live(f) => Ok(f),
            MFlex::Packed { .. } => unreachable!(),
        }
    }

    /// Recompresses when `compress` is set and the flex is large enough.
    /// Keeps the flex live if compression does not shrink it or fails.
    pub fn close(&mut self, compress: bool) {
        let MFlex::Live(flex) = self else {
            return;
        };
        if !compress || flex.bytes() < MIN_COMPRESS_BYTES {
            return;
        }
        match zstd::bulk::compress(flex.as_bytes(), LEVEL) {
            Ok(data) if data.len() < flex.bytes() => {
                tracing::trace!(raw = flex.bytes(), packed = data.len(), "mflex close");
                *self = MFlex::Packed {
                    data,
                    raw_len: flex.bytes(),
                    count: flex.count(),
                };
            }
            Ok(_) => {}
            Err(e) => tracing::trace!(error = %e, "mflex close left run uncompressed"),
        }
    }

    pub fn into_flex(self) -> Flex {
        match self {
            MFlex::Live(f) => f,
            packed => packed.view().into_owned(),
        }
    }
}
