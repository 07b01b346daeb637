use std::io;

/// Errors raised while building a set or growing its buffers.
///
/// Lookups and updates report "not found" and failed preconditions through
/// their return values; only configuration, allocation and compression
/// problems surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("size limit {0} is not a supported level")]
    InvalidSizeLimit(u32),

    #[error("run capacity {0} is below the minimum of {min}", min = crate::config::MIN_RUN_CAPACITY)]
    InvalidRunCapacity(usize),

    #[error("compression depth {0} exceeds the maximum of {max}", max = crate::config::MAX_DEPTH)]
    InvalidCompressionDepth(u8),

    #[error("failed to allocate {bytes} bytes")]
    AllocationFailed { bytes: usize },

    #[error("compression failed: {0}")]
    Compression(#[from] io::Error),

    #[error("corrupt buffer: {0}")]
    Corrupt(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
