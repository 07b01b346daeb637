use crate::error::Error;
use crate::pool::{PoolBackend, SharedPool};

/// Deepest compression depth a set accepts.
pub const MAX_DEPTH: u8 = 8;
pub const DEFAULT_RUN_CAPACITY: usize = 4096;
pub const MIN_RUN_CAPACITY: usize = 64;
pub const DEFAULT_SEED: u64 = 0xABCD_EF01_2345_6789;

const LIMITS: [u32; 12] = [
    0, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536,
];

/// Byte budget class for the small tier; the medium tier gets three times as
/// much before the set moves to the full tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SizeLimit(u8);

impl SizeLimit {
    pub const L0: SizeLimit = SizeLimit(0);
    pub const L64: SizeLimit = SizeLimit(1);
    pub const L128: SizeLimit = SizeLimit(2);
    pub const L256: SizeLimit = SizeLimit(3);
    pub const L512: SizeLimit = SizeLimit(4);
    pub const L1024: SizeLimit = SizeLimit(5);
    pub const L2048: SizeLimit = SizeLimit(6);
    pub const L4096: SizeLimit = SizeLimit(7);
    pub const L8192: SizeLimit = SizeLimit(8);
    pub const L16384: SizeLimit = SizeLimit(9);
    pub const L32768: SizeLimit = SizeLimit(10);
    pub const L65536: SizeLimit = SizeLimit(11);

    /// Level for an exact byte count from the supported list.
    pub fn from_bytes(bytes: u32) -> Result<Self, Error> {
        LIMITS
            .iter()
            .position(|&l| l == bytes)
            .map(|i| SizeLimit(i as u8))
            .ok_or(Error::InvalidSizeLimit(bytes))
    }

    #[inline]
    pub fn level(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn bytes(self) -> usize {
        LIMITS[self.0 as usize] as usize
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit::L2048
    }
}

impl TryFrom<u32> for SizeLimit {
    type Error = Error;

    fn try_from(bytes: u32) -> Result<Self, Error> {
        SizeLimit::from_bytes(bytes)
    }
}

/// Which interning pool, if any, the full tier stores members through.
#[derive(Clone, Default)]
pub enum PoolKind {
    #[default]
    None,
    Hash,
    Tree,
    /// A pool shared with other sets; the set never resets it.
    Shared(SharedPool),
}

impl PoolKind {
    pub fn backend(&self) -> Option<PoolBackend> {
        match self {
            PoolKind::None => None,
            PoolKind::Hash => Some(PoolBackend::Hash),
            PoolKind::Tree => Some(PoolBackend::Tree),
            PoolKind::Shared(p) => Some(p.lock().unwrap_or_else(std::sync::PoisonError::into_inner).kind()),
        }
    }
}

impl std::fmt::Debug for PoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolKind::None => f.write_str("None"),
            PoolKind::Hash => f.write_str("Hash"),
            PoolKind::Tree => f.write_str("Tree"),
            PoolKind::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub size_limit: SizeLimit,
    pub compression_depth: u8,
    pub pool: PoolKind,
    pub run_capacity: usize,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size_limit: SizeLimit::default(),
            compression_depth: 0,
            pool: PoolKind::None,
            run_capacity: DEFAULT_RUN_CAPACITY,
            seed: DEFAULT_SEED,
        }
    }
}

impl Config {
    pub fn size_limit(mut self, limit: SizeLimit) -> Self {
        self.size_limit = limit;
        self
    }

    pub fn compression_depth(mut self, depth: u8) -> Self {
        self.compression_depth = depth;
        self
    }

    pub fn pool(mut self, pool: PoolKind) -> Self {
        self.pool = pool;
        self
    }

    pub fn run_capacity(mut self, bytes: usize) -> Self {
        self.run_capacity = bytes;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.compression_depth > MAX_DEPTH {
            return Err(Error::InvalidCompressionDepth(self.compression_depth));
        }
        if self.run_capacity < MIN_RUN_CAPACITY {
            return Err(Error::InvalidRunCapacity(self.run_capacity));
        }
        Ok(())
    }
}
