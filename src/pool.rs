//! Reference-counted byte string interning.
//!
//! Two interchangeable backends sit behind [`InternPool`]: [`HashPool`]
//! (arena + raw hash table, O(1)) and [`TreePool`] (ordered maps, O(log n),
//! less overhead per string). IDs are 1-based; `0` is never handed out.

use hashbrown::raw::RawTable;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[cfg(feature = "fast-hash")]
use rustc_hash::FxHasher;
#[cfg(feature = "fast-hash")]
use std::hash::BuildHasherDefault;

#[cfg(not(feature = "fast-hash"))]
use ahash::RandomState;

#[cfg(feature = "fast-hash")]
pub(crate) type Build = BuildHasherDefault<FxHasher>;
#[cfg(not(feature = "fast-hash"))]
pub(crate) type Build = RandomState;

pub type AtomId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolBackend {
    Hash,
    Tree,
}

impl PoolBackend {
    pub fn name(self) -> &'static str {
        match self {
            PoolBackend::Hash => "hash",
            PoolBackend::Tree => "tree",
        }
    }
}

/// Capability shared by both pool backends.
pub trait InternPool: fmt::Debug {
    /// Returns the ID for `bytes`, creating it if needed; the refcount grows
    /// by one either way.
    fn intern(&mut self, bytes: &[u8]) -> AtomId;
    /// ID of an interned string without touching its refcount.
    fn get_id(&self, bytes: &[u8]) -> Option<AtomId>;
    fn exists(&self, bytes: &[u8]) -> bool {
        self.get_id(bytes).is_some()
    }
    fn lookup(&self, id: AtomId) -> Option<&[u8]>;
    fn retain(&mut self, id: AtomId);
    /// Drops one reference; true when the string was freed.
    fn release(&mut self, id: AtomId) -> bool;
    fn refcount(&self, id: AtomId) -> u64;
    /// Number of distinct strings held.
    fn count(&self) -> usize;
    /// Approximate heap footprint.
    fn bytes(&self) -> usize;
    /// Drops every string. IDs handed out before are invalid afterwards.
    fn reset(&mut self);
    fn kind(&self) -> PoolBackend;
    fn boxed_clone(&self) -> Box<dyn InternPool + Send>;
}

pub fn new_pool(kind: PoolBackend) -> Box<dyn InternPool + Send> {
    match kind {
        PoolBackend::Hash => Box::new(HashPool::default()),
        PoolBackend::Tree => Box::new(TreePool::default()),
    }
}

// ---------------------------------------------------------------------------
// hash backend

// Encodes location inside the arena.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Loc {
    chunk: u32,
    off: u32,
    len: u32,
}

// Entry we store in RawTable. No owned strings.
#[derive(Clone)]
struct KeyEntry {
    hash: u64,
    loc: Loc,
    id: AtomId,
}

#[derive(Clone, Copy)]
struct Slot {
    loc: Loc,
    refs: u64,
}

const ARENA_CHUNK: usize = 64 * 1024;

#[derive(Clone)]
pub struct HashPool {
    hasher: Build,
    // Append-only chunks for string bytes, compacted once dead bytes
    // outweigh live ones
    arena: Vec<Box<[u8]>>,
    write_chunk: usize,
    write_off: usize,
    live_bytes: usize,
    dead_bytes: usize,
    // Key lookup table: compares by bytes in arena
    table: RawTable<KeyEntry>,
    // id - 1 -> slot (None when freed)
    slots: Vec<Option<Slot>>,
    free_ids: Vec<AtomId>,
    len: usize,
}

impl Default for HashPool {
    fn default() -> Self {
        Self {
            hasher: Build::default(),
            arena: Vec::new(),
            write_chunk: 0,
            write_off: 0,
            live_bytes: 0,
            dead_bytes: 0,
            table: RawTable::new(),
            slots: Vec::new(),
            free_ids: Vec::new(),
            len: 0,
        }
    }
}

impl fmt::Debug for HashPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashPool")
            .field("arena_chunks", &self.arena.len())
            .field("write_chunk", &self.write_chunk)
            .field("write_off", &self.write_off)
            .field("live_bytes", &self.live_bytes)
            .field("dead_bytes", &self.dead_bytes)
            .field("len", &self.len)
            .field("allocated_ids", &self.slots.len())
            .finish()
    }
}

impl HashPool {
    pub fn allocated_ids(&self) -> usize {
        self.slots.len()
    }

    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let mut state = self.hasher.build_hasher();
        state.write(bytes);
        state.finish()
    }

    fn slot(&self, id: AtomId) -> Option<&Slot> {
        let idx = usize::try_from(id.checked_sub(1)?).ok()?;
        self.slots.get(idx)?.as_ref()
    }

    fn slot_mut(&mut self, id: AtomId) -> Option<&mut Slot> {
        let idx = usize::try_from(id.checked_sub(1)?).ok()?;
        self.slots.get_mut(idx)?.as_mut()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Loc {
        self.ensure_capacity(bytes.len());
        let chunk_idx = self.write_chunk;
        let start = self.write_off;
        let end = start + bytes.len();
        self.arena[chunk_idx][start..end].copy_from_slice(bytes);
        self.write_off = end;
        Loc {
            chunk: chunk_idx as u32,
            off: start as u32,
            len: bytes.len() as u32,
        }
    }

    fn ensure_capacity(&mut self, needed: usize) {
        let fits = self
            .arena
            .get(self.write_chunk)
            .is_some_and(|chunk| self.write_off + needed <= chunk.len());
        if !fits {
            let chunk = vec![0u8; ARENA_CHUNK.max(needed)].into_boxed_slice();
            self.arena.push(chunk);
            self.write_chunk = self.arena.len() - 1;
            self.write_off = 0;
        }
    }

    fn loc_bytes(&self, loc: Loc) -> &[u8] {
        let off = loc.off as usize;
        &self.arena[loc.chunk as usize][off..off + loc.len as usize]
    }

    fn maybe_compact(&mut self) {
        if self.dead_bytes >= ARENA_CHUNK && self.dead_bytes > self.live_bytes {
            self.compact();
        }
    }

    /// Rewrites every live string into a fresh arena and rebuilds the table.
    /// IDs are unchanged.
    fn compact(&mut self) {
        tracing::trace!(
            live = self.live_bytes,
            dead = self.dead_bytes,
            chunks = self.arena.len(),
            "compacting intern arena"
        );
        let old = std::mem::take(&mut self.arena);
        self.write_chunk = 0;
        self.write_off = 0;
        self.dead_bytes = 0;
        self.table.clear();
        for idx in 0..self.slots.len() {
            let Some(slot) = self.slots[idx] else {
                continue;
            };
            let off = slot.loc.off as usize;
            let bytes = &old[slot.loc.chunk as usize][off..off + slot.loc.len as usize];
            let loc = self.write_bytes(bytes);
            let hash = self.hash_bytes(bytes);
            let id = idx as AtomId + 1;
            self.slots[idx] = Some(Slot { loc, refs: slot.refs });
            self.table
                .insert(hash, KeyEntry { hash, loc, id }, |entry| entry.hash);
        }
    }
}

impl InternPool for HashPool {
    fn intern(&mut self, bytes: &[u8]) -> AtomId {
        let hash = self.hash_bytes(bytes);
        let found = self
            .table
            .get(hash, |entry| self.loc_bytes(entry.loc) == bytes)
            .map(|entry| entry.id);
        if let Some(id) = found {
            if let Some(slot) = self.slot_mut(id) {
                slot.refs += 1;
            }
            return id;
        }

        let loc = self.write_bytes(bytes);
        let slot = Some(Slot { loc, refs: 1 });
        let id = match self.free_ids.pop() {
            Some(id) => {
                self.slots[(id - 1) as usize] = slot;
                id
            }
            None => {
                self.slots.push(slot);
                self.slots.len() as AtomId
            }
        };
        self.table
            .insert(hash, KeyEntry { hash, loc, id }, |entry| entry.hash);
        self.len += 1;
        self.live_bytes += bytes.len();
        id
    }

    fn get_id(&self, bytes: &[u8]) -> Option<AtomId> {
        let hash = self.hash_bytes(bytes);
        self.table
            .get(hash, |entry| self.loc_bytes(entry.loc) == bytes)
            .map(|entry| entry.id)
    }

    fn lookup(&self, id: AtomId) -> Option<&[u8]> {
        self.slot(id).map(|slot| self.loc_bytes(slot.loc))
    }

    fn retain(&mut self, id: AtomId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.refs += 1;
        }
    }

    fn release(&mut self, id: AtomId) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        slot.refs -= 1;
        if slot.refs > 0 {
            return false;
        }
        let loc = slot.loc;
        let hash = self.hash_bytes(self.loc_bytes(loc));
        let removed = self.table.remove_entry(hash, |entry| entry.id == id);
        debug_assert!(removed.is_some(), "entry must exist when releasing");
        self.slots[(id - 1) as usize] = None;
        self.free_ids.push(id);
        self.len -= 1;
        self.live_bytes -= loc.len as usize;
        self.dead_bytes += loc.len as usize;
        self.maybe_compact();
        true
    }

    fn refcount(&self, id: AtomId) -> u64 {
        self.slot(id).map_or(0, |slot| slot.refs)
    }

    fn count(&self) -> usize {
        self.len
    }

    fn bytes(&self) -> usize {
        self.arena.iter().map(|chunk| chunk.len()).sum::<usize>()
            + self.table.buckets() * std::mem::size_of::<KeyEntry>()
            + self.slots.capacity() * std::mem::size_of::<Option<Slot>>()
            + self.free_ids.capacity() * std::mem::size_of::<AtomId>()
    }

    fn reset(&mut self) {
        tracing::debug!(backend = "hash", strings = self.len, "intern pool reset");
        self.table.clear();
        self.slots.clear();
        self.free_ids.clear();
        // Keep the first chunk for reuse.
        self.arena.truncate(1);
        self.write_chunk = 0;
        self.write_off = 0;
        self.live_bytes = 0;
        self.dead_bytes = 0;
        self.len = 0;
    }

    fn kind(&self) -> PoolBackend {
        PoolBackend::Hash
    }

    fn boxed_clone(&self) -> Box<dyn InternPool + Send> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// tree backend

#[derive(Clone, Default)]
pub struct TreePool {
    by_bytes: BTreeMap<Arc<[u8]>, AtomId>,
    by_id: BTreeMap<AtomId, (Arc<[u8]>, u64)>,
    next_id: AtomId,
    free_ids: Vec<AtomId>,
    payload: usize,
}

impl fmt::Debug for TreePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreePool")
            .field("len", &self.by_id.len())
            .field("payload", &self.payload)
            .finish()
    }
}

impl InternPool for TreePool {
    fn intern(&mut self, bytes: &[u8]) -> AtomId {
        if let Some(&id) = self.by_bytes.get(bytes) {
            if let Some((_, refs)) = self.by_id.get_mut(&id) {
                *refs += 1;
            }
            return id;
        }
        let id = self.free_ids.pop().unwrap_or_else(|| {
            self.next_id += 1;
            self.next_id
        });
        let key: Arc<[u8]> = Arc::from(bytes);
        self.by_bytes.insert(Arc::clone(&key), id);
        self.by_id.insert(id, (key, 1));
        self.payload += bytes.len();
        id
    }

    fn get_id(&self, bytes: &[u8]) -> Option<AtomId> {
        self.by_bytes.get(bytes).copied()
    }

    fn lookup(&self, id: AtomId) -> Option<&[u8]> {
        self.by_id.get(&id).map(|(bytes, _)| &bytes[..])
    }

    fn retain(&mut self, id: AtomId) {
        if let Some((_, refs)) = self.by_id.get_mut(&id) {
            *refs += 1;
        }
    }

    fn release(&mut self, id: AtomId) -> bool {
        let Some((_, refs)) = self.by_id.get_mut(&id) else {
            return false;
        };
        *refs -= 1;
        if *refs > 0 {
            return false;
        }
        if let Some((bytes, _)) = self.by_id.remove(&id) {
            self.by_bytes.remove(&bytes[..]);
            self.payload -= bytes.len();
        }
        self.free_ids.push(id);
        true
    }

    fn refcount(&self, id: AtomId) -> u64 {
        self.by_id.get(&id).map_or(0, |(_, refs)| *refs)
    }

    fn count(&self) -> usize {
        self.by_id.len()
    }

    fn bytes(&self) -> usize {
        // Two map entries plus one shared allocation per string.
        let per_entry = 2 * std::mem::size_of::<Arc<[u8]>>()
            + std::mem::size_of::<AtomId>() * 2
            + std::mem::size_of::<u64>();
        self.payload + self.by_id.len() * per_entry
    }

    fn reset(&mut self) {
        tracing::debug!(backend = "tree", strings = self.by_id.len(), "intern pool reset");
        self.by_bytes.clear();
        self.by_id.clear();
        self.free_ids.clear();
        self.next_id = 0;
        self.payload = 0;
    }

    fn kind(&self) -> PoolBackend {
        PoolBackend::Tree
    }

    fn boxed_clone(&self) -> Box<dyn InternPool + Send> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// handles

pub type SharedPool = Arc<Mutex<dyn InternPool + Send>>;

pub fn shared_pool(kind: PoolBackend) -> SharedPool {
    match kind {
        PoolBackend::Hash => Arc::new(Mutex::new(HashPool::default())),
        PoolBackend::Tree => Arc::new(Mutex::new(TreePool::default())),
    }
}

/// How a set reaches its pool: owned outright, or shared with other sets.
pub enum PoolHandle {
    Owned(Box<dyn InternPool + Send>),
    Shared(SharedPool),
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolHandle::Owned(p) => f.debug_tuple("Owned").field(p).finish(),
            PoolHandle::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

pub enum PoolRef<'a> {
    Owned(&'a (dyn InternPool + Send + 'static)),
    Shared(MutexGuard<'a, dyn InternPool + Send + 'static>),
}

pub enum PoolMut<'a> {
    Owned(&'a mut (dyn InternPool + Send + 'static)),
    Shared(MutexGuard<'a, dyn InternPool + Send + 'static>),
}

impl Deref for PoolRef<'_> {
    type Target = dyn InternPool + Send;

    fn deref(&self) -> &Self::Target {
        match self {
            PoolRef::Owned(p) => *p,
            PoolRef::Shared(g) => &**g,
        }
    }
}

impl Deref for PoolMut<'_> {
    type Target = dyn InternPool + Send;

    fn deref(&self) -> &Self::Target {
        match self {
            PoolMut::Owned(p) => &**p,
            PoolMut::Shared(g) => &**g,
        }
    }
}

impl DerefMut for PoolMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            PoolMut::Owned(p) => &mut **p,
            PoolMut::Shared(g) => &mut **g,
        }
    }
}

impl PoolHandle {
    pub fn owned(kind: PoolBackend) -> Self {
        PoolHandle::Owned(new_pool(kind))
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, PoolHandle::Owned(_))
    }

    pub fn read(&self) -> PoolRef<'_> {
        match self {
            PoolHandle::Owned(p) => PoolRef::Owned(&**p),
            PoolHandle::Shared(p) => PoolRef::Shared(p.lock().unwrap_or_else(PoisonError::into_inner)),
        }
    }

    pub fn write(&mut self) -> PoolMut<'_> {
        match self {
            PoolHandle::Owned(p) => PoolMut::Owned(&mut **p),
            PoolHandle::Shared(p) => PoolMut::Shared(p.lock().unwrap_or_else(PoisonError::into_inner)),
        }
    }

    /// Owned pools are deep-copied; shared pools are shared by the copy.
    pub fn duplicate(&self) -> Self {
        match self {
            PoolHandle::Owned(p) => PoolHandle::Owned(p.boxed_clone()),
            PoolHandle::Shared(p) => PoolHandle::Shared(Arc::clone(p)),
        }
    }
}
