use hashbrown::raw::RawTable;
use std::hash::BuildHasher;

use crate::error::Error;
use crate::pool::Build;
use crate::scalar::{Scalar, ScalarRef};

/// Member → score table backing the full tier.
///
/// O(1) insert/update, remove, lookup. Keys hash through the canonical
/// [`Scalar`] hash, so numerically equal members of different variants land
/// on the same entry.
#[derive(Clone)]
pub struct MemberIndex {
    hasher: Build,
    table: RawTable<(Scalar, Scalar)>,
}

impl MemberIndex {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hasher: Build::default(),
            table: RawTable::with_capacity(capacity),
        }
    }

    #[inline]
    fn hash(&self, member: ScalarRef<'_>) -> u64 {
        BuildHasher::hash_one(&self.hasher, member)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Makes room for `additional` inserts, failing instead of aborting.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        let hasher = &self.hasher;
        self.table
            .try_reserve(additional, |(k, _)| BuildHasher::hash_one(hasher, k.as_ref()))
            .map_err(|_| Error::AllocationFailed {
                bytes: additional * std::mem::size_of::<(Scalar, Scalar)>(),
            })
    }

    /// Sets the score of `member`, returning the previous one.
    pub fn insert(&mut self, member: ScalarRef<'_>, score: Scalar) -> Option<Scalar> {
        let hash = self.hash(member);
        if let Some((_, s)) = self.table.get_mut(hash, |(k, _)| k.as_ref() == member) {
            return Some(std::mem::replace(s, score));
        }
        let hasher = &self.hasher;
        self.table.insert(hash, (member.to_owned(), score), |(k, _)| {
            BuildHasher::hash_one(hasher, k.as_ref())
        });
        None
    }

    pub fn remove(&mut self, member: ScalarRef<'_>) -> Option<Scalar> {
        let hash = self.hash(member);
        self.table
            .remove_entry(hash, |(k, _)| k.as_ref() == member)
            .map(|(_, s)| s)
    }

    #[inline]
    pub fn get(&self, member: ScalarRef<'_>) -> Option<&Scalar> {
        let hash = self.hash(member);
        self.table.get(hash, |(k, _)| k.as_ref() == member).map(|(_, s)| s)
    }

    #[inline]
    pub fn contains(&self, member: ScalarRef<'_>) -> bool {
        self.get(member).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Scalar, &Scalar)> + '_ {
        // SAFETY: the iterator cannot outlive the table it borrows.
        unsafe { self.table.iter() }.map(|bucket| {
            // SAFETY: buckets returned by `iter` contain valid elements
            let (member, score) = unsafe { bucket.as_ref() };
            (member, score)
        })
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Table footprint, not counting spilled byte payloads.
    pub fn bytes(&self) -> usize {
        self.table.buckets() * (std::mem::size_of::<(Scalar, Scalar)>() + 1)
    }

    #[cfg(test)]
    pub(crate) fn buckets(&self) -> usize {
        self.table.buckets()
    }
}

impl Default for MemberIndex {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemberIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberIndex").field("len", &self.len()).finish()
    }
}
