// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hash-indexed view holding the latest entry per key

use crate::error::{ContainerError, EngineError};
use crate::schema::{Keyed, Lookup, Nullable, Schema};
use crate::view::{Accessor, Mutator, Publisher};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use vista_core::Stamp;

#[derive(Debug, Clone)]
struct Indexed<T> {
    index: u64,
    entry: T,
}

/// Latest entry per key, last write wins
#[derive(Debug, Clone)]
pub struct Dictionary<T: Keyed> {
    entries: HashMap<T::Key, Indexed<T>>,
}

impl<T: Keyed> Dictionary<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Store `entry` as it appeared at stream `index`.
    ///
    /// An entry older than the one already stored for its key is ignored,
    /// so a late replay cannot undo a newer write. Returns whether the
    /// entry was stored.
    pub fn apply(&mut self, entry: T, index: u64) -> bool {
        let key = entry.key();
        if let Some(current) = self.entries.get(&key) {
            if current.index > index {
                return false;
            }
        }
        self.entries.insert(key, Indexed { index, entry });
        true
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|i| &i.entry)
    }

    /// Like [`get`](Self::get), for entries that must exist
    pub fn at<Q>(&self, key: &Q) -> Result<&T, ContainerError>
    where
        T::Key: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.get(key).ok_or_else(|| ContainerError::KeyNotFound {
            key: format!("{key:?}"),
        })
    }

    /// The stored entry, or the type's null entry for `key`
    pub fn get_or_null(&self, key: &T::Key) -> T
    where
        T: Nullable + Clone,
    {
        self.get(key)
            .cloned()
            .unwrap_or_else(|| T::null(key.clone()))
    }

    /// Stream index the entry for `key` came from
    pub fn index_of<Q>(&self, key: &Q) -> Option<u64>
    where
        T::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|i| i.index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values().map(|i| &i.entry)
    }

    pub fn keys(&self) -> impl Iterator<Item = &T::Key> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn accessor(&self) -> Accessor<'_, Self> {
        Accessor::new(self)
    }

    pub fn mutator<'a, E>(&'a mut self, publisher: Publisher<'a, E>) -> Mutator<'a, Self, E> {
        Mutator::new(self, publisher)
    }
}

impl<T: Keyed> Default for Dictionary<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Mutator<'_, Dictionary<T>, E>
where
    T: Keyed + Clone,
    E: From<T> + Send + Sync + 'static,
{
    /// Store and publish `entry`, replacing any entry with the same key.
    pub fn add(&mut self, entry: T) -> Result<Stamp, EngineError> {
        let stamp = self.publisher.publish(E::from(entry.clone()))?;
        self.container.apply(entry, stamp.index);
        Ok(stamp)
    }

    /// Like [`add`](Self::add), but fails if the key is already present.
    pub fn must_add(&mut self, entry: T) -> Result<Stamp, EngineError>
    where
        T: Debug,
    {
        if self.container.has(&entry.key()) {
            return Err(ContainerError::KeyAlreadyExists {
                entry: format!("{entry:?}"),
            }
            .into());
        }
        self.add(entry)
    }
}

impl<T: Keyed> Lookup for Dictionary<T> {
    type Key = T::Key;
    type Item = T;

    fn lookup(&self, key: &T::Key) -> Option<&T> {
        self.get(key)
    }
}

/// A dictionary on its own is a complete schema
impl<T> Schema for Dictionary<T>
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    type Entry = T;

    fn apply(&mut self, entry: &T, index: u64) {
        Dictionary::apply(self, entry.clone(), index);
    }
}

#[cfg(test)]
#[path = "dictionary_tests.rs"]
mod tests;
