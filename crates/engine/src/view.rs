// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only and read-write views bound to one transaction

use crate::error::EngineError;
use std::ops::Deref;
use vista_core::{Stamp, Stream};

/// Publishes entries on behalf of a transaction
pub struct Publisher<'a, E> {
    stream: &'a Stream<E>,
}

impl<'a, E: Send + Sync + 'static> Publisher<'a, E> {
    pub(crate) fn new(stream: &'a Stream<E>) -> Self {
        Self { stream }
    }

    pub fn publish(&self, entry: E) -> Result<Stamp, EngineError> {
        Ok(self.stream.publish(entry)?)
    }

    pub fn stream(&self) -> &'a Stream<E> {
        self.stream
    }
}

impl<E> Clone for Publisher<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Publisher<'_, E> {}

/// Read-only view of a container
pub struct Accessor<'a, C> {
    container: &'a C,
}

impl<'a, C> Accessor<'a, C> {
    pub fn new(container: &'a C) -> Self {
        Self { container }
    }
}

impl<C> Deref for Accessor<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.container
    }
}

/// Read-write view of a container.
///
/// Reads go through `Deref`; writes update the container at once and
/// publish the entry to the stream.
pub struct Mutator<'a, C, E> {
    pub(crate) container: &'a mut C,
    pub(crate) publisher: Publisher<'a, E>,
}

impl<'a, C, E> Mutator<'a, C, E> {
    pub fn new(container: &'a mut C, publisher: Publisher<'a, E>) -> Self {
        Self {
            container,
            publisher,
        }
    }
}

impl<C, E> Deref for Mutator<'_, C, E> {
    type Target = C;

    fn deref(&self) -> &C {
        self.container
    }
}
