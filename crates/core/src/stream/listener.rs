// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener side of a subscription

use crate::record::{Position, Unparsable};

/// Whether delivery should go on after a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// A listener's answer to a termination request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Accept,
    /// Keep delivering for now; the request is repeated later
    Defer,
}

/// Receives the records of a stream, in index order, from its own thread.
pub trait Listener<E>: Send {
    fn on_entry(&mut self, entry: &E, at: Position) -> Flow;

    /// Called for stored records that failed to decode on replay.
    fn on_unparsable(&mut self, record: &Unparsable, at: Position) -> Flow {
        tracing::warn!(index = at.index, reason = %record.reason, "skipping unparsable record");
        Flow::Continue
    }

    /// Called when the subscription is asked to stop.
    fn on_terminate(&mut self) -> Termination {
        Termination::Accept
    }
}

/// Listener built from a closure
pub struct FnListener<F>(F);

/// Wrap a closure as a listener
pub fn from_fn<E, F>(f: F) -> FnListener<F>
where
    F: FnMut(&E, Position) -> Flow + Send,
{
    FnListener(f)
}

impl<E, F> Listener<E> for FnListener<F>
where
    F: FnMut(&E, Position) -> Flow + Send,
{
    fn on_entry(&mut self, entry: &E, at: Position) -> Flow {
        (self.0)(entry, at)
    }
}

impl<F> FnListener<F> {
    pub fn into_inner(self) -> F {
        self.0
    }
}
