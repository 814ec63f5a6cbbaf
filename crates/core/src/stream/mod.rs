// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only, subscribable record stream
//!
//! This module provides:
//! - `Stream` - the ordered log; publishing wakes every parked listener
//! - `Listener` - the per-record callback run on a dedicated thread
//! - `Subscription` / `ScopedSubscription` - handles for owned and borrowed
//!   listeners

mod listener;
mod subscription;

pub use listener::{from_fn, Flow, FnListener, Listener, Termination};
pub use subscription::{ScopedSubscription, Subscription};

use crate::clock::{Clock, Micros, SystemClock};
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::persist::Persister;
use crate::record::{Body, Record, Stamp};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// An ordered, append-only log of entries of type `E`.
///
/// Cloning a `Stream` yields another handle onto the same log.
pub struct Stream<E> {
    shared: Arc<Shared<E>>,
}

pub(crate) struct Shared<E> {
    state: Mutex<State<E>>,
    wake: Condvar,
    closed: AtomicBool,
    clock: Arc<dyn Clock>,
    config: StreamConfig,
    subscribers: AtomicUsize,
    next_subscription: AtomicU64,
}

struct State<E> {
    records: Vec<Arc<Record<E>>>,
    last_us: Micros,
    persister: Option<Box<dyn Persister<E>>>,
}

/// Builder for a stream with a non-default clock, config or durable log
pub struct StreamBuilder<E> {
    config: StreamConfig,
    clock: Arc<dyn Clock>,
    persister: Option<Box<dyn Persister<E>>>,
}

impl<E: Send + Sync + 'static> StreamBuilder<E> {
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn persister(mut self, persister: impl Persister<E> + 'static) -> Self {
        self.persister = Some(Box::new(persister));
        self
    }

    /// Open the stream, replaying whatever the durable log holds.
    pub fn open(self) -> Result<Stream<E>, StreamError> {
        let mut state = State {
            records: Vec::new(),
            last_us: 0,
            persister: None,
        };

        if let Some(mut persister) = self.persister {
            let span = tracing::info_span!("stream_replay");
            let _guard = span.enter();

            let mut unparsable = 0usize;
            persister.replay(&mut |mut record| {
                let expected = state.records.len() as u64;
                if record.index != expected {
                    warn!(stored = record.index, expected, "reindexing replayed record");
                    record.index = expected;
                }
                if matches!(record.body, Body::Unparsable(_)) {
                    unparsable += 1;
                }
                state.last_us = state.last_us.max(record.us);
                state.records.push(Arc::new(record));
            })?;

            info!(
                records = state.records.len(),
                unparsable, "replayed durable log"
            );
            state.persister = Some(persister);
        }

        Ok(Stream::from_state(state, self.clock, self.config))
    }
}

impl<E: Send + Sync + 'static> Stream<E> {
    /// In-memory stream stamped by the system clock
    pub fn new() -> Self {
        Self::in_memory(StreamConfig::default(), SystemClock)
    }

    pub fn in_memory(config: StreamConfig, clock: impl Clock + 'static) -> Self {
        let state = State {
            records: Vec::new(),
            last_us: 0,
            persister: None,
        };
        Self::from_state(state, Arc::new(clock), config)
    }

    fn from_state(state: State<E>, clock: Arc<dyn Clock>, config: StreamConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                wake: Condvar::new(),
                closed: AtomicBool::new(false),
                clock,
                config,
                subscribers: AtomicUsize::new(0),
                next_subscription: AtomicU64::new(0),
            }),
        }
    }

    pub fn builder() -> StreamBuilder<E> {
        StreamBuilder {
            config: StreamConfig::default(),
            clock: Arc::new(SystemClock),
            persister: None,
        }
    }

    /// Append an entry stamped with the stream's clock.
    ///
    /// Stamps never go backwards: a clock that steps back yields the
    /// previous record's timestamp.
    pub fn publish(&self, entry: E) -> Result<Stamp, StreamError> {
        let mut state = self.shared.lock();
        let us = self.shared.clock.now_us().max(state.last_us);
        let stamp = self.shared.append(&mut state, entry, us)?;
        drop(state);
        self.shared.wake.notify_all();
        Ok(stamp)
    }

    /// Append an entry carrying its own timestamp.
    pub fn publish_at(&self, entry: E, us: Micros) -> Result<Stamp, StreamError> {
        let mut state = self.shared.lock();
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(StreamError::Closed);
        }
        if us < state.last_us {
            return Err(StreamError::TimestampRegression {
                previous: state.last_us,
                attempted: us,
            });
        }
        let stamp = self.shared.append(&mut state, entry, us)?;
        drop(state);
        self.shared.wake.notify_all();
        Ok(stamp)
    }

    /// Number of records, unparsable markers included
    pub fn size(&self) -> u64 {
        self.shared.lock().records.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Index and timestamp of the newest record
    pub fn last(&self) -> Option<Stamp> {
        self.shared.lock().records.last().map(|r| r.stamp())
    }

    /// Snapshot of the records in `range`, clamped to what exists
    pub fn read(&self, range: Range<u64>) -> Vec<Arc<Record<E>>> {
        let state = self.shared.lock();
        let len = state.records.len() as u64;
        let start = range.start.min(len) as usize;
        let end = range.end.clamp(range.start.min(len), len) as usize;
        state.records[start..end].to_vec()
    }

    /// Listener threads currently running
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.shared.config
    }

    pub fn now_us(&self) -> Micros {
        self.shared.clock.now_us()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Ask every subscription, detached ones included, to terminate.
    /// Later publishes fail with [`StreamError::Closed`].
    pub fn close(&self) {
        {
            let _state = self.shared.lock();
            self.shared.closed.store(true, Ordering::SeqCst);
        }
        self.shared.wake.notify_all();
        info!("stream closed");
    }

    /// Run `listener` on its own thread, starting from index 0.
    ///
    /// The handle must be joined or detached.
    pub fn subscribe<L>(&self, listener: L) -> Result<Subscription<L>, StreamError>
    where
        L: Listener<E> + 'static,
    {
        Subscription::spawn(Arc::clone(&self.shared), listener)
    }

    /// Run a borrowed listener on a scoped thread.
    ///
    /// The handle has no `detach`; it must be joined before the scope ends.
    pub fn subscribe_scoped<'scope, 'env, L>(
        &self,
        scope: &'scope thread::Scope<'scope, 'env>,
        listener: &'env mut L,
    ) -> Result<ScopedSubscription<'scope>, StreamError>
    where
        L: Listener<E>,
    {
        ScopedSubscription::spawn(scope, Arc::clone(&self.shared), listener)
    }
}

impl<E: Send + Sync + 'static> Default for Stream<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Stream<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E> Shared<E> {
    fn lock(&self) -> MutexGuard<'_, State<E>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn append(&self, state: &mut State<E>, entry: E, us: Micros) -> Result<Stamp, StreamError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StreamError::Closed);
        }
        let record = Record::entry(state.records.len() as u64, us, entry);
        if let Some(persister) = state.persister.as_mut() {
            if let Err(e) = persister.append(&record) {
                error!(index = record.index, error = %e, "append to durable log failed");
                return Err(e.into());
            }
        }
        let stamp = record.stamp();
        state.records.push(Arc::new(record));
        state.last_us = us;
        Ok(stamp)
    }

    pub(crate) fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub(crate) fn next_subscription_id(&self) -> u64 {
        self.next_subscription.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn enter_subscriber(&self) {
        self.subscribers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn leave_subscriber(&self) {
        self.subscribers.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn termination_requested(&self, stop: &AtomicBool) -> bool {
        stop.load(Ordering::SeqCst) || self.closed.load(Ordering::SeqCst)
    }

    /// Raise a subscription's stop flag and wake its thread.
    ///
    /// The flag is set under the state lock so a listener about to park
    /// cannot miss it.
    pub(crate) fn request_termination(&self, stop: &AtomicBool) {
        {
            let _state = self.lock();
            stop.store(true, Ordering::SeqCst);
        }
        self.wake.notify_all();
    }

    /// Records from `cursor` on, with the stream size at the time.
    ///
    /// Parks while there is nothing new. With `poll` set the park is bounded
    /// and returns `None` on timeout; otherwise it also ends when
    /// termination is requested.
    pub(crate) fn next_batch(
        &self,
        cursor: u64,
        stop: &AtomicBool,
        poll: Option<Duration>,
    ) -> Option<(Vec<Arc<Record<E>>>, u64)> {
        let state = self.lock();
        let idle = |s: &mut State<E>| {
            (s.records.len() as u64) <= cursor
                && (poll.is_some() || !self.termination_requested(stop))
        };
        let state = match poll {
            Some(timeout) => {
                self.wake
                    .wait_timeout_while(state, timeout, idle)
                    .unwrap_or_else(|e| e.into_inner())
                    .0
            }
            None => self
                .wake
                .wait_while(state, idle)
                .unwrap_or_else(|e| e.into_inner()),
        };
        let total = state.records.len() as u64;
        if total > cursor {
            Some((state.records[cursor as usize..].to_vec(), total))
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
