// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription handles and the per-listener delivery loop

use super::listener::{Flow, Listener, Termination};
use super::Shared;
use crate::error::StreamError;
use crate::record::{Body, Position};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Type-erased access to the stream a subscription belongs to
trait Terminate: Send + Sync {
    fn request_termination(&self, stop: &AtomicBool);
}

impl<E: Send + Sync> Terminate for Shared<E> {
    fn request_termination(&self, stop: &AtomicBool) {
        Shared::request_termination(self, stop)
    }
}

/// Handle for a listener owned by its delivery thread.
///
/// Either [`join`](Self::join) or [`detach`](Self::detach) must be called.
/// Dropping a live handle is a bug: the listener is stopped and the drop
/// panics.
pub struct Subscription<L> {
    id: u64,
    stop: Arc<AtomicBool>,
    stream: Arc<dyn Terminate>,
    handle: Option<JoinHandle<L>>,
}

impl<L> Subscription<L> {
    pub(super) fn spawn<E>(shared: Arc<Shared<E>>, mut listener: L) -> Result<Self, StreamError>
    where
        E: Send + Sync + 'static,
        L: Listener<E> + 'static,
    {
        let id = shared.next_subscription_id();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_shared = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name(format!("vista-sub-{id}"))
            .spawn(move || {
                deliver(&thread_shared, &mut listener, &thread_stop, id);
                listener
            })
            .map_err(StreamError::Spawn)?;

        Ok(Self {
            id,
            stop,
            stream: shared,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the listener has stopped on its own
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Ask the listener to stop without waiting for it.
    pub fn terminate(&self) {
        self.stream.request_termination(&self.stop);
    }

    /// Stop the listener, wait for its thread, and hand the listener back.
    pub fn join(mut self) -> Result<L, StreamError> {
        self.stream.request_termination(&self.stop);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| StreamError::ListenerPanicked),
            None => Err(StreamError::ListenerPanicked),
        }
    }

    /// Let the listener run until it stops itself or the stream closes.
    pub fn detach(mut self) {
        debug!(subscription = self.id, "subscription detached");
        self.handle.take();
    }
}

impl<L> Drop for Subscription<L> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            error!(
                subscription = self.id,
                "subscription dropped without join() or detach()"
            );
            self.stream.request_termination(&self.stop);
            let _ = handle.join();
            misuse(self.id);
        }
    }
}

/// Handle for a listener borrowed from the caller's stack.
///
/// Must be joined before the borrow ends; there is no detach.
pub struct ScopedSubscription<'scope> {
    id: u64,
    stop: Arc<AtomicBool>,
    stream: Arc<dyn Terminate>,
    handle: Option<ScopedJoinHandle<'scope, ()>>,
}

impl<'scope> ScopedSubscription<'scope> {
    pub(super) fn spawn<'env, E, L>(
        scope: &'scope Scope<'scope, 'env>,
        shared: Arc<Shared<E>>,
        listener: &'env mut L,
    ) -> Result<Self, StreamError>
    where
        E: Send + Sync + 'static,
        L: Listener<E>,
    {
        let id = shared.next_subscription_id();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_shared = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name(format!("vista-sub-{id}"))
            .spawn_scoped(scope, move || {
                deliver(&thread_shared, listener, &thread_stop, id);
            })
            .map_err(StreamError::Spawn)?;

        Ok(Self {
            id,
            stop,
            stream: shared,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the listener and wait for its thread.
    pub fn join(mut self) -> Result<(), StreamError> {
        self.stream.request_termination(&self.stop);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| StreamError::ListenerPanicked),
            None => Err(StreamError::ListenerPanicked),
        }
    }
}

impl Drop for ScopedSubscription<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            error!(
                subscription = self.id,
                "scoped subscription dropped without join()"
            );
            self.stream.request_termination(&self.stop);
            let _ = handle.join();
            misuse(self.id);
        }
    }
}

#[allow(clippy::panic)]
fn misuse(id: u64) {
    if !thread::panicking() {
        panic!("subscription {id} dropped while joinable; call join() or detach()");
    }
}

/// Keeps the stream's subscriber count accurate however the loop exits
struct Registered<'a, E>(&'a Shared<E>);

impl<'a, E> Registered<'a, E> {
    fn new(shared: &'a Shared<E>) -> Self {
        shared.enter_subscriber();
        Self(shared)
    }
}

impl<E> Drop for Registered<'_, E> {
    fn drop(&mut self) {
        self.0.leave_subscriber();
    }
}

/// Decides when a termination request actually ends delivery
struct TerminationGate {
    poll: Duration,
    max_deferrals: u32,
    deferrals: u32,
    last_asked: Option<Instant>,
}

impl TerminationGate {
    fn new(poll: Duration, max_deferrals: u32) -> Self {
        Self {
            poll,
            max_deferrals,
            deferrals: 0,
            last_asked: None,
        }
    }

    /// Bounded park interval once the listener has deferred
    fn poll(&self) -> Option<Duration> {
        self.last_asked.map(|_| self.poll)
    }

    fn should_exit<E, L>(&mut self, listener: &mut L, requested: bool, id: u64) -> bool
    where
        L: Listener<E> + ?Sized,
    {
        if !requested {
            return false;
        }
        if let Some(at) = self.last_asked {
            if at.elapsed() < self.poll {
                return false;
            }
        }
        match listener.on_terminate() {
            Termination::Accept => true,
            Termination::Defer => {
                self.deferrals += 1;
                if self.deferrals > self.max_deferrals {
                    warn!(
                        subscription = id,
                        deferrals = self.deferrals,
                        "listener kept deferring termination, forcing it"
                    );
                    return true;
                }
                self.last_asked = Some(Instant::now());
                false
            }
        }
    }
}

fn deliver<E, L>(shared: &Shared<E>, listener: &mut L, stop: &AtomicBool, id: u64)
where
    L: Listener<E> + ?Sized,
{
    let _registered = Registered::new(shared);
    let config = shared.config();
    let mut gate = TerminationGate::new(config.termination_poll, config.max_termination_deferrals);
    let mut cursor = 0u64;
    debug!(subscription = id, "listener started");

    'outer: loop {
        if gate.should_exit::<E, L>(listener, shared.termination_requested(stop), id) {
            break;
        }
        let Some((batch, total)) = shared.next_batch(cursor, stop, gate.poll()) else {
            continue;
        };
        for record in batch {
            if gate.should_exit::<E, L>(listener, shared.termination_requested(stop), id) {
                break 'outer;
            }
            let at = Position {
                index: record.index,
                us: record.us,
                total,
            };
            let flow = match &record.body {
                Body::Entry(entry) => listener.on_entry(entry, at),
                Body::Unparsable(bad) => listener.on_unparsable(bad, at),
            };
            cursor = record.index + 1;
            if flow == Flow::Stop {
                break 'outer;
            }
        }
    }

    debug!(subscription = id, delivered = cursor, "listener stopped");
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
