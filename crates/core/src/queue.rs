// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded multi-producer, single-consumer message queue
//!
//! A fixed ring of slots. Each slot moves `Free -> Filling -> Ready ->
//! Draining -> Free`. Producers claim the slot at the head under the ring
//! lock and fill it outside of it; one consumer thread takes Ready slots
//! from the tail in the order they were claimed.
//!
//! Ordering is per producer thread only. Two threads pushing concurrently
//! under [`Overflow::Block`] may interleave in any order.

use crate::config::{Overflow, QueueConfig};
use crate::error::QueueError;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// The single consumer of a queue.
pub trait Consumer<M>: Send + 'static {
    /// Handle one message. `dropped` is the number of messages lost to
    /// overflow between the previously delivered message and this one.
    fn on_message(&mut self, message: M, dropped: u64);

    /// Called once after the last message, with drops no later message
    /// could report.
    fn on_shutdown(&mut self, undelivered_drops: u64) {
        if undelivered_drops > 0 {
            tracing::warn!(dropped = undelivered_drops, "queue shut down after dropping messages");
        }
    }
}

/// Outcome of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushed {
    /// The message was queued; `index` counts accepted messages from 0
    Accepted { index: u64 },
    /// The queue was full and the message was discarded
    Dropped,
}

/// Counters since the queue was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pushed: u64,
    pub accepted: u64,
    /// Incoming messages discarded plus queued messages evicted
    pub dropped: u64,
    pub delivered: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Free,
    Filling,
    Ready,
    Draining,
}

struct Ring {
    slots: Vec<Slot>,
    /// Drops reported alongside the message in each slot
    carried: Vec<u64>,
    head: usize,
    tail: usize,
    /// Drops waiting for the next accepted message
    pending_drops: u64,
    paused: bool,
    closing: bool,
    stats: QueueStats,
}

impl Ring {
    fn next(&self, i: usize) -> usize {
        (i + 1) % self.slots.len()
    }

    fn has_ready(&self) -> bool {
        self.slots[self.tail] == Slot::Ready && (!self.paused || self.closing)
    }

    fn drained(&self) -> bool {
        self.closing && self.slots[self.tail] == Slot::Free
    }
}

struct Shared<M> {
    ring: Mutex<Ring>,
    cells: Box<[Mutex<Option<M>>]>,
    ready: Condvar,
    space: Condvar,
    overflow: Overflow,
}

impl<M> Shared<M> {
    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cell(&self, slot: usize) -> MutexGuard<'_, Option<M>> {
        self.cells[slot].lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, message: M) -> Result<Pushed, QueueError> {
        let mut evicted = None;
        let mut ring = self.lock();
        if ring.closing {
            return Err(QueueError::Closed);
        }
        ring.stats.pushed += 1;

        while ring.slots[ring.head] != Slot::Free {
            match self.overflow {
                Overflow::Block => {
                    ring = self.space.wait(ring).unwrap_or_else(|e| e.into_inner());
                    if ring.closing {
                        ring.stats.pushed -= 1;
                        return Err(QueueError::Closed);
                    }
                }
                Overflow::DropOldest if ring.slots[ring.head] == Slot::Ready => {
                    // Full ring: head and tail meet at the oldest message
                    let slot = ring.head;
                    evicted = self.cell(slot).take();
                    let forward = ring.carried[slot] + 1;
                    ring.slots[slot] = Slot::Free;
                    ring.tail = ring.next(slot);
                    if ring.tail == slot {
                        ring.pending_drops += forward;
                    } else {
                        let tail = ring.tail;
                        ring.carried[tail] += forward;
                    }
                    ring.stats.dropped += 1;
                }
                Overflow::DropIncoming | Overflow::DropOldest => {
                    ring.pending_drops += 1;
                    ring.stats.dropped += 1;
                    return Ok(Pushed::Dropped);
                }
            }
        }

        let slot = ring.head;
        ring.slots[slot] = Slot::Filling;
        ring.carried[slot] = mem::take(&mut ring.pending_drops);
        ring.head = ring.next(slot);
        let index = ring.stats.accepted;
        ring.stats.accepted += 1;
        drop(ring);

        *self.cell(slot) = Some(message);

        self.lock().slots[slot] = Slot::Ready;
        self.ready.notify_one();
        drop(evicted);
        Ok(Pushed::Accepted { index })
    }

    fn close(&self) {
        self.lock().closing = true;
        self.ready.notify_all();
        self.space.notify_all();
    }
}

/// Producer handle; clone one per thread that needs to push
pub struct Producer<M> {
    shared: Arc<Shared<M>>,
}

impl<M> Producer<M> {
    pub fn push(&self, message: M) -> Result<Pushed, QueueError> {
        self.shared.push(message)
    }
}

impl<M> Clone for Producer<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// A bounded queue together with its consumer thread.
///
/// Dropping the queue closes it, drains every Ready message and joins the
/// consumer.
pub struct BoundedQueue<M, C> {
    shared: Arc<Shared<M>>,
    consumer: Option<JoinHandle<C>>,
}

impl<M, C> BoundedQueue<M, C>
where
    M: Send + 'static,
    C: Consumer<M>,
{
    pub fn spawn(config: QueueConfig, consumer: C) -> Result<Self, QueueError> {
        Self::start(config, consumer, false)
    }

    /// Start with the consumer held back until [`resume`](Self::resume).
    pub fn spawn_paused(config: QueueConfig, consumer: C) -> Result<Self, QueueError> {
        Self::start(config, consumer, true)
    }

    fn start(config: QueueConfig, mut consumer: C, paused: bool) -> Result<Self, QueueError> {
        let capacity = config.capacity.max(1);
        let shared = Arc::new(Shared {
            ring: Mutex::new(Ring {
                slots: vec![Slot::Free; capacity],
                carried: vec![0; capacity],
                head: 0,
                tail: 0,
                pending_drops: 0,
                paused,
                closing: false,
                stats: QueueStats::default(),
            }),
            cells: (0..capacity).map(|_| Mutex::new(None)).collect(),
            ready: Condvar::new(),
            space: Condvar::new(),
            overflow: config.overflow,
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("vista-queue".to_string())
            .spawn(move || {
                consume(&thread_shared, &mut consumer);
                consumer
            })
            .map_err(QueueError::Spawn)?;

        debug!(capacity, overflow = ?config.overflow, "queue consumer started");
        Ok(Self {
            shared,
            consumer: Some(handle),
        })
    }
}

impl<M, C> BoundedQueue<M, C> {
    pub fn producer(&self) -> Producer<M> {
        Producer {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn push(&self, message: M) -> Result<Pushed, QueueError> {
        self.shared.push(message)
    }

    /// Hold the consumer before it takes its next message.
    pub fn pause(&self) {
        self.shared.lock().paused = true;
    }

    pub fn resume(&self) {
        self.shared.lock().paused = false;
        self.shared.ready.notify_all();
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.lock().stats
    }

    pub fn capacity(&self) -> usize {
        self.shared.cells.len()
    }

    /// Slots not currently free
    pub fn len(&self) -> usize {
        self.shared
            .lock()
            .slots
            .iter()
            .filter(|s| **s != Slot::Free)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the queue, drain it, and hand the consumer back.
    pub fn shutdown(mut self) -> Result<C, QueueError> {
        self.shared.close();
        match self.consumer.take() {
            Some(handle) => handle.join().map_err(|_| QueueError::ConsumerPanicked),
            None => Err(QueueError::ConsumerPanicked),
        }
    }
}

impl<M, C> Drop for BoundedQueue<M, C> {
    fn drop(&mut self) {
        if let Some(handle) = self.consumer.take() {
            self.shared.close();
            if handle.join().is_err() {
                error!("queue consumer panicked during shutdown");
            }
        }
    }
}

fn consume<M, C: Consumer<M>>(shared: &Shared<M>, consumer: &mut C) {
    loop {
        let ring = shared.lock();
        let mut ring = shared
            .ready
            .wait_while(ring, |r| !r.has_ready() && !r.drained())
            .unwrap_or_else(|e| e.into_inner());
        if !ring.has_ready() {
            let undelivered = ring.pending_drops;
            drop(ring);
            consumer.on_shutdown(undelivered);
            debug!("queue consumer stopped");
            return;
        }

        let slot = ring.tail;
        ring.slots[slot] = Slot::Draining;
        ring.tail = ring.next(slot);
        let dropped = mem::take(&mut ring.carried[slot]);
        drop(ring);

        let message = shared.cell(slot).take();
        if let Some(message) = message {
            let outcome = catch_unwind(AssertUnwindSafe(|| consumer.on_message(message, dropped)));
            if outcome.is_err() {
                error!(dropped, "queue consumer panicked; message discarded");
            }
        }

        let mut ring = shared.lock();
        ring.slots[slot] = Slot::Free;
        ring.stats.delivered += 1;
        drop(ring);
        shared.space.notify_all();
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
