// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine: a stream, a queue, and the views built from them
//!
//! Every change to the views happens on the queue's consumer thread.
//! Replayed stream entries and user transactions share that queue, so a
//! transaction queued after entry N sees the views with N applied.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::future::TxnFuture;
use crate::schema::{Lookup, Schema};
use crate::view::Publisher;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{info, warn};
use vista_core::{
    BoundedQueue, Consumer, Flow, Listener, Persister, Position, Producer, Pushed, QueueError,
    QueueStats, Stamp, Stream, Subscription, Unparsable,
};

/// What a transaction function gets to work with
pub struct Txn<'a, S: Schema> {
    pub views: &'a mut S,
    pub publisher: Publisher<'a, S::Entry>,
}

impl<S: Schema> Txn<'_, S> {
    /// Publish `entry` and apply it to the views right away.
    pub fn add(&mut self, entry: S::Entry) -> Result<Stamp, EngineError> {
        let stamp = self.publisher.publish(entry.clone())?;
        self.views.apply(&entry, stamp.index);
        Ok(stamp)
    }
}

type Job<S> = Box<dyn FnOnce(&mut S, &Stream<<S as Schema>::Entry>) + Send>;

enum Message<S: Schema> {
    Replayed { entry: S::Entry, index: u64 },
    Skipped { index: u64 },
    Run(Job<S>),
}

/// Replay progress, shared between the consumer and the engine handle
struct Progress {
    target: u64,
    caught_up: Mutex<bool>,
    changed: Condvar,
    entries_seen: AtomicU64,
}

impl Progress {
    fn new(target: u64) -> Self {
        Self {
            target,
            caught_up: Mutex::new(target == 0),
            changed: Condvar::new(),
            entries_seen: AtomicU64::new(0),
        }
    }

    fn reached(&self, index: u64) {
        if index + 1 < self.target {
            return;
        }
        let mut caught_up = self.caught_up.lock().unwrap_or_else(|e| e.into_inner());
        if !*caught_up {
            *caught_up = true;
            info!(entries = self.target, "engine caught up");
            self.changed.notify_all();
        }
    }

    fn is_caught_up(&self) -> bool {
        *self.caught_up.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait(&self, timeout: Duration) -> bool {
        let caught_up = self.caught_up.lock().unwrap_or_else(|e| e.into_inner());
        let (caught_up, _) = self
            .changed
            .wait_timeout_while(caught_up, timeout, |done| !*done)
            .unwrap_or_else(|e| e.into_inner());
        *caught_up
    }
}

/// Queue consumer owning the views
struct Applier<S: Schema> {
    views: S,
    stream: Stream<S::Entry>,
    progress: Arc<Progress>,
}

impl<S: Schema> Consumer<Message<S>> for Applier<S> {
    fn on_message(&mut self, message: Message<S>, dropped: u64) {
        if dropped > 0 {
            warn!(dropped, "engine queue dropped messages; views may be stale");
        }
        match message {
            Message::Replayed { entry, index } => {
                self.views.apply(&entry, index);
                self.progress.entries_seen.fetch_add(1, Ordering::SeqCst);
                self.progress.reached(index);
            }
            Message::Skipped { index } => self.progress.reached(index),
            Message::Run(job) => job(&mut self.views, &self.stream),
        }
    }
}

/// Stream listener feeding the queue
struct Replayer<S: Schema> {
    queue: Producer<Message<S>>,
}

impl<S: Schema> Replayer<S> {
    fn forward(&self, message: Message<S>) -> Flow {
        match self.queue.push(message) {
            Ok(_) => Flow::Continue,
            Err(QueueError::Closed) => Flow::Stop,
            Err(e) => {
                warn!(error = %e, "replay stopped");
                Flow::Stop
            }
        }
    }
}

impl<S: Schema> Listener<S::Entry> for Replayer<S> {
    fn on_entry(&mut self, entry: &S::Entry, at: Position) -> Flow {
        self.forward(Message::Replayed {
            entry: entry.clone(),
            index: at.index,
        })
    }

    fn on_unparsable(&mut self, record: &Unparsable, at: Position) -> Flow {
        warn!(index = at.index, reason = %record.reason, "view skips unparsable record");
        self.forward(Message::Skipped { index: at.index })
    }
}

/// Materialized views over a stream, updated through one serialized queue
pub struct Engine<S: Schema> {
    stream: Stream<S::Entry>,
    queue: Option<BoundedQueue<Message<S>, Applier<S>>>,
    replay: Option<Subscription<Replayer<S>>>,
    progress: Arc<Progress>,
}

impl<S: Schema> Engine<S> {
    /// Engine over a fresh in-memory stream
    pub fn new(views: S) -> Result<Self, EngineError> {
        let config = EngineConfig::default();
        let stream = Stream::in_memory(config.stream.clone(), vista_core::SystemClock);
        Self::with_stream(config, views, stream)
    }

    /// Engine over a stream backed by `persister`, replaying it first
    pub fn with_persister(
        config: EngineConfig,
        views: S,
        persister: impl Persister<S::Entry> + 'static,
    ) -> Result<Self, EngineError> {
        let stream = Stream::builder()
            .config(config.stream.clone())
            .persister(persister)
            .open()?;
        Self::with_stream(config, views, stream)
    }

    /// Engine over an existing stream.
    ///
    /// The views are rebuilt from every record the stream holds.
    pub fn with_stream(
        config: EngineConfig,
        views: S,
        stream: Stream<S::Entry>,
    ) -> Result<Self, EngineError> {
        let target = stream.size();
        let progress = Arc::new(Progress::new(target));

        let queue = BoundedQueue::spawn(
            config.queue.clone(),
            Applier {
                views,
                stream: stream.clone(),
                progress: Arc::clone(&progress),
            },
        )?;
        let replay = stream.subscribe(Replayer {
            queue: queue.producer(),
        })?;

        info!(
            replaying = target,
            capacity = config.queue.capacity,
            "engine started"
        );
        Ok(Self {
            stream,
            queue: Some(queue),
            replay: Some(replay),
            progress,
        })
    }

    pub fn stream(&self) -> &Stream<S::Entry> {
        &self.stream
    }

    /// Whether every record present at startup has been applied
    pub fn caught_up(&self) -> bool {
        self.progress.is_caught_up()
    }

    /// Block until caught up or until `timeout` passes
    pub fn wait_caught_up(&self, timeout: Duration) -> bool {
        self.progress.wait(timeout)
    }

    /// Stream entries applied by the consumer so far
    pub fn entries_seen(&self) -> u64 {
        self.progress.entries_seen.load(Ordering::SeqCst)
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.as_ref().map(|q| q.stats()).unwrap_or_default()
    }

    /// Run `f` against the views on the consumer thread.
    ///
    /// A panic inside `f` resolves the future with
    /// [`EngineError::Panicked`]; the engine keeps running.
    pub fn transaction<R, F>(&self, f: F) -> TxnFuture<R>
    where
        F: FnOnce(&mut Txn<'_, S>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(move |txn| Ok(f(txn)))
    }

    /// Like [`transaction`](Self::transaction) for a fallible function
    pub fn try_transaction<R, F>(&self, f: F) -> TxnFuture<R>
    where
        F: FnOnce(&mut Txn<'_, S>) -> Result<R, EngineError> + Send + 'static,
        R: Send + 'static,
    {
        self.submit(f)
    }

    /// Run `f`, then hand its outcome to `next` on the consumer thread.
    ///
    /// `next` is called exactly once: with `f`'s value, with
    /// [`EngineError::Panicked`] if `f` panicked, or with
    /// [`EngineError::Cancelled`] if the transaction never ran. In the last
    /// case it runs on whichever thread discarded the transaction.
    pub fn transaction_then<R, F, N>(&self, f: F, next: N) -> TxnFuture<()>
    where
        F: FnOnce(&mut Txn<'_, S>) -> R + Send + 'static,
        R: Send + 'static,
        N: FnOnce(Result<R, EngineError>) + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.enqueue(
            move |txn| Ok(f(txn)),
            move |result: Result<R, EngineError>| {
                let status = match &result {
                    Ok(_) => Ok(()),
                    Err(EngineError::Panicked(message)) => {
                        Err(EngineError::Panicked(message.clone()))
                    }
                    Err(_) => Err(EngineError::Cancelled),
                };
                next(result);
                let _ = tx.send(status);
            },
        );
        TxnFuture::new(rx)
    }

    /// Publish `entry` and apply it to the views.
    pub fn add(&self, entry: S::Entry) -> TxnFuture<()> {
        self.submit(move |txn| txn.add(entry).map(|_| ()))
    }

    /// Look up `key` in a single-container engine.
    pub fn get(&self, key: S::Key) -> TxnFuture<Option<S::Item>>
    where
        S: Lookup,
        S::Item: Clone + Send + 'static,
    {
        self.get_in::<S, _>(|views| views, key)
    }

    pub fn has(&self, key: S::Key) -> TxnFuture<bool>
    where
        S: Lookup,
    {
        self.has_in::<S, _>(|views| views, key)
    }

    /// Look up `key` in the container `pick` selects.
    pub fn get_in<C, P>(&self, pick: P, key: C::Key) -> TxnFuture<Option<C::Item>>
    where
        C: Lookup,
        C::Item: Clone + Send + 'static,
        P: for<'v> FnOnce(&'v S) -> &'v C + Send + 'static,
    {
        self.transaction(move |txn| pick(&*txn.views).lookup(&key).cloned())
    }

    pub fn has_in<C, P>(&self, pick: P, key: C::Key) -> TxnFuture<bool>
    where
        C: Lookup,
        P: for<'v> FnOnce(&'v S) -> &'v C + Send + 'static,
    {
        self.transaction(move |txn| pick(&*txn.views).lookup(&key).is_some())
    }

    fn submit<R, F>(&self, f: F) -> TxnFuture<R>
    where
        F: FnOnce(&mut Txn<'_, S>) -> Result<R, EngineError> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.enqueue(f, move |result| {
            // The caller may have stopped waiting
            let _ = tx.send(result);
        });
        TxnFuture::new(rx)
    }

    /// Queue `f`; `deliver` receives its outcome exactly once.
    fn enqueue<R, F, D>(&self, f: F, deliver: D)
    where
        F: FnOnce(&mut Txn<'_, S>) -> Result<R, EngineError> + Send + 'static,
        R: Send + 'static,
        D: FnOnce(Result<R, EngineError>) + Send + 'static,
    {
        let reply = Reply::new(deliver);
        let job: Job<S> = Box::new(move |views, stream| {
            let started = Instant::now();
            let mut txn = Txn {
                views,
                publisher: Publisher::new(stream),
            };
            let result = catch_unwind(AssertUnwindSafe(|| f(&mut txn)))
                .unwrap_or_else(|panic| Err(EngineError::Panicked(panic_message(panic.as_ref()))));
            if let Err(EngineError::Panicked(message)) = &result {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    %message,
                    "transaction panicked"
                );
            }
            reply.send(result);
        });

        // A job that is not accepted drops its reply, which delivers
        // Cancelled
        match &self.queue {
            Some(queue) => match queue.push(Message::Run(job)) {
                Ok(Pushed::Accepted { .. }) => {}
                Ok(Pushed::Dropped) => warn!("transaction dropped by full queue"),
                Err(e) => warn!(error = %e, "transaction rejected"),
            },
            None => warn!("transaction submitted to a stopped engine"),
        }
    }

    /// Stop replaying, drain the queue, and hand the views back.
    pub fn shutdown(mut self) -> Result<S, EngineError> {
        if let Some(replay) = self.replay.take() {
            replay.join()?;
        }
        let applier = match self.queue.take() {
            Some(queue) => queue.shutdown()?,
            None => return Err(EngineError::Cancelled),
        };
        info!(entries_seen = self.entries_seen(), "engine stopped");
        Ok(applier.views)
    }
}

impl<S: Schema> Drop for Engine<S> {
    fn drop(&mut self) {
        if let Some(replay) = self.replay.take() {
            if let Err(e) = replay.join() {
                warn!(error = %e, "replay listener ended abnormally");
            }
        }
        if let Some(queue) = self.queue.take() {
            drop(queue);
            info!(entries_seen = self.entries_seen(), "engine stopped");
        }
    }
}

/// Outcome slot of a queued transaction.
///
/// Dropping it unsent delivers [`EngineError::Cancelled`], so a job the
/// queue discards still answers its caller.
struct Reply<R> {
    deliver: Option<Box<dyn FnOnce(Result<R, EngineError>) + Send>>,
}

impl<R> Reply<R> {
    fn new(deliver: impl FnOnce(Result<R, EngineError>) + Send + 'static) -> Self {
        Self {
            deliver: Some(Box::new(deliver)),
        }
    }

    fn send(mut self, result: Result<R, EngineError>) {
        if let Some(deliver) = self.deliver.take() {
            deliver(result);
        }
    }
}

impl<R> Drop for Reply<R> {
    fn drop(&mut self) {
        if let Some(deliver) = self.deliver.take() {
            deliver(Err(EngineError::Cancelled));
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
