// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for streams and queues

use crate::clock::Micros;
use crate::persist::PersistError;
use thiserror::Error;

/// Errors that can occur publishing to or subscribing on a stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
    #[error("stream is closed")]
    Closed,
    #[error("timestamp {attempted} precedes last published timestamp {previous}")]
    TimestampRegression { previous: Micros, attempted: Micros },
    #[error("failed to spawn listener thread: {0}")]
    Spawn(std::io::Error),
    #[error("listener panicked")]
    ListenerPanicked,
}

/// Errors that can occur starting, feeding or stopping a queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is shutting down")]
    Closed,
    #[error("failed to spawn consumer thread: {0}")]
    Spawn(std::io::Error),
    #[error("consumer thread panicked")]
    ConsumerPanicked,
}
