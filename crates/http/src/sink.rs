// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where the chunks of a streamed response go

use thiserror::Error;
use tokio::sync::mpsc;

/// The client is no longer reading
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("client disconnected")]
pub struct SinkClosed;

/// The writing half of a chunked response.
///
/// Called from a subscription thread, never from async code, so an
/// implementation may block until the client has room.
pub trait ChunkSink: Send + 'static {
    fn send(&mut self, chunk: String) -> Result<(), SinkClosed>;
}

/// Sink feeding a bounded tokio channel, for servers that write the
/// response body from a task
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    /// A sink and the receiver the server drains; `buffer` chunks may
    /// be in flight before the subscription waits.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

impl ChunkSink for ChannelSink {
    fn send(&mut self, chunk: String) -> Result<(), SinkClosed> {
        self.tx.blocking_send(chunk).map_err(|_| SinkClosed)
    }
}

impl ChunkSink for std::sync::mpsc::Sender<String> {
    fn send(&mut self, chunk: String) -> Result<(), SinkClosed> {
        std::sync::mpsc::Sender::send(self, chunk).map_err(|_| SinkClosed)
    }
}
