// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result handle for a queued transaction

use crate::error::EngineError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Resolves once the engine's consumer has run the transaction.
///
/// Await it from async code, or call [`wait`](Self::wait) from a plain
/// thread. Resolves to [`EngineError::Cancelled`] if the transaction was
/// dropped before it ran.
#[must_use = "a transaction result is only observed through its future"]
pub struct TxnFuture<R> {
    rx: oneshot::Receiver<Result<R, EngineError>>,
}

impl<R> TxnFuture<R> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<R, EngineError>>) -> Self {
        Self { rx }
    }

    /// Block the calling thread until the transaction has run.
    ///
    /// Must not be called from inside an async runtime or from within
    /// another transaction.
    pub fn wait(self) -> Result<R, EngineError> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(EngineError::Cancelled))
    }

    /// Block until the transaction has run, discarding its value.
    pub fn go(self) -> Result<(), EngineError> {
        self.wait().map(|_| ())
    }
}

impl<R> Future for TxnFuture<R> {
    type Output = Result<R, EngineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(EngineError::Cancelled)))
    }
}
