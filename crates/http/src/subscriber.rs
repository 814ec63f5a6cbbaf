// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunked HTTP subscription to a stream
//!
//! Each served entry is one chunk, `{"<value_name>": <entry>}` and a
//! newline. When the subscription is told to stop, a final
//! [`TERMINATED`] chunk is written.

use crate::error::HttpError;
use crate::params::SubscribeParams;
use crate::response::{wrap, Response};
use crate::sink::ChunkSink;
use serde::Serialize;
use tracing::{debug, warn};
use vista_core::{Flow, Listener, Micros, Position, Stream, Termination, Unparsable};

/// Last chunk written when the stream or server ends the subscription
pub const TERMINATED: &str = "{\"error\":\"The subscriber has terminated.\"}\n";

/// Stream listener writing entries to a [`ChunkSink`]
pub struct HttpSubscriber<S> {
    value_name: String,
    sink: S,
    serving: bool,
    last: u64,
    from_us: Option<Micros>,
    remaining_cap: Option<u64>,
    nowait: bool,
    sent: u64,
}

impl<S: ChunkSink> HttpSubscriber<S> {
    /// `now_us` is the time of the request, the reference for `recent`.
    pub fn new(value_name: &str, params: &SubscribeParams, now_us: Micros, sink: S) -> Self {
        Self {
            value_name: value_name.to_string(),
            sink,
            serving: params.serves_immediately(),
            last: params.last(),
            from_us: params.from_us(now_us),
            remaining_cap: params.limit(),
            nowait: params.nowait,
            sent: 0,
        }
    }

    /// Entries written so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn start_serving(&mut self, at: Position) {
        if self.serving {
            return;
        }
        if at.remaining() < self.last {
            self.serving = true;
        }
        if self.from_us.is_some_and(|from| at.us >= from) {
            self.serving = true;
        }
    }

    fn after(&self, at: Position) -> Flow {
        if self.remaining_cap == Some(0) || (self.nowait && at.is_last()) {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }
}

impl<E: Serialize, S: ChunkSink> Listener<E> for HttpSubscriber<S> {
    fn on_entry(&mut self, entry: &E, at: Position) -> Flow {
        self.start_serving(at);
        if !self.serving {
            return self.after(at);
        }

        let chunk = match wrap(&self.value_name, entry) {
            Ok(chunk) => chunk + "\n",
            Err(e) => {
                warn!(index = at.index, error = %e, "entry failed to serialize, closing subscription");
                return Flow::Stop;
            }
        };
        if self.sink.send(chunk).is_err() {
            debug!(index = at.index, sent = self.sent, "subscriber went away");
            return Flow::Stop;
        }
        self.sent += 1;
        if let Some(cap) = self.remaining_cap.as_mut() {
            *cap = cap.saturating_sub(1);
        }
        self.after(at)
    }

    fn on_unparsable(&mut self, record: &Unparsable, at: Position) -> Flow {
        debug!(index = at.index, reason = %record.reason, "not serving unparsable record");
        self.after(at)
    }

    fn on_terminate(&mut self) -> Termination {
        // Nothing to do if the client is already gone
        let _ = self.sink.send(TERMINATED.to_string());
        Termination::Accept
    }
}

/// How a subscription request was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    /// A complete reply; nothing was subscribed
    Reply(Response),
    /// Chunks are flowing to the sink from subscription `id`
    Chunked { id: u64 },
}

/// Answer a subscription request against `stream`.
///
/// `sizeonly` replies with the stream size, and `nowait` on an empty stream
/// replies with an empty body. Otherwise a detached subscription feeds
/// `sink` until the client leaves, a limit is reached or the stream closes.
pub fn serve_subscription<E, S>(
    stream: &Stream<E>,
    value_name: &str,
    query: &str,
    sink: S,
) -> Result<Served, HttpError>
where
    E: Serialize + Send + Sync + 'static,
    S: ChunkSink,
{
    let params = match SubscribeParams::from_query(query) {
        Ok(params) => params,
        Err(e) => return Ok(Served::Reply(Response::error(400, "BAD_REQUEST", e))),
    };
    if params.sizeonly {
        return Ok(Served::Reply(Response::text(200, format!("{}\n", stream.size()))));
    }
    if params.nowait && stream.is_empty() {
        return Ok(Served::Reply(Response::text(200, "")));
    }

    let subscriber = HttpSubscriber::new(value_name, &params, stream.now_us(), sink);
    let subscription = stream.subscribe(subscriber)?;
    let id = subscription.id();
    subscription.detach();
    debug!(subscription = id, ?params, "serving chunked subscription");
    Ok(Served::Chunked { id })
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
