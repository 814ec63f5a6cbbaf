// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-entry GET and POST handlers over an engine
//!
//! Both run as transactions and reply from the engine's consumer thread,
//! so a handler never blocks the server while the queue is busy.

use crate::response::{wrap, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use vista_core::Stamp;
use vista_engine::{Engine, EngineError, Lookup, Schema, Txn, TxnFuture};

/// Look `key` up in the container `pick` selects and reply with
/// `200 {"entry": ...}` or `404 {"error":"NOT_FOUND"}`.
///
/// `respond` is always called, with `500` or `503` when the lookup
/// panicked or never ran.
pub fn get_entry<S, C, P, R>(engine: &Engine<S>, pick: P, key: C::Key, respond: R) -> TxnFuture<()>
where
    S: Schema,
    C: Lookup,
    C::Item: Serialize,
    P: for<'v> FnOnce(&'v S) -> &'v C + Send + 'static,
    R: FnOnce(Response) + Send + 'static,
{
    engine.transaction_then(
        move |txn| match pick(&*txn.views).lookup(&key) {
            Some(item) => match wrap("entry", item) {
                Ok(body) => Response::text(200, body + "\n"),
                Err(e) => Response::error(500, "INTERNAL_ERROR", e),
            },
            None => Response::not_found(),
        },
        move |result| respond(result.unwrap_or_else(unavailable)),
    )
}

/// Decode `body` and store it with `insert`, replying `201` with the
/// assigned index and timestamp.
///
/// A body that does not decode is answered with `400` right away and no
/// transaction is queued. `insert` is expected to use `must_add`; an
/// already-present entry becomes `409 {"error":"ALREADY_EXISTS"}`.
pub fn post_entry<S, T, I, R>(
    engine: &Engine<S>,
    body: &str,
    insert: I,
    respond: R,
) -> Option<TxnFuture<()>>
where
    S: Schema,
    T: DeserializeOwned + Send + 'static,
    I: FnOnce(&mut Txn<'_, S>, T) -> Result<Stamp, EngineError> + Send + 'static,
    R: FnOnce(Response) + Send + 'static,
{
    let entry: T = match serde_json::from_str(body) {
        Ok(entry) => entry,
        Err(e) => {
            debug!(error = %e, "rejecting undecodable body");
            respond(Response::error(400, "BAD_REQUEST", e));
            return None;
        }
    };

    Some(engine.transaction_then(
        move |txn| insert(txn, entry),
        move |result| respond(created(result.and_then(|inserted| inserted))),
    ))
}

fn created(result: Result<Stamp, EngineError>) -> Response {
    match result {
        Ok(stamp) => Response::json(201, &stamp),
        Err(EngineError::Container(e)) if e.is_already_exists() => {
            Response::error(409, "ALREADY_EXISTS", e)
        }
        Err(e) => unavailable(e),
    }
}

/// Reply for a transaction that failed outside the handler's own logic
fn unavailable(error: EngineError) -> Response {
    match error {
        EngineError::Cancelled => {
            warn!("transaction cancelled; replying 503");
            Response::error(503, "UNAVAILABLE", error)
        }
        e => {
            warn!(error = %e, "transaction failed");
            Response::error(500, "INTERNAL_ERROR", e)
        }
    }
}

#[cfg(test)]
#[path = "rest_tests.rs"]
mod tests;
