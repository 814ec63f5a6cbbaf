// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! HTTP boundary for vista streams and engines
//!
//! The networking stack is not part of this crate. A server hands over the
//! query string or body of a request plus somewhere to write the answer:
//! a [`ChunkSink`] for chunked subscriptions, a callback for plain replies.

mod error;
mod params;
mod response;
mod rest;
mod sink;
mod subscriber;

pub use error::{HttpError, ParamError};
pub use params::SubscribeParams;
pub use response::{wrap, Response};
pub use rest::{get_entry, post_entry};
pub use sink::{ChannelSink, ChunkSink, SinkClosed};
pub use subscriber::{serve_subscription, HttpSubscriber, Served, TERMINATED};
