// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vista-core: the log and queue underneath vista's materialized views
//!
//! This crate provides:
//! - `Stream` - append-only, subscribable log with durable replay
//! - `BoundedQueue` - fixed-capacity single-consumer queue with overflow policies
//! - `Persister` - the durable log boundary, with an in-memory implementation
//! - `Clock` - injectable time source for record timestamps

pub mod clock;
pub mod config;
pub mod error;
pub mod persist;
pub mod queue;
pub mod record;
pub mod stream;

pub use clock::{Clock, FakeClock, Micros, SystemClock};
pub use config::{Overflow, QueueConfig, StreamConfig};
pub use error::{QueueError, StreamError};
pub use persist::{MemoryLog, PersistError, Persister};
pub use queue::{BoundedQueue, Consumer, Producer, Pushed, QueueStats};
pub use record::{Body, Position, Record, Stamp, Unparsable};
pub use stream::{
    from_fn, Flow, FnListener, Listener, ScopedSubscription, Stream, StreamBuilder, Subscription,
    Termination,
};
