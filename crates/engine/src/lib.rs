// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Vista materialized views: containers, schemas, and the transaction engine

mod config;
mod dictionary;
mod engine;
mod error;
mod future;
mod matrix;
mod schema;
mod view;

pub use config::EngineConfig;
pub use dictionary::Dictionary;
pub use engine::{Engine, Txn};
pub use error::{ContainerError, EngineError};
pub use future::TxnFuture;
pub use matrix::{Axis, Line, Matrix};
pub use schema::{Cell, Keyed, Lookup, Nullable, NullableCell, Schema};
pub use view::{Accessor, Mutator, Publisher};
