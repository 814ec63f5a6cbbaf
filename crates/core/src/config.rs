// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunables for streams and queues

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Subscription behavior for a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// How often a listener that deferred termination is asked again
    #[serde(with = "humantime_serde")]
    pub termination_poll: Duration,
    /// Deferrals allowed before termination is forced
    pub max_termination_deferrals: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            termination_poll: Duration::from_millis(5),
            max_termination_deferrals: 200,
        }
    }
}

/// What a full queue does with the next push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    /// The producer waits for a free slot
    #[default]
    Block,
    /// The message being pushed is discarded
    DropIncoming,
    /// The oldest message not yet taken by the consumer is discarded
    DropOldest,
}

impl Overflow {
    pub fn drops(self) -> bool {
        !matches!(self, Overflow::Block)
    }
}

/// Shape of a bounded queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
    pub overflow: Overflow,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            overflow: Overflow::Block,
        }
    }
}

impl QueueConfig {
    pub fn new(capacity: usize, overflow: Overflow) -> Self {
        Self { capacity, overflow }
    }
}
