// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Records stored in a stream

use crate::clock::Micros;
use serde::{Deserialize, Serialize};

/// Where a record landed when it was published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub index: u64,
    pub us: Micros,
}

/// Where a delivered record sits relative to the stream at delivery time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub index: u64,
    pub us: Micros,
    /// Stream size observed when the record was handed out
    pub total: u64,
}

impl Position {
    /// Records published after this one, as of delivery
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.index + 1)
    }

    pub fn is_last(&self) -> bool {
        self.remaining() == 0
    }
}

/// A stored record that could not be decoded on replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unparsable {
    pub raw: String,
    pub reason: String,
}

/// Payload of a record
#[derive(Debug, Clone, PartialEq)]
pub enum Body<E> {
    Entry(E),
    Unparsable(Unparsable),
}

/// One immutable, indexed, timestamped slot of a stream
#[derive(Debug, Clone, PartialEq)]
pub struct Record<E> {
    pub index: u64,
    pub us: Micros,
    pub body: Body<E>,
}

impl<E> Record<E> {
    pub fn entry(index: u64, us: Micros, entry: E) -> Self {
        Self {
            index,
            us,
            body: Body::Entry(entry),
        }
    }

    pub fn unparsable(index: u64, us: Micros, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            index,
            us,
            body: Body::Unparsable(Unparsable {
                raw: raw.into(),
                reason: reason.into(),
            }),
        }
    }

    pub fn stamp(&self) -> Stamp {
        Stamp {
            index: self.index,
            us: self.us,
        }
    }

    pub fn as_entry(&self) -> Option<&E> {
        match &self.body {
            Body::Entry(e) => Some(e),
            Body::Unparsable(_) => None,
        }
    }
}
