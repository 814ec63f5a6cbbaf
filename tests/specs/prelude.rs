// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared entry types and helpers for the specs

#![allow(dead_code)]

pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use std::thread;
pub use std::time::{Duration, Instant};
pub use vista_core::{
    BoundedQueue, Consumer, FakeClock, Flow, MemoryLog, Overflow, Position, QueueConfig, Stream,
    StreamConfig,
};
pub use vista_engine::{Cell, Dictionary, Engine, EngineConfig, Keyed, Matrix, Schema};

/// A named integer, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Number {
    pub name: String,
    pub value: i64,
}

pub fn number(name: &str, value: i64) -> Number {
    Number {
        name: name.to_string(),
        value,
    }
}

impl Keyed for Number {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// A player's points in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub player: String,
    pub round: u32,
    pub points: i64,
}

pub fn score(player: &str, round: u32, points: i64) -> Score {
    Score {
        player: player.to_string(),
        round,
        points,
    }
}

impl Cell for Score {
    type Row = String;
    type Col = u32;

    fn row(&self) -> String {
        self.player.clone()
    }

    fn col(&self) -> u32 {
        self.round
    }
}

/// Every entry type the specs store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entry {
    Number(Number),
    Score(Score),
}

impl From<Number> for Entry {
    fn from(n: Number) -> Self {
        Entry::Number(n)
    }
}

impl From<Score> for Entry {
    fn from(s: Score) -> Self {
        Entry::Score(s)
    }
}

#[derive(Debug, Default)]
pub struct Views {
    pub numbers: Dictionary<Number>,
    pub scores: Matrix<Score>,
}

impl Schema for Views {
    type Entry = Entry;

    fn apply(&mut self, entry: &Entry, index: u64) {
        match entry {
            Entry::Number(n) => {
                self.numbers.apply(n.clone(), index);
            }
            Entry::Score(s) => {
                self.scores.apply(s.clone(), index);
            }
        }
    }
}

pub fn fake_stream<E: Send + Sync + 'static>() -> Stream<E> {
    Stream::in_memory(StreamConfig::default(), FakeClock::new())
}

pub fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}
