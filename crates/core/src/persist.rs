// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable log boundary
//!
//! A stream hands every published record to its persister before the
//! record becomes visible, and asks the persister to replay what it holds
//! once, when the stream is opened.

use crate::clock::Micros;
use crate::record::Record;
use std::io;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by a durable log
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Append-and-replay storage behind a stream
pub trait Persister<E>: Send {
    /// Durably store one record. The record is only published if this succeeds.
    fn append(&mut self, record: &Record<E>) -> Result<(), PersistError>;

    /// Feed every stored record to `on_record`, oldest first.
    ///
    /// Records that cannot be decoded should be handed out as unparsable
    /// records rather than failing the whole replay.
    fn replay(&mut self, on_record: &mut dyn FnMut(Record<E>)) -> Result<(), PersistError>;
}

/// In-memory log, shareable between stream instances to simulate restarts
#[derive(Debug)]
pub struct MemoryLog<E> {
    records: Arc<Mutex<Vec<Record<E>>>>,
}

impl<E> MemoryLog<E> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a marker for a record that will fail to decode on replay
    pub fn push_unparsable(&self, us: Micros, raw: &str, reason: &str) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let index = records.len() as u64;
        records.push(Record::unparsable(index, us, raw, reason));
    }
}

impl<E> Clone for MemoryLog<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<E> Default for MemoryLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send> Persister<E> for MemoryLog<E> {
    fn append(&mut self, record: &Record<E>) -> Result<(), PersistError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn replay(&mut self, on_record: &mut dyn FnMut(Record<E>)) -> Result<(), PersistError> {
        let records = self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for record in records {
            on_record(record);
        }
        Ok(())
    }
}
