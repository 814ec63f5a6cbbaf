// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for containers and the engine

use thiserror::Error;
use vista_core::{QueueError, StreamError};

/// Errors raised by container reads and strict writes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContainerError {
    #[error("key not found: {key}")]
    KeyNotFound { key: String },
    #[error("cell not found: ({row}, {col})")]
    CellNotFound { row: String, col: String },
    #[error("row not found: {row}")]
    RowNotFound { row: String },
    #[error("column not found: {col}")]
    ColNotFound { col: String },
    #[error("key already exists: {entry}")]
    KeyAlreadyExists { entry: String },
    #[error("cell already exists: {entry}")]
    CellAlreadyExists { entry: String },
}

impl ContainerError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContainerError::KeyNotFound { .. }
                | ContainerError::CellNotFound { .. }
                | ContainerError::RowNotFound { .. }
                | ContainerError::ColNotFound { .. }
        )
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            ContainerError::KeyAlreadyExists { .. } | ContainerError::CellAlreadyExists { .. }
        )
    }
}

/// Errors that can occur in the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("transaction cancelled before it ran")]
    Cancelled,
    #[error("transaction panicked: {0}")]
    Panicked(String),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn container(&self) -> Option<&ContainerError> {
        match self {
            EngineError::Container(e) => Some(e),
            _ => None,
        }
    }
}
