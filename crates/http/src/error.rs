// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;
use vista_core::StreamError;

/// A query parameter that could not be understood
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("parameter `{name}` must be a non-negative integer, got `{value}`")]
    NotANumber { name: String, value: String },
}

/// Errors surfaced to the embedding server
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
}
