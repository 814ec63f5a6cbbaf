// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vista_core::{QueueConfig, StreamConfig};

/// Settings for an engine's stream subscriptions and update queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stream: StreamConfig,
    pub queue: QueueConfig,
}

impl EngineConfig {
    /// Parse from TOML, e.g.
    ///
    /// ```toml
    /// [stream]
    /// termination_poll = "10ms"
    ///
    /// [queue]
    /// capacity = 256
    /// overflow = "block"
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
