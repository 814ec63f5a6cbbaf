// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Display;
use tracing::error;

/// A complete, non-chunked reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// JSON body followed by a newline
    pub fn json(status: u16, value: &impl Serialize) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::text(status, body + "\n"),
            Err(e) => {
                error!(error = %e, "response body failed to serialize");
                Self::error(500, "INTERNAL_ERROR", e)
            }
        }
    }

    /// `{"error": code, "message": ...}`
    pub fn error(status: u16, code: &str, message: impl Display) -> Self {
        let body = serde_json::json!({ "error": code, "message": message.to_string() });
        Self::text(status, format!("{body}\n"))
    }

    pub fn not_found() -> Self {
        Self::text(404, "{\"error\":\"NOT_FOUND\"}\n")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `value` as a one-field object, `{"<name>": value}`
pub fn wrap(name: &str, value: &impl Serialize) -> Result<String, serde_json::Error> {
    let mut object = Map::new();
    object.insert(name.to_string(), serde_json::to_value(value)?);
    serde_json::to_string(&Value::Object(object))
}
