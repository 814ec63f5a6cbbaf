// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription query parameters

use crate::error::ParamError;
use std::time::Duration;
use vista_core::Micros;

/// What part of a stream a chunked subscription should serve.
///
/// Any of `recent`, `since`, `n` or `n_min` holds output back until one of
/// them is satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeParams {
    /// Serve entries stamped within this long before the request
    pub recent: Option<Duration>,
    /// Serve entries stamped at or after this epoch-microsecond time
    pub since: Option<Micros>,
    /// Serve the last `n` entries, and by default no more than `n` in total
    pub n: Option<u64>,
    /// Serve at least the last `n_min` entries, without a cap
    pub n_min: Option<u64>,
    /// Close after this many entries; `0` means no cap
    pub cap: Option<u64>,
    /// Close after the entry that was last when it was delivered
    pub nowait: bool,
    /// Reply with the stream size instead of subscribing
    pub sizeonly: bool,
}

impl SubscribeParams {
    /// Parse a query string such as `n=10&nowait`.
    ///
    /// A leading `?` is accepted and unknown parameters are ignored.
    pub fn from_query(query: &str) -> Result<Self, ParamError> {
        let mut params = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            match name {
                "recent" => params.recent = Some(Duration::from_millis(number(name, value)?)),
                "since" => params.since = Some(number(name, value)?),
                "n" => params.n = Some(number(name, value)?),
                "n_min" => params.n_min = Some(number(name, value)?),
                "cap" => params.cap = Some(number(name, value)?),
                "nowait" => params.nowait = true,
                "sizeonly" => params.sizeonly = true,
                _ => {}
            }
        }
        Ok(params)
    }

    /// Whether output starts right away
    pub fn serves_immediately(&self) -> bool {
        self.recent.is_none() && self.since.is_none() && self.n.is_none() && self.n_min.is_none()
    }

    /// How many trailing entries to serve regardless of time filters
    pub fn last(&self) -> u64 {
        self.n_min.or(self.n).unwrap_or(0)
    }

    /// The effective limit on entries served
    pub fn limit(&self) -> Option<u64> {
        match self.cap {
            Some(0) => None,
            Some(cap) => Some(cap),
            None => self.n.filter(|n| *n > 0),
        }
    }

    /// Earliest timestamp to serve, given the time of the request
    pub fn from_us(&self, now_us: Micros) -> Option<Micros> {
        match (self.recent, self.since) {
            (Some(recent), _) => {
                let back = u64::try_from(recent.as_micros()).unwrap_or(u64::MAX);
                Some(now_us.saturating_sub(back))
            }
            (None, since) => since,
        }
    }
}

fn number(name: &str, value: &str) -> Result<u64, ParamError> {
    value.parse().map_err(|_| ParamError::NotANumber {
        name: name.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
