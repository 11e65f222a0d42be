// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel identifiers.
//!
//! A channel key is an opaque string naming a conversation. The core never
//! parses it — adapters prefix it with a short tag (`tg-`, `http-`) so the
//! [`crate::push_registry`]-style lookup in `relay-channel-manager` can route
//! by prefix. The only constraint the core enforces is filesystem safety,
//! because the key is embedded directly into socket and PID file names.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// An opaque, filesystem-safe channel identifier.
///
/// Two calls with the same key address the same agent session — this is a
/// feature, not an accident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChannelKey(String);

/// Error constructing a [`ChannelKey`] from an untrusted string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelKeyError {
    #[error("channel key must not be empty")]
    Empty,
    #[error("channel key {0:?} contains characters unsafe for a filename")]
    Unsafe(String),
}

impl ChannelKey {
    /// Validate and construct a channel key.
    ///
    /// Allowed characters: ASCII alphanumerics, `-`, `_`, `.`. This keeps the
    /// key safe to embed verbatim into `<socket-dir>/<prefix>-<channel>.sock`.
    pub fn new(raw: impl Into<String>) -> Result<Self, ChannelKeyError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ChannelKeyError::Empty);
        }
        let safe = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !safe {
            return Err(ChannelKeyError::Unsafe(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for ChannelKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ChannelKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ChannelKey::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "channel_key_tests.rs"]
mod tests;
