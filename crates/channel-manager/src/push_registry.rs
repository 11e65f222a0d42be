// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound, agent-initiated delivery — the `push` half of the daemon.
//!
//! Deliberately independent of [`crate::ChannelManager`]: it holds no
//! reference to the dispatch maps and is never on the hot path of a `send`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// A transport capable of delivering a message the agent initiated outside
/// of any in-flight dispatch (a proactive notification, a scheduled report).
#[async_trait]
pub trait PushHandler: Send + Sync {
    /// Deliver `text` (with optional `media`, e.g. a path or URL) to
    /// `channel`. Returns `true` if delivery was accepted by the transport.
    async fn send(&self, channel: &str, text: &str, media: Option<&str>) -> bool;
}

/// Ordered prefix → handler map. The first registered prefix that `channel`
/// starts with wins; re-registering a prefix replaces its handler in place
/// without disturbing registration order.
pub struct PushRegistry {
    entries: Mutex<Vec<(String, Arc<dyn PushHandler>)>>,
}

impl Default for PushRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PushRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, prefix: impl Into<String>, handler: Arc<dyn PushHandler>) {
        let prefix = prefix.into();
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.iter_mut().find(|(p, _)| *p == prefix) {
            existing.1 = handler;
        } else {
            entries.push((prefix, handler));
        }
    }

    /// Route to the first handler whose registered prefix matches `channel`.
    /// Returns `false` with no handler invoked if nothing matches.
    pub async fn send(&self, channel: &str, text: &str, media: Option<&str>) -> bool {
        let candidate = {
            let entries = self.entries.lock();
            entries
                .iter()
                .find(|(prefix, _)| channel.starts_with(prefix.as_str()))
                .map(|(_, handler)| Arc::clone(handler))
        };
        match candidate {
            Some(handler) => handler.send(channel, text, media).await,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "push_registry_tests.rs"]
mod tests;
