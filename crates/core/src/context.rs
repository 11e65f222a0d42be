// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-message channel context, rendered into a machine-readable header line
//! prepended to the content before dispatch.

use serde::{Deserialize, Serialize};

/// Optional metadata about where a message came from.
///
/// When present, `relay-channel-manager` prepends a single bracketed header
/// line to the content so the agent knows where it is speaking. Omitted
/// fields are omitted from the header. The prefix is idempotent (computed
/// once per send, never re-parsed by anything downstream).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelContext {
    pub channel: Option<String>,
    pub adapter: Option<String>,
    pub user_name: Option<String>,
    pub chat_title: Option<String>,
    pub topic_name: Option<String>,
}

impl ChannelContext {
    /// Render the bracketed header line, or an empty string if every field
    /// is absent.
    ///
    /// Form: `[channel: <c>, adapter: <a>, user: <u>, chat: <t>, topic: <n>]\n`
    /// with omitted fields dropped and separators adjusted so there is never
    /// a dangling `, `.
    pub fn render_header(&self) -> String {
        let mut parts = Vec::new();
        if let Some(c) = &self.channel {
            parts.push(format!("channel: {c}"));
        }
        if let Some(a) = &self.adapter {
            parts.push(format!("adapter: {a}"));
        }
        if let Some(u) = &self.user_name {
            parts.push(format!("user: {u}"));
        }
        if let Some(t) = &self.chat_title {
            parts.push(format!("chat: {t}"));
        }
        if let Some(n) = &self.topic_name {
            parts.push(format!("topic: {n}"));
        }
        if parts.is_empty() {
            return String::new();
        }
        format!("[{}]\n", parts.join(", "))
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
