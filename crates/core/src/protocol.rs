// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol shared between `relay-channel-manager` (the client) and
//! `relay-session-host` (the server) over the per-channel Unix socket.
//!
//! Line-delimited JSON (LF-terminated). Client-to-host frames are one of the
//! two variants below. Host-to-client frames are, for the common case, the
//! agent's own stdout lines forwarded verbatim — the host only peeks at them
//! (see [`ResultPeek`]) to update its bookkeeping, it never re-serializes
//! them. The host additionally synthesizes two frame shapes of its own: a
//! `result` frame on agent exit (see [`synthetic_result`]) and a `_stderr`
//! frame for forwarded stderr lines (see [`stderr_frame`]).

use crate::content::MessageContent;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A frame written by the client (`relay-channel-manager`) to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "user")]
    User { message: UserMessage },
    #[serde(rename = "interrupt")]
    Interrupt,
}

/// Body of a `user` client frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ClientFrame {
    /// Build a `user` frame carrying the given content.
    pub fn user(content: MessageContent) -> Self {
        ClientFrame::User {
            message: UserMessage {
                role: "user".to_string(),
                content,
            },
        }
    }
}

/// Just enough of a `result` frame to drive dispatch bookkeeping.
///
/// Deserialized leniently from an agent stdout line (or a synthetic frame);
/// unknown fields are ignored, and lines that are not a `result` frame at
/// all simply fail to match `kind == "result"` and are treated as ordinary
/// streamed events.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultPeek {
    #[serde(rename = "type")]
    pub kind: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub text: String,
}

impl ResultPeek {
    /// Attempt to peek a line as a `result` frame. Returns `None` if the
    /// line is not JSON, or JSON but not a `result`-typed object.
    pub fn parse(line: &str) -> Option<ResultPeek> {
        let peek: ResultPeek = serde_json::from_str(line).ok()?;
        if peek.kind == "result" {
            Some(peek)
        } else {
            None
        }
    }
}

/// Build the synthetic `result` frame the host emits when the agent process
/// exits mid-turn, so the in-flight dispatch can complete cleanly.
pub fn synthetic_result(is_error: bool, text: &str) -> Value {
    json!({ "type": "result", "is_error": is_error, "text": text })
}

/// Build the internal `_stderr` frame mirrored to the client.
pub fn stderr_frame(text: &str) -> Value {
    json!({ "type": "_stderr", "text": text })
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
