// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles for the process-spawn boundary. Mirrors the teacher's
//! `Fake*Adapter` pattern (`crates/adapters/src/agent/mod.rs`): a fake that
//! implements the same trait as production but never forks a real process.

use async_trait::async_trait;
use relay_core::SessionHostConfig;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use crate::error::ChannelManagerError;
use crate::host_launcher::HostLauncher;

/// Simulates a session host: binds the requested socket and answers every
/// line it receives with a canned `result` frame after an optional delay.
/// Accepts one connection at a time, replacing the previous one on a new
/// accept — same single-client model the real host uses.
pub struct FakeHostLauncher {
    pub reply_text: String,
    pub session_id: Option<String>,
    pub delay: Duration,
    /// When set, `spawn` succeeds but never actually listens, simulating a
    /// host binary that is unreachable (to exercise the spawn-deadline path).
    pub unreachable: bool,
}

impl FakeHostLauncher {
    pub fn new(reply_text: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
            session_id: Some("sess-fake".to_string()),
            delay: Duration::ZERO,
            unreachable: false,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reply_text: String::new(),
            session_id: None,
            delay: Duration::ZERO,
            unreachable: true,
        }
    }
}

#[async_trait]
impl HostLauncher for FakeHostLauncher {
    async fn spawn(&self, config: &SessionHostConfig) -> Result<(), ChannelManagerError> {
        if self.unreachable {
            return Ok(());
        }
        if let Some(parent) = config.socket_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::remove_file(&config.socket_path);
        let listener = UnixListener::bind(&config.socket_path)
            .map_err(|e| ChannelManagerError::HostUnreachable(e.to_string()))?;

        let reply_text = self.reply_text.clone();
        let session_id = self.session_id.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let reply_text = reply_text.clone();
                let session_id = session_id.clone();
                tokio::spawn(async move {
                    serve_one(stream, reply_text, session_id, delay).await;
                });
            }
        });
        Ok(())
    }
}

async fn serve_one(
    stream: tokio::net::UnixStream,
    reply_text: String,
    session_id: Option<String>,
    delay: Duration,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    while let Ok(Some(_line)) = lines.next_line().await {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let frame = serde_json::json!({
            "type": "result",
            "text": reply_text,
            "is_error": false,
            "session_id": session_id,
        });
        let mut out = frame.to_string();
        out.push('\n');
        if write_half.write_all(out.as_bytes()).await.is_err() {
            break;
        }
    }
}
