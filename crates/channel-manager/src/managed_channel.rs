// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-channel dispatch state machine: one [`ManagedChannel`] per live
//! session-host connection, serializing turns, coalescing backlog, and
//! peeking `result` frames to resolve the caller waiting on them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use relay_core::{ChannelKey, MessageContent, ResultPeek, SendResult, SessionIdentifier};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{oneshot, Mutex as AsyncMutex, Notify};

use crate::error::ChannelManagerError;
use crate::session_record::SessionRecordStore;
use crate::OnEvent;

type Resolver = oneshot::Sender<Result<SendResult, ChannelManagerError>>;

struct Dispatch {
    resolver: Resolver,
    on_event: Option<OnEvent>,
    start: Instant,
}

struct QueuedMessage {
    content: MessageContent,
    on_event: Option<OnEvent>,
    resolver: Resolver,
}

enum ChannelState {
    Idle,
    Busy(Dispatch),
}

struct Inner {
    state: ChannelState,
    queue: VecDeque<QueuedMessage>,
}

/// One live connection to a session host, plus everything needed to
/// serialize turns against it.
pub struct ManagedChannel {
    channel: ChannelKey,
    writer: AsyncMutex<OwnedWriteHalf>,
    inner: Mutex<Inner>,
    channels: Arc<Mutex<HashMap<ChannelKey, Arc<ManagedChannel>>>>,
    session_records: Arc<SessionRecordStore>,
    shutdown: Notify,
}

impl ManagedChannel {
    pub(crate) fn attach(
        channel: ChannelKey,
        read_half: OwnedReadHalf,
        write_half: OwnedWriteHalf,
        channels: Arc<Mutex<HashMap<ChannelKey, Arc<ManagedChannel>>>>,
        session_records: Arc<SessionRecordStore>,
    ) -> Arc<Self> {
        let managed = Arc::new(Self {
            channel,
            writer: AsyncMutex::new(write_half),
            inner: Mutex::new(Inner {
                state: ChannelState::Idle,
                queue: VecDeque::new(),
            }),
            channels,
            session_records,
            shutdown: Notify::new(),
        });
        let reader = Arc::clone(&managed);
        tokio::spawn(async move { reader.run_reader(read_half).await });
        managed
    }

    /// Dispatch immediately if idle, otherwise enqueue behind the in-flight
    /// turn. Resolves once the agent's reply for this caller's content is
    /// known (either from its own turn, or — if folded into a later
    /// caller's batch — as [`SendResult::coalesced_away`]).
    pub async fn send(
        self: &Arc<Self>,
        content: MessageContent,
        on_event: Option<OnEvent>,
    ) -> Result<SendResult, ChannelManagerError> {
        let (tx, rx) = oneshot::channel();
        let to_write = {
            let mut guard = self.inner.lock();
            if matches!(guard.state, ChannelState::Idle) {
                guard.state = ChannelState::Busy(Dispatch {
                    resolver: tx,
                    on_event,
                    start: Instant::now(),
                });
                Some(content.clone())
            } else {
                guard.queue.push_back(QueuedMessage {
                    content: content.clone(),
                    on_event,
                    resolver: tx,
                });
                None
            }
        };
        if let Some(content) = to_write {
            self.write_frame(content).await;
        }
        rx.await.unwrap_or(Err(ChannelManagerError::ChannelDisconnected))
    }

    /// Close this connection without signalling the host — used on hot
    /// reload, where the host is meant to survive and be reconnected to.
    pub(crate) fn disconnect_for_reload(&self) {
        let (dispatch, queued) = {
            let mut guard = self.inner.lock();
            let dispatch = std::mem::replace(&mut guard.state, ChannelState::Idle);
            (dispatch, guard.queue.drain(..).collect::<Vec<_>>())
        };
        Self::fail_all(dispatch, queued, ChannelManagerError::ChannelDisconnected);
        self.shutdown.notify_waiters();
    }

    fn fail_all(dispatch: ChannelState, queued: Vec<QueuedMessage>, error: ChannelManagerError) {
        if let ChannelState::Busy(d) = dispatch {
            let _ = d.resolver.send(Err(error.clone()));
        }
        for msg in queued {
            let _ = msg.resolver.send(Err(error.clone()));
        }
    }

    async fn write_frame(self: &Arc<Self>, content: MessageContent) {
        let frame = relay_core::ClientFrame::user(content);
        let line = match serde_json::to_string(&frame) {
            Ok(mut s) => {
                s.push('\n');
                s
            }
            Err(error) => {
                tracing::warn!(channel = %self.channel, %error, "failed to encode client frame");
                self.teardown(ChannelManagerError::ChannelDisconnected).await;
                return;
            }
        };
        let write_result = {
            let mut writer = self.writer.lock().await;
            writer.write_all(line.as_bytes()).await
        };
        if let Err(error) = write_result {
            tracing::warn!(channel = %self.channel, %error, "write to session host failed");
            self.teardown(ChannelManagerError::ChannelDisconnected).await;
        }
    }

    /// Tear the connection down after an unrecoverable I/O failure: fail the
    /// in-flight dispatch and everything queued behind it, then deregister
    /// so the next `send` reconnects or respawns transparently.
    async fn teardown(self: &Arc<Self>, error: ChannelManagerError) {
        let (dispatch, queued) = {
            let mut guard = self.inner.lock();
            let dispatch = std::mem::replace(&mut guard.state, ChannelState::Idle);
            (dispatch, guard.queue.drain(..).collect::<Vec<_>>())
        };
        Self::fail_all(dispatch, queued, error);
        self.channels.lock().remove(&self.channel);
    }

    async fn run_reader(self: Arc<Self>, read_half: OwnedReadHalf) {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    tracing::info!(channel = %self.channel, "closing session host connection for reload");
                    break;
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if !line.trim().is_empty() {
                                self.handle_line(&line).await;
                            }
                        }
                        Ok(None) => {
                            tracing::info!(channel = %self.channel, "session host closed the connection");
                            self.teardown(ChannelManagerError::ChannelDisconnected).await;
                            break;
                        }
                        Err(error) => {
                            tracing::warn!(channel = %self.channel, %error, "error reading from session host");
                            self.teardown(ChannelManagerError::ChannelDisconnected).await;
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_line(self: &Arc<Self>, line: &str) {
        if let Some(peek) = ResultPeek::parse(line) {
            if let Some(session_id) = &peek.session_id {
                self.session_records
                    .set_and_persist(&self.channel, SessionIdentifier::new(session_id.clone()));
            }
            self.complete_dispatch_and_advance(peek).await;
            return;
        }

        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => self.dispatch_event(value),
            Err(_) => {
                tracing::debug!(channel = %self.channel, %line, "unparsable line from session host, discarding");
            }
        }
    }

    /// Resolve the in-flight dispatch with `peek`'s result and, in the same
    /// lock acquisition, hand any queued backlog to a new dispatch. The
    /// state never goes observably `Idle` while the queue is non-empty —
    /// otherwise a concurrent `send` could see `Idle` and write its message
    /// ahead of one already queued, breaking FIFO delivery order (spec.md
    /// §4.1/§5, P2).
    async fn complete_dispatch_and_advance(self: &Arc<Self>, peek: ResultPeek) {
        let next = {
            let mut guard = self.inner.lock();
            match std::mem::replace(&mut guard.state, ChannelState::Idle) {
                ChannelState::Busy(dispatch) => {
                    let result = SendResult {
                        text: peek.text,
                        duration_ms: dispatch.start.elapsed().as_millis() as u64,
                        is_error: peek.is_error,
                        coalesced: false,
                    };
                    let _ = dispatch.resolver.send(Ok(result));
                }
                ChannelState::Idle => {
                    tracing::warn!(channel = %self.channel, "result frame with no in-flight dispatch");
                }
            }
            Self::next_dispatch_locked(&mut guard)
        };
        if let Some(content) = next {
            self.write_frame(content).await;
        }
    }

    fn dispatch_event(&self, value: serde_json::Value) {
        let is_stderr = value.get("type").and_then(|t| t.as_str()) == Some("_stderr");
        if is_stderr {
            if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
                tracing::debug!(channel = %self.channel, stderr = %text, "session host stderr");
            }
            return;
        }
        let on_event = {
            let guard = self.inner.lock();
            match &guard.state {
                ChannelState::Busy(dispatch) => dispatch.on_event.clone(),
                ChannelState::Idle => None,
            }
        };
        if let Some(callback) = on_event {
            let channel = self.channel.clone();
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(value))).is_err() {
                tracing::warn!(%channel, "onEvent handler panicked, dispatch continues");
            }
        }
    }

    /// Pop the next batch off the queue (if any) and install it as the new
    /// `Busy` dispatch before the lock is released, applying the coalescing
    /// rules: a single queued message dispatches as-is; an all-text backlog
    /// is joined into one combined turn (every caller but the last resolves
    /// immediately as coalesced-away); any block content in the backlog
    /// dispatches the first message alone and requeues the rest in order.
    /// Must be called with `guard.state` already `Idle`. Returns the content
    /// to write for the newly-installed dispatch, if one was started.
    fn next_dispatch_locked(guard: &mut Inner) -> Option<MessageContent> {
        if guard.queue.is_empty() {
            return None;
        }
        let batch: Vec<QueuedMessage> = guard.queue.drain(..).collect();

        let msg = if batch.len() == 1 {
            batch.into_iter().next()
        } else if batch.iter().all(|m| m.content.is_plain_text()) {
            Self::coalesce_batch(batch)
        } else {
            Some(Self::requeue_all_but_first(guard, batch))
        }?;

        let content = msg.content.clone();
        guard.state = ChannelState::Busy(Dispatch {
            resolver: msg.resolver,
            on_event: msg.on_event,
            start: Instant::now(),
        });
        Some(content)
    }

    fn coalesce_batch(mut batch: Vec<QueuedMessage>) -> Option<QueuedMessage> {
        let last = batch.pop()?;
        let mut joined = String::new();
        for msg in batch {
            if !joined.is_empty() {
                joined.push_str("\n\n");
            }
            joined.push_str(msg.content.as_text().unwrap_or_default());
            let _ = msg.resolver.send(Ok(SendResult::coalesced_away()));
        }
        if !joined.is_empty() {
            joined.push_str("\n\n");
        }
        joined.push_str(last.content.as_text().unwrap_or_default());
        Some(QueuedMessage {
            content: MessageContent::Text(joined),
            on_event: last.on_event,
            resolver: last.resolver,
        })
    }

    fn requeue_all_but_first(guard: &mut Inner, mut batch: Vec<QueuedMessage>) -> QueuedMessage {
        let first = batch.remove(0);
        for msg in batch.into_iter().rev() {
            guard.queue.push_front(msg);
        }
        first
    }
}

#[cfg(test)]
#[path = "managed_channel_tests.rs"]
mod tests;
