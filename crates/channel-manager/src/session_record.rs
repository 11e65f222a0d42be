// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted channel-to-session-identifier map, so a daemon restart can
//! resume the agent's own conversational context instead of starting fresh.
//!
//! Persistence follows the teacher's `Snapshot::save`/`load` shape: write to
//! a sibling temp file, then rename over the real path so a reader never
//! observes a half-written record.

use parking_lot::Mutex;
use relay_core::{ChannelKey, SessionIdentifier};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct SessionRecordStore {
    path: PathBuf,
    records: Mutex<HashMap<ChannelKey, SessionIdentifier>>,
}

impl SessionRecordStore {
    /// Load the record file if present; a missing or corrupt file just
    /// starts empty rather than failing daemon startup.
    pub fn load(path: PathBuf) -> Self {
        let records = Self::read_from_disk(&path).unwrap_or_default();
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    fn read_from_disk(path: &Path) -> Option<HashMap<ChannelKey, SessionIdentifier>> {
        let bytes = std::fs::read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn get(&self, channel: &ChannelKey) -> Option<SessionIdentifier> {
        self.records.lock().get(channel).cloned()
    }

    /// All channels with a known identifier, used by `shutdown_hosts` to
    /// find PID files for hosts with no currently-connected channel.
    pub fn known_channels(&self) -> Vec<ChannelKey> {
        self.records.lock().keys().cloned().collect()
    }

    /// Record a newly observed session identifier and persist the whole map.
    /// A write failure is logged and otherwise swallowed — losing the resume
    /// point for one restart is recoverable, crashing the dispatch path isn't.
    pub fn set_and_persist(&self, channel: &ChannelKey, id: SessionIdentifier) {
        let snapshot = {
            let mut guard = self.records.lock();
            guard.insert(channel.clone(), id);
            guard.clone()
        };
        if let Err(error) = Self::write_atomic(&self.path, &snapshot) {
            tracing::warn!(path = %self.path.display(), %error, "failed to persist session record");
        }
    }

    fn write_atomic(path: &Path, records: &HashMap<ChannelKey, SessionIdentifier>) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        {
            use std::io::Write;
            let file = std::fs::File::create(&tmp_path)?;
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer(&mut writer, records)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_record_tests.rs"]
mod tests;
