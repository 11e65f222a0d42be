// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn channel(key: &str) -> ChannelKey {
    ChannelKey::new(key).unwrap()
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionRecordStore::load(dir.path().join("records.json"));
    assert_eq!(store.get(&channel("tg-1")), None);
}

#[test]
fn set_and_persist_round_trips_through_a_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let store = SessionRecordStore::load(path.clone());
    store.set_and_persist(&channel("tg-1"), SessionIdentifier::new("sess-a"));

    let reloaded = SessionRecordStore::load(path);
    assert_eq!(reloaded.get(&channel("tg-1")), Some(SessionIdentifier::new("sess-a")));
}

#[test]
fn corrupt_file_loads_empty_rather_than_panicking() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    std::fs::write(&path, b"not json").unwrap();
    let store = SessionRecordStore::load(path);
    assert_eq!(store.get(&channel("tg-1")), None);
}

#[test]
fn known_channels_reflects_every_recorded_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionRecordStore::load(dir.path().join("records.json"));
    store.set_and_persist(&channel("tg-1"), SessionIdentifier::new("sess-a"));
    store.set_and_persist(&channel("http-2"), SessionIdentifier::new("sess-b"));

    let mut known = store.known_channels();
    known.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(known, vec![channel("http-2"), channel("tg-1")]);
}
