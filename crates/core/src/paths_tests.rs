// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

#[test]
fn socket_path_follows_naming_convention() {
    let dir = PathBuf::from("/tmp/relay");
    let channel = ChannelKey::new("tg-42").unwrap();
    assert_eq!(
        socket_path(&dir, "relay", &channel),
        PathBuf::from("/tmp/relay/relay-tg-42.sock")
    );
}

#[test]
fn pid_path_follows_naming_convention() {
    let dir = PathBuf::from("/tmp/relay");
    let channel = ChannelKey::new("http").unwrap();
    assert_eq!(
        pid_path(&dir, "relay", &channel),
        PathBuf::from("/tmp/relay/relay-http.pid")
    );
}
