// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn captures_and_echoes_opaque_token() {
    let id = SessionIdentifier::new("sess_abc123");
    assert_eq!(id.as_str(), "sess_abc123");
    assert_eq!(id.to_string(), "sess_abc123");
}

#[test]
fn serde_roundtrip() {
    let id = SessionIdentifier::new("sess_abc123");
    let json = serde_json::to_string(&id).unwrap();
    let back: SessionIdentifier = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
