// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::content::ContentBlock;

#[test]
fn user_frame_serializes_with_tag() {
    let frame = ClientFrame::user(MessageContent::Text("hello".to_string()));
    let json = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["type"], "user");
    assert_eq!(json["message"]["role"], "user");
    assert_eq!(json["message"]["content"], "hello");
}

#[test]
fn user_frame_with_blocks_round_trips() {
    let frame = ClientFrame::user(MessageContent::Blocks(vec![ContentBlock::text("hi")]));
    let json = serde_json::to_string(&frame).unwrap();
    let back: ClientFrame = serde_json::from_str(&json).unwrap();
    assert_eq!(back, frame);
}

#[test]
fn interrupt_frame_round_trips() {
    let json = serde_json::to_string(&ClientFrame::Interrupt).unwrap();
    assert_eq!(json, "{\"type\":\"interrupt\"}");
    let back: ClientFrame = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ClientFrame::Interrupt);
}

#[test]
fn result_peek_extracts_session_id() {
    let line = r#"{"type":"result","session_id":"sess-1","is_error":false,"text":"Hello!"}"#;
    let peek = ResultPeek::parse(line).unwrap();
    assert_eq!(peek.session_id.as_deref(), Some("sess-1"));
    assert!(!peek.is_error);
    assert_eq!(peek.text, "Hello!");
}

#[test]
fn result_peek_ignores_non_result_lines() {
    let line = r#"{"type":"assistant","text":"thinking..."}"#;
    assert!(ResultPeek::parse(line).is_none());
}

#[test]
fn result_peek_ignores_unparsable_lines() {
    assert!(ResultPeek::parse("not json").is_none());
}

#[test]
fn result_peek_tolerates_missing_optional_fields() {
    let peek = ResultPeek::parse(r#"{"type":"result"}"#).unwrap();
    assert_eq!(peek.session_id, None);
    assert!(!peek.is_error);
    assert_eq!(peek.text, "");
}

#[test]
fn synthetic_result_has_expected_shape() {
    let v = synthetic_result(true, "[Session ended (exit code 1).]");
    assert_eq!(v["type"], "result");
    assert_eq!(v["is_error"], true);
    assert_eq!(v["text"], "[Session ended (exit code 1).]");
}

#[test]
fn stderr_frame_has_expected_shape() {
    let v = stderr_frame("boom");
    assert_eq!(v["type"], "_stderr");
    assert_eq!(v["text"], "boom");
}
