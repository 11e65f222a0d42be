// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn text_content_serializes_as_bare_string() {
    let content = MessageContent::Text("hello".to_string());
    assert_eq!(serde_json::to_string(&content).unwrap(), "\"hello\"");
}

#[test]
fn blocks_content_round_trips() {
    let content = MessageContent::Blocks(vec![
        ContentBlock::text("look at this"),
        ContentBlock::image("image/png", "QUJD"),
    ]);
    let json = serde_json::to_value(&content).unwrap();
    assert_eq!(json[0]["type"], "text");
    assert_eq!(json[0]["text"], "look at this");
    assert_eq!(json[1]["type"], "image");
    assert_eq!(json[1]["source"]["type"], "base64");
    assert_eq!(json[1]["source"]["media_type"], "image/png");
    assert_eq!(json[1]["source"]["data"], "QUJD");

    let back: MessageContent = serde_json::from_value(json).unwrap();
    assert_eq!(back, content);
}

#[test]
fn is_plain_text_distinguishes_variants() {
    assert!(MessageContent::Text("x".into()).is_plain_text());
    assert!(!MessageContent::Blocks(vec![ContentBlock::text("x")]).is_plain_text());
}

#[test]
fn with_header_prepends_to_text() {
    let content = MessageContent::Text("hi".to_string());
    let headered = content.with_header("[channel: c]\n");
    assert_eq!(headered.as_text(), Some("[channel: c]\nhi"));
}

#[test]
fn with_header_inserts_leading_block() {
    let content = MessageContent::Blocks(vec![ContentBlock::image("image/png", "QUJD")]);
    let headered = content.with_header("[channel: c]\n");
    match headered {
        MessageContent::Blocks(blocks) => {
            assert_eq!(blocks.len(), 2);
            assert_eq!(blocks[0], ContentBlock::text("[channel: c]"));
        }
        MessageContent::Text(_) => panic!("expected blocks"),
    }
}

#[test]
fn empty_header_is_noop() {
    let content = MessageContent::Text("hi".to_string());
    assert_eq!(content.clone().with_header(""), content);
}
