// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_context_renders_empty_header() {
    assert_eq!(ChannelContext::default().render_header(), "");
}

#[test]
fn full_context_renders_all_fields_in_order() {
    let ctx = ChannelContext {
        channel: Some("tg-42".to_string()),
        adapter: Some("telegram".to_string()),
        user_name: Some("alice".to_string()),
        chat_title: Some("Team Chat".to_string()),
        topic_name: Some("bugs".to_string()),
    };
    assert_eq!(
        ctx.render_header(),
        "[channel: tg-42, adapter: telegram, user: alice, chat: Team Chat, topic: bugs]\n"
    );
}

#[test]
fn partial_context_omits_missing_fields_without_dangling_separators() {
    let ctx = ChannelContext {
        channel: Some("http".to_string()),
        adapter: None,
        user_name: Some("bob".to_string()),
        chat_title: None,
        topic_name: None,
    };
    assert_eq!(ctx.render_header(), "[channel: http, user: bob]\n");
}
