// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message content: either a plain string or an ordered sequence of typed
//! content blocks. Only the plain-string form is eligible for coalescing —
//! see `relay-channel-manager`'s drain-queue logic.

use serde::{Deserialize, Serialize};

/// Body of a single inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text. The only form the dispatch engine will fold into a
    /// combined turn when messages back up behind a busy channel.
    Text(String),
    /// Ordered content blocks (text interleaved with images). Never
    /// coalesced — a batch containing any block content is dispatched
    /// message-by-message.
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// `true` for the plain-text variant, which is the only form eligible
    /// for coalescing.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, MessageContent::Text(_))
    }

    /// Borrow the plain-text payload, if this is the text variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s),
            MessageContent::Blocks(_) => None,
        }
    }

    /// Consume into the plain-text payload, if this is the text variant.
    pub fn into_text(self) -> Option<String> {
        match self {
            MessageContent::Text(s) => Some(s),
            MessageContent::Blocks(_) => None,
        }
    }

    /// Prepend a text header line to this content.
    ///
    /// For plain text, prepends to the string directly. For block content,
    /// inserts an equivalent text block at the start so the header survives
    /// alongside images.
    pub fn with_header(self, header: &str) -> Self {
        if header.is_empty() {
            return self;
        }
        match self {
            MessageContent::Text(text) => MessageContent::Text(format!("{header}{text}")),
            MessageContent::Blocks(mut blocks) => {
                blocks.insert(0, ContentBlock::text(header.trim_end_matches('\n')));
                MessageContent::Blocks(blocks)
            }
        }
    }
}

/// A single typed content block.
///
/// Serializes to the session-host wire schema verbatim:
/// `{"type": "text", "text": "..."}` or
/// `{"type": "image", "source": {"type": "base64", "media_type": "...", "data": "..."}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

/// Nested `source` object of an image content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image(media_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        ContentBlock::Image {
            source: ImageSource {
                kind: "base64".to_string(),
                media_type: media_type.into(),
                data: base64_data.into(),
            },
        }
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
