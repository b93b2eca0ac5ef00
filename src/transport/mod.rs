//! Outbound chat delivery.
//!
//! The core only knows this trait; `telegram` is the production adapter.
//! Texts are HTML (bold, links), user content is escaped by `messages`.

pub mod telegram;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::UserId;

/// Telegram rejects longer message texts.
pub const MAX_MESSAGE_LEN: usize = 4096;

#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The user blocked the bot or the chat no longer exists.
    #[error("User {0} is unreachable")]
    Unreachable(UserId),

    #[error("Delivery request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Keyboard attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Persistent reply keyboard; each button sends its label as text.
    Reply(Vec<Vec<String>>),
    /// Buttons under the message that send callback data.
    Inline(Vec<Vec<InlineButton>>),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        user_id: UserId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), DeliveryError>;

    async fn send_document(
        &self,
        user_id: UserId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError>;
}

/// Splits `text` into chunks of at most `max_len` characters.
///
/// Prefers paragraph breaks, then line breaks, then any char boundary,
/// and never cuts inside an HTML tag.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        // Byte offset of the first char past the limit.
        let Some((boundary, _)) = remaining.char_indices().nth(max_len) else {
            chunks.push(remaining.to_string());
            break;
        };

        let search_region = &remaining[..boundary];
        let split_at = search_region
            .rfind("\n\n")
            .map(|p| p + 1)
            .or_else(|| search_region.rfind('\n'))
            .filter(|&p| p > 0)
            .unwrap_or(boundary);
        let split_at = outside_html_tag(search_region, split_at);
        let split_at = if split_at == 0 {
            remaining.char_indices().nth(1).map_or(remaining.len(), |(i, _)| i)
        } else {
            split_at
        };

        let (chunk, rest) = remaining.split_at(split_at);
        let chunk = chunk.trim_end();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        remaining = rest.trim_start_matches('\n');
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

/// Moves a split point that falls inside `<...>` to the tag start.
fn outside_html_tag(text: &str, split_at: usize) -> usize {
    match text[..split_at].rfind(|c: char| c == '<' || c == '>') {
        Some(i) if text.as_bytes()[i] == b'<' => i,
        _ => split_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("Привіт", MAX_MESSAGE_LEN), vec!["Привіт"]);
        assert_eq!(split_message("", MAX_MESSAGE_LEN), vec![""]);
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let text = "я".repeat(MAX_MESSAGE_LEN);
        assert_eq!(split_message(&text, MAX_MESSAGE_LEN).len(), 1);
    }

    #[test]
    fn splits_on_line_breaks() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(text, 10), vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn unbroken_text_is_cut_at_limit() {
        let text = "ї".repeat(25);
        let parts = split_message(&text, 10);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= 10));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn never_cuts_inside_a_tag() {
        let text = "abcdefg<b>x</b>";
        let parts = split_message(text, 9);
        assert_eq!(parts[0], "abcdefg");
        assert!(parts[1].starts_with("<b>"));
    }
}
