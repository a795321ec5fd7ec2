// SPDX-License-Identifier: GPL-3.0-only

//! Markdown rendering with YAML frontmatter for conversations.
//!
//! The rendered document starts with a `---`-delimited frontmatter block
//! (title, model, dates, token count, tags) followed by one `**Role:**`
//! section per message with visible text. Reasoning collected from
//! `<think>…</think>` spans and auxiliary reasoning fields is folded into a
//! collapsible `<details>` block under the reply it belongs to.
//!
//! Both frontmatter dates use a fixed reference timezone so documents
//! rendered on different machines agree.
//!
//! # Example
//!
//! ```
//! use lms2md::{parser, render};
//!
//! let json = r#"{
//!     "name": "Test Chat",
//!     "messages": [{
//!         "versions": [{
//!             "role": "user",
//!             "type": "singleStep",
//!             "content": [{ "type": "text", "text": "Hello" }]
//!         }]
//!     }]
//! }"#;
//!
//! let conversation = parser::parse_conversation(json).unwrap();
//! let markdown = render::render_conversation(&conversation, Some(7));
//!
//! assert!(markdown.starts_with("---\ntitle: \"Test Chat\"\n"));
//! assert!(markdown.contains("**User:**\nHello"));
//! ```

use crate::extract::extract_texts;
use crate::parser::Conversation;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use std::fmt::Write;

/// Timezone used for the `published` and `created` frontmatter dates.
const REFERENCE_TZ: Tz = chrono_tz::America::Denver;

/// Author label emitted in the frontmatter.
const AUTHOR: &str = "LM Studio Chat to Markdown Converter";

/// Renders a conversation as Markdown with YAML frontmatter.
///
/// `conversation_id`, when present, comes from the numeric prefix of the
/// export filename and is surfaced as the `id:` frontmatter field.
#[must_use]
pub fn render_conversation(conversation: &Conversation, conversation_id: Option<u64>) -> String {
    let mut out = String::new();

    let title = conversation.name.as_deref().unwrap_or("Untitled");
    let model_id = conversation.model_id();
    let published = Utc::now().with_timezone(&REFERENCE_TZ).format("%Y-%m-%d");

    writeln!(out, "---").unwrap();
    writeln!(out, "title: \"{title}\"").unwrap();
    if let Some(model) = model_id {
        writeln!(out, "Model: {model}").unwrap();
    }
    writeln!(out, "author: \"{AUTHOR}\"").unwrap();
    writeln!(out, "published: {published}").unwrap();
    writeln!(
        out,
        "created: \"{}\"",
        format_created(conversation.created_at.as_ref())
    )
    .unwrap();
    if let Some(id) = conversation_id {
        writeln!(out, "id: {id}").unwrap();
    }
    writeln!(
        out,
        "tokens: {}",
        format_tokens(conversation.token_count.as_ref())
    )
    .unwrap();
    match model_id {
        Some(model) => writeln!(out, "description: \"Talk with {model}\"").unwrap(),
        None => writeln!(out, "description: \"LM Studio conversation\"").unwrap(),
    }
    writeln!(out, "tags:").unwrap();
    writeln!(out, "  - \"LM-Studio\"").unwrap();
    writeln!(out, "---").unwrap();
    writeln!(out).unwrap();

    for message in &conversation.messages {
        let Some(version) = message.canonical_version() else {
            continue;
        };
        let (visible, thinking) = extract_texts(version);
        // No visible text, no section: reasoning alone is not worth a header.
        if visible.is_empty() {
            continue;
        }

        let role = capitalize(version.role.as_deref().unwrap_or("unknown"));
        writeln!(out, "**{role}:**").unwrap();
        writeln!(out, "{}", visible.join("\n")).unwrap();
        if !thinking.is_empty() {
            writeln!(out).unwrap();
            writeln!(out, "<details><summary>thinking</summary>").unwrap();
            writeln!(out).unwrap();
            writeln!(out, "```").unwrap();
            writeln!(out, "{}", thinking.join("\n")).unwrap();
            writeln!(out, "```").unwrap();
            writeln!(out, "</details>").unwrap();
        }
        writeln!(out).unwrap();
    }

    out
}

/// Transliterates a conversation title into a filesystem-safe filename stem.
///
/// Alphanumerics, spaces, underscores, and hyphens survive; everything else
/// becomes an underscore. Surrounding whitespace is trimmed and remaining
/// spaces become underscores.
#[must_use]
pub fn safe_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Formats a millisecond creation timestamp in the reference timezone.
///
/// Values that are absent or not an integer render as `N/A`.
fn format_created(created_at: Option<&Value>) -> String {
    created_at
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .map_or_else(
            || "N/A".to_owned(),
            |timestamp| {
                timestamp
                    .with_timezone(&REFERENCE_TZ)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            },
        )
}

/// Formats the frontmatter token count.
///
/// Integers and all-digit strings become bare integers; other values are
/// emitted literally; a missing count becomes `N/A`.
fn format_tokens(token_count: Option<&Value>) -> String {
    match token_count {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => match s.parse::<u64>() {
            Ok(n) if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() => n.to_string(),
            _ => s.clone(),
        },
        Some(other) => other.to_string(),
        None => "N/A".to_owned(),
    }
}

/// Capitalizes the first character and lowercases the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
    })
}
