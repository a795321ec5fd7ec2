// SPDX-License-Identifier: GPL-3.0-only

//! Reduction of conversations to their semantically relevant fields.
//!
//! LM Studio exports carry a lot of client state (plugin configuration,
//! prediction settings, per-version generation stats) that is noise for
//! archival purposes. This module projects a conversation onto a fixed
//! keep-list: the title, creation timestamp, token count, a reduced model
//! descriptor, and the messages flattened to their canonical version's role
//! and raw text. The keep-list is authoritative; anything not on it is
//! absent from the output regardless of what the source contained.
//!
//! Inline `<think>…</think>` markers are preserved verbatim here; splitting
//! reasoning from visible text is the Markdown pipeline's concern.
//!
//! # Example
//!
//! ```
//! use lms2md::{parser, sanitize};
//!
//! let json = r#"{
//!     "name": "Test Chat",
//!     "pinned": true,
//!     "messages": [{
//!         "currentlySelected": 0,
//!         "versions": [{
//!             "role": "user",
//!             "type": "singleStep",
//!             "content": [{ "type": "text", "text": "Hello" }]
//!         }]
//!     }]
//! }"#;
//!
//! let conversation = parser::parse_conversation(json).unwrap();
//! let reduced = sanitize::sanitize(&conversation);
//!
//! assert_eq!(reduced.messages[0].role, "user");
//! assert_eq!(reduced.messages[0].text, "Hello");
//! ```

use crate::extract::extract_segments;
use crate::parser::Conversation;
use serde::Serialize;
use serde_json::Value;

/// Descriptor fields kept when reducing an object-shaped `lastUsedModel`.
const MODEL_DESCRIPTOR_KEYS: [&str; 2] = ["indexedModelIdentifier", "identifier"];

/// A conversation reduced to its keep-list fields.
///
/// Field order here fixes the key order of the serialized document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedConversation {
    /// The conversation title, when the source had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Creation timestamp, passed through verbatim.
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,

    /// Token count, passed through verbatim.
    #[serde(rename = "tokenCount", skip_serializing_if = "Option::is_none")]
    pub token_count: Option<Value>,

    /// Rebuilt messages, one per message with a canonical version.
    pub messages: Vec<SanitizedMessage>,

    /// The last-used-model descriptor, reduced to its identifier fields.
    #[serde(rename = "lastUsedModel", skip_serializing_if = "Option::is_none")]
    pub last_used_model: Option<Value>,
}

/// One rebuilt message: the canonical version's role and raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedMessage {
    /// Role of the canonical version, `"unknown"` when absent.
    pub role: String,

    /// Newline-joined non-empty text segments, think markers included.
    pub text: String,
}

/// Projects a conversation onto the keep-list fields.
///
/// Messages without a canonical version are dropped; every other anomaly
/// degrades silently rather than erroring.
#[must_use]
pub fn sanitize(conversation: &Conversation) -> SanitizedConversation {
    let messages = conversation
        .messages
        .iter()
        .filter_map(|message| message.canonical_version())
        .map(|version| SanitizedMessage {
            role: version
                .role
                .clone()
                .unwrap_or_else(|| "unknown".to_owned()),
            text: joined_text(extract_segments(version)),
        })
        .collect();

    SanitizedConversation {
        name: conversation.name.clone(),
        created_at: conversation.created_at.clone(),
        token_count: conversation.token_count.clone(),
        messages,
        last_used_model: conversation.last_used_model.as_ref().map(reduce_model),
    }
}

/// Joins text segments with newlines, skipping empty segments.
fn joined_text(segments: Vec<String>) -> String {
    segments
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduces an object-shaped model descriptor to its identifier fields.
///
/// Non-object values pass through unchanged.
fn reduce_model(model: &Value) -> Value {
    let Value::Object(fields) = model else {
        return model.clone();
    };

    let reduced: serde_json::Map<String, Value> = MODEL_DESCRIPTOR_KEYS
        .iter()
        .filter_map(|key| fields.get(*key).map(|v| ((*key).to_owned(), v.clone())))
        .collect();

    Value::Object(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_conversation;
    use serde_json::json;

    fn sanitize_json(json_str: &str) -> SanitizedConversation {
        sanitize(&parse_conversation(json_str).unwrap())
    }

    #[test]
    fn keeps_only_keep_list_fields() {
        let reduced = sanitize_json(
            r#"{
                "name": "Test Chat",
                "createdAt": 1700000000000,
                "tokenCount": 42,
                "pinned": true,
                "systemPrompt": "be nice",
                "plugins": ["a"],
                "messages": []
            }"#,
        );

        let text = serde_json::to_string(&reduced).unwrap();
        for key in ["pinned", "systemPrompt", "plugins", "lastUsedModel"] {
            assert!(!text.contains(key), "unexpected key {key}");
        }
        let positions: Vec<usize> = ["\"name\"", "\"createdAt\"", "\"tokenCount\"", "\"messages\""]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(
            positions.windows(2).all(|pair| pair[0] < pair[1]),
            "keys out of order in {text}"
        );
    }

    #[test]
    fn rebuilds_messages_as_role_and_text() {
        let reduced = sanitize_json(
            r#"{
                "messages": [{
                    "currentlySelected": 0,
                    "versions": [{
                        "role": "assistant",
                        "type": "singleStep",
                        "genInfo": { "stopReason": "eosFound" },
                        "content": [{ "type": "text", "text": "<think>plan</think>Hello" }]
                    }]
                }]
            }"#,
        );

        assert_eq!(
            reduced.messages,
            vec![SanitizedMessage {
                role: "assistant".into(),
                text: "<think>plan</think>Hello".into(),
            }]
        );
    }

    #[test]
    fn defaults_role_to_unknown() {
        let reduced = sanitize_json(
            r#"{
                "messages": [{
                    "versions": [{ "type": "singleStep", "content": [{ "type": "text", "text": "hi" }] }]
                }]
            }"#,
        );

        assert_eq!(reduced.messages[0].role, "unknown");
    }

    #[test]
    fn drops_messages_without_versions() {
        let reduced = sanitize_json(
            r#"{
                "messages": [
                    { "versions": [] },
                    { "currentlySelected": 3 },
                    {
                        "versions": [{
                            "role": "user",
                            "type": "singleStep",
                            "content": [{ "type": "text", "text": "kept" }]
                        }]
                    }
                ]
            }"#,
        );

        assert_eq!(reduced.messages.len(), 1);
        assert_eq!(reduced.messages[0].text, "kept");
    }

    #[test]
    fn skips_empty_segments_when_joining() {
        let reduced = sanitize_json(
            r#"{
                "messages": [{
                    "versions": [{
                        "role": "assistant",
                        "type": "multiStep",
                        "steps": [
                            { "content": [{ "type": "text", "text": "x" }] },
                            { "content": [{ "type": "text", "text": "" }] },
                            { "content": [{ "type": "text", "text": "y" }] }
                        ]
                    }]
                }]
            }"#,
        );

        assert_eq!(reduced.messages[0].text, "x\ny");
    }

    #[test]
    fn unknown_version_shape_yields_empty_text() {
        let reduced = sanitize_json(
            r#"{
                "messages": [{
                    "versions": [{ "role": "assistant", "type": "debug" }]
                }]
            }"#,
        );

        assert_eq!(reduced.messages[0].text, "");
    }

    #[test]
    fn reduces_model_descriptor_to_identifier_fields() {
        let reduced = sanitize_json(
            r#"{
                "lastUsedModel": {
                    "indexedModelIdentifier": "qwen/qwen3-8b",
                    "identifier": "qwen3-8b",
                    "instanceLoadTimeConfig": { "fields": [] }
                },
                "messages": []
            }"#,
        );

        assert_eq!(
            reduced.last_used_model,
            Some(json!({
                "indexedModelIdentifier": "qwen/qwen3-8b",
                "identifier": "qwen3-8b"
            }))
        );
    }

    #[test]
    fn passes_non_object_model_descriptor_through() {
        let reduced = sanitize_json(r#"{"lastUsedModel": "legacy-id", "messages": []}"#);

        assert_eq!(reduced.last_used_model, Some(json!("legacy-id")));
    }

    #[test]
    fn omits_fields_absent_from_source() {
        let reduced = sanitize_json(r#"{"messages": []}"#);

        assert_eq!(
            serde_json::to_string(&reduced).unwrap(),
            r#"{"messages":[]}"#
        );
    }

    #[test]
    fn passes_token_count_strings_through() {
        let reduced = sanitize_json(r#"{"tokenCount": "1234", "messages": []}"#);

        assert_eq!(reduced.token_count, Some(json!("1234")));
    }

    #[test]
    fn sanitizing_twice_is_a_fixed_point() {
        let reduced = sanitize_json(
            r#"{
                "name": "Test Chat",
                "createdAt": 1700000000000,
                "tokenCount": 42,
                "lastUsedModel": { "indexedModelIdentifier": "qwen/qwen3-8b", "identifier": "q" },
                "messages": [{
                    "currentlySelected": 0,
                    "versions": [{
                        "role": "assistant",
                        "type": "singleStep",
                        "content": [{ "type": "text", "text": "<think>plan</think>Hello" }]
                    }]
                }]
            }"#,
        );

        let once = serde_json::to_string_pretty(&reduced).unwrap();
        let again = sanitize(&parse_conversation(&once).unwrap());

        assert_eq!(reduced, again);
    }

    #[test]
    fn matches_reference_sanitized_document() {
        let reduced = sanitize_json(
            r#"{
                "name": "Test Chat",
                "createdAt": 1700000000000,
                "tokenCount": 42,
                "messages": [{
                    "currentlySelected": 0,
                    "versions": [{
                        "role": "assistant",
                        "type": "singleStep",
                        "content": [{ "type": "text", "text": "<think>plan</think>Hello" }]
                    }]
                }]
            }"#,
        );

        assert_eq!(
            serde_json::to_value(&reduced).unwrap(),
            json!({
                "name": "Test Chat",
                "createdAt": 1_700_000_000_000_i64,
                "tokenCount": 42,
                "messages": [{ "role": "assistant", "text": "<think>plan</think>Hello" }]
            })
        );
    }
}
