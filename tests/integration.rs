// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for lms2md parsing, sanitizing, and rendering.

use lms2md::{parser, render, sanitize};
use serde_json::json;
use std::fs;

const SAMPLE_EXPORT: &str = r#"{
    "name": "Test Chat",
    "createdAt": 1700000000000,
    "tokenCount": 42,
    "systemPrompt": "you are helpful",
    "pinned": false,
    "lastUsedModel": {
        "indexedModelIdentifier": "qwen/qwen3-8b",
        "identifier": "qwen3-8b",
        "instanceLoadTimeConfig": { "fields": [] }
    },
    "messages": [
        {
            "currentlySelected": 0,
            "versions": [{
                "role": "user",
                "type": "singleStep",
                "content": [{ "type": "text", "text": "Say hello" }]
            }]
        },
        {
            "currentlySelected": 1,
            "versions": [
                {
                    "role": "assistant",
                    "type": "singleStep",
                    "content": [{ "type": "text", "text": "discarded draft" }]
                },
                {
                    "role": "assistant",
                    "type": "multiStep",
                    "steps": [
                        {
                            "genInfo": { "stopReason": "eosFound" },
                            "content": [{ "type": "text", "text": "<think>plan</think>Hello" }]
                        },
                        { "content": [{ "type": "text", "text": "How can I help?" }] }
                    ]
                }
            ]
        },
        { "versions": [] }
    ]
}"#;

/// Sanitizes the sample export and checks the whole reduced document.
#[test]
fn sanitizes_sample_export() {
    let conversation = parser::parse_conversation(SAMPLE_EXPORT).unwrap();
    let reduced = sanitize::sanitize(&conversation);

    assert_eq!(
        serde_json::to_value(&reduced).unwrap(),
        json!({
            "name": "Test Chat",
            "createdAt": 1_700_000_000_000_i64,
            "tokenCount": 42,
            "messages": [
                { "role": "user", "text": "Say hello" },
                { "role": "assistant", "text": "<think>plan</think>Hello\nHow can I help?" }
            ],
            "lastUsedModel": {
                "indexedModelIdentifier": "qwen/qwen3-8b",
                "identifier": "qwen3-8b"
            }
        })
    );
}

/// Renders the sample export and checks the structure of the Markdown.
#[test]
fn renders_sample_export() {
    let conversations = parser::parse_conversations(SAMPLE_EXPORT).unwrap();
    assert_eq!(conversations.len(), 1);

    let markdown = render::render_conversation(&conversations[0], Some(42));

    assert!(markdown.starts_with("---\ntitle: \"Test Chat\"\n"));
    assert!(markdown.contains("Model: qwen/qwen3-8b\n"));
    assert!(markdown.contains("id: 42\n"));
    assert!(markdown.contains("tokens: 42\n"));
    assert!(markdown.contains("**User:**\nSay hello\n"));
    // The second version is selected, its think span folded away.
    assert!(markdown.contains("**Assistant:**\nHello\nHow can I help?\n"));
    assert!(!markdown.contains("discarded draft"));
    assert!(markdown.contains("<details><summary>thinking</summary>\n\n```\nplan\n```\n</details>\n"));
    // The versionless message contributes nothing.
    assert_eq!(markdown.matches("**").count(), 4);
}

/// Sanitized output written to disk reads back to the same document.
#[test]
fn sanitized_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat.sanitized.json");

    let conversation = parser::parse_conversation(SAMPLE_EXPORT).unwrap();
    let reduced = sanitize::sanitize(&conversation);
    fs::write(&path, serde_json::to_string_pretty(&reduced).unwrap()).unwrap();

    let reread = fs::read_to_string(&path).unwrap();
    let again = sanitize::sanitize(&parser::parse_conversation(&reread).unwrap());

    assert_eq!(reduced, again);
}

/// A sanitized document still renders: the flattened messages come back as
/// synthetic versions.
#[test]
fn renders_sanitized_document() {
    let conversation = parser::parse_conversation(SAMPLE_EXPORT).unwrap();
    let reduced = serde_json::to_string(&sanitize::sanitize(&conversation)).unwrap();

    let conversations = parser::parse_conversations(&reduced).unwrap();
    let markdown = render::render_conversation(&conversations[0], None);

    assert!(markdown.contains("**User:**\nSay hello\n"));
    assert!(markdown.contains("**Assistant:**\nHello\nHow can I help?\n"));
}

/// An array root converts to one conversation per element.
#[test]
fn converts_array_of_conversations() {
    let json = format!("[{SAMPLE_EXPORT}, {SAMPLE_EXPORT}]");
    let conversations = parser::parse_conversations(&json).unwrap();

    assert_eq!(conversations.len(), 2);
    for conversation in &conversations {
        let markdown = render::render_conversation(conversation, None);
        assert!(markdown.contains("**User:**\nSay hello\n"));
    }
}

/// Root shapes that are not conversations fail loudly, naming the shape.
#[test]
fn unexpected_root_shape_is_an_error() {
    let err = parser::parse_conversations("\"just a string\"").unwrap_err();
    assert!(err.to_string().contains("a string"), "got: {err}");

    let err = parser::parse_conversation("[1, 2]").unwrap_err();
    assert!(err.to_string().contains("an array"), "got: {err}");
}
