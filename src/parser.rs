// SPDX-License-Identifier: GPL-3.0-only

//! JSON parsing for LM Studio conversation exports.
//!
//! This module handles deserialization of the JSON documents LM Studio
//! writes for each chat. A document is either one conversation object or an
//! array of them; every message holds a list of candidate "versions"
//! (edits and regenerations) plus an index naming the selected one.
//!
//! Parsing is strict about the document root and lenient about everything
//! below it: an unrecognized root shape is an error, while malformed
//! messages, bad selection indices, and unknown version or block types all
//! degrade to empty contributions. Downstream consumers depend on that
//! best-effort behavior, so keep it.
//!
//! # Example
//!
//! ```
//! use lms2md::parser::parse_conversations;
//!
//! let json = r#"{
//!     "name": "Test Chat",
//!     "createdAt": 1700000000000,
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
//! let conversations = parse_conversations(json).unwrap();
//! assert_eq!(conversations.len(), 1);
//! assert_eq!(conversations[0].messages.len(), 1);
//! ```

use serde::Deserialize;
use snafu::prelude::*;

/// Error type for conversation parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// Failed to parse JSON content.
    #[snafu(display("failed to parse JSON: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },

    /// The root value is neither a conversation nor a list of conversations.
    #[snafu(display("not a conversation or list of conversations: found {found}"))]
    Format {
        /// A short description of the offending JSON shape.
        found: String,
    },
}

/// A single conversation from an LM Studio export.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    /// The conversation title.
    pub name: Option<String>,

    /// Creation time, a Unix timestamp in milliseconds in current exports.
    ///
    /// Kept as raw JSON so the sanitized output can pass it through
    /// verbatim even when an old export stored something else here.
    pub created_at: Option<serde_json::Value>,

    /// Token count; an integer in current exports, a string in older ones.
    pub token_count: Option<serde_json::Value>,

    /// The `lastUsedModel` descriptor, kept raw.
    pub last_used_model: Option<serde_json::Value>,

    /// The messages, in conversation order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Resolves the model identifier for this conversation.
    ///
    /// Prefers the root-level `lastUsedModel` descriptor (its
    /// `indexedModelIdentifier`, then `identifier`). When that is absent,
    /// scans each version's and then each step's generation metadata in
    /// conversation order and returns the first `indexedModelIdentifier`
    /// found.
    #[must_use]
    pub fn model_id(&self) -> Option<&str> {
        let from_root = self.last_used_model.as_ref().and_then(|model| {
            get_str(model, &["indexedModelIdentifier"]).or_else(|| get_str(model, &["identifier"]))
        });
        if from_root.is_some() {
            return from_root;
        }

        for message in &self.messages {
            for version in &message.versions {
                if let Some(model) = version.gen_info_model.as_deref() {
                    return Some(model);
                }
                if let VersionBody::MultiStep(steps) = &version.body {
                    for step in steps {
                        if let Some(model) = step.gen_info_model.as_deref() {
                            return Some(model);
                        }
                    }
                }
            }
        }

        None
    }
}

/// A message slot holding one or more candidate versions.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Index of the selected version, when present and integral.
    pub currently_selected: Option<u64>,

    /// Candidate versions, in authoring order.
    pub versions: Vec<Version>,
}

impl Message {
    /// Returns the version that should represent this message.
    ///
    /// A valid in-range `currentlySelected` index wins; a missing,
    /// out-of-range, or non-integer index falls back to the first version.
    /// Messages without versions have no canonical version and are dropped
    /// from derived output.
    #[must_use]
    pub fn canonical_version(&self) -> Option<&Version> {
        self.currently_selected
            .and_then(|selected| usize::try_from(selected).ok())
            .filter(|selected| *selected < self.versions.len())
            .map_or_else(|| self.versions.first(), |index| self.versions.get(index))
    }
}

/// One candidate rendering of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    /// The speaker role (e.g. "user", "assistant").
    pub role: Option<String>,

    /// The content payload, keyed by the version's `type` discriminant.
    pub body: VersionBody,

    /// Auxiliary reasoning carried outside the content blocks.
    pub reasoning_content: Option<String>,

    /// `genInfo.indexedModelIdentifier`, when the version carries one.
    pub gen_info_model: Option<String>,
}

/// The two recognized content shapes of a version.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionBody {
    /// A flat sequence of content blocks.
    SingleStep(Vec<ContentBlock>),

    /// A sequence of steps, each with its own content blocks.
    MultiStep(Vec<Step>),

    /// An unrecognized shape; contributes no text, silently.
    Other,
}

/// One step of a multi-step version.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// The step's content blocks, in order.
    pub content: Vec<ContentBlock>,

    /// Auxiliary reasoning carried on the step itself.
    pub reasoning_content: Option<String>,

    /// `genInfo.indexedModelIdentifier`, when the step carries one.
    pub gen_info_model: Option<String>,
}

/// A typed unit of version content.
///
/// Only text blocks contribute to extracted output; images, tool calls, and
/// anything unrecognized are silently omitted.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// A text block. Missing `text` fields read as the empty string.
    Text(String),

    /// A non-text block.
    Other,
}

impl<'de> Deserialize<'de> for Conversation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        if !value.is_object() {
            return Err(serde::de::Error::custom("expected a conversation object"));
        }

        let messages = value
            .get("messages")
            .and_then(|m| serde_json::from_value(m.clone()).ok())
            .unwrap_or_default();

        Ok(Self {
            name: get_string(&value, &["name"]),
            created_at: value.get("createdAt").cloned(),
            token_count: value.get("tokenCount").cloned(),
            last_used_model: value.get("lastUsedModel").cloned(),
            messages,
        })
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        let versions: Vec<Version> = value
            .get("versions")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        // Sanitized documents carry flattened {role, text} messages instead
        // of version arrays. Read those back as one synthetic single-step
        // version so sanitizing is a fixed point on its own output.
        if versions.is_empty()
            && value.get("versions").is_none()
            && let Some(text) = get_str(&value, &["text"])
        {
            return Ok(Self {
                currently_selected: None,
                versions: vec![Version {
                    role: get_string(&value, &["role"]),
                    body: VersionBody::SingleStep(vec![ContentBlock::Text(text.to_owned())]),
                    reasoning_content: None,
                    gen_info_model: None,
                }],
            });
        }

        Ok(Self {
            currently_selected: value
                .get("currentlySelected")
                .and_then(serde_json::Value::as_u64),
            versions,
        })
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        let body = match get_str(&value, &["type"]) {
            Some("singleStep") => VersionBody::SingleStep(content_blocks(&value)),
            Some("multiStep") => VersionBody::MultiStep(
                value
                    .get("steps")
                    .and_then(|s| serde_json::from_value(s.clone()).ok())
                    .unwrap_or_default(),
            ),
            _ => VersionBody::Other,
        };

        Ok(Self {
            role: get_string(&value, &["role"]),
            body,
            reasoning_content: get_string(&value, &["reasoning_content"]),
            gen_info_model: get_string(&value, &["genInfo", "indexedModelIdentifier"]),
        })
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        Ok(Self {
            content: content_blocks(&value),
            reasoning_content: get_string(&value, &["reasoning_content"]),
            gen_info_model: get_string(&value, &["genInfo", "indexedModelIdentifier"]),
        })
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        if get_str(&value, &["type"]) == Some("text") {
            return Ok(Self::Text(
                get_str(&value, &["text"]).unwrap_or_default().to_owned(),
            ));
        }

        Ok(Self::Other)
    }
}

/// Parses the `content` array of a version or step.
fn content_blocks(value: &serde_json::Value) -> Vec<ContentBlock> {
    value
        .get("content")
        .and_then(|c| serde_json::from_value(c.clone()).ok())
        .unwrap_or_default()
}

/// Navigates a JSON path and returns the string value at the end.
///
/// # Arguments
///
/// * `value` - The root JSON value to navigate from
/// * `path` - A sequence of keys to follow through the JSON structure
fn get_str<'a>(value: &'a serde_json::Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str()
}

/// Like [`get_str`] but returns an owned `String`.
fn get_string(value: &serde_json::Value, path: &[&str]) -> Option<String> {
    get_str(value, path).map(str::to_owned)
}

/// Describes a JSON value's shape for error messages.
fn shape_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object without a \"messages\" field",
    }
}

/// Parses a JSON string holding exactly one conversation object.
///
/// This is the entry point for the sanitizing pipeline, which operates on
/// one conversation at a time. Any object is accepted; missing fields read
/// as absent rather than erroring.
///
/// # Errors
///
/// Returns [`ParseError::Json`] for malformed JSON and
/// [`ParseError::Format`] when the root is not an object.
pub fn parse_conversation(json_str: &str) -> Result<Conversation, ParseError> {
    let value: serde_json::Value = serde_json::from_str(json_str).context(JsonSnafu)?;
    ensure!(
        value.is_object(),
        FormatSnafu {
            found: shape_of(&value),
        }
    );
    serde_json::from_value(value).context(JsonSnafu)
}

/// Parses a JSON string holding one conversation or an array of them.
///
/// A root object must carry a `messages` field to count as a conversation;
/// a root array yields one conversation per object element.
///
/// # Errors
///
/// Returns [`ParseError::Json`] for malformed JSON and
/// [`ParseError::Format`] for any other root shape, naming the shape found.
///
/// # Example
///
/// ```
/// use lms2md::parser::parse_conversations;
///
/// let json = r#"[{"messages": []}, {"messages": []}]"#;
/// let conversations = parse_conversations(json).unwrap();
/// assert_eq!(conversations.len(), 2);
/// ```
pub fn parse_conversations(json_str: &str) -> Result<Vec<Conversation>, ParseError> {
    let value: serde_json::Value = serde_json::from_str(json_str).context(JsonSnafu)?;

    match value {
        serde_json::Value::Object(map) if map.contains_key("messages") => Ok(vec![
            serde_json::from_value(serde_json::Value::Object(map)).context(JsonSnafu)?,
        ]),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| {
                ensure!(
                    item.is_object(),
                    FormatSnafu {
                        found: shape_of(&item),
                    }
                );
                serde_json::from_value(item).context(JsonSnafu)
            })
            .collect(),
        other => FormatSnafu {
            found: shape_of(&other),
        }
        .fail(),
    }
}
