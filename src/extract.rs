// SPDX-License-Identifier: GPL-3.0-only

//! Text extraction from conversation versions.
//!
//! A version's text lives in typed content blocks, either in one flat
//! sequence (`singleStep`) or nested under steps (`multiStep`). This module
//! flattens both shapes into ordered text segments and, for the Markdown
//! pipeline, splits inline `<think>…</think>` reasoning away from the
//! visible reply text.
//!
//! # Example
//!
//! ```
//! use lms2md::extract::split_think;
//!
//! let (reasoning, visible) = split_think("<think>plan</think>Hello");
//! assert_eq!(reasoning.as_deref(), Some("plan"));
//! assert_eq!(visible, "Hello");
//! ```

use crate::parser::{ContentBlock, Version, VersionBody};

/// Opening marker of an inline reasoning span.
const THINK_OPEN: &str = "<think>";

/// Closing marker of an inline reasoning span.
const THINK_CLOSE: &str = "</think>";

/// Collects the raw text of every text block in a version, in order.
///
/// Multi-step versions are flattened across steps with no step markers;
/// versions of an unrecognized shape contribute nothing. Empty text blocks
/// are kept so callers decide whether to drop them.
#[must_use]
pub fn extract_segments(version: &Version) -> Vec<String> {
    match &version.body {
        VersionBody::SingleStep(blocks) => block_texts(blocks).collect(),
        VersionBody::MultiStep(steps) => steps
            .iter()
            .flat_map(|step| block_texts(&step.content))
            .collect(),
        VersionBody::Other => Vec::new(),
    }
}

/// Splits the first `<think>…</think>` span out of `text`.
///
/// Returns the trimmed interior of the span and the remaining visible text
/// (the parts before and after the span, trimmed as a whole). Only the
/// first paired span is extracted; later markers stay in the visible text.
/// Without a paired span, the input comes back unchanged.
#[must_use]
pub fn split_think(text: &str) -> (Option<String>, String) {
    let Some(open) = text.find(THINK_OPEN) else {
        return (None, text.to_owned());
    };
    let interior_start = open + THINK_OPEN.len();
    let Some(close) = text[interior_start..].find(THINK_CLOSE) else {
        return (None, text.to_owned());
    };

    let interior = &text[interior_start..interior_start + close];
    let after = &text[interior_start + close + THINK_CLOSE.len()..];
    let visible = format!("{}{after}", &text[..open]);

    (Some(interior.trim().to_owned()), visible.trim().to_owned())
}

/// Separates a version's text into visible segments and thinking segments.
///
/// Each text block is split on its first think span; the auxiliary
/// `reasoning_content` fields (per step, then per version) are appended to
/// the thinking collection. Empty results on either side are dropped.
#[must_use]
pub fn extract_texts(version: &Version) -> (Vec<String>, Vec<String>) {
    let mut visible = Vec::new();
    let mut thinking = Vec::new();

    match &version.body {
        VersionBody::SingleStep(blocks) => {
            for text in block_texts(blocks) {
                split_block(&text, &mut visible, &mut thinking);
            }
        }
        VersionBody::MultiStep(steps) => {
            for step in steps {
                for text in block_texts(&step.content) {
                    split_block(&text, &mut visible, &mut thinking);
                }
                push_reasoning(step.reasoning_content.as_deref(), &mut thinking);
            }
        }
        VersionBody::Other => {}
    }

    push_reasoning(version.reasoning_content.as_deref(), &mut thinking);

    (visible, thinking)
}

fn block_texts(blocks: &[ContentBlock]) -> impl Iterator<Item = String> + '_ {
    blocks.iter().filter_map(|block| match block {
        ContentBlock::Text(text) => Some(text.clone()),
        ContentBlock::Other => None,
    })
}

fn split_block(text: &str, visible: &mut Vec<String>, thinking: &mut Vec<String>) {
    let (reasoning, rest) = split_think(text);
    if let Some(reasoning) = reasoning.filter(|r| !r.is_empty()) {
        thinking.push(reasoning);
    }
    if !rest.is_empty() {
        visible.push(rest);
    }
}

fn push_reasoning(field: Option<&str>, thinking: &mut Vec<String>) {
    if let Some(reasoning) = field.map(str::trim).filter(|r| !r.is_empty()) {
        thinking.push(reasoning.to_owned());
    }
}
