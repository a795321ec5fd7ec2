// SPDX-License-Identifier: GPL-3.0-only

//! Convert LM Studio conversation exports to Markdown and sanitized JSON.
//!
//! LM Studio stores each chat as a JSON document in which every message
//! holds multiple candidate "versions" (edits and regenerations) plus an
//! index naming the selected one. This crate:
//!
//! 1. Parses the document into typed Rust representations, resolving the
//!    canonical version of each message
//! 2. Extracts ordered text, separating visible replies from inline
//!    `<think>…</think>` reasoning
//! 3. Projects the document onto a reduced keep-list form, or renders it
//!    as Markdown with YAML frontmatter
//!
//! # Example
//!
//! ```no_run
//! use lms2md::{parser, render, sanitize};
//!
//! let json = std::fs::read_to_string("42.conversation.json").unwrap();
//!
//! for conversation in parser::parse_conversations(&json).unwrap() {
//!     let markdown = render::render_conversation(&conversation, Some(42));
//!     println!("{markdown}");
//! }
//!
//! let conversation = parser::parse_conversation(&json).unwrap();
//! let reduced = sanitize::sanitize(&conversation);
//! println!("{}", serde_json::to_string_pretty(&reduced).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`parser`]: JSON parsing and canonical-version selection
//! - [`extract`]: text extraction and reasoning/visible splitting
//! - [`sanitize`]: keep-list projection to a reduced JSON document
//! - [`render`]: Markdown generation with YAML frontmatter

#![deny(missing_docs)]

pub mod extract;
pub mod parser;
pub mod render;
pub mod sanitize;
