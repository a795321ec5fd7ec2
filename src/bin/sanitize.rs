// SPDX-License-Identifier: GPL-3.0-only

//! Command-line interface for the sanitizing pipeline.
//!
//! This binary provides the `lms-sanitize` command: it reduces one
//! LM Studio conversation export to its keep-list fields and writes the
//! result as pretty-printed JSON.

use lexopt::prelude::*;
use lms2md::{parser, sanitize};
use snafu::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("missing required argument: <SOURCE>"))]
    MissingSource,

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("failed to serialize sanitized output: {source}"))]
    Serialize { source: serde_json::Error },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Reduce an LM Studio conversation export to its relevant fields

Usage: {name} <SOURCE> [DEST]

Arguments:
  <SOURCE>  Input conversation JSON file
  [DEST]    Output path (default: <SOURCE> with its extension
            replaced by .sanitized.json)

Options:
  -h, --help     Print help
  -V, --version  Print version",
        name = "lms-sanitize",
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<(Option<PathBuf>, Option<PathBuf>), lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut source: Option<PathBuf> = None;
    let mut dest: Option<PathBuf> = None;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("lms-sanitize {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) if source.is_none() => source = Some(val.parse()?),
            Value(val) if dest.is_none() => dest = Some(val.parse()?),
            Value(_) => return Err("too many arguments".into()),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok((source, dest))
}

fn main() -> Result<(), Error> {
    let (source, dest) = parse_args().context(ParseArgsSnafu)?;
    let source = source.context(MissingSourceSnafu)?;
    let dest = dest.unwrap_or_else(|| source.with_extension("sanitized.json"));

    let json = std::fs::read_to_string(&source).context(ReadFileSnafu { path: &source })?;
    let conversation =
        parser::parse_conversation(&json).context(ParseFileSnafu { path: &source })?;
    let reduced = sanitize::sanitize(&conversation);

    let output = serde_json::to_string_pretty(&reduced).context(SerializeSnafu)?;
    std::fs::write(&dest, output).context(WriteFileSnafu { path: &dest })?;

    println!("Wrote {}", dest.display());
    Ok(())
}
