// SPDX-License-Identifier: GPL-3.0-only

//! Command-line interface for the Markdown pipeline.
//!
//! This binary provides the `lms2md` command: it scans the current
//! directory for `*.conversation.json` exports and writes one Markdown file
//! per conversation into an `output/` subdirectory.

use lexopt::prelude::*;
use lms2md::{parser, render};
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filename suffix that marks an LM Studio conversation export.
const EXPORT_SUFFIX: &str = ".conversation.json";

/// Subdirectory that receives the rendered Markdown files.
const OUTPUT_DIR: &str = "output";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

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

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("{failed} of {total} files failed to convert"))]
    SomeFilesFailed { failed: usize, total: usize },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert LM Studio conversation exports to Markdown

Usage: {name}

Scans the current directory for *{suffix} files and writes one
Markdown file per conversation into the {output}/ subdirectory. A numeric
filename prefix (e.g. 42{suffix}) becomes the conversation id in
the frontmatter and the output filename.

Options:
  -h, --help     Print help
  -V, --version  Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        suffix = EXPORT_SUFFIX,
        output = OUTPUT_DIR,
    );
}

fn parse_args() -> Result<(), lexopt::Error> {
    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    parse_args().context(ParseArgsSnafu)?;

    let files = collect_export_files(Path::new("."));
    std::fs::create_dir_all(OUTPUT_DIR).context(CreateOutputDirSnafu)?;

    // A file that fails to convert does not abort its siblings.
    let mut failed: usize = 0;
    for file in &files {
        if let Err(err) = process_file(file) {
            eprintln!("{err}");
            failed += 1;
        }
    }

    ensure!(
        failed == 0,
        SomeFilesFailedSnafu {
            failed,
            total: files.len(),
        }
    );
    Ok(())
}

/// Collects conversation export files from the top level of `dir`.
fn collect_export_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(EXPORT_SUFFIX))
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Converts one export file, writing each contained conversation.
fn process_file(input: &Path) -> Result<(), Error> {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let conversation_id = file_name
        .strip_suffix(EXPORT_SUFFIX)
        .and_then(|prefix| prefix.parse::<u64>().ok());

    match conversation_id {
        Some(id) => println!("Processing: {file_name} (id={id})"),
        None => println!("Processing: {file_name} (no numeric id, omitting it from frontmatter)"),
    }

    let json = std::fs::read_to_string(input).context(ReadFileSnafu { path: input })?;
    let conversations =
        parser::parse_conversations(&json).context(ParseFileSnafu { path: input })?;

    for conversation in &conversations {
        let title = conversation.name.as_deref().unwrap_or("Untitled");
        let stem = render::safe_filename(title);
        let out_name = match conversation_id {
            Some(id) => format!("{stem}_{id}.md"),
            None => format!("{stem}.md"),
        };
        let out_path = Path::new(OUTPUT_DIR).join(out_name);

        let markdown = render::render_conversation(conversation, conversation_id);
        std::fs::write(&out_path, &markdown).context(WriteFileSnafu { path: &out_path })?;

        println!("Wrote {}", out_path.display());
    }

    Ok(())
}
