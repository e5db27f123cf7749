// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Talegraph CLI entrypoint.
//!
//! Loads a story export into an in-memory document store and prints its graph projection
//! as JSON. `--schema` prints the JSON schemas of the stored documents instead.

use std::error::Error;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use talegraph::config::EditorConfig;
use talegraph::editor::StoryEditor;
use talegraph::store::{document_schemas, MemoryDocumentStore, StoryExport};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--config <file>] <story.json>\n  {program} --schema\n\n<story.json> is a story export: {{ \"id\", \"story\", \"chapters\" }}.\n--config reads editor settings (layout, temp id prefix) from a JSON file.\n--schema prints the story and chapter document schemas.\n\nSet RUST_LOG to change log output (default: warn, written to stderr)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    schema: bool,
    config: Option<String>,
    story: Option<String>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => {
                if options.schema {
                    return Err(());
                }
                options.schema = true;
            }
            "--config" => {
                if options.config.is_some() {
                    return Err(());
                }
                let path = args.next().ok_or(())?;
                options.config = Some(path);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.story.is_some() {
                    return Err(());
                }
                options.story = Some(arg);
            }
        }
    }

    if options.schema {
        if options.story.is_some() || options.config.is_some() {
            return Err(());
        }
    } else if options.story.is_none() {
        return Err(());
    }

    Ok(options)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "talegraph".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_logging();

        if options.schema {
            println!("{}", serde_json::to_string_pretty(&document_schemas())?);
            return Ok(());
        }

        let config = match options.config.as_deref() {
            Some(path) => EditorConfig::load(path)?,
            None => EditorConfig::default(),
        };
        let Some(story_path) = options.story else {
            print_usage(&program);
            std::process::exit(2);
        };

        let store = MemoryDocumentStore::new();
        let story_id = StoryExport::load(&story_path)?.seed(&store)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let editor = runtime.block_on(StoryEditor::load(&store, &story_id, config))?;

        println!("{}", serde_json::to_string_pretty(editor.projection())?);
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("talegraph: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, CliOptions};

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter()
            .map(|arg| (*arg).to_owned())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_story_path() {
        let options = parse_options(args(&["story.json"])).expect("parse options");
        assert_eq!(
            options,
            CliOptions {
                story: Some("story.json".to_owned()),
                ..CliOptions::default()
            }
        );
    }

    #[test]
    fn parses_config_before_or_after_story() {
        for raw in [
            &["--config", "editor.json", "story.json"][..],
            &["story.json", "--config", "editor.json"][..],
        ] {
            let options = parse_options(args(raw)).expect("parse options");
            assert_eq!(options.config.as_deref(), Some("editor.json"));
            assert_eq!(options.story.as_deref(), Some("story.json"));
            assert!(!options.schema);
        }
    }

    #[test]
    fn parses_schema_flag() {
        let options = parse_options(args(&["--schema"])).expect("parse options");
        assert!(options.schema);
        assert!(options.story.is_none());
    }

    #[test]
    fn requires_a_story_unless_printing_schemas() {
        assert!(parse_options(std::iter::empty()).is_err());
        assert!(parse_options(args(&["--config", "editor.json"])).is_err());
    }

    #[test]
    fn rejects_schema_with_story_or_config() {
        assert!(parse_options(args(&["--schema", "story.json"])).is_err());
        assert!(parse_options(args(&["--schema", "--config", "editor.json"])).is_err());
    }

    #[test]
    fn rejects_duplicates_and_unknown_flags() {
        assert!(parse_options(args(&["a.json", "b.json"])).is_err());
        assert!(parse_options(args(&["--schema", "--schema"])).is_err());
        assert!(parse_options(args(&["--config", "a", "--config", "b", "s.json"])).is_err());
        assert!(parse_options(args(&["--config"])).is_err());
        assert!(parse_options(args(&["--verbose", "story.json"])).is_err());
    }
}
