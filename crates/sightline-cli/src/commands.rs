//! Subcommand dispatch.
//!
//! Each command opens the store, runs one operation and writes its result to
//! `out`. Plain text goes out as-is; everything structured is JSON.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use sightline_core::config::config_path;
use sightline_core::{SightlineConfig, TimelineStore};
use sightline_types::EditPayload;
use tracing::debug;

use crate::cli::{Cli, Command, SearchMode};
use crate::importer;

/// Run `cli`, reading edit payloads from `input` when asked to.
pub fn execute(cli: Cli, mut input: impl Read, mut out: impl Write) -> Result<()> {
    let Cli {
        timeline,
        config,
        command,
    } = cli;

    let open = || -> Result<TimelineStore> {
        let config = load_config(config.as_deref())?;
        open_store(timeline.clone(), &config)
    };

    match command {
        Command::Show => write_text(&mut out, &open()?.get_full_document()),
        Command::Snapshot => write_json(&mut out, &open()?.get_document_snapshot()),
        Command::Log { date } => write_text(&mut out, &open()?.get_log_for_date(&date)?),
        Command::Blocks => write_json(&mut out, &open()?.list_blocks()),
        Command::Tags => write_json(&mut out, &open()?.list_tags()),
        Command::Edit { payload } => {
            let payload = read_payload(&payload, &mut input)?;
            let response = open()?.apply_edit(payload)?;
            write_json(&mut out, &response)
        }
        Command::Intern { tag } => write_json(&mut out, &open()?.intern_tag(&tag)?),
        Command::Assign { index, tags } => {
            write_json(&mut out, &open()?.assign_block_tags(index, &tags)?)
        }
        Command::Search { mode, query } => {
            let store = open()?;
            let indices = match mode {
                SearchMode::Prefix => store.search_prefix(&query),
                SearchMode::Infix => store.search_infix(&query),
            };
            write_json(&mut out, &indices)
        }
        Command::Complete { partial } => write_json(&mut out, &open()?.autocomplete_tag(&partial)),
        Command::Compact { max_block_chars } => {
            write_json(&mut out, &open()?.compact(max_block_chars)?)
        }
        Command::Import(args) => {
            let summary = importer::run(&args.source, &args.output)?;
            write_json(&mut out, &summary)
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<SightlineConfig> {
    let Some(path) = explicit.map(Path::to_path_buf).or_else(config_path) else {
        return Ok(SightlineConfig::default());
    };
    debug!(path = %path.display(), "loading config");
    SightlineConfig::load_from_path(&path)
        .with_context(|| format!("failed to load config '{}'", path.display()))
}

fn open_store(timeline: Option<PathBuf>, config: &SightlineConfig) -> Result<TimelineStore> {
    let path = timeline
        .or_else(|| config.resolve_timeline_path())
        .ok_or_else(|| anyhow!("no timeline path: pass --timeline or set SIGHTLINE_TIMELINE_PATH"))?;
    TimelineStore::open_at(path.clone(), config)
        .with_context(|| format!("failed to open timeline '{}'", path.display()))
}

fn read_payload(arg: &str, input: &mut impl Read) -> Result<EditPayload> {
    let json = if arg == "-" {
        let mut buf = String::new();
        input
            .read_to_string(&mut buf)
            .context("failed to read edit payload from stdin")?;
        buf
    } else {
        arg.to_string()
    };
    serde_json::from_str(&json).context("invalid edit payload")
}

fn write_text(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.is_empty() && !text.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
