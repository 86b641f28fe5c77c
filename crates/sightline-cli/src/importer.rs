//! Vault importer.
//!
//! Turns a notes vault into a version-0 timeline snapshot:
//!
//! ```text
//! vault/
//! ├── journal/
//! │   ├── January 3, 2024.md     → one block dated 2024-01-03, #type:journal
//! │   └── 2024-01-04.md
//! └── projects/
//!     └── Home Lab/network.md    → dated by mtime, #project, #type:project-note,
//!                                  #project:home-lab
//! ```
//!
//! Blocks are ordered by date; notes sharing a date keep journal-first,
//! path-sorted order.

use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sightline_core::{TagRegistry, Timeline};
use sightline_types::{BlockId, TagId, TaggedBlock};
use tracing::{debug, info};
use walkdir::WalkDir;

const JOURNAL_DATE_FORMATS: [&str; 3] = ["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d"];

/// What an import produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub blocks: usize,
    pub tags: usize,
}

/// Import `source` and write the snapshot to `output`, replacing any file
/// already there.
pub fn run(source: &Path, output: &Path) -> Result<ImportSummary> {
    ensure_directory(source)
        .with_context(|| format!("source directory '{}' is invalid", source.display()))?;

    let journal_dir = source.join("journal");
    ensure_directory(&journal_dir)
        .with_context(|| format!("journal directory '{}' is missing", journal_dir.display()))?;

    let projects_dir = source.join("projects");
    ensure_directory(&projects_dir)
        .with_context(|| format!("projects directory '{}' is missing", projects_dir.display()))?;

    let mut registry = TagRegistry::new();
    let mut blocks = collect_journal_entries(&journal_dir, &mut registry)?;
    blocks.extend(collect_project_notes(&projects_dir, &mut registry)?);
    blocks.sort_by_key(|block| block.date);

    let timeline = Timeline::from_blocks(blocks, registry);
    timeline
        .save_to_path(output)
        .with_context(|| format!("failed to write snapshot to '{}'", output.display()))?;

    let summary = ImportSummary {
        blocks: timeline.block_count(),
        tags: timeline.tag_registry().len(),
    };
    info!(
        source = %source.display(),
        output = %output.display(),
        blocks = summary.blocks,
        tags = summary.tags,
        "import completed"
    );
    Ok(summary)
}

fn collect_journal_entries(journal_dir: &Path, registry: &mut TagRegistry) -> Result<Vec<TaggedBlock>> {
    let journal_tag = registry
        .intern_path(["type", "journal"])
        .ok_or_else(|| anyhow!("failed to intern #type:journal"))?;

    let mut files = Vec::new();
    let entries = fs::read_dir(journal_dir)
        .with_context(|| format!("failed to read journal directory '{}'", journal_dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read journal directory '{}'", journal_dir.display()))?
            .path();
        if path.is_file() && is_markdown(&path) {
            files.push(path);
        }
    }
    files.sort();

    let mut blocks = Vec::with_capacity(files.len());
    for path in files {
        let stem = path
            .file_stem()
            .and_then(OsStr::to_str)
            .ok_or_else(|| anyhow!("journal entry '{}' has an invalid name", path.display()))?;
        let date = parse_journal_date(stem)
            .with_context(|| format!("failed to parse date from journal entry '{stem}.md'"))?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read journal entry '{}'", path.display()))?;

        debug!(path = %path.display(), %date, "journal entry");
        blocks.push(TaggedBlock::new(BlockId::UNASSIGNED, date, text).with_tags([journal_tag]));
    }
    Ok(blocks)
}

fn collect_project_notes(projects_dir: &Path, registry: &mut TagRegistry) -> Result<Vec<TaggedBlock>> {
    let project_tag = registry.intern_segment(None, "project");
    let note_tag = registry
        .intern_path(["type", "project-note"])
        .ok_or_else(|| anyhow!("failed to intern #type:project-note"))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(projects_dir) {
        let entry = entry.with_context(|| {
            format!("failed to walk projects directory '{}'", projects_dir.display())
        })?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut blocks = Vec::with_capacity(files.len());
    for path in files {
        let relative = path
            .strip_prefix(projects_dir)
            .with_context(|| format!("failed to strip projects prefix from '{}'", path.display()))?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read project note '{}'", path.display()))?;
        let date = modified_date(&path)?;

        let mut tags: Vec<TagId> = vec![project_tag, note_tag];
        let mut parent = project_tag;
        let dirs = relative.parent().into_iter().flat_map(Path::components);
        for component in dirs {
            let Component::Normal(name) = component else {
                continue;
            };
            if let Some(segment) = slugify(&name.to_string_lossy()) {
                parent = registry.intern_segment(Some(parent), &segment);
                tags.push(parent);
            }
        }
        tags.sort_unstable();

        debug!(path = %path.display(), %date, tags = tags.len(), "project note");
        blocks.push(TaggedBlock::new(BlockId::UNASSIGNED, date, text).with_tags(tags));
    }
    Ok(blocks)
}

fn ensure_directory(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to read metadata for '{}'", path.display()))?;
    if !metadata.is_dir() {
        bail!("'{}' is not a directory", path.display());
    }
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Parse a journal file stem such as `September 5, 2023`, `Sept 5, 2023`
/// or `2023-09-05`.
fn parse_journal_date(stem: &str) -> Result<NaiveDate> {
    let trimmed = stem.trim().trim_matches('.');
    let abbreviated = trimmed.replace("Sept", "Sep");

    [trimmed, abbreviated.as_str()]
        .into_iter()
        .flat_map(|candidate| {
            JOURNAL_DATE_FORMATS
                .iter()
                .map(move |format| NaiveDate::parse_from_str(candidate, format))
        })
        .find_map(Result::ok)
        .ok_or_else(|| anyhow!("unable to parse journal date from '{stem}'"))
}

fn modified_date(path: &Path) -> Result<NaiveDate> {
    let modified = fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .with_context(|| format!("failed to read modification time for '{}'", path.display()))?;
    Ok(DateTime::<Utc>::from(modified).date_naive())
}

/// Lowercase ASCII alphanumerics, with every other run collapsed to one `-`.
fn slugify(name: &str) -> Option<String> {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            slug.push(lower);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    (!slug.is_empty()).then_some(slug)
}
