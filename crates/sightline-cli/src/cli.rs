//! Argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Versioned journal timeline: edit, tag and search one growing document.
#[derive(Parser, Debug)]
#[command(name = "sightline", version)]
#[command(about = "Edit, tag and search a Sightline timeline")]
pub struct Cli {
    /// Timeline snapshot to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub timeline: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the full document
    Show,

    /// Print the document and its version as JSON
    Snapshot,

    /// Print the text logged on one day
    Log {
        /// Day as YYYY-MM-DD
        date: String,
    },

    /// List blocks with offsets, dates and tags
    Blocks,

    /// List every tag with its colour
    Tags,

    /// Apply an edit payload and print the response
    Edit {
        /// `{"base_version": N, "ops": [...]}`, or `-` to read stdin
        payload: String,
    },

    /// Register a tag such as `#project:sightline`
    Intern {
        tag: String,
    },

    /// Replace the tags of the block at INDEX
    Assign {
        index: usize,

        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Find blocks whose tags match a query
    Search {
        #[arg(value_enum)]
        mode: SearchMode,

        query: String,
    },

    /// Suggest tags for a partial name
    Complete {
        partial: String,
    },

    /// Merge adjacent blocks that share a date and tags
    Compact {
        /// Upper bound on merged block length in code points
        #[arg(long)]
        max_block_chars: Option<usize>,
    },

    /// Build a timeline snapshot from a markdown vault
    Import(ImportArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    /// Tag names starting with the query
    Prefix,
    /// Tag names containing the query
    Infix,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Vault holding `journal/` and `projects/`
    #[arg(long, value_name = "SOURCE_DIR")]
    pub source: PathBuf,

    /// Snapshot file to write
    #[arg(long, value_name = "OUTPUT_FILE")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sightline", "show", "--timeline", "/tmp/t.json"]).unwrap();
        assert_eq!(cli.timeline, Some(PathBuf::from("/tmp/t.json")));
        assert!(matches!(cli.command, Command::Show));
    }

    #[test]
    fn test_parse_assign_requires_tags() {
        assert!(Cli::try_parse_from(["sightline", "assign", "0"]).is_err());
        let cli = Cli::try_parse_from(["sightline", "assign", "3", "a:b", "c"]).unwrap();
        match cli.command {
            Command::Assign { index, tags } => {
                assert_eq!(index, 3);
                assert_eq!(tags, vec!["a:b", "c"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_mode() {
        let cli = Cli::try_parse_from(["sightline", "search", "infix", "journal"]).unwrap();
        match cli.command {
            Command::Search { mode, query } => {
                assert_eq!(mode, SearchMode::Infix);
                assert_eq!(query, "journal");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
