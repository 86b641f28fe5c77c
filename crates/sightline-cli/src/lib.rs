//! Command-line frontend for the Sightline timeline.
//!
//! The `sightline` binary is a thin shell over [`sightline_core::TimelineStore`]:
//! every subcommand opens the store, runs one operation and prints the result
//! (JSON for anything structured). `import` builds a fresh snapshot from a
//! markdown vault instead.
//!
//! ```bash
//! sightline show
//! sightline edit '{"base_version": 3, "ops": [{"type": "insert", "position": 0, "text": "hi"}]}'
//! sightline assign 2 project:sightline type:journal
//! sightline search prefix project
//! sightline import --source ~/vault --output ~/.config/sightline/timeline.json
//! ```

pub mod cli;
pub mod commands;
pub mod importer;
pub mod logging;
