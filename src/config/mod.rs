//! Configuration file support.
//!
//! A `zotfiles.toml` in the working directory (or a file given with
//! `--config`) provides defaults for the export flags. CLI arguments always
//! win over the file; the file wins over built-in defaults.

pub mod loader;

pub use loader::load_config;

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the Zotero library or the directory containing it.
    pub library: Option<PathBuf>,
    /// Output directory for `export`.
    pub output_dir: Option<PathBuf>,
    /// Overwrite existing files in the output tree instead of skipping.
    pub overwrite_files: Option<bool>,
    /// Write a JSON export report to this path.
    pub report: Option<PathBuf>,
}
