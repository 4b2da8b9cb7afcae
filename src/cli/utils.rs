//! Shared CLI helpers.

use crate::db::LIBRARY_DB_NAME;
use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Resolve the library argument to a concrete database file path.
///
/// A missing argument or a nonexistent path falls back to the current
/// directory; a directory gets the standard database file name appended.
/// The returned path may still not exist; callers decide how to fail.
pub fn locate_library(arg: Option<&Path>) -> Result<PathBuf> {
    let mut path = match arg {
        Some(path) if path.exists() => path.to_path_buf(),
        _ => env::current_dir()?,
    };
    if path.is_dir() {
        path.push(LIBRARY_DB_NAME);
    }
    Ok(path)
}
