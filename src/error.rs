//! Fatal error taxonomy.
//!
//! Only the failures that abort a whole run live here; everything else
//! (duplicate names, unresolved attachments, per-file copy failures) is
//! reported through counts and log output. Each variant maps to a distinct
//! process exit code so scripts can tell the failure modes apart.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("the Zotero library does not exist: {}", .0.display())]
    LibraryNotFound(PathBuf),

    #[error("the Zotero library is not supported: {field} version mismatch (found {found}, supported {supported})")]
    UnsupportedLibrary { field: &'static str, found: u32, supported: u32 },

    #[error("the output directory path is not valid: {}", .0.display())]
    InvalidOutputDir(PathBuf),

    #[error("cyclic collection structure detected at collection {0}")]
    CyclicCollections(i64),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::LibraryNotFound(_) => 3,
            Error::UnsupportedLibrary { .. } => 4,
            Error::InvalidOutputDir(_) => 5,
            Error::CyclicCollections(_) => 6,
        }
    }
}

/// Exit code for a top-level error: the typed code if the chain bottoms out
/// in an [`Error`], otherwise a generic failure.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1)
}
