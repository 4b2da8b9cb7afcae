//! Core data types shared across the export pipeline.

use serde::Serialize;
use std::path::PathBuf;

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Sentinel parent id for collections and items without a parent.
pub const NO_PARENT: i64 = -1;

/// A flat collection row as stored in the library: id, parent id and
/// display name. The hierarchy is only implied by `parent_id` until a
/// forest is built from a set of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    pub id: i64,
    /// [`NO_PARENT`] if the collection sits at the top level.
    pub parent_id: i64,
    pub name: String,
}

/// An attachment that was resolved to an actual file on disk, together
/// with the collections it belongs to.
///
/// `owner_collections` is final by the time the binder sees it: the
/// resolver has already substituted the parent item's collections for
/// attachments that carry none of their own.
#[derive(Debug, Clone)]
pub struct AttachmentFile {
    pub item_id: i64,
    /// [`NO_PARENT`] if the attachment has no parent item.
    pub parent_item_id: i64,
    /// File name the attachment is exported under.
    pub display_name: String,
    /// Absolute path of the file inside the library's storage directory.
    pub source_path: PathBuf,
    pub owner_collections: Vec<CollectionRecord>,
}

/// A file bound to a collection node, ready to be copied out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub source_id: i64,
    pub display_name: String,
    pub source_path: PathBuf,
}

/// What to do when a destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    Overwrite,
    Skip,
}

/// Counts from binding attachments into a forest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BindStats {
    /// File entries appended to nodes. A file in N collections counts N times.
    pub bound: usize,
    /// Entries rejected because the node already held that display name.
    pub duplicates: usize,
    /// Owning collection ids that were not present in the forest.
    pub unknown_collections: usize,
}

/// Counts from materializing a forest to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Counts from resolving raw attachment rows to files on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// PDF attachment rows found in the library.
    pub attachments: usize,
    /// Attachments resolved to exactly one storage file.
    pub resolved: usize,
    /// Attachments whose storage directory held no matching file.
    pub missing: usize,
    /// Attachments whose storage directory held more than one candidate.
    pub ambiguous: usize,
}
