//! Attachment resolution.
//!
//! Turns raw attachment rows into [`AttachmentFile`]s that point at actual
//! files in the library's `storage/` directory, finalizes the collections
//! each file belongs to (falling back to the parent item's collections),
//! and gathers the closed set of collection records the forest is built
//! from.

use crate::db::queries::{self, AttachmentRow};
use crate::domain::{AttachmentFile, CollectionRecord, ResolveStats, NO_PARENT};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const STORAGE_PREFIX: &str = "storage:";
const STORAGE_DIR: &str = "storage";
const PDF_EXTENSION: &str = "pdf";

/// Resolve everything the tree stage needs from the library.
///
/// Returns the resolved attachments (owning collections final), the closed
/// collection record set covering every owner and its ancestors, and the
/// resolution counts.
pub fn resolve_library(
    conn: &Connection,
    library_path: &Path,
) -> Result<(Vec<AttachmentFile>, HashMap<i64, CollectionRecord>, ResolveStats)> {
    let rows = queries::pdf_attachments(conn)?;
    let storage_root = library_path.parent().unwrap_or_else(|| Path::new(".")).join(STORAGE_DIR);

    let (mut attachments, stats) = resolve_files(rows, &storage_root);
    attach_owner_collections(conn, &mut attachments)?;
    let collections = collection_closure(conn, &attachments)?;

    Ok((attachments, collections, stats))
}

/// Locate each attachment's file under `storage_root`.
///
/// An attachment resolves only if its storage directory holds exactly one
/// PDF; none means the file was deleted out from under the library, more
/// than one means we cannot tell which file the row refers to. Unresolved
/// attachments are dropped here, counted in the stats.
pub fn resolve_files(
    rows: Vec<AttachmentRow>,
    storage_root: &Path,
) -> (Vec<AttachmentFile>, ResolveStats) {
    let mut stats = ResolveStats { attachments: rows.len(), ..ResolveStats::default() };
    let mut attachments = Vec::with_capacity(rows.len());

    for row in rows {
        let display_name = row.path.strip_prefix(STORAGE_PREFIX).unwrap_or(&row.path).to_string();
        if row.key.is_empty() {
            debug!(item = row.item_id, "attachment has no storage key");
            stats.missing += 1;
            continue;
        }

        let storage_dir = storage_root.join(&row.key);
        match single_pdf_in(&storage_dir) {
            PdfLookup::One(source_path) => {
                stats.resolved += 1;
                attachments.push(AttachmentFile {
                    item_id: row.item_id,
                    parent_item_id: row.parent_item_id,
                    display_name,
                    source_path,
                    owner_collections: Vec::new(),
                });
            }
            PdfLookup::None => {
                debug!(item = row.item_id, dir = %storage_dir.display(), "no pdf file in storage directory");
                stats.missing += 1;
            }
            PdfLookup::Several(count) => {
                warn!(
                    "more than one pdf file found in the folder: {} ({} candidates)",
                    storage_dir.display(),
                    count
                );
                stats.ambiguous += 1;
            }
        }
    }

    (attachments, stats)
}

enum PdfLookup {
    None,
    One(std::path::PathBuf),
    Several(usize),
}

fn single_pdf_in(storage_dir: &Path) -> PdfLookup {
    let Ok(entries) = fs::read_dir(storage_dir) else {
        return PdfLookup::None;
    };
    let mut pdfs: Vec<std::path::PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(PDF_EXTENSION))
        .collect();
    match pdfs.len() {
        0 => PdfLookup::None,
        1 => PdfLookup::One(pdfs.remove(0)),
        n => PdfLookup::Several(n),
    }
}

/// Fill in each attachment's owning collections.
///
/// Attachments are usually children of a regular item, and it is the parent
/// item that carries the collection memberships; an attachment that has no
/// memberships of its own inherits its parent item's.
pub fn attach_owner_collections(
    conn: &Connection,
    attachments: &mut [AttachmentFile],
) -> Result<()> {
    let item_ids: Vec<i64> = attachments.iter().map(|a| a.item_id).collect();
    let mut by_item = queries::item_collections(conn, &item_ids)?;
    for attachment in attachments.iter_mut() {
        if let Some(collections) = by_item.remove(&attachment.item_id) {
            attachment.owner_collections = collections;
        }
    }

    let parent_ids: Vec<i64> = attachments
        .iter()
        .filter(|a| a.owner_collections.is_empty() && a.parent_item_id != NO_PARENT)
        .map(|a| a.parent_item_id)
        .collect();
    if parent_ids.is_empty() {
        return Ok(());
    }

    let by_parent = queries::item_collections(conn, &parent_ids)?;
    for attachment in
        attachments.iter_mut().filter(|a| a.owner_collections.is_empty())
    {
        if let Some(collections) = by_parent.get(&attachment.parent_item_id) {
            attachment.owner_collections = collections.clone();
        }
    }
    Ok(())
}

/// Collect every owning collection plus all of its ancestors.
///
/// Owner records carry their parent id but the parent's own row may not be
/// among them, so missing parents are fetched in rounds until the chain set
/// is closed. A parent id that does not exist in the library simply ends
/// its chain (the builder will treat the child as a root).
pub fn collection_closure(
    conn: &Connection,
    attachments: &[AttachmentFile],
) -> Result<HashMap<i64, CollectionRecord>> {
    let mut map: HashMap<i64, CollectionRecord> = HashMap::new();
    for attachment in attachments {
        for collection in &attachment.owner_collections {
            map.entry(collection.id).or_insert_with(|| collection.clone());
        }
    }

    let mut missing: BTreeSet<i64> = map
        .values()
        .filter(|c| c.parent_id != NO_PARENT && !map.contains_key(&c.parent_id))
        .map(|c| c.parent_id)
        .collect();

    while !missing.is_empty() {
        let fetched = queries::collections_by_id(conn, &missing)?;
        missing.clear();
        for collection in fetched {
            let parent_id = collection.parent_id;
            map.entry(collection.id).or_insert(collection);
            if parent_id != NO_PARENT && !map.contains_key(&parent_id) {
                missing.insert(parent_id);
            }
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(item_id: i64, parent_item_id: i64, path: &str, key: &str) -> AttachmentRow {
        AttachmentRow {
            item_id,
            parent_item_id,
            path: path.to_string(),
            key: key.to_string(),
        }
    }

    fn storage_with(files: &[(&str, &str)]) -> TempDir {
        let storage = TempDir::new().expect("storage dir");
        for (key, name) in files {
            let dir = storage.path().join(key);
            fs::create_dir_all(&dir).expect("create storage subdir");
            fs::write(dir.join(name), b"pdf").expect("write storage file");
        }
        storage
    }

    #[test]
    fn test_storage_prefix_is_stripped_from_display_name() {
        let storage = storage_with(&[("AAAA1111", "paper.pdf")]);
        let (attachments, stats) =
            resolve_files(vec![row(10, NO_PARENT, "storage:paper.pdf", "AAAA1111")], storage.path());

        assert_eq!(stats.resolved, 1);
        assert_eq!(attachments[0].display_name, "paper.pdf");
        assert_eq!(attachments[0].source_path, storage.path().join("AAAA1111/paper.pdf"));
    }

    #[test]
    fn test_display_name_without_prefix_is_kept() {
        let storage = storage_with(&[("AAAA1111", "paper.pdf")]);
        let (attachments, _) =
            resolve_files(vec![row(10, NO_PARENT, "paper.pdf", "AAAA1111")], storage.path());
        assert_eq!(attachments[0].display_name, "paper.pdf");
    }

    #[test]
    fn test_renamed_storage_file_still_resolves() {
        // The stored file name can differ from the path column; the single
        // pdf in the directory wins, the display name comes from the row.
        let storage = storage_with(&[("AAAA1111", "renamed.pdf")]);
        let (attachments, stats) =
            resolve_files(vec![row(10, NO_PARENT, "storage:paper.pdf", "AAAA1111")], storage.path());

        assert_eq!(stats.resolved, 1);
        assert_eq!(attachments[0].display_name, "paper.pdf");
        assert_eq!(attachments[0].source_path, storage.path().join("AAAA1111/renamed.pdf"));
    }

    #[test]
    fn test_missing_storage_directory_is_counted() {
        let storage = TempDir::new().expect("storage dir");
        let (attachments, stats) =
            resolve_files(vec![row(10, NO_PARENT, "storage:paper.pdf", "GONE0000")], storage.path());

        assert!(attachments.is_empty());
        assert_eq!(stats, ResolveStats { attachments: 1, missing: 1, ..Default::default() });
    }

    #[test]
    fn test_storage_directory_without_pdf_is_counted_missing() {
        let storage = storage_with(&[("AAAA1111", "notes.txt")]);
        let (attachments, stats) =
            resolve_files(vec![row(10, NO_PARENT, "storage:paper.pdf", "AAAA1111")], storage.path());

        assert!(attachments.is_empty());
        assert_eq!(stats.missing, 1);
    }

    #[test]
    fn test_ambiguous_storage_directory_is_skipped() {
        let storage = storage_with(&[("AAAA1111", "one.pdf"), ("AAAA1111", "two.pdf")]);
        let (attachments, stats) =
            resolve_files(vec![row(10, NO_PARENT, "storage:paper.pdf", "AAAA1111")], storage.path());

        assert!(attachments.is_empty());
        assert_eq!(stats.ambiguous, 1);
    }

    fn membership_fixture() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch(
            "CREATE TABLE items (itemID INTEGER PRIMARY KEY, key TEXT NOT NULL);
             CREATE TABLE collections (
                 collectionID INTEGER PRIMARY KEY,
                 collectionName TEXT NOT NULL,
                 parentCollectionID INT
             );
             CREATE TABLE collectionItems (collectionID INT NOT NULL, itemID INT NOT NULL);

             INSERT INTO items VALUES (10, 'AAAA1111'), (20, 'CCCC3333');
             INSERT INTO collections VALUES
                 (1, 'Root', NULL),
                 (2, 'Sub', 1),
                 (3, 'Deep', 2);
             INSERT INTO collectionItems VALUES (3, 20);",
        )
        .expect("create fixture schema");
        conn
    }

    fn unowned_attachment(item_id: i64, parent_item_id: i64) -> AttachmentFile {
        AttachmentFile {
            item_id,
            parent_item_id,
            display_name: "paper.pdf".to_string(),
            source_path: std::path::PathBuf::from("/storage/x/paper.pdf"),
            owner_collections: Vec::new(),
        }
    }

    #[test]
    fn test_attachment_inherits_parent_item_collections() {
        let conn = membership_fixture();
        let mut attachments = vec![unowned_attachment(10, 20)];
        attach_owner_collections(&conn, &mut attachments).expect("attach");

        let owners = &attachments[0].owner_collections;
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].id, 3);
    }

    #[test]
    fn test_attachment_without_parent_stays_unowned() {
        let conn = membership_fixture();
        let mut attachments = vec![unowned_attachment(10, NO_PARENT)];
        attach_owner_collections(&conn, &mut attachments).expect("attach");
        assert!(attachments[0].owner_collections.is_empty());
    }

    #[test]
    fn test_closure_fetches_ancestors_in_rounds() {
        let conn = membership_fixture();
        let mut attachment = unowned_attachment(10, 20);
        attachment.owner_collections =
            vec![CollectionRecord { id: 3, parent_id: 2, name: "Deep".to_string() }];

        let closure = collection_closure(&conn, &[attachment]).expect("closure");

        let mut ids: Vec<i64> = closure.keys().copied().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3], "parent and grandparent are pulled in");
        assert_eq!(closure[&1].parent_id, NO_PARENT);
    }

    #[test]
    fn test_closure_tolerates_dangling_parent() {
        let conn = membership_fixture();
        let mut attachment = unowned_attachment(10, 20);
        attachment.owner_collections =
            vec![CollectionRecord { id: 7, parent_id: 99, name: "Orphan".to_string() }];

        let closure = collection_closure(&conn, &[attachment]).expect("closure");

        assert_eq!(closure.len(), 1, "unknown parent id ends the chain");
        assert!(closure.contains_key(&7));
    }
}
