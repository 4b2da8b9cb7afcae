//! SQL queries against the Zotero library.
//!
//! Id lists are interpolated directly into `IN (...)` clauses; every id is
//! an `i64` straight from another query, so no untrusted text reaches the
//! SQL.

use crate::domain::{CollectionRecord, NO_PARENT};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};

/// A PDF attachment row.
///
/// `path` holds the stored file name (usually prefixed `storage:`), `key`
/// the name of the storage subdirectory the file lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRow {
    pub item_id: i64,
    /// [`NO_PARENT`] if the attachment has no parent item.
    pub parent_item_id: i64,
    pub path: String,
    pub key: String,
}

/// All PDF attachments in the library.
pub fn pdf_attachments(conn: &Connection) -> Result<Vec<AttachmentRow>> {
    let mut stmt = conn.prepare(
        "SELECT itemAttachments.itemID, itemAttachments.parentItemID,
                itemAttachments.path, items.key
         FROM itemAttachments
         LEFT JOIN items ON items.itemID = itemAttachments.itemID
         WHERE itemAttachments.contentType = 'application/pdf'",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(AttachmentRow {
            item_id: row.get(0)?,
            parent_item_id: row.get::<_, Option<i64>>(1)?.unwrap_or(NO_PARENT),
            path: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            key: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// The collections each of the given items belongs to.
///
/// Items without any collection membership produce no entry.
pub fn item_collections(
    conn: &Connection,
    item_ids: &[i64],
) -> Result<HashMap<i64, Vec<CollectionRecord>>> {
    let mut map: HashMap<i64, Vec<CollectionRecord>> = HashMap::new();
    if item_ids.is_empty() {
        return Ok(map);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT items.itemID, collectionItems.collectionID,
                collections.parentCollectionID, collections.collectionName
         FROM items
         LEFT JOIN collectionItems ON collectionItems.itemID = items.itemID
         LEFT JOIN collections ON collections.collectionID = collectionItems.collectionID
         WHERE items.itemID IN ({})",
        id_list(item_ids.iter().copied())
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, Option<i64>>(1)?,
            row.get::<_, Option<i64>>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    for row in rows {
        let (item_id, collection_id, parent_id, name) = row?;
        // Items outside any collection still produce a row through the left
        // join; those have no collection id.
        let Some(collection_id) = collection_id else {
            continue;
        };
        map.entry(item_id).or_default().push(CollectionRecord {
            id: collection_id,
            parent_id: parent_id.unwrap_or(NO_PARENT),
            name: name.unwrap_or_default(),
        });
    }
    Ok(map)
}

/// Flat lookup of collection rows by id, for the parent-closure walk.
pub fn collections_by_id(conn: &Connection, ids: &BTreeSet<i64>) -> Result<Vec<CollectionRecord>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT c.collectionID, c.parentCollectionID, c.collectionName
         FROM collections c
         WHERE c.collectionID IN ({})",
        id_list(ids.iter().copied())
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(CollectionRecord {
            id: row.get(0)?,
            parent_id: row.get::<_, Option<i64>>(1)?.unwrap_or(NO_PARENT),
            name: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Total number of collections in the library.
pub fn collection_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))?;
    Ok(count as u64)
}

fn id_list(ids: impl Iterator<Item = i64>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch(
            "CREATE TABLE items (itemID INTEGER PRIMARY KEY, key TEXT NOT NULL);
             CREATE TABLE itemAttachments (
                 itemID INTEGER PRIMARY KEY,
                 parentItemID INT,
                 contentType TEXT,
                 path TEXT
             );
             CREATE TABLE collections (
                 collectionID INTEGER PRIMARY KEY,
                 collectionName TEXT NOT NULL,
                 parentCollectionID INT
             );
             CREATE TABLE collectionItems (collectionID INT NOT NULL, itemID INT NOT NULL);

             INSERT INTO items VALUES (10, 'AAAA1111'), (11, 'BBBB2222'), (20, 'CCCC3333');
             INSERT INTO itemAttachments VALUES
                 (10, 20, 'application/pdf', 'storage:paper.pdf'),
                 (11, NULL, 'application/pdf', 'storage:notes.pdf'),
                 (20, NULL, 'text/html', 'storage:page.html');
             INSERT INTO collections VALUES
                 (1, 'Root', NULL),
                 (2, 'Sub', 1);
             INSERT INTO collectionItems VALUES (2, 20);",
        )
        .expect("create fixture schema");
        conn
    }

    #[test]
    fn test_pdf_attachments_filters_content_type() {
        let conn = fixture_conn();
        let mut rows = pdf_attachments(&conn).expect("query");
        rows.sort_by_key(|row| row.item_id);

        assert_eq!(rows.len(), 2, "the text/html attachment is excluded");
        assert_eq!(
            rows[0],
            AttachmentRow {
                item_id: 10,
                parent_item_id: 20,
                path: "storage:paper.pdf".to_string(),
                key: "AAAA1111".to_string(),
            }
        );
        assert_eq!(rows[1].parent_item_id, NO_PARENT, "NULL parent maps to the sentinel");
    }

    #[test]
    fn test_item_collections_groups_by_item() {
        let conn = fixture_conn();
        let map = item_collections(&conn, &[10, 20]).expect("query");

        assert!(!map.contains_key(&10), "item without memberships has no entry");
        let collections = map.get(&20).expect("parent item memberships");
        assert_eq!(
            collections,
            &vec![CollectionRecord { id: 2, parent_id: 1, name: "Sub".to_string() }]
        );
    }

    #[test]
    fn test_item_collections_empty_input() {
        let conn = fixture_conn();
        assert!(item_collections(&conn, &[]).expect("query").is_empty());
    }

    #[test]
    fn test_collections_by_id_maps_null_parent() {
        let conn = fixture_conn();
        let ids: BTreeSet<i64> = [1, 2, 99].into_iter().collect();
        let mut rows = collections_by_id(&conn, &ids).expect("query");
        rows.sort_by_key(|record| record.id);

        assert_eq!(rows.len(), 2, "unknown ids yield no rows");
        assert_eq!(rows[0].parent_id, NO_PARENT);
        assert_eq!(rows[1], CollectionRecord { id: 2, parent_id: 1, name: "Sub".to_string() });
    }

    #[test]
    fn test_collection_count() {
        let conn = fixture_conn();
        assert_eq!(collection_count(&conn).expect("count"), 2);
    }
}
