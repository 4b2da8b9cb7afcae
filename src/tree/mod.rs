//! Collection forest: tree construction and attachment binding.
//!
//! Collections come out of the library as flat (id, parent id, name) rows;
//! the hierarchy is only implied. [`CollectionForest`] makes it explicit:
//! nodes live in an arena and reference each other by index, and a single
//! id lookup table backs both parent linking at build time and collection
//! lookup at bind time.

use crate::domain::{AttachmentFile, BindStats, CollectionRecord, FileEntry, NO_PARENT};
use crate::error::Error;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

pub mod materialize;

/// Index of a node in the forest arena.
pub type NodeId = usize;

/// A collection holding the files bound to it and its child collections.
#[derive(Debug, Clone)]
pub struct CollectionNode {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub files: Vec<FileEntry>,
    pub children: Vec<NodeId>,
}

/// The collection hierarchy as displayed by the Zotero app.
///
/// Built once per run from a flat record set. The only mutation after
/// building is [`CollectionForest::bind`] appending file entries to nodes;
/// the tree structure itself never changes.
#[derive(Debug, Default)]
pub struct CollectionForest {
    nodes: Vec<CollectionNode>,
    roots: Vec<NodeId>,
    by_id: HashMap<i64, NodeId>,
}

impl CollectionForest {
    /// Arrange flat collection records into trees.
    ///
    /// A record whose parent id is not present in `records` becomes a root,
    /// silently: a live library export can be transiently inconsistent and
    /// a dangling parent is not worth failing over. Cyclic parent chains,
    /// on the other hand, would make every traversal loop and are rejected
    /// with [`Error::CyclicCollections`].
    ///
    /// Nodes, roots and children are ordered by collection id, so building
    /// twice from the same records yields the same structure.
    pub fn build(records: HashMap<i64, CollectionRecord>) -> Result<Self, Error> {
        check_acyclic(&records)?;

        let mut sorted: Vec<CollectionRecord> = records.into_values().collect();
        sorted.sort_unstable_by_key(|record| record.id);

        let mut nodes = Vec::with_capacity(sorted.len());
        let mut by_id = HashMap::with_capacity(sorted.len());
        for record in sorted {
            by_id.insert(record.id, nodes.len());
            nodes.push(CollectionNode {
                id: record.id,
                parent_id: record.parent_id,
                name: record.name,
                files: Vec::new(),
                children: Vec::new(),
            });
        }

        let mut roots = Vec::new();
        for idx in 0..nodes.len() {
            let parent_id = nodes[idx].parent_id;
            if parent_id == NO_PARENT {
                roots.push(idx);
                continue;
            }
            match by_id.get(&parent_id) {
                Some(&parent_idx) => nodes[parent_idx].children.push(idx),
                None => {
                    debug!(
                        collection = nodes[idx].id,
                        parent = parent_id,
                        "dangling parent reference, treating collection as a root"
                    );
                    roots.push(idx);
                }
            }
        }

        Ok(Self { nodes, roots, by_id })
    }

    /// Append each resolved attachment to the node of every collection it
    /// belongs to.
    ///
    /// A file that belongs to N collections is bound N times on purpose;
    /// within one node, display names stay unique and a second file with a
    /// name already bound there is counted as a duplicate and dropped.
    /// Attachments without owning collections are skipped (the resolver has
    /// already applied the parent-item fallback), and collection ids the
    /// forest does not know are dropped per attachment.
    pub fn bind(&mut self, attachments: &[AttachmentFile]) -> BindStats {
        let mut stats = BindStats::default();
        for attachment in attachments {
            if attachment.source_path.as_os_str().is_empty() {
                continue;
            }
            for collection in &attachment.owner_collections {
                let Some(&idx) = self.by_id.get(&collection.id) else {
                    debug!(
                        collection = collection.id,
                        item = attachment.item_id,
                        "attachment references a collection missing from the forest"
                    );
                    stats.unknown_collections += 1;
                    continue;
                };
                let node = &mut self.nodes[idx];
                if node.files.iter().any(|file| file.display_name == attachment.display_name) {
                    warn!(
                        "duplicate file {:?} in collection {:?}, skipping",
                        attachment.display_name, node.name
                    );
                    stats.duplicates += 1;
                    continue;
                }
                node.files.push(FileEntry {
                    source_id: attachment.item_id,
                    display_name: attachment.display_name.clone(),
                    source_path: attachment.source_path.clone(),
                });
                stats.bound += 1;
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by collection id.
    pub fn get(&self, collection_id: i64) -> Option<&CollectionNode> {
        self.by_id.get(&collection_id).map(|&idx| &self.nodes[idx])
    }

    pub fn roots(&self) -> impl Iterator<Item = &CollectionNode> {
        self.roots.iter().map(|&idx| &self.nodes[idx])
    }

    pub fn children<'a>(
        &'a self,
        node: &'a CollectionNode,
    ) -> impl Iterator<Item = &'a CollectionNode> + 'a {
        node.children.iter().map(|&idx| &self.nodes[idx])
    }

    /// Total number of file entries bound across all nodes.
    pub fn file_count(&self) -> usize {
        self.nodes.iter().map(|node| node.files.len()).sum()
    }
}

/// Reject parent chains that revisit a collection.
///
/// Walks each record's parent chain with a visited set; a dangling parent
/// simply ends the chain (that case is handled permissively at link time).
fn check_acyclic(records: &HashMap<i64, CollectionRecord>) -> Result<(), Error> {
    for record in records.values() {
        let mut seen = HashSet::new();
        seen.insert(record.id);
        let mut current = record.parent_id;
        while current != NO_PARENT {
            let Some(parent) = records.get(&current) else {
                break;
            };
            if !seen.insert(parent.id) {
                return Err(Error::CyclicCollections(parent.id));
            }
            current = parent.parent_id;
        }
    }
    Ok(())
}
