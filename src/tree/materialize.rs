//! Materialize a collection forest as directories and file copies.

use super::{CollectionForest, NodeId};
use crate::domain::{CollisionPolicy, WriteReport};
use crate::utils::sanitize_component;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

impl CollectionForest {
    /// Copy every bound file under `output_root`, mirroring the collection
    /// hierarchy as nested directories.
    ///
    /// The walk is breadth-first over an explicit queue, never recursive:
    /// collection trees are user-controlled and can be arbitrarily deep.
    /// Each queue entry carries the relative path accumulated from its
    /// ancestors' names.
    ///
    /// A single failed copy is counted and logged and the walk continues.
    /// If a node's directory cannot be created, all of its files are
    /// counted as failed; its children stay on the queue and sibling
    /// subtrees are unaffected.
    pub fn write(&self, output_root: &Path, policy: CollisionPolicy) -> WriteReport {
        let mut report = WriteReport::default();
        let mut queue: VecDeque<(NodeId, PathBuf)> = self
            .roots
            .iter()
            .map(|&idx| (idx, PathBuf::from(sanitize_component(&self.nodes[idx].name))))
            .collect();

        while let Some((idx, rel_path)) = queue.pop_front() {
            let node = &self.nodes[idx];
            for &child in &node.children {
                queue.push_back((child, rel_path.join(sanitize_component(&self.nodes[child].name))));
            }

            let dir = output_root.join(&rel_path);
            if let Err(err) = fs::create_dir_all(&dir) {
                warn!(
                    "failed to create {}: {} ({} file(s) not written)",
                    dir.display(),
                    err,
                    node.files.len()
                );
                report.failed += node.files.len();
                continue;
            }

            for file in &node.files {
                let destination = dir.join(sanitize_component(&file.display_name));
                if destination.exists() && policy == CollisionPolicy::Skip {
                    report.skipped += 1;
                    continue;
                }
                match fs::copy(&file.source_path, &destination) {
                    Ok(_) => report.written += 1,
                    Err(err) => {
                        warn!(
                            "failed to copy {} to {}: {}",
                            file.source_path.display(),
                            destination.display(),
                            err
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        report
    }
}
