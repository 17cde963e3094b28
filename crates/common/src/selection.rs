//! Selection model
//!
//! Holds the ids picked for the next batch action. Toggling cascades over a
//! node's whole subtree; removing from the queue drops exactly one id. The set is
//! not kept consistent with folder membership between those operations.

use crate::tree::{FileNode, FileTree};
use std::collections::HashSet;
use tracing::debug;

/// Set of selected node ids, tied to the tree generation it was last reconciled with
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    ids: HashSet<String>,
    generation: u64,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect `node_id` together with every descendant.
    ///
    /// Returns the number of ids the operation touched; zero when the node is not
    /// in `tree`.
    pub fn toggle(&mut self, node_id: &str, checked: bool, tree: &FileTree) -> usize {
        let targets = tree.descendants_inclusive(node_id);
        if checked {
            self.ids.extend(targets.iter().map(|id| id.to_string()));
        } else {
            for id in &targets {
                self.ids.remove(*id);
            }
        }
        debug!(
            "{} {} ({} ids)",
            if checked { "Selected" } else { "Deselected" },
            node_id,
            targets.len()
        );
        targets.len()
    }

    /// Drop a single id from the queue without touching its ancestors or descendants.
    pub fn remove(&mut self, node_id: &str) -> bool {
        self.ids.remove(node_id)
    }

    /// Replace the whole selection, as when loading a suite.
    pub fn replace<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.ids.contains(node_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Tree generation this selection was last reconciled against.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Selected ids in a stable order (sorted), folders included.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Adopt a freshly fetched tree, dropping ids it no longer contains.
    ///
    /// Returns how many ids were dropped.
    pub fn reconcile(&mut self, tree: &FileTree) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| tree.contains(id));
        self.generation = tree.generation();
        let dropped = before - self.ids.len();
        if dropped > 0 {
            debug!(
                "Dropped {} stale ids on tree generation {}",
                dropped,
                tree.generation()
            );
        }
        dropped
    }

    /// Selected file nodes in tree pre-order. Folders never appear.
    pub fn selected_files<'a>(&self, tree: &'a FileTree) -> Vec<&'a FileNode> {
        tree.preorder()
            .map(|(node, _)| node)
            .filter(|node| node.is_file() && self.ids.contains(&node.id))
            .collect()
    }

    /// Ids of the selected files, in queue order.
    pub fn selected_file_ids(&self, tree: &FileTree) -> Vec<String> {
        self.selected_files(tree)
            .into_iter()
            .map(|node| node.id.clone())
            .collect()
    }

    pub fn selected_file_count(&self, tree: &FileTree) -> usize {
        tree.preorder()
            .filter(|(node, _)| node.is_file() && self.ids.contains(&node.id))
            .count()
    }
}
