//! Workspace tree
//!
//! Turns the flat, parent-referencing record list delivered by the remote into an
//! ordered forest. Nodes live in an arena owned by [`FileTree`]; children are
//! indices into that arena, and every traversal uses an explicit stack so deep
//! trees never hit the call-stack limit.

use crate::types::{FsRecord, NodeKind};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A node in the built tree
#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub language: Option<String>,
    pub content: Option<String>,
    pub parent_id: Option<String>,
    children: Vec<usize>,
}

impl FileNode {
    fn from_record(record: &FsRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            kind: record.kind,
            language: record.language.clone(),
            content: record.content.clone(),
            parent_id: record.parent_id.clone(),
            children: Vec::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Ordered forest built from one fetch of the remote tree
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    nodes: Vec<FileNode>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
    generation: u64,
}

impl FileTree {
    /// Build a tree from flat records.
    ///
    /// Never fails: unresolved parents place the node at the root, a repeated id
    /// keeps its first record, and nodes on a parent cycle are left out.
    pub fn build(records: &[FsRecord], generation: u64) -> Self {
        let mut nodes = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for record in records {
            if index.contains_key(&record.id) {
                warn!("Duplicate node id {} in tree payload, keeping first", record.id);
                continue;
            }
            index.insert(record.id.clone(), nodes.len());
            nodes.push(FileNode::from_record(record));
        }

        let mut roots = Vec::new();
        for idx in 0..nodes.len() {
            let parent = nodes[idx]
                .parent_id
                .as_ref()
                .and_then(|pid| index.get(pid).copied())
                .filter(|&p| p != idx);

            match parent {
                Some(p) => nodes[p].children.push(idx),
                None => roots.push(idx),
            }
        }

        // Nodes on a parent cycle never hang off a root. Drop them from the index
        // so lookups and walks only ever see the acyclic part.
        let mut reachable = vec![false; nodes.len()];
        let mut stack = roots.clone();
        while let Some(idx) = stack.pop() {
            reachable[idx] = true;
            stack.extend(nodes[idx].children.iter().copied());
        }
        let unreachable = reachable.iter().filter(|r| !**r).count();
        if unreachable > 0 {
            warn!("Ignoring {} nodes caught in a parent cycle", unreachable);
            index.retain(|_, idx| reachable[*idx]);
        }

        let mut tree = Self {
            nodes,
            roots,
            index,
            generation,
        };
        tree.sort();

        debug!(
            "Built tree generation {} with {} nodes ({} roots)",
            generation,
            tree.len(),
            tree.roots.len()
        );
        tree
    }

    /// Stable sort of every sibling list: folders first, then by name.
    fn sort(&mut self) {
        let nodes = &self.nodes;
        let order = |a: &usize, b: &usize| {
            let (a, b) = (&nodes[*a], &nodes[*b]);
            a.kind
                .rank()
                .cmp(&b.kind.rank())
                .then_with(|| a.name.cmp(&b.name))
        };

        let mut roots = std::mem::take(&mut self.roots);
        roots.sort_by(order);

        let mut children: Vec<Vec<usize>> = self
            .nodes
            .iter()
            .map(|n| n.children.clone())
            .collect();
        for list in children.iter_mut() {
            list.sort_by(order);
        }

        self.roots = roots;
        for (node, list) in self.nodes.iter_mut().zip(children) {
            node.children = list;
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&FileNode> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn roots(&self) -> impl Iterator<Item = &FileNode> + '_ {
        self.roots.iter().map(move |&idx| &self.nodes[idx])
    }

    pub fn children<'a>(&'a self, node: &'a FileNode) -> impl Iterator<Item = &'a FileNode> + 'a {
        node.children.iter().map(move |&idx| &self.nodes[idx])
    }

    /// Pre-order walk over the whole forest, yielding each node with its depth.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder::new(self, self.roots.iter().rev().map(|&idx| (idx, 0)).collect())
    }

    /// `id` followed by its transitive descendants in pre-order.
    ///
    /// Empty when `id` is not part of this tree.
    pub fn descendants_inclusive(&self, id: &str) -> Vec<&str> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        Preorder::new(self, vec![(start, 0)])
            .map(|(node, _)| node.id.as_str())
            .collect()
    }
}

/// Explicit-stack pre-order iterator over a [`FileTree`]
pub struct Preorder<'a> {
    tree: &'a FileTree,
    stack: Vec<(usize, usize)>,
}

impl<'a> Preorder<'a> {
    fn new(tree: &'a FileTree, stack: Vec<(usize, usize)>) -> Self {
        Self { tree, stack }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (&'a FileNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, depth) = self.stack.pop()?;
        let node = &self.tree.nodes[idx];
        self.stack
            .extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        Some((node, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<'a>(nodes: impl Iterator<Item = &'a FileNode>) -> Vec<&'a str> {
        nodes.map(|n| n.id.as_str()).collect()
    }

    fn assert_sibling_order(tree: &FileTree, siblings: Vec<&FileNode>) {
        for pair in siblings.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let ordered = (a.is_folder() && b.is_file()) || (a.kind == b.kind && a.name <= b.name);
            assert!(ordered, "{} ({}) before {} ({})", a.name, a.kind, b.name, b.kind);
        }
        for node in siblings {
            assert_sibling_order(tree, tree.children(node).collect());
        }
    }

    #[test]
    fn test_folders_precede_files_at_root() {
        let records = vec![
            FsRecord::folder("1", None, "b"),
            FsRecord::file("2", Some("1"), "a.ts"),
            FsRecord::file("3", None, "a.ts"),
        ];
        let tree = FileTree::build(&records, 1);

        assert_eq!(ids(tree.roots()), vec!["1", "3"]);
        let folder = tree.get("1").unwrap();
        assert_eq!(ids(tree.children(folder)), vec!["2"]);
    }

    #[test]
    fn test_unresolved_parent_becomes_root() {
        let records = vec![
            FsRecord::file("orphan", Some("missing"), "lost.ts"),
            FsRecord::file("self", Some("self"), "loop.ts"),
        ];
        let tree = FileTree::build(&records, 1);

        assert_eq!(ids(tree.roots()), vec!["orphan", "self"]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let records = vec![
            FsRecord::file("c", Some("p"), "child.ts"),
            FsRecord::folder("p", None, "parent"),
        ];
        let tree = FileTree::build(&records, 1);

        assert_eq!(ids(tree.roots()), vec!["p"]);
        assert_eq!(tree.get("p").unwrap().child_count(), 1);
    }

    #[test]
    fn test_node_count_and_ordering_hold_for_mixed_tree() {
        let records = vec![
            FsRecord::file("f3", Some("src"), "zeta.ts"),
            FsRecord::folder("src", None, "src"),
            FsRecord::folder("lib", Some("src"), "lib"),
            FsRecord::file("f1", Some("lib"), "Beta.ts"),
            FsRecord::file("f2", Some("lib"), "alpha.ts"),
            FsRecord::folder("api", Some("src"), "api"),
            FsRecord::file("f4", None, "README.md"),
            FsRecord::folder("docs", None, "docs"),
        ];
        let tree = FileTree::build(&records, 7);

        assert_eq!(tree.len(), records.len());
        assert_eq!(tree.preorder().count(), records.len());
        for record in &records {
            assert_eq!(tree.get(&record.id).unwrap().name, record.name);
        }
        assert_sibling_order(&tree, tree.roots().collect());

        // Case-sensitive: uppercase sorts before lowercase.
        let lib = tree.get("lib").unwrap();
        assert_eq!(ids(tree.children(lib)), vec!["f1", "f2"]);
        assert_eq!(tree.generation(), 7);
    }

    #[test]
    fn test_preorder_depths() {
        let records = vec![
            FsRecord::folder("a", None, "a"),
            FsRecord::folder("b", Some("a"), "b"),
            FsRecord::file("c", Some("b"), "c.ts"),
            FsRecord::file("d", Some("a"), "d.ts"),
        ];
        let tree = FileTree::build(&records, 1);
        let walk: Vec<(&str, usize)> = tree.preorder().map(|(n, d)| (n.id.as_str(), d)).collect();

        assert_eq!(walk, vec![("a", 0), ("b", 1), ("c", 2), ("d", 1)]);
    }

    #[test]
    fn test_descendants_inclusive() {
        let records = vec![
            FsRecord::folder("a", None, "a"),
            FsRecord::folder("b", Some("a"), "b"),
            FsRecord::file("c", Some("b"), "c.ts"),
            FsRecord::file("d", Some("a"), "d.ts"),
            FsRecord::file("e", None, "e.ts"),
        ];
        let tree = FileTree::build(&records, 1);

        assert_eq!(tree.descendants_inclusive("a"), vec!["a", "b", "c", "d"]);
        assert_eq!(tree.descendants_inclusive("e"), vec!["e"]);
        assert!(tree.descendants_inclusive("nope").is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let records = vec![
            FsRecord::file("x", None, "first.ts"),
            FsRecord::file("x", None, "second.ts"),
        ];
        let tree = FileTree::build(&records, 1);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("x").unwrap().name, "first.ts");
    }

    #[test]
    fn test_parent_cycle_is_left_out() {
        let records = vec![
            FsRecord::folder("a", Some("b"), "a"),
            FsRecord::folder("b", Some("a"), "b"),
            FsRecord::file("c", Some("a"), "c.ts"),
            FsRecord::file("d", None, "d.ts"),
        ];
        let tree = FileTree::build(&records, 1);

        assert_eq!(ids(tree.roots()), vec!["d"]);
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains("a"));
        assert!(tree.get("c").is_none());
        assert!(tree.descendants_inclusive("a").is_empty());
        assert_eq!(tree.preorder().count(), 1);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut records = vec![FsRecord::folder("n0", None, "n0")];
        for i in 1..20_000 {
            let parent = format!("n{}", i - 1);
            records.push(FsRecord::folder(&format!("n{}", i), Some(parent.as_str()), "n"));
        }
        let tree = FileTree::build(&records, 1);

        assert_eq!(tree.preorder().count(), 20_000);
        assert_eq!(tree.descendants_inclusive("n0").len(), 20_000);
    }
}
