//! Infection tree
//!
//! Who-infected-whom, rooted at a synthetic node for the seeded cases.
//! Removing a node reparents its children so every surviving descendant
//! stays reachable from the root. At scoring time the tree is the record
//! of every cow that ever carried infection, including culled reactors.

use indexmap::{IndexMap, IndexSet};
use tracing::warn;

use crate::types::{BadgerId, CowId};

/// A node in the infection tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Root,
    Cow(CowId),
    Badger(BadgerId),
}

#[derive(Debug, Clone)]
pub struct InfectionTree {
    children: IndexMap<Node, IndexSet<Node>>,
    parents: IndexMap<Node, Node>,
}

impl Default for InfectionTree {
    fn default() -> Self {
        let mut children = IndexMap::new();
        children.insert(Node::Root, IndexSet::new());
        Self {
            children,
            parents: IndexMap::new(),
        }
    }
}

impl InfectionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `child` as a descendant infection of `parent`.
    pub fn insert(&mut self, parent: Node, child: Node) {
        self.children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        self.children.entry(child.clone()).or_default();
        self.parents.insert(child, parent);
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.children.contains_key(node)
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.children.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn children_of(&self, node: &Node) -> impl Iterator<Item = &Node> {
        self.children.get(node).into_iter().flatten()
    }

    pub fn parent_of(&self, node: &Node) -> Option<&Node> {
        self.parents.get(node)
    }

    /// Remove a node, reparenting its children to its parent.
    pub fn remove(&mut self, node: &Node) {
        let Some(parent) = self.parents.shift_remove(node) else {
            warn!(?node, "cannot remove: node has no parent in infection tree");
            return;
        };
        let orphans = self.children.shift_remove(node).unwrap_or_default();
        for child in &orphans {
            self.parents.insert(child.clone(), parent.clone());
        }
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.shift_remove(node);
            siblings.extend(orphans);
        }
    }

    /// All cows that ever appeared in the tree, in insertion order.
    pub fn cows(&self) -> impl Iterator<Item = &CowId> {
        self.children.keys().filter_map(|node| match node {
            Node::Cow(id) => Some(id),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cow(name: &str) -> Node {
        Node::Cow(CowId::from(name))
    }

    #[test]
    fn test_insert_and_enumerate() {
        let mut tree = InfectionTree::new();
        tree.insert(Node::Root, cow("a"));
        tree.insert(cow("a"), cow("b"));
        tree.insert(cow("a"), Node::Badger(BadgerId::from("x")));
        assert_eq!(tree.len(), 3);
        let cows: Vec<_> = tree.cows().map(|c| c.0.clone()).collect();
        assert_eq!(cows, vec!["a", "b"]);
        assert_eq!(tree.parent_of(&cow("b")), Some(&cow("a")));
    }

    #[test]
    fn test_remove_reparents_children() {
        let mut tree = InfectionTree::new();
        tree.insert(Node::Root, cow("a"));
        tree.insert(cow("a"), cow("b"));
        tree.insert(cow("a"), cow("c"));
        tree.insert(cow("b"), cow("d"));

        tree.remove(&cow("a"));

        assert!(!tree.contains(&cow("a")));
        assert_eq!(tree.parent_of(&cow("b")), Some(&Node::Root));
        assert_eq!(tree.parent_of(&cow("c")), Some(&Node::Root));
        // Grandchild keeps its own parent.
        assert_eq!(tree.parent_of(&cow("d")), Some(&cow("b")));
        let root_children: Vec<_> = tree.children_of(&Node::Root).cloned().collect();
        assert!(root_children.contains(&cow("b")));
        assert!(root_children.contains(&cow("c")));
    }

    #[test]
    fn test_every_node_has_one_parent() {
        let mut tree = InfectionTree::new();
        tree.insert(Node::Root, cow("a"));
        tree.insert(cow("a"), cow("b"));
        tree.insert(cow("b"), cow("c"));
        for name in ["a", "b", "c"] {
            assert!(tree.parent_of(&cow(name)).is_some());
        }
        assert!(tree.parent_of(&Node::Root).is_none());
    }

    #[test]
    fn test_remove_unknown_is_ignored() {
        let mut tree = InfectionTree::new();
        tree.insert(Node::Root, cow("a"));
        tree.remove(&cow("ghost"));
        assert_eq!(tree.len(), 1);
    }
}
