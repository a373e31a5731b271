//! Arena-backed structural trees.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. The first
//! node pushed is the root. Identifier names are interned per tree.

use clonescope_api::StructuralKey;
use lasso::{Rodeo, Spur};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// Keys and lines only.
    Shallow,
    /// Keys, lines and identifier names.
    Deep,
}

#[derive(Debug, Clone)]
pub struct StructuralNode {
    pub key: StructuralKey,
    /// 1-based source line, 0 when unknown (e.g. rebuilt from storage).
    pub line: u32,
    pub name: Option<Spur>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct StructuralTree {
    nodes: Vec<StructuralNode>,
    names: Rodeo,
    mode: TraversalMode,
}

impl StructuralTree {
    /// Creates a tree holding only its root.
    pub fn new(root_key: StructuralKey, line: u32, mode: TraversalMode) -> Self {
        Self {
            nodes: vec![StructuralNode {
                key: root_key,
                line,
                name: None,
                parent: None,
                children: Vec::new(),
            }],
            names: Rodeo::default(),
            mode,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &StructuralNode {
        &self.nodes[id.index()]
    }

    pub fn key(&self, id: NodeId) -> StructuralKey {
        self.nodes[id.index()].key
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()]
            .name
            .map(|spur| self.names.resolve(&spur))
    }

    /// Appends a child under `parent`. The name is only kept in deep trees.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        key: StructuralKey,
        line: u32,
        name: Option<&str>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let name = match self.mode {
            TraversalMode::Deep => name.map(|n| self.names.get_or_intern(n)),
            TraversalMode::Shallow => None,
        };
        self.nodes.push(StructuralNode {
            key,
            line,
            name,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Pre-order walk starting at the root.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root()],
        }
    }

    /// Equality of keys, names and child order, ignoring lines.
    pub fn structurally_eq(&self, other: &StructuralTree) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut pending = vec![(self.root(), other.root())];
        while let Some((a, b)) = pending.pop() {
            let (left, right) = (self.node(a), other.node(b));
            if left.key != right.key
                || left.children.len() != right.children.len()
                || self.name(a) != other.name(b)
            {
                return false;
            }
            pending.extend(left.children.iter().copied().zip(right.children.iter().copied()));
        }
        true
    }
}

pub struct Preorder<'a> {
    tree: &'a StructuralTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(symbol: u16) -> StructuralKey {
        StructuralKey::new(symbol, 0)
    }

    #[test]
    fn test_preorder_and_parent_links() {
        let mut tree = StructuralTree::new(key(1), 1, TraversalMode::Shallow);
        let root = tree.root();
        let a = tree.add_child(root, key(2), 1, None);
        let b = tree.add_child(root, key(3), 2, None);
        let a1 = tree.add_child(a, key(4), 1, None);

        let order: Vec<_> = tree.preorder().map(|id| tree.key(id).symbol()).collect();
        assert_eq!(order, vec![1, 2, 4, 3]);
        assert_eq!(tree.parent(a1), Some(a));
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_names_only_kept_in_deep_trees() {
        let mut shallow = StructuralTree::new(key(1), 1, TraversalMode::Shallow);
        let id = shallow.add_child(shallow.root(), key(2), 1, Some("foo"));
        assert_eq!(shallow.name(id), None);

        let mut deep = StructuralTree::new(key(1), 1, TraversalMode::Deep);
        let first = deep.add_child(deep.root(), key(2), 1, Some("foo"));
        let second = deep.add_child(deep.root(), key(2), 2, Some("foo"));
        assert_eq!(deep.name(first), Some("foo"));
        assert_eq!(deep.node(first).name, deep.node(second).name);
    }

    #[test]
    fn test_structural_equality_ignores_lines() {
        let mut left = StructuralTree::new(key(1), 1, TraversalMode::Deep);
        left.add_child(left.root(), key(2), 3, Some("x"));
        let mut right = StructuralTree::new(key(1), 10, TraversalMode::Deep);
        right.add_child(right.root(), key(2), 30, Some("x"));
        assert!(left.structurally_eq(&right));

        let mut renamed = StructuralTree::new(key(1), 1, TraversalMode::Deep);
        renamed.add_child(renamed.root(), key(2), 3, Some("y"));
        assert!(!left.structurally_eq(&renamed));
    }
}
