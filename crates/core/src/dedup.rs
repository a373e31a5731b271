//! Hash-consing of structural trees.
//!
//! [`reduce`] maps every structurally identical subtree of a batch onto one
//! [`DedupEntry`]; [`rebuild`] expands the table back into independent trees.
//!
//! Child index list layout:
//! `[R, root_0 .. root_{R-1}, children(entry_0), children(entry_1), ...]`
//! where each entry's children are listed in table order. Entries are created
//! in post-order, so every child index is smaller than its parent's.

use crate::error::BlobError;
use crate::model::{NodeId, StructuralTree, TraversalMode};
use clonescope_api::StructuralKey;
use std::collections::HashMap;
use xxhash_rust::xxh3::Xxh3DefaultBuilder;

/// One unique node shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupEntry {
    pub key: StructuralKey,
    pub child_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupTable {
    entries: Vec<DedupEntry>,
}

impl DedupTable {
    pub fn from_entries(entries: Vec<DedupEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DedupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildIndexList(Vec<u32>);

impl ChildIndexList {
    pub fn from_vec(indices: Vec<u32>) -> Self {
        Self(indices)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn root_count(&self) -> usize {
        self.0.first().copied().unwrap_or(0) as usize
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A deduplicated batch of trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupedForest {
    pub table: DedupTable,
    pub indices: ChildIndexList,
}

#[derive(Hash, PartialEq, Eq)]
struct Shape {
    key: StructuralKey,
    children: Vec<u32>,
}

#[derive(Default)]
struct Deduplicator {
    entries: Vec<DedupEntry>,
    children: Vec<Vec<u32>>,
    lookup: HashMap<Shape, u32, Xxh3DefaultBuilder>,
}

impl Deduplicator {
    fn push(&mut self, key: StructuralKey, children: Vec<u32>) -> u32 {
        let idx = self.entries.len() as u32;
        self.entries.push(DedupEntry {
            key,
            child_count: children.len() as u32,
        });
        self.children.push(children);
        idx
    }

    fn intern(&mut self, key: StructuralKey, children: Vec<u32>) -> u32 {
        let shape = Shape { key, children };
        if let Some(&idx) = self.lookup.get(&shape) {
            return idx;
        }
        let idx = self.push(key, shape.children.clone());
        self.lookup.insert(shape, idx);
        idx
    }

    /// Post-order walk of one tree. The root always gets a fresh entry.
    fn add_tree(&mut self, tree: &StructuralTree) -> u32 {
        let root = tree.root();
        let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
        let mut done: Vec<u32> = Vec::new();

        while let Some((id, expanded)) = stack.pop() {
            let children = tree.children(id);
            if !expanded {
                stack.push((id, true));
                stack.extend(children.iter().rev().map(|&child| (child, false)));
                continue;
            }

            let child_ids = done.split_off(done.len() - children.len());
            let idx = if id == root {
                self.push(tree.key(id), child_ids)
            } else {
                self.intern(tree.key(id), child_ids)
            };
            done.push(idx);
        }

        done.pop().unwrap_or_default()
    }

    fn finish(self, roots: Vec<u32>) -> DedupedForest {
        let total: usize = self.children.iter().map(Vec::len).sum();
        let mut indices = Vec::with_capacity(1 + roots.len() + total);
        indices.push(roots.len() as u32);
        indices.extend(roots);
        for children in self.children {
            indices.extend(children);
        }
        DedupedForest {
            table: DedupTable::from_entries(self.entries),
            indices: ChildIndexList(indices),
        }
    }
}

/// Hash-conses a batch of trees into one shared table.
pub fn reduce<'a>(roots: impl IntoIterator<Item = &'a StructuralTree>) -> DedupedForest {
    let mut dedup = Deduplicator::default();
    let root_ids: Vec<u32> = roots.into_iter().map(|tree| dedup.add_tree(tree)).collect();
    tracing::trace!(
        "Reduced {} trees into {} unique shapes",
        root_ids.len(),
        dedup.entries.len()
    );
    dedup.finish(root_ids)
}

/// Expands a table back into one shallow tree per root.
///
/// Shared entries are cloned per occurrence, so the returned trees share
/// nothing with each other.
pub fn rebuild(forest: &DedupedForest) -> Result<Vec<StructuralTree>, BlobError> {
    let entries = forest.table.entries();
    let indices = forest.indices.as_slice();

    let Some((&root_count, rest)) = indices.split_first() else {
        return Err(BlobError::Malformed("empty child index list".into()));
    };
    let root_count = root_count as usize;
    if rest.len() < root_count {
        return Err(BlobError::Malformed(format!(
            "{} roots declared but only {} indices present",
            root_count,
            rest.len()
        )));
    }
    let (roots, mut remaining) = rest.split_at(root_count);

    let mut child_slices: Vec<&[u32]> = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let count = entry.child_count as usize;
        if remaining.len() < count {
            return Err(BlobError::Malformed(format!(
                "entry {} expects {} children, {} indices left",
                idx,
                count,
                remaining.len()
            )));
        }
        let (children, tail) = remaining.split_at(count);
        if let Some(&bad) = children.iter().find(|&&child| child as usize >= idx) {
            return Err(BlobError::Malformed(format!(
                "entry {} references child {} out of order",
                idx, bad
            )));
        }
        child_slices.push(children);
        remaining = tail;
    }
    if !remaining.is_empty() {
        return Err(BlobError::Malformed(format!(
            "{} trailing child indices",
            remaining.len()
        )));
    }

    roots
        .iter()
        .map(|&root| {
            let root = root as usize;
            let entry = entries.get(root).ok_or_else(|| {
                BlobError::Malformed(format!("root index {} outside table", root))
            })?;

            let mut tree = StructuralTree::new(entry.key, 0, TraversalMode::Shallow);
            let mut stack = vec![(root, tree.root())];
            while let Some((entry_idx, node)) = stack.pop() {
                for &child in child_slices[entry_idx] {
                    let child = child as usize;
                    let id = tree.add_child(node, entries[child].key, 0, None);
                    stack.push((child, id));
                }
            }
            Ok(tree)
        })
        .collect()
}
