use crate::model::{NodeId, StructuralTree, TraversalMode};
use clonescope_api::StructuralKey;
use clonescope_plugin::LanguageHandler;
use tree_sitter::{Tree, TreeCursor};

pub(super) struct TreeWalker<'a> {
    pub handler: &'a dyn LanguageHandler,
    pub source: &'a [u8],
    pub mode: TraversalMode,
    pub max_depth: usize,
}

impl TreeWalker<'_> {
    pub fn walk(&self, tree: &Tree) -> StructuralTree {
        let root = tree.root_node();
        let mut structural = StructuralTree::new(
            StructuralKey::new(root.kind_id(), 0),
            line_of(&root),
            self.mode,
        );

        let mut cursor = root.walk();
        let root_id = structural.root();
        if cursor.goto_first_child() {
            self.walk_siblings(&mut cursor, &mut structural, root_id, 1);
            cursor.goto_parent();
        }
        structural
    }

    /// Visits the cursor's node and its following siblings.
    fn walk_siblings(
        &self,
        cursor: &mut TreeCursor<'_>,
        tree: &mut StructuralTree,
        parent: NodeId,
        depth: usize,
    ) {
        if depth >= self.max_depth {
            return;
        }
        loop {
            self.visit(cursor, tree, parent, depth);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    fn visit(
        &self,
        cursor: &mut TreeCursor<'_>,
        tree: &mut StructuralTree,
        parent: NodeId,
        depth: usize,
    ) {
        let node = cursor.node();
        let field = cursor.field_id().map_or(0, |id| id.get());
        let Some((symbol, field)) = self.handler.classify(node.kind_id(), field) else {
            return;
        };

        let name = match self.mode {
            TraversalMode::Deep => self.handler.deep_name(&node, self.source),
            TraversalMode::Shallow => None,
        };
        let id = tree.add_child(
            parent,
            StructuralKey::new(symbol, field),
            line_of(&node),
            name.as_deref(),
        );

        if cursor.goto_first_child() {
            self.walk_siblings(cursor, tree, id, depth + 1);
            cursor.goto_parent();
        }
    }
}

fn line_of(node: &tree_sitter::Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}
