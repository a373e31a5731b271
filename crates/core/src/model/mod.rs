pub mod tree;

pub use tree::{NodeId, StructuralNode, StructuralTree, TraversalMode};
