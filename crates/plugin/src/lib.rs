use std::fmt::Debug;
use tree_sitter::{Language, Node};

/// A grammar-backed language the extractor can parse.
///
/// Handlers are registered with the extractor in priority order; the order
/// also decides which handler wins when content of unknown language is
/// probed against all of them.
pub trait LanguageHandler: Send + Sync + Debug {
    /// Stable identifier, also used as the corpus directory name.
    fn id(&self) -> &str;

    /// File extensions (without the dot) this handler claims.
    fn extensions(&self) -> &[&str];

    fn grammar(&self) -> Language;

    /// Filter hook applied to every node before it enters a tree.
    ///
    /// Returning `None` drops the node together with its subtree. The
    /// default keeps every node unchanged.
    fn classify(&self, symbol: u16, field: u16) -> Option<(u16, u16)> {
        Some((symbol, field))
    }

    /// Human-meaningful name of a node for name-verified matching.
    ///
    /// `None` means the node kind carries no name. Kinds that do carry one
    /// but lack the expected child yield an empty string.
    fn deep_name(&self, _node: &Node<'_>, _source: &[u8]) -> Option<String> {
        None
    }
}

/// UTF-8 text of a node, lossy on invalid input.
pub fn node_text(node: &Node<'_>, source: &[u8]) -> String {
    source
        .get(node.byte_range())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

/// Text of a named field child, or an empty string when it is absent.
pub fn field_text(node: &Node<'_>, field: &str, source: &[u8]) -> String {
    node.child_by_field_name(field)
        .map(|child| node_text(&child, source))
        .unwrap_or_default()
}
