use clonescope_plugin::{LanguageHandler, field_text, node_text};
use tree_sitter::{Language, Node};

/// Java support backed by `tree-sitter-java`.
///
/// Comments are dropped from structural trees so that documentation edits
/// do not break otherwise identical code.
#[derive(Debug, Clone)]
pub struct JavaHandler {
    comment_symbols: [u16; 2],
}

impl Default for JavaHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaHandler {
    pub fn new() -> Self {
        let language: Language = tree_sitter_java::LANGUAGE.into();
        Self {
            comment_symbols: [
                language.id_for_node_kind("line_comment", true),
                language.id_for_node_kind("block_comment", true),
            ],
        }
    }
}

impl LanguageHandler for JavaHandler {
    fn id(&self) -> &str {
        "java"
    }

    fn extensions(&self) -> &[&str] {
        &["java"]
    }

    fn grammar(&self) -> Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn classify(&self, symbol: u16, field: u16) -> Option<(u16, u16)> {
        if self.comment_symbols.contains(&symbol) {
            None
        } else {
            Some((symbol, field))
        }
    }

    fn deep_name(&self, node: &Node<'_>, source: &[u8]) -> Option<String> {
        match node.kind() {
            "string_literal"
            | "character_literal"
            | "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal"
            | "decimal_floating_point_literal"
            | "hex_floating_point_literal"
            | "integral_type"
            | "floating_point_type"
            | "boolean_type"
            | "void_type"
            | "type_identifier" => Some(node_text(node, source)),
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "method_declaration"
            | "constructor_declaration"
            | "method_invocation" => Some(field_text(node, "name", source)),
            "object_creation_expression" => Some(field_text(node, "type", source)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(&JavaHandler::new().grammar()).unwrap();
        parser.parse(source, None).unwrap()
    }

    fn names_of(source: &str, kind: &str) -> Vec<String> {
        let handler = JavaHandler::new();
        let tree = parse(source);
        let mut names = Vec::new();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.kind() == kind {
                names.push(handler.deep_name(&node, source.as_bytes()).unwrap());
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        names
    }

    const SOURCE: &str = r#"
class Account {
    // balance in cents
    long balance;

    /* Adds funds. */
    void deposit(int amount) {
        log("deposit");
        this.audit.record(amount, 0x10);
        Object o = new Receipt();
    }
}
"#;

    #[test]
    fn test_declaration_names() {
        assert_eq!(names_of(SOURCE, "class_declaration"), vec!["Account"]);
        assert_eq!(names_of(SOURCE, "method_declaration"), vec!["deposit"]);
    }

    #[test]
    fn test_invocation_names() {
        assert_eq!(names_of(SOURCE, "method_invocation"), vec!["log", "record"]);
        assert_eq!(names_of(SOURCE, "object_creation_expression"), vec!["Receipt"]);
    }

    #[test]
    fn test_literal_and_type_names() {
        assert_eq!(names_of(SOURCE, "string_literal"), vec!["\"deposit\""]);
        assert_eq!(names_of(SOURCE, "hex_integer_literal"), vec!["0x10"]);
        assert_eq!(names_of(SOURCE, "integral_type"), vec!["long", "int"]);
        assert_eq!(names_of(SOURCE, "void_type"), vec!["void"]);
    }

    #[test]
    fn test_comments_are_dropped() {
        let handler = JavaHandler::new();
        let tree = parse(SOURCE);
        let mut comments = 0;
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.kind().ends_with("_comment") {
                comments += 1;
                assert_eq!(handler.classify(node.kind_id(), 0), None);
            } else {
                assert!(handler.classify(node.kind_id(), 3).is_some());
            }
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor).collect::<Vec<_>>());
        }
        assert_eq!(comments, 2);
    }

    #[test]
    fn test_unnamed_kinds() {
        let handler = JavaHandler::new();
        let tree = parse(SOURCE);
        assert_eq!(handler.deep_name(&tree.root_node(), SOURCE.as_bytes()), None);
    }
}
