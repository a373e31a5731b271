//! C and C++ support backed by `tree-sitter-cpp`.

use clonescope_plugin::{LanguageHandler, field_text, node_text};
use tree_sitter::{Language, Node};

#[derive(Debug, Default, Clone, Copy)]
pub struct CppHandler;

impl CppHandler {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageHandler for CppHandler {
    fn id(&self) -> &str {
        "cpp"
    }

    fn extensions(&self) -> &[&str] {
        &["cpp", "hpp", "c", "h", "cc", "hh", "cxx", "hxx"]
    }

    fn grammar(&self) -> Language {
        tree_sitter_cpp::LANGUAGE.into()
    }

    fn deep_name(&self, node: &Node<'_>, source: &[u8]) -> Option<String> {
        match node.kind() {
            "string_literal" | "number_literal" | "primitive_type" | "type_identifier" => {
                Some(node_text(node, source))
            }
            "class_specifier" => Some(field_text(node, "name", source)),
            "function_definition" => Some(
                node.child_by_field_name("declarator")
                    .map(|declarator| field_text(&declarator, "declarator", source))
                    .unwrap_or_default(),
            ),
            "call_expression" => Some(call_target(node, source)),
            _ => None,
        }
    }
}

/// Name of the function a call expression invokes.
///
/// Member calls resolve to the member name, so `obj.run()` and `ptr->run()`
/// both yield `run`. Any other callee yields its own text, never the arguments.
fn call_target(node: &Node<'_>, source: &[u8]) -> String {
    let Some(function) = node.child_by_field_name("function") else {
        return String::new();
    };
    match function.kind() {
        "field_expression" => field_text(&function, "field", source),
        _ => node_text(&function, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn names_of(source: &str, kind: &str) -> Vec<String> {
        let handler = CppHandler::new();
        let mut parser = Parser::new();
        parser.set_language(&handler.grammar()).unwrap();
        let tree = parser.parse(source, None).unwrap();

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

    #[test]
    fn test_literals_and_types() {
        let source = r#"int main() { const char *s = "hi"; double d = 2.5; Foo f; }"#;
        assert_eq!(names_of(source, "string_literal"), vec!["\"hi\""]);
        assert_eq!(names_of(source, "number_literal"), vec!["2.5"]);
        assert_eq!(names_of(source, "primitive_type"), vec!["int", "char", "double"]);
        assert_eq!(names_of(source, "type_identifier"), vec!["Foo"]);
    }

    #[test]
    fn test_class_and_function_names() {
        let source = "class Widget { int size; };\nint area(int w) { return w; }\n";
        assert_eq!(names_of(source, "class_specifier"), vec!["Widget"]);
        assert_eq!(names_of(source, "function_definition"), vec!["area"]);
    }

    #[test]
    fn test_call_targets() {
        let source = "void f() { run(); ns::go(); obj.stop(); ptr->halt(); }";
        assert_eq!(
            names_of(source, "call_expression"),
            vec!["run", "ns::go", "stop", "halt"]
        );

        let source = "void f() { g<int>(alpha); (*fp)(alpha); }";
        assert_eq!(names_of(source, "call_expression"), vec!["g<int>", "(*fp)"]);
    }

    #[test]
    fn test_call_target_ignores_arguments() {
        let before = names_of("void f() { g<int>(alpha); }", "call_expression");
        let after = names_of("void f() { g<int>(beta); }", "call_expression");
        assert_eq!(before, after);
    }

    #[test]
    fn test_nodes_without_names() {
        let handler = CppHandler::new();
        let mut parser = Parser::new();
        parser.set_language(&handler.grammar()).unwrap();
        let tree = parser.parse("int x;", None).unwrap();
        assert_eq!(handler.deep_name(&tree.root_node(), b"int x;"), None);
    }

    #[test]
    fn test_classify_is_passthrough() {
        let handler = CppHandler::new();
        assert_eq!(handler.classify(42, 7), Some((42, 7)));
        assert!(handler.extensions().contains(&"hpp"));
    }
}
