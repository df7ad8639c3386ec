use super::node_text;
use crate::parser::language::{LanguageId, LanguageSupport};
use crate::parser::SymbolKind;
use tree_sitter::{Language, Node};

const ANNOTATIONS: &[&str] = &["marker_annotation", "annotation"];

pub struct Java;

impl Java {
    /// Annotations and keywords live together in the `modifiers` node
    fn modifier_nodes<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let owner = self.anchor(node);
        let mut cursor = owner.walk();
        let modifiers = owner
            .children(&mut cursor)
            .find(|c| c.kind() == "modifiers");
        match modifiers {
            Some(m) => {
                let mut inner = m.walk();
                let children: Vec<Node<'t>> = m.children(&mut inner).collect();
                children
            }
            None => Vec::new(),
        }
    }
}

impl LanguageSupport for Java {
    fn id(&self) -> LanguageId {
        LanguageId::Java
    }

    fn grammar(&self) -> Language {
        tree_sitter_java::language()
    }

    fn call_pattern(&self) -> &'static str {
        "(method_invocation) @call\n(object_creation_expression) @call"
    }

    fn declaration_kind(&self, node: Node, _source: &[u8]) -> Option<SymbolKind> {
        let kind = match node.kind() {
            "class_declaration" | "record_declaration" => SymbolKind::Class,
            "interface_declaration" | "annotation_type_declaration" => SymbolKind::Interface,
            "enum_declaration" => SymbolKind::Enum,
            "method_declaration" | "constructor_declaration" => SymbolKind::Method,
            "variable_declarator" => SymbolKind::Variable,
            _ => return None,
        };
        Some(kind)
    }

    fn anchor<'t>(&self, node: Node<'t>) -> Node<'t> {
        if node.kind() == "variable_declarator" {
            if let Some(declaration) = node.parent() {
                return declaration;
            }
        }
        node
    }

    fn return_type(&self, node: Node, source: &[u8]) -> Option<String> {
        if node.kind() != "method_declaration" {
            return None;
        }
        node.child_by_field_name("type")
            .map(|t| node_text(t, source))
    }

    fn decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        self.modifier_nodes(node)
            .into_iter()
            .filter(|m| ANNOTATIONS.contains(&m.kind()))
            .map(|m| node_text(m, source))
            .collect()
    }

    fn modifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        self.modifier_nodes(node)
            .into_iter()
            .filter(|m| !ANNOTATIONS.contains(&m.kind()) && !m.kind().contains("comment"))
            .map(|m| node_text(m, source))
            .collect()
    }
}
