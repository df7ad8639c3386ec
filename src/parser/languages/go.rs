use super::{doc_comment, node_text};
use crate::parser::language::{LanguageId, LanguageSupport};
use crate::parser::{Parameter, SymbolKind};
use tree_sitter::{Language, Node};

pub struct Go;

impl LanguageSupport for Go {
    fn id(&self) -> LanguageId {
        LanguageId::Go
    }

    fn grammar(&self) -> Language {
        tree_sitter_go::language()
    }

    fn call_pattern(&self) -> &'static str {
        "(call_expression) @call"
    }

    fn declaration_kind(&self, node: Node, _source: &[u8]) -> Option<SymbolKind> {
        let kind = match node.kind() {
            "function_declaration" => SymbolKind::Function,
            "method_declaration" => SymbolKind::Method,
            "type_spec" => match node.child_by_field_name("type").map(|t| t.kind()) {
                Some("struct_type") => SymbolKind::Struct,
                Some("interface_type") => SymbolKind::Interface,
                _ => SymbolKind::TypeAlias,
            },
            "type_alias" => SymbolKind::TypeAlias,
            "const_spec" | "var_spec" => SymbolKind::Variable,
            _ => return None,
        };
        Some(kind)
    }

    /// A lone spec is documented on its enclosing `type`/`var`/`const` keyword
    fn anchor<'t>(&self, node: Node<'t>) -> Node<'t> {
        match node.parent() {
            Some(parent)
                if matches!(
                    parent.kind(),
                    "type_declaration" | "const_declaration" | "var_declaration"
                ) && parent.named_child_count() == 1 =>
            {
                parent
            }
            _ => node,
        }
    }

    fn parameter(&self, node: Node, source: &[u8]) -> Vec<Parameter> {
        let type_annotation = node
            .child_by_field_name("type")
            .map(|t| node_text(t, source));
        let type_annotation = if node.kind() == "variadic_parameter_declaration" {
            type_annotation.map(|t| format!("...{}", t))
        } else {
            type_annotation
        };

        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| node_text(n, source))
            .collect();

        if names.is_empty() {
            // Unnamed parameter: only the type is written
            return type_annotation.map(Parameter::named).into_iter().collect();
        }
        names
            .into_iter()
            .map(|name| Parameter {
                name,
                type_annotation: type_annotation.clone(),
                default_value: None,
            })
            .collect()
    }

    fn return_type(&self, node: Node, source: &[u8]) -> Option<String> {
        node.child_by_field_name("result")
            .map(|r| node_text(r, source))
    }

    fn docstring(&self, node: Node, source: &[u8]) -> Option<String> {
        doc_comment(self.anchor(node), source, |text| text.starts_with("//"))
    }

    fn decorators(&self, _node: Node, _source: &[u8]) -> Vec<String> {
        Vec::new()
    }

    fn modifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        node.child_by_field_name("receiver")
            .map(|r| node_text(r, source))
            .into_iter()
            .collect()
    }
}
