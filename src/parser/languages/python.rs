use super::{children_of_kind, field_parameter, node_text};
use crate::parser::language::{LanguageId, LanguageSupport};
use crate::parser::{Parameter, SymbolKind};
use tree_sitter::{Language, Node};

pub struct Python;

impl LanguageSupport for Python {
    fn id(&self) -> LanguageId {
        LanguageId::Python
    }

    fn grammar(&self) -> Language {
        tree_sitter_python::language()
    }

    fn call_pattern(&self) -> &'static str {
        "(call) @call"
    }

    fn declaration_kind(&self, node: Node, _source: &[u8]) -> Option<SymbolKind> {
        match node.kind() {
            "function_definition" => Some(SymbolKind::Function),
            "class_definition" => Some(SymbolKind::Class),
            // Plain `name = value` statements only; attribute and tuple targets are not declarations
            "assignment"
                if node.parent().map(|p| p.kind()) == Some("expression_statement")
                    && node.child_by_field_name("left").map(|l| l.kind()) == Some("identifier") =>
            {
                Some(SymbolKind::Variable)
            }
            _ => None,
        }
    }

    fn name(&self, node: Node, source: &[u8]) -> Option<String> {
        let field = if node.kind() == "assignment" { "left" } else { "name" };
        node.child_by_field_name(field).map(|n| node_text(n, source))
    }

    fn anchor<'t>(&self, node: Node<'t>) -> Node<'t> {
        match node.parent() {
            Some(parent)
                if matches!(parent.kind(), "decorated_definition" | "expression_statement") =>
            {
                parent
            }
            _ => node,
        }
    }

    /// Decorated definitions start at their first decorator
    fn extent<'t>(&self, node: Node<'t>) -> Node<'t> {
        match node.parent() {
            Some(parent) if parent.kind() == "decorated_definition" => parent,
            _ => node,
        }
    }

    fn parameter(&self, node: Node, source: &[u8]) -> Vec<Parameter> {
        match node.kind() {
            "keyword_separator" | "positional_separator" => Vec::new(),
            "typed_parameter" => {
                let name = node
                    .named_child(0)
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                vec![Parameter {
                    name,
                    type_annotation: node.child_by_field_name("type").map(|t| node_text(t, source)),
                    default_value: None,
                }]
            }
            _ => field_parameter(node, source).into_iter().collect(),
        }
    }

    /// First statement of the body, when it is a bare string literal
    fn docstring(&self, node: Node, source: &[u8]) -> Option<String> {
        let body = self.body(node)?;
        let first = body.named_child(0)?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let literal = first.named_child(0)?;
        if literal.kind() != "string" {
            return None;
        }
        let doc = unquote(&node_text(literal, source));
        (!doc.is_empty()).then_some(doc)
    }

    fn decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        let anchor = self.anchor(node);
        if anchor.kind() != "decorated_definition" {
            return Vec::new();
        }
        children_of_kind(anchor, source, &["decorator"])
    }

    fn modifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        if self.is_async(node, source) {
            vec!["async".to_string()]
        } else {
            Vec::new()
        }
    }
}

fn unquote(literal: &str) -> String {
    let text = literal.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"\"\"Adds numbers.\n    \"\"\""), "Adds numbers.");
        assert_eq!(unquote("r'raw'"), "raw");
        assert_eq!(unquote("\"plain\""), "plain");
    }
}
