use super::{children_of_kind, field_parameter, node_text};
use crate::parser::language::{LanguageId, LanguageSupport};
use crate::parser::{Parameter, SymbolKind};
use tree_sitter::{Language, Node};

pub struct CSharp;

impl LanguageSupport for CSharp {
    fn id(&self) -> LanguageId {
        LanguageId::CSharp
    }

    fn grammar(&self) -> Language {
        tree_sitter_c_sharp::language()
    }

    fn call_pattern(&self) -> &'static str {
        "(invocation_expression) @call\n(object_creation_expression) @call"
    }

    fn declaration_kind(&self, node: Node, _source: &[u8]) -> Option<SymbolKind> {
        let kind = match node.kind() {
            "class_declaration" | "record_declaration" => SymbolKind::Class,
            "struct_declaration" | "record_struct_declaration" => SymbolKind::Struct,
            "interface_declaration" => SymbolKind::Interface,
            "enum_declaration" => SymbolKind::Enum,
            "method_declaration" | "constructor_declaration" | "destructor_declaration" => {
                SymbolKind::Method
            }
            "local_function_statement" => SymbolKind::Function,
            "namespace_declaration" | "file_scoped_namespace_declaration" => SymbolKind::Module,
            "property_declaration" | "variable_declarator" => SymbolKind::Variable,
            "delegate_declaration" => SymbolKind::TypeAlias,
            _ => return None,
        };
        Some(kind)
    }

    /// Field declarators sit two levels below the statement carrying modifiers
    fn anchor<'t>(&self, node: Node<'t>) -> Node<'t> {
        if node.kind() != "variable_declarator" {
            return node;
        }
        let declaration = node.parent().filter(|p| p.kind() == "variable_declaration");
        declaration
            .and_then(|d| d.parent())
            .unwrap_or(node)
    }

    fn parameter(&self, node: Node, source: &[u8]) -> Vec<Parameter> {
        match node.kind() {
            "parameter" => field_parameter(node, source)
                .map(|mut p| {
                    let mut cursor = node.walk();
                    let clause = node
                        .named_children(&mut cursor)
                        .find(|c| c.kind() == "equals_value_clause");
                    p.default_value = clause
                        .and_then(|c| c.named_child(0))
                        .map(|v| node_text(v, source));
                    p
                })
                .into_iter()
                .collect(),
            // `params T[] name` is not wrapped in a parameter node
            "identifier" => vec![Parameter {
                name: node_text(node, source),
                type_annotation: node
                    .prev_named_sibling()
                    .filter(|t| t.kind() != "parameter" && t.kind() != "attribute_list")
                    .map(|t| node_text(t, source)),
                default_value: None,
            }],
            _ => Vec::new(),
        }
    }

    fn return_type(&self, node: Node, source: &[u8]) -> Option<String> {
        if !matches!(node.kind(), "method_declaration" | "local_function_statement") {
            return None;
        }
        node.child_by_field_name("returns")
            .or_else(|| node.child_by_field_name("type"))
            .map(|t| node_text(t, source))
    }

    fn is_async(&self, node: Node, source: &[u8]) -> bool {
        self.modifiers(node, source).iter().any(|m| m == "async")
    }

    fn decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        children_of_kind(self.anchor(node), source, &["attribute_list"])
    }

    fn modifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        children_of_kind(self.anchor(node), source, &["modifier"])
    }
}
