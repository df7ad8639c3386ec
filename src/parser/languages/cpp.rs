use super::{children_of_kind, field_parameter, node_text};
use crate::parser::language::{LanguageId, LanguageSupport};
use crate::parser::{Parameter, SymbolKind};
use tree_sitter::{Language, Node};

const MODIFIER_KINDS: &[&str] = &[
    "storage_class_specifier",
    "type_qualifier",
    "virtual",
    "virtual_function_specifier",
    "explicit_function_specifier",
];

pub struct Cpp;

impl Cpp {
    /// Walk `declarator` fields down to the function declarator, if any
    fn function_declarator<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut current = node.child_by_field_name("declarator")?;
        loop {
            if current.kind() == "function_declarator" {
                return Some(current);
            }
            current = inner_declarator(current)?;
        }
    }

    /// The identifier a variable or data member declares
    fn variable_declarator<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut current = node.child_by_field_name("declarator")?;
        loop {
            match current.kind() {
                "identifier" | "field_identifier" => return Some(current),
                "init_declarator" | "pointer_declarator" | "array_declarator"
                | "reference_declarator" => current = inner_declarator(current)?,
                _ => return None,
            }
        }
    }
}

/// `&` declarators carry their target as a plain child
fn inner_declarator(node: Node) -> Option<Node> {
    node.child_by_field_name("declarator").or_else(|| {
        if node.kind() == "reference_declarator" {
            node.named_child(0)
        } else {
            None
        }
    })
}

impl LanguageSupport for Cpp {
    fn id(&self) -> LanguageId {
        LanguageId::Cpp
    }

    fn grammar(&self) -> Language {
        tree_sitter_cpp::language()
    }

    fn call_pattern(&self) -> &'static str {
        "(call_expression) @call"
    }

    fn declaration_kind(&self, node: Node, _source: &[u8]) -> Option<SymbolKind> {
        let has_body = node.child_by_field_name("body").is_some();
        let kind = match node.kind() {
            "function_definition" => SymbolKind::Function,
            "field_declaration" if self.function_declarator(node).is_some() => SymbolKind::Function,
            "declaration" | "field_declaration" if self.variable_declarator(node).is_some() => {
                SymbolKind::Variable
            }
            "class_specifier" if has_body => SymbolKind::Class,
            "struct_specifier" | "union_specifier" if has_body => SymbolKind::Struct,
            "enum_specifier" if has_body => SymbolKind::Enum,
            "namespace_definition" => SymbolKind::Module,
            "alias_declaration" | "type_definition" => SymbolKind::TypeAlias,
            _ => return None,
        };
        Some(kind)
    }

    fn name(&self, node: Node, source: &[u8]) -> Option<String> {
        match node.kind() {
            "function_definition" | "field_declaration" | "declaration" => {
                let Some(declarator) = self.function_declarator(node) else {
                    return self
                        .variable_declarator(node)
                        .map(|v| node_text(v, source));
                };
                let target = declarator.child_by_field_name("declarator")?;
                let text = node_text(target, source);
                Some(text.rsplit("::").next().unwrap_or(&text).to_string())
            }
            "type_definition" => node
                .child_by_field_name("declarator")
                .map(|d| node_text(d, source)),
            _ => node.child_by_field_name("name").map(|n| node_text(n, source)),
        }
    }

    fn parameter_list<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.function_declarator(node)?
            .child_by_field_name("parameters")
    }

    fn parameter(&self, node: Node, source: &[u8]) -> Vec<Parameter> {
        field_parameter(node, source)
            .map(|mut p| {
                p.name = p
                    .name
                    .trim_start_matches(|c: char| c == '*' || c == '&')
                    .trim()
                    .to_string();
                p
            })
            .into_iter()
            .collect()
    }

    fn return_type(&self, node: Node, source: &[u8]) -> Option<String> {
        self.function_declarator(node)?;
        node.child_by_field_name("type")
            .map(|t| node_text(t, source))
    }

    fn decorators(&self, _node: Node, _source: &[u8]) -> Vec<String> {
        Vec::new()
    }

    fn modifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        children_of_kind(node, source, MODIFIER_KINDS)
    }
}
