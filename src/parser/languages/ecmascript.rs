use super::{children_of_kind, doc_comment, node_text, strip_annotation};
use crate::parser::language::{LanguageId, LanguageSupport};
use crate::parser::{Parameter, SymbolKind};
use tree_sitter::{Language, Node};

const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function",
    "function_expression",
    "generator_function",
];

const MODIFIER_TOKENS: &[&str] = &[
    "static",
    "async",
    "readonly",
    "abstract",
    "override",
    "declare",
    "get",
    "set",
    "accessibility_modifier",
];

/// JavaScript, TypeScript and TSX share one grammar family
pub struct EcmaScript {
    id: LanguageId,
    grammar: fn() -> Language,
    typed: bool,
}

impl EcmaScript {
    pub fn javascript() -> Self {
        Self {
            id: LanguageId::JavaScript,
            grammar: tree_sitter_javascript::language,
            typed: false,
        }
    }

    pub fn typescript() -> Self {
        Self {
            id: LanguageId::TypeScript,
            grammar: tree_sitter_typescript::language_typescript,
            typed: true,
        }
    }

    pub fn tsx() -> Self {
        Self {
            id: LanguageId::Tsx,
            grammar: tree_sitter_typescript::language_tsx,
            typed: true,
        }
    }

    /// For `const f = () => {}` the arrow function carries the signature
    fn callable<'t>(&self, node: Node<'t>) -> Node<'t> {
        if node.kind() == "variable_declarator" {
            if let Some(value) = node.child_by_field_name("value") {
                if FUNCTION_VALUES.contains(&value.kind()) {
                    return value;
                }
            }
        }
        node
    }
}

impl LanguageSupport for EcmaScript {
    fn id(&self) -> LanguageId {
        self.id
    }

    fn grammar(&self) -> Language {
        (self.grammar)()
    }

    fn call_pattern(&self) -> &'static str {
        "(call_expression) @call\n(new_expression) @call"
    }

    fn declaration_kind(&self, node: Node, _source: &[u8]) -> Option<SymbolKind> {
        let kind = match node.kind() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                SymbolKind::Function
            }
            "class_declaration" | "abstract_class_declaration" => SymbolKind::Class,
            "class" if node.child_by_field_name("name").is_some() => SymbolKind::Class,
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                SymbolKind::Method
            }
            "variable_declarator" => {
                let name = node.child_by_field_name("name")?;
                if name.kind() != "identifier" {
                    return None;
                }
                if self.callable(node) != node {
                    SymbolKind::Function
                } else {
                    SymbolKind::Variable
                }
            }
            "field_definition" | "public_field_definition" => SymbolKind::Variable,
            "interface_declaration" if self.typed => SymbolKind::Interface,
            "type_alias_declaration" if self.typed => SymbolKind::TypeAlias,
            "enum_declaration" if self.typed => SymbolKind::Enum,
            "internal_module" | "module" if self.typed => SymbolKind::Module,
            _ => return None,
        };
        Some(kind)
    }

    fn name(&self, node: Node, source: &[u8]) -> Option<String> {
        let field = if node.kind() == "field_definition" {
            "property"
        } else {
            "name"
        };
        node.child_by_field_name(field).map(|n| node_text(n, source))
    }

    fn anchor<'t>(&self, node: Node<'t>) -> Node<'t> {
        let mut anchor = node;
        if node.kind() == "variable_declarator" {
            if let Some(statement) = node.parent() {
                anchor = statement;
            }
        }
        match anchor.parent() {
            Some(parent) if parent.kind() == "export_statement" => parent,
            _ => anchor,
        }
    }

    fn body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.callable(node).child_by_field_name("body")
    }

    fn parameter_list<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.callable(node).child_by_field_name("parameters")
    }

    fn parameters(&self, node: Node, source: &[u8]) -> Vec<Parameter> {
        let callable = self.callable(node);
        // `x => x * 2` has a bare identifier instead of a parameter list
        if let Some(single) = callable.child_by_field_name("parameter") {
            return vec![Parameter::named(node_text(single, source))];
        }
        let Some(list) = self.parameter_list(node) else {
            return Vec::new();
        };
        let mut cursor = list.walk();
        let children: Vec<Node> = list.named_children(&mut cursor).collect();
        children
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .flat_map(|c| self.parameter(c, source))
            .collect()
    }

    fn return_type(&self, node: Node, source: &[u8]) -> Option<String> {
        self.callable(node)
            .child_by_field_name("return_type")
            .map(|n| strip_annotation(&node_text(n, source)))
    }

    fn is_async(&self, node: Node, _source: &[u8]) -> bool {
        super::has_child_kind(self.callable(node), "async")
    }

    fn docstring(&self, node: Node, source: &[u8]) -> Option<String> {
        doc_comment(self.anchor(node), source, |text| text.starts_with("/**"))
    }

    fn decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        let mut decorators = Vec::new();
        let anchor = self.anchor(node);
        if anchor.kind() == "export_statement" {
            decorators.extend(children_of_kind(anchor, source, &["decorator"]));
        }
        decorators.extend(children_of_kind(node, source, &["decorator"]));
        decorators
    }

    fn modifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        let mut modifiers = Vec::new();
        let anchor = self.anchor(node);
        if anchor.kind() == "export_statement" {
            modifiers.push("export".to_string());
            if super::has_child_kind(anchor, "default") {
                modifiers.push("default".to_string());
            }
        }
        if let Some(statement) = node.parent().filter(|_| node.kind() == "variable_declarator") {
            if let Some(keyword) = statement.child(0) {
                if !keyword.is_named() {
                    modifiers.push(node_text(keyword, source));
                }
            }
        }
        modifiers.extend(children_of_kind(node, source, MODIFIER_TOKENS));
        let callable = self.callable(node);
        if callable != node && super::has_child_kind(callable, "async") {
            modifiers.push("async".to_string());
        }
        modifiers
    }
}
