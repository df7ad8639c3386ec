use super::node_text;
use crate::parser::language::{LanguageId, LanguageSupport};
use crate::parser::SymbolKind;
use tree_sitter::{Language, Node};

pub struct Rust;

impl LanguageSupport for Rust {
    fn id(&self) -> LanguageId {
        LanguageId::Rust
    }

    fn grammar(&self) -> Language {
        tree_sitter_rust::language()
    }

    fn call_pattern(&self) -> &'static str {
        "(call_expression) @call\n(macro_invocation) @call"
    }

    fn declaration_kind(&self, node: Node, _source: &[u8]) -> Option<SymbolKind> {
        let kind = match node.kind() {
            "function_item" | "function_signature_item" => SymbolKind::Function,
            "struct_item" | "union_item" => SymbolKind::Struct,
            "enum_item" => SymbolKind::Enum,
            "trait_item" => SymbolKind::Interface,
            "impl_item" => SymbolKind::Class,
            "type_item" => SymbolKind::TypeAlias,
            "mod_item" => SymbolKind::Module,
            "const_item" | "static_item" => SymbolKind::Variable,
            "let_declaration"
                if node.child_by_field_name("pattern").map(|p| p.kind()) == Some("identifier") =>
            {
                SymbolKind::Variable
            }
            _ => return None,
        };
        Some(kind)
    }

    fn name(&self, node: Node, source: &[u8]) -> Option<String> {
        match node.kind() {
            // Methods of `impl Foo<T>` belong to `Foo`
            "impl_item" => node.child_by_field_name("type").map(|t| {
                let text = node_text(t, source);
                text.split('<').next().unwrap_or("").trim().to_string()
            }),
            "let_declaration" => node
                .child_by_field_name("pattern")
                .map(|p| node_text(p, source)),
            _ => node.child_by_field_name("name").map(|n| node_text(n, source)),
        }
    }

    fn is_scope_only(&self, node: Node) -> bool {
        node.kind() == "impl_item"
    }

    fn is_async(&self, node: Node, _source: &[u8]) -> bool {
        let mut cursor = node.walk();
        let modifiers = node
            .children(&mut cursor)
            .find(|c| c.kind() == "function_modifiers");
        modifiers.is_some_and(|m| super::has_child_kind(m, "async"))
    }

    /// Outer attributes directly above the item, doc comments may be interleaved
    fn decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        let mut attributes = Vec::new();
        let mut sibling = node.prev_sibling();
        while let Some(prev) = sibling {
            match prev.kind() {
                "attribute_item" => attributes.push(node_text(prev, source)),
                "line_comment" | "block_comment" => {}
                _ => break,
            }
            sibling = prev.prev_sibling();
        }
        attributes.reverse();
        attributes
    }

    fn modifiers(&self, node: Node, source: &[u8]) -> Vec<String> {
        let mut modifiers = Vec::new();
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "visibility_modifier" => modifiers.push(node_text(child, source)),
                "function_modifiers" => {
                    let mut inner = child.walk();
                    let tokens: Vec<Node> = child.children(&mut inner).collect();
                    modifiers.extend(tokens.into_iter().map(|t| node_text(t, source)));
                }
                "mutable_specifier" => modifiers.push("mut".to_string()),
                "unsafe" => modifiers.push("unsafe".to_string()),
                _ => {}
            }
        }
        // Methods carry the trait their impl block implements
        let trait_impl = node
            .parent()
            .filter(|list| list.kind() == "declaration_list")
            .and_then(|list| list.parent())
            .filter(|owner| owner.kind() == "impl_item")
            .and_then(|owner| owner.child_by_field_name("trait"));
        if let Some(tr) = trait_impl {
            modifiers.push(format!("impl {}", node_text(tr, source)));
        }
        modifiers
    }
}
