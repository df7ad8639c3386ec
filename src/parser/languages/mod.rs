//! Built-in language capabilities and the node helpers they share.

mod cpp;
mod csharp;
mod ecmascript;
mod go;
mod java;
mod python;
mod rust;

use super::language::LanguageSupport;
use super::Parameter;
use tree_sitter::Node;

pub use cpp::Cpp;
pub use csharp::CSharp;
pub use ecmascript::EcmaScript;
pub use go::Go;
pub use java::Java;
pub use python::Python;
pub use rust::Rust;

pub fn builtin() -> Vec<Box<dyn LanguageSupport>> {
    vec![
        Box::new(Python),
        Box::new(EcmaScript::javascript()),
        Box::new(EcmaScript::typescript()),
        Box::new(EcmaScript::tsx()),
        Box::new(Rust),
        Box::new(Go),
        Box::new(Java),
        Box::new(Cpp),
        Box::new(CSharp),
    ]
}

/// Node kinds that may sit between a doc comment and its declaration
const DOC_TRANSPARENT: &[&str] = &["attribute_item", "attribute_list"];

pub fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

pub fn first_identifier(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind().ends_with("identifier"));
    found.map(|n| node_text(n, source))
}

pub fn has_child_kind(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

pub fn children_of_kind(node: Node, source: &[u8], kinds: &[&str]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| kinds.contains(&c.kind()))
        .map(|c| node_text(c, source))
        .collect()
}

/// Drop a leading `:` or `->` from a type annotation
pub fn strip_annotation(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("->")
        .or_else(|| trimmed.strip_prefix(':'))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Parameter built from the common field names most grammars use
pub fn field_parameter(node: Node, source: &[u8]) -> Option<Parameter> {
    let kind = node.kind();
    if kind.ends_with("identifier") {
        return Some(Parameter::named(node_text(node, source)));
    }

    let spread = ["rest", "splat", "spread", "variadic"]
        .iter()
        .any(|marker| kind.contains(marker));
    let name = if spread {
        None
    } else {
        ["name", "pattern", "left", "declarator"]
            .iter()
            .find_map(|field| node.child_by_field_name(field))
            .map(|n| node_text(n, source))
            .or_else(|| first_identifier(node, source))
    };

    let type_annotation = if spread {
        None
    } else {
        node.child_by_field_name("type")
            .map(|n| strip_annotation(&node_text(n, source)))
    };
    let default_value = ["value", "default_value", "right"]
        .iter()
        .find_map(|field| node.child_by_field_name(field))
        .map(|n| node_text(n, source));

    let name = name.unwrap_or_else(|| node_text(node, source));
    if name.trim().is_empty() {
        return None;
    }
    Some(Parameter {
        name,
        type_annotation,
        default_value,
    })
}

/// Collect the comment block immediately above `anchor`. Stops at a blank
/// line or at the first comment `accept` rejects.
pub fn doc_comment(anchor: Node, source: &[u8], accept: impl Fn(&str) -> bool) -> Option<String> {
    let mut expected_row = anchor.start_position().row;
    let mut collected = Vec::new();
    let mut sibling = anchor.prev_sibling();

    while let Some(node) = sibling {
        if node.end_position().row + 1 < expected_row {
            break;
        }
        let kind = node.kind();
        if kind.contains("comment") {
            let text = node_text(node, source);
            if !accept(text.trim_start()) {
                break;
            }
            collected.push(clean_comment(&text));
        } else if !DOC_TRANSPARENT.contains(&kind) {
            break;
        }
        expected_row = node.start_position().row;
        sibling = node.prev_sibling();
    }

    collected.reverse();
    let doc = collected
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!doc.is_empty()).then_some(doc)
}

/// Strip comment delimiters and leading gutters
pub fn clean_comment(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            let mut line = line.trim();
            for prefix in ["///", "//!", "//", "/**", "/*", "#"] {
                if let Some(rest) = line.strip_prefix(prefix) {
                    line = rest;
                    break;
                }
            }
            line = line.strip_suffix("*/").unwrap_or(line).trim();
            line.strip_prefix('*').unwrap_or(line).trim().to_string()
        })
        .collect();

    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}
