pub mod language;
pub mod languages;
pub mod pattern_compiler;
pub mod symbol_resolver;
pub mod tree_provider;

use serde::{Deserialize, Serialize};
use std::fmt;
use tree_sitter::Tree;

pub use language::{LanguageId, LanguageRegistry, LanguageSupport};

/// Type of code symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Variable,
    Interface,
    TypeAlias,
    Struct,
    Enum,
    Module,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Variable => "variable",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Module => "module",
        }
    }

    /// Only declarations that open a scope may be recorded as a parent
    pub fn can_enclose(&self) -> bool {
        !matches!(self, SymbolKind::Variable)
    }

    /// Kinds whose nested functions are methods
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::Struct | SymbolKind::Interface | SymbolKind::Enum
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a declaration's parameter list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<String>,
    pub default_value: Option<String>,
}

impl Parameter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_annotation: None,
            default_value: None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(ty) = &self.type_annotation {
            write!(f, ": {}", ty)?;
        }
        if let Some(default) = &self.default_value {
            write!(f, " = {}", default)?;
        }
        Ok(())
    }
}

/// A named declaration with its definition range and signature metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub start_byte: usize,
    pub end_byte: usize,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
    /// Name of the tightest enclosing scope-opening symbol
    pub parent: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub docstring: Option<String>,
    pub decorators: Vec<String>,
    pub modifiers: Vec<String>,
    pub signature: String,
}

impl Symbol {
    pub fn line_span(&self) -> String {
        format!("{}-{}", self.start_line, self.end_line)
    }

    pub fn line_count(&self) -> usize {
        self.end_line + 1 - self.start_line
    }

    pub fn contains(&self, other: &Symbol) -> bool {
        self.start_byte <= other.start_byte
            && other.end_byte <= self.end_byte
            && (self.start_byte, self.end_byte) != (other.start_byte, other.end_byte)
    }
}

/// Immutable source text bound to a language
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub language: LanguageId,
    pub text: String,
}

impl SourceUnit {
    pub fn new(language: LanguageId, text: impl Into<String>) -> Self {
        Self {
            language,
            text: text.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A syntax tree together with the language and content fingerprint it came from
#[derive(Debug, Clone)]
pub struct ParsedTree {
    pub tree: Tree,
    pub language: LanguageId,
    pub fingerprint: String,
}
