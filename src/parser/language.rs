use super::languages::{self, node_text};
use super::{Parameter, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tree_sitter::{Language, Node};

/// Languages with a registered grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageId {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    Java,
    Cpp,
    CSharp,
}

impl LanguageId {
    pub const ALL: [LanguageId; 9] = [
        LanguageId::Python,
        LanguageId::JavaScript,
        LanguageId::TypeScript,
        LanguageId::Tsx,
        LanguageId::Rust,
        LanguageId::Go,
        LanguageId::Java,
        LanguageId::Cpp,
        LanguageId::CSharp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageId::Python => "python",
            LanguageId::JavaScript => "javascript",
            LanguageId::TypeScript => "typescript",
            LanguageId::Tsx => "tsx",
            LanguageId::Rust => "rust",
            LanguageId::Go => "go",
            LanguageId::Java => "java",
            LanguageId::Cpp => "cpp",
            LanguageId::CSharp => "c_sharp",
        }
    }

    /// Language detector: map a path to a language by its extension
    pub fn detect(path: &Path) -> Option<LanguageId> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let id = match extension.as_str() {
            "py" | "pyi" => LanguageId::Python,
            "js" | "mjs" | "cjs" | "jsx" => LanguageId::JavaScript,
            "ts" | "mts" | "cts" => LanguageId::TypeScript,
            "tsx" => LanguageId::Tsx,
            "rs" => LanguageId::Rust,
            "go" => LanguageId::Go,
            "java" => LanguageId::Java,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" | "h" => LanguageId::Cpp,
            "cs" => LanguageId::CSharp,
            _ => return None,
        };
        Some(id)
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageId {
    type Err = crate::error::SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => LanguageId::Python,
            "javascript" | "js" | "jsx" => LanguageId::JavaScript,
            "typescript" | "ts" => LanguageId::TypeScript,
            "tsx" => LanguageId::Tsx,
            "rust" | "rs" => LanguageId::Rust,
            "go" | "golang" => LanguageId::Go,
            "java" => LanguageId::Java,
            "cpp" | "c++" | "cxx" => LanguageId::Cpp,
            "c_sharp" | "csharp" | "c#" | "cs" => LanguageId::CSharp,
            other => return Err(crate::error::SearchError::UnsupportedLanguage(other.to_string())),
        };
        Ok(id)
    }
}

/// What a language contributes: its grammar, its call pattern and how its
/// declarations are shaped. Shared traversal code only talks to this trait.
pub trait LanguageSupport: Send + Sync {
    fn id(&self) -> LanguageId;

    fn grammar(&self) -> Language;

    /// Query matching call sites; every match must capture `@call`
    fn call_pattern(&self) -> &'static str;

    /// The symbol kind a node declares, if it is declaration-like
    fn declaration_kind(&self, node: Node, source: &[u8]) -> Option<SymbolKind>;

    fn name(&self, node: Node, source: &[u8]) -> Option<String> {
        node.child_by_field_name("name")
            .map(|n| node_text(n, source))
            .or_else(|| languages::first_identifier(node, source))
    }

    /// The outermost node that still belongs to this declaration (export
    /// wrappers, decorator groups, declaration statements). Comments and
    /// decorators are looked up around it.
    fn anchor<'t>(&self, node: Node<'t>) -> Node<'t> {
        node
    }

    /// Scopes that only name the parent of their members, like Rust `impl`
    /// blocks. They take part in parent resolution but are not reported.
    fn is_scope_only(&self, _node: Node) -> bool {
        false
    }

    /// The node whose range is reported for this declaration
    fn extent<'t>(&self, node: Node<'t>) -> Node<'t> {
        node
    }

    fn body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("body")
    }

    fn parameter_list<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("parameters")
    }

    fn parameters(&self, node: Node, source: &[u8]) -> Vec<Parameter> {
        let Some(list) = self.parameter_list(node) else {
            return Vec::new();
        };
        let mut cursor = list.walk();
        let children: Vec<Node> = list.named_children(&mut cursor).collect();
        children
            .into_iter()
            .filter(|c| !c.kind().contains("comment"))
            .flat_map(|c| self.parameter(c, source))
            .collect()
    }

    fn parameter(&self, node: Node, source: &[u8]) -> Vec<Parameter> {
        languages::field_parameter(node, source).into_iter().collect()
    }

    fn return_type(&self, node: Node, source: &[u8]) -> Option<String> {
        node.child_by_field_name("return_type")
            .map(|n| languages::strip_annotation(&node_text(n, source)))
    }

    fn is_async(&self, node: Node, _source: &[u8]) -> bool {
        languages::has_child_kind(node, "async")
    }

    fn docstring(&self, node: Node, source: &[u8]) -> Option<String> {
        languages::doc_comment(self.anchor(node), source, |text| {
            text.starts_with("/**") || text.starts_with("///")
        })
    }

    fn decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        languages::children_of_kind(node, source, &["decorator"])
    }

    fn modifiers(&self, _node: Node, _source: &[u8]) -> Vec<String> {
        Vec::new()
    }
}

/// Lookup table from identifier to capability
pub struct LanguageRegistry {
    languages: HashMap<LanguageId, Box<dyn LanguageSupport>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            languages: HashMap::new(),
        }
    }

    /// Registry with every built-in grammar
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for support in languages::builtin() {
            registry.register(support);
        }
        registry
    }

    pub fn register(&mut self, support: Box<dyn LanguageSupport>) {
        self.languages.insert(support.id(), support);
    }

    pub fn get(&self, id: LanguageId) -> Option<&dyn LanguageSupport> {
        self.languages.get(&id).map(|s| s.as_ref())
    }

    pub fn is_supported(&self, id: LanguageId) -> bool {
        self.languages.contains_key(&id)
    }

    /// Detect and confirm a grammar is registered
    pub fn detect(&self, path: &Path) -> Option<LanguageId> {
        LanguageId::detect(path).filter(|id| self.is_supported(*id))
    }

    pub fn supported(&self) -> Vec<LanguageId> {
        let mut ids: Vec<LanguageId> = self.languages.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
