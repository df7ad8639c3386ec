pub mod engine;
pub mod extractor;
pub mod scope;

use crate::config::SearchConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use engine::SearchEngine;
pub use extractor::CodeExtractor;
pub use scope::{DirectoryReport, FileFailure, ScopeWalker};

/// What a search looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchKind {
    FunctionCalls,
    SymbolDefinitions,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::FunctionCalls => "function-calls",
            SearchKind::SymbolDefinitions => "symbol-definitions",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "-").as_str() {
            "function-calls" | "calls" => Ok(SearchKind::FunctionCalls),
            "symbol-definitions" | "definitions" => Ok(SearchKind::SymbolDefinitions),
            other => Err(format!(
                "Unknown search type '{}', expected function-calls or symbol-definitions",
                other
            )),
        }
    }
}

/// A search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParameters {
    pub kind: SearchKind,
    /// Substring matched against call text or symbol names
    pub target: String,
    /// File or directory
    pub scope: PathBuf,
    /// Overrides extension-based detection
    pub language: Option<String>,
    /// Read content at this git revision instead of the working tree
    pub revision: Option<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_results: usize,
    pub context_lines: usize,
    pub include_context: bool,
}

impl SearchParameters {
    pub fn new(kind: SearchKind, target: impl Into<String>, scope: impl Into<PathBuf>) -> Self {
        let defaults = SearchConfig::default();
        Self {
            kind,
            target: target.into(),
            scope: scope.into(),
            language: None,
            revision: None,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_results: defaults.max_results,
            context_lines: defaults.context_lines,
            include_context: false,
        }
    }

    /// Take the cap and context width from engine configuration
    pub fn configured(mut self, config: &SearchConfig) -> Self {
        self.max_results = config.max_results;
        self.context_lines = config.context_lines;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_context(mut self, lines: usize) -> Self {
        self.include_context = true;
        self.context_lines = lines;
        self
    }
}

/// One match, with optional surrounding lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub file_path: String,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
    pub match_text: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub language: String,
}

/// Why a file produced nothing without being searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Unsupported,
    Binary,
    Empty,
}

/// Per-file result of a search; failures are data, not control flow
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Searched(Vec<SearchResult>),
    Skipped(SkipReason),
    Failed(String),
}

impl FileOutcome {
    pub fn into_results(self) -> Vec<SearchResult> {
        match self {
            FileOutcome::Searched(results) => results,
            FileOutcome::Skipped(_) | FileOutcome::Failed(_) => Vec::new(),
        }
    }
}
