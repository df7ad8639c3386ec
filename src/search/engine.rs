use super::extractor::CodeExtractor;
use super::scope::ScopeWalker;
use super::{FileOutcome, SearchKind, SearchParameters, SearchResult, SkipReason};
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::parser::languages::node_text;
use crate::parser::pattern_compiler::PatternCompiler;
use crate::parser::symbol_resolver;
use crate::parser::tree_provider::TreeProvider;
use crate::parser::{LanguageId, LanguageRegistry, ParsedTree, SourceUnit, Symbol};
use crate::source::{decode_text, ContentSource, WorkspaceSource};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tree_sitter::QueryCursor;

const INLINE_IDENTITY: &str = "<inline>";

/// Runs call and definition searches over files, directories and in-memory
/// source. Owns the tree and pattern caches for its lifetime.
pub struct SearchEngine {
    registry: Arc<LanguageRegistry>,
    trees: TreeProvider,
    patterns: PatternCompiler,
    source: Arc<dyn ContentSource>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_source(config, Arc::new(WorkspaceSource))
    }

    pub fn with_source(config: SearchConfig, source: Arc<dyn ContentSource>) -> Self {
        let registry = Arc::new(LanguageRegistry::with_builtin());
        Self {
            trees: TreeProvider::new(registry.clone(), config.tree_cache_size),
            patterns: PatternCompiler::new(registry.clone()),
            registry,
            source,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Search the request's scope, a single file or a whole directory
    pub fn search(&self, params: &SearchParameters) -> Result<Vec<SearchResult>> {
        if params.scope.is_dir() {
            self.search_directory(&params.scope, params)
        } else {
            self.search_file(&params.scope, params)
        }
    }

    /// Only an invalid built-in pattern is reported as an error; every other
    /// failure yields an empty list.
    pub fn search_file(&self, path: &Path, params: &SearchParameters) -> Result<Vec<SearchResult>> {
        self.file_outcome(path, params, params.max_results)
            .map(FileOutcome::into_results)
    }

    pub fn search_directory(&self, path: &Path, params: &SearchParameters) -> Result<Vec<SearchResult>> {
        Ok(ScopeWalker::new(self).walk(path, params)?.results)
    }

    /// Search one file, emitting at most `cap` results
    pub fn file_outcome(&self, path: &Path, params: &SearchParameters, cap: usize) -> Result<FileOutcome> {
        let Some(language) = self.resolve_language(path, params) else {
            tracing::debug!("Skipping {}: unsupported language", path.display());
            return Ok(FileOutcome::Skipped(SkipReason::Unsupported));
        };

        let bytes = match self.source.read(path, params.revision.as_deref()) {
            Ok(bytes) => bytes,
            Err(e) => return contain(path, e),
        };
        if bytes.is_empty() {
            return Ok(FileOutcome::Skipped(SkipReason::Empty));
        }
        let text = match decode_text(path, bytes) {
            Ok(text) => text,
            Err(SearchError::Binary(_)) => {
                tracing::debug!("Skipping {}: binary content", path.display());
                return Ok(FileOutcome::Skipped(SkipReason::Binary));
            }
            Err(e) => return contain(path, e),
        };

        let unit = SourceUnit::new(language, text);
        if unit.is_blank() {
            return Ok(FileOutcome::Skipped(SkipReason::Empty));
        }

        let identity = path.display().to_string();
        match self.search_unit(&identity, &unit, params, cap) {
            Ok(results) => Ok(FileOutcome::Searched(results)),
            Err(e) => contain(path, e),
        }
    }

    /// Search text that is already in memory
    pub fn search_source(&self, identity: &str, unit: &SourceUnit, params: &SearchParameters) -> Result<Vec<SearchResult>> {
        if unit.is_blank() {
            return Ok(Vec::new());
        }
        match self.search_unit(identity, unit, params, params.max_results) {
            Ok(results) => Ok(results),
            Err(e) if e.is_per_file() => {
                tracing::warn!("Search failed for {}: {}", identity, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Explicit override first, then the file extension
    pub fn resolve_language(&self, path: &Path, params: &SearchParameters) -> Option<LanguageId> {
        match params.language.as_deref() {
            Some(name) => name
                .parse::<LanguageId>()
                .ok()
                .filter(|id| self.registry.is_supported(*id)),
            None => self.registry.detect(path),
        }
    }

    pub fn read_text(&self, path: &Path, revision: Option<&str>) -> Result<String> {
        let bytes = self.source.read(path, revision)?;
        decode_text(path, bytes)
    }

    /// Read and decode a file, detecting its language
    pub fn load(&self, path: &Path, revision: Option<&str>) -> Result<SourceUnit> {
        let language = self
            .registry
            .detect(path)
            .ok_or_else(|| SearchError::UnsupportedLanguage(path.display().to_string()))?;
        Ok(SourceUnit::new(language, self.read_text(path, revision)?))
    }

    pub fn extract_symbols(&self, source: &str, language: LanguageId) -> Result<Vec<Symbol>> {
        self.symbols(INLINE_IDENTITY, &SourceUnit::new(language, source))
    }

    pub fn symbols(&self, identity: &str, unit: &SourceUnit) -> Result<Vec<Symbol>> {
        let parsed = self.trees.parse(identity, unit)?;
        self.resolve(&parsed, unit)
    }

    pub fn extractor(&self, language: LanguageId) -> Result<CodeExtractor<'_>> {
        if !self.registry.is_supported(language) {
            return Err(SearchError::UnsupportedLanguage(language.to_string()));
        }
        Ok(CodeExtractor::new(self, language))
    }

    pub fn clear_caches(&self) {
        self.trees.clear();
        self.patterns.clear();
    }

    fn resolve(&self, parsed: &ParsedTree, unit: &SourceUnit) -> Result<Vec<Symbol>> {
        let support = self
            .registry
            .get(unit.language)
            .ok_or_else(|| SearchError::UnsupportedLanguage(unit.language.to_string()))?;
        Ok(symbol_resolver::extract_symbols(parsed, unit, support))
    }

    fn search_unit(&self, identity: &str, unit: &SourceUnit, params: &SearchParameters, cap: usize) -> Result<Vec<SearchResult>> {
        if cap == 0 {
            return Ok(Vec::new());
        }
        let parsed = self.trees.parse(identity, unit)?;
        let lines = unit.lines();
        let hits = match params.kind {
            SearchKind::FunctionCalls => self.find_calls(&parsed, unit, params, cap)?,
            SearchKind::SymbolDefinitions => self.find_definitions(&parsed, unit, params, cap)?,
        };

        Ok(hits
            .into_iter()
            .map(|hit| {
                let (context_before, context_after) = if params.include_context {
                    context_window(&lines, hit.start_line, hit.end_line, params.context_lines)
                } else {
                    (Vec::new(), Vec::new())
                };
                let mut metadata = hit.metadata;
                metadata.insert("search_type".to_string(), params.kind.to_string());
                metadata.insert("target".to_string(), params.target.clone());
                SearchResult {
                    file_path: identity.to_string(),
                    start_line: hit.start_line,
                    end_line: hit.end_line,
                    match_text: hit.text,
                    context_before,
                    context_after,
                    metadata,
                    language: unit.language.to_string(),
                }
            })
            .collect())
    }

    /// Call sites whose text contains the target, in document order
    fn find_calls(&self, parsed: &ParsedTree, unit: &SourceUnit, params: &SearchParameters, cap: usize) -> Result<Vec<Hit>> {
        let Some(pattern) = self.patterns.compile_for(unit.language, SearchKind::FunctionCalls)? else {
            return Ok(Vec::new());
        };
        let call = pattern
            .capture_index("call")
            .ok_or_else(|| SearchError::InvalidPattern {
                language: unit.language.to_string(),
                message: "pattern has no @call capture".to_string(),
            })?;

        let source = unit.bytes();
        let mut cursor = QueryCursor::new();
        let mut hits = Vec::new();
        for (m, index) in cursor.captures(&pattern.query, parsed.tree.root_node(), source) {
            let capture = m.captures[index];
            if capture.index != call {
                continue;
            }
            let text = node_text(capture.node, source);
            if !text.contains(&params.target) {
                continue;
            }
            hits.push(Hit {
                start_line: capture.node.start_position().row + 1,
                end_line: capture.node.end_position().row + 1,
                text,
                metadata: BTreeMap::new(),
            });
            if hits.len() >= cap {
                break;
            }
        }
        Ok(hits)
    }

    fn find_definitions(&self, parsed: &ParsedTree, unit: &SourceUnit, params: &SearchParameters, cap: usize) -> Result<Vec<Hit>> {
        let symbols = self.resolve(parsed, unit)?;
        Ok(symbols
            .into_iter()
            .filter(|s| s.name.contains(&params.target))
            .take(cap)
            .map(|symbol| {
                let mut metadata = BTreeMap::new();
                metadata.insert("symbol_type".to_string(), symbol.kind.to_string());
                metadata.insert("symbol_name".to_string(), symbol.name.clone());
                if let Some(parent) = &symbol.parent {
                    metadata.insert("parent".to_string(), parent.clone());
                }
                Hit {
                    start_line: symbol.start_line,
                    end_line: symbol.end_line,
                    text: symbol.signature,
                    metadata,
                }
            })
            .collect())
    }
}

/// A match before it is dressed with file-level details
struct Hit {
    start_line: usize,
    end_line: usize,
    text: String,
    metadata: BTreeMap<String, String>,
}

/// Turn a per-file error into a failed outcome; anything else propagates
fn contain(path: &Path, error: SearchError) -> Result<FileOutcome> {
    match error {
        SearchError::NotFound(_) => {
            tracing::debug!("Not found: {}", path.display());
            Ok(FileOutcome::Failed(error.to_string()))
        }
        e if e.is_per_file() => {
            tracing::warn!("Failed to search {}: {}", path.display(), e);
            Ok(FileOutcome::Failed(e.to_string()))
        }
        e => Err(e),
    }
}

/// Up to `count` lines on each side of the 1-based inclusive range, clipped to the file
pub fn context_window(lines: &[&str], start_line: usize, end_line: usize, count: usize) -> (Vec<String>, Vec<String>) {
    let start = start_line.saturating_sub(1).min(lines.len());
    let end = end_line.min(lines.len());
    let before = lines[start.saturating_sub(count)..start]
        .iter()
        .map(|l| l.to_string())
        .collect();
    let after = lines[end..end.saturating_add(count).min(lines.len())]
        .iter()
        .map(|l| l.to_string())
        .collect();
    (before, after)
}
