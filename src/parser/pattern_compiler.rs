use super::{LanguageId, LanguageRegistry};
use crate::error::{Result, SearchError};
use crate::search::SearchKind;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tree_sitter::Query;

/// A query compiled for one language
pub struct CompiledPattern {
    pub language: LanguageId,
    pub query: Query,
}

impl CompiledPattern {
    pub fn capture_index(&self, name: &str) -> Option<u32> {
        self.query.capture_index_for_name(name)
    }
}

/// Compiles structural patterns, caching them for the life of the process
pub struct PatternCompiler {
    registry: Arc<LanguageRegistry>,
    cache: RwLock<HashMap<(LanguageId, String), Arc<CompiledPattern>>>,
}

impl PatternCompiler {
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The fixed pattern for a search kind. Definition searches walk the
    /// tree instead of running a query.
    pub fn pattern_text(&self, language: LanguageId, kind: SearchKind) -> Result<Option<&'static str>> {
        let support = self
            .registry
            .get(language)
            .ok_or_else(|| SearchError::UnsupportedLanguage(language.to_string()))?;
        Ok(match kind {
            SearchKind::FunctionCalls => Some(support.call_pattern()),
            SearchKind::SymbolDefinitions => None,
        })
    }

    pub fn compile_for(&self, language: LanguageId, kind: SearchKind) -> Result<Option<Arc<CompiledPattern>>> {
        match self.pattern_text(language, kind)? {
            Some(pattern) => self.compile(language, pattern).map(Some),
            None => Ok(None),
        }
    }

    pub fn compile(&self, language: LanguageId, pattern: &str) -> Result<Arc<CompiledPattern>> {
        let key = (language, pattern_hash(pattern));
        if let Some(compiled) = self.cache.read().get(&key) {
            return Ok(compiled.clone());
        }

        let support = self
            .registry
            .get(language)
            .ok_or_else(|| SearchError::UnsupportedLanguage(language.to_string()))?;
        let query = Query::new(support.grammar(), pattern).map_err(|e| SearchError::InvalidPattern {
            language: language.to_string(),
            message: format!("{:?}", e),
        })?;
        tracing::debug!("Compiled pattern for {}", language);

        // Two threads may compile the same pattern; the first insert wins
        let compiled = Arc::new(CompiledPattern { language, query });
        let mut cache = self.cache.write();
        Ok(cache.entry(key).or_insert(compiled).clone())
    }

    pub fn cached_patterns(&self) -> usize {
        self.cache.read().len()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

fn pattern_hash(pattern: &str) -> String {
    hex::encode(Sha256::digest(pattern.as_bytes()))
}
