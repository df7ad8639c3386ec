use super::{LanguageId, LanguageRegistry, ParsedTree, SourceUnit};
use crate::error::{Result, SearchError};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tree_sitter::{Parser, Tree};

/// Parses source into syntax trees, remembering recent trees by content fingerprint
pub struct TreeProvider {
    registry: Arc<LanguageRegistry>,
    cache: Mutex<TreeCache>,
}

/// Bounded map; the oldest insertion is evicted first
struct TreeCache {
    trees: HashMap<String, Tree>,
    order: VecDeque<String>,
    capacity: usize,
}

impl TreeCache {
    fn insert(&mut self, key: String, tree: Tree) {
        if self.trees.contains_key(&key) {
            return;
        }
        while self.trees.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.trees.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.trees.insert(key, tree);
    }
}

impl TreeProvider {
    pub fn new(registry: Arc<LanguageRegistry>, capacity: usize) -> Self {
        Self {
            registry,
            cache: Mutex::new(TreeCache {
                trees: HashMap::new(),
                order: VecDeque::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Cache key over identity, language and content; any edit yields a new key
    pub fn fingerprint(identity: &str, language: LanguageId, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        hasher.update([0u8]);
        hasher.update(language.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Parse `unit`, reusing a cached tree for identical content.
    /// Malformed source still yields a tree with error nodes.
    pub fn parse(&self, identity: &str, unit: &SourceUnit) -> Result<ParsedTree> {
        let support = self
            .registry
            .get(unit.language)
            .ok_or_else(|| SearchError::UnsupportedLanguage(unit.language.to_string()))?;
        let fingerprint = Self::fingerprint(identity, unit.language, &unit.text);

        if let Some(tree) = self.cache.lock().trees.get(&fingerprint) {
            tracing::debug!("Tree cache hit for {}", identity);
            return Ok(ParsedTree {
                tree: tree.clone(),
                language: unit.language,
                fingerprint,
            });
        }

        let mut parser = Parser::new();
        parser
            .set_language(support.grammar())
            .map_err(|e| SearchError::ParseFailure(format!("{}: {}", unit.language, e)))?;
        let tree = parser
            .parse(&unit.text, None)
            .ok_or_else(|| SearchError::ParseFailure(format!("parser gave up on {}", identity)))?;

        tracing::debug!("Parsed {} as {}", identity, unit.language);
        self.cache.lock().insert(fingerprint.clone(), tree.clone());

        Ok(ParsedTree {
            tree,
            language: unit.language,
            fingerprint,
        })
    }

    pub fn cached_trees(&self) -> usize {
        self.cache.lock().trees.len()
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.trees.clear();
        cache.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(capacity: usize) -> TreeProvider {
        TreeProvider::new(Arc::new(LanguageRegistry::with_builtin()), capacity)
    }

    #[test]
    fn test_cache_hit_returns_equivalent_tree() {
        let trees = provider(8);
        let unit = SourceUnit::new(LanguageId::Python, "def f():\n    return 1\n");

        let first = trees.parse("a.py", &unit).unwrap();
        let second = trees.parse("a.py", &unit).unwrap();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(
            first.tree.root_node().to_sexp(),
            second.tree.root_node().to_sexp()
        );
        assert_eq!(trees.cached_trees(), 1);
    }

    #[test]
    fn test_changed_content_is_not_served_stale() {
        let trees = provider(8);
        let before = SourceUnit::new(LanguageId::Python, "def f():\n    pass\n");
        let after = SourceUnit::new(LanguageId::Python, "class C:\n    pass\n");

        let old = trees.parse("a.py", &before).unwrap();
        let new = trees.parse("a.py", &after).unwrap();
        assert_ne!(old.fingerprint, new.fingerprint);
        assert!(new.tree.root_node().to_sexp().contains("class_definition"));
    }

    #[test]
    fn test_cache_is_bounded() {
        let trees = provider(2);
        for i in 0..5 {
            let unit = SourceUnit::new(LanguageId::Python, format!("x = {}\n", i));
            trees.parse(&format!("f{}.py", i), &unit).unwrap();
        }
        assert_eq!(trees.cached_trees(), 2);
        trees.clear();
        assert_eq!(trees.cached_trees(), 0);
    }

    #[test]
    fn test_malformed_source_still_parses() {
        let trees = provider(4);
        let unit = SourceUnit::new(LanguageId::Python, "def broken(:\n  ))) class\n");
        let parsed = trees.parse("bad.py", &unit).unwrap();
        assert!(parsed.tree.root_node().has_error());
    }

    #[test]
    fn test_unregistered_language() {
        let trees = TreeProvider::new(Arc::new(LanguageRegistry::new()), 4);
        let unit = SourceUnit::new(LanguageId::Go, "package main\n");
        assert!(matches!(
            trees.parse("main.go", &unit),
            Err(SearchError::UnsupportedLanguage(_))
        ));
    }
}
