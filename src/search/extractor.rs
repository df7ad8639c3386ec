use super::SearchEngine;
use crate::error::Result;
use crate::parser::{LanguageId, Symbol, SymbolKind};

/// Symbol lookups for one language, sharing the engine's caches
pub struct CodeExtractor<'e> {
    engine: &'e SearchEngine,
    language: LanguageId,
}

impl<'e> CodeExtractor<'e> {
    pub(crate) fn new(engine: &'e SearchEngine, language: LanguageId) -> Self {
        Self { engine, language }
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn extract_symbols(&self, source: &str) -> Result<Vec<Symbol>> {
        self.engine.extract_symbols(source, self.language)
    }

    /// First function or method with exactly this name
    pub fn extract_function(&self, source: &str, name: &str) -> Result<Option<Symbol>> {
        Ok(self
            .extract_symbols(source)?
            .into_iter()
            .find(|s| s.kind.is_callable() && s.name == name))
    }

    /// First class, struct, interface or enum with exactly this name
    pub fn extract_class(&self, source: &str, name: &str) -> Result<Option<Symbol>> {
        Ok(self
            .extract_symbols(source)?
            .into_iter()
            .find(|s| s.kind.is_class_like() && s.name == name))
    }

    pub fn methods_of(&self, source: &str, class: &str) -> Result<Vec<Symbol>> {
        Ok(self
            .extract_symbols(source)?
            .into_iter()
            .filter(|s| s.kind == SymbolKind::Method && s.parent.as_deref() == Some(class))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;

    const SOURCE: &str = r#"
class Calculator:
    def __init__(self):
        self.total = 0

    def add(self, x, y):
        return x + y

def add(a, b):
    return a + b
"#;

    #[test]
    fn test_extract_function_and_class() {
        let engine = SearchEngine::new(SearchConfig::default());
        let extractor = engine.extractor(LanguageId::Python).unwrap();
        assert_eq!(extractor.language(), LanguageId::Python);

        let add = extractor.extract_function(SOURCE, "add").unwrap().unwrap();
        assert_eq!(add.kind, SymbolKind::Method);
        assert_eq!(add.line_span(), "6-7");

        let class = extractor.extract_class(SOURCE, "Calculator").unwrap().unwrap();
        assert_eq!(class.start_line, 2);
        assert_eq!(class.line_count(), 6);

        assert!(extractor.extract_function(SOURCE, "subtract").unwrap().is_none());
        assert!(extractor.extract_class(SOURCE, "add").unwrap().is_none());
    }

    #[test]
    fn test_methods_of() {
        let engine = SearchEngine::new(SearchConfig::default());
        let extractor = engine.extractor(LanguageId::Python).unwrap();

        let names: Vec<String> = extractor
            .methods_of(SOURCE, "Calculator")
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["__init__", "add"]);
        assert!(extractor.methods_of(SOURCE, "Missing").unwrap().is_empty());
    }
}
