/// Engine-wide defaults, read from the environment by the server binary.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Cap applied when a request does not carry its own
    pub max_results: usize,
    pub context_lines: usize,
    /// Number of parsed trees kept in memory
    pub tree_cache_size: usize,
    /// Apply .gitignore and hidden-file filters while walking directories
    pub respect_gitignore: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 100,
            context_lines: 3,
            tree_cache_size: 256,
            respect_gitignore: false,
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str, fallback: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(fallback)
        };

        Self {
            max_results: number("CODE_EXTRACTOR_MAX_RESULTS", defaults.max_results),
            context_lines: number("CODE_EXTRACTOR_CONTEXT_LINES", defaults.context_lines),
            tree_cache_size: number("CODE_EXTRACTOR_TREE_CACHE_SIZE", defaults.tree_cache_size)
                .max(1),
            respect_gitignore: lookup("CODE_EXTRACTOR_RESPECT_GITIGNORE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.respect_gitignore),
        }
    }
}
