//! Structural code search and symbol extraction on tree-sitter syntax trees.
//!
//! The [`search::SearchEngine`] owns the parse and query caches and answers
//! call-site and definition searches over single files or whole directories.
//! The `mcp` and `handlers` modules expose it as an MCP stdio server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod parser;
pub mod search;
pub mod source;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use parser::{LanguageId, Parameter, Symbol, SymbolKind};
pub use search::{
    CodeExtractor, DirectoryReport, SearchEngine, SearchKind, SearchParameters, SearchResult,
};
