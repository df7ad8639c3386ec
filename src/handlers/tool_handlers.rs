use crate::mcp::types::Content;
use crate::parser::{Symbol, SourceUnit};
use crate::search::{DirectoryReport, ScopeWalker, SearchEngine, SearchKind, SearchParameters};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tool handlers for MCP server
pub struct ToolHandlers {
    engine: Arc<SearchEngine>,
}

impl ToolHandlers {
    pub fn new(engine: Arc<SearchEngine>) -> Self {
        Self { engine }
    }

    /// Run parsing and searching off the async runtime
    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&SearchEngine) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || work(&engine))
            .await
            .context("Search task failed")?
    }

    /// Handle get_symbols tool
    pub async fn handle_get_symbols(&self, args: &Value) -> Result<Vec<Content>> {
        let path = required_path(args, "file_path")?;

        let symbols = self
            .blocking(move |engine| {
                let unit = load(engine, &path)?;
                Ok(engine.symbols(&path.display().to_string(), &unit)?)
            })
            .await?;

        let listed: Vec<Value> = symbols.iter().map(symbol_summary).collect();
        json_content(&json!({ "count": listed.len(), "symbols": listed }))
    }

    /// Handle get_function tool
    pub async fn handle_get_function(&self, args: &Value) -> Result<Vec<Content>> {
        let path = required_path(args, "file_path")?;
        let name = required_str(args, "function_name")?.to_string();

        let (unit, function) = self
            .blocking(move |engine| {
                let unit = load(engine, &path)?;
                let function = engine
                    .extractor(unit.language)?
                    .extract_function(&unit.text, &name)?
                    .with_context(|| format!("Function '{}' not found in {}", name, path.display()))?;
                Ok((unit, function))
            })
            .await?;

        json_content(&json!({
            "name": function.name,
            "type": function.kind,
            "code": code_of(&unit, &function),
            "lines": function.line_span(),
            "parameters": function.parameters.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            "return_type": function.return_type,
            "is_async": function.is_async,
            "parent": function.parent,
            "decorators": function.decorators,
            "docstring": function.docstring,
        }))
    }

    /// Handle get_class tool
    pub async fn handle_get_class(&self, args: &Value) -> Result<Vec<Content>> {
        let path = required_path(args, "file_path")?;
        let name = required_str(args, "class_name")?.to_string();

        let (unit, class, methods) = self
            .blocking(move |engine| {
                let unit = load(engine, &path)?;
                let extractor = engine.extractor(unit.language)?;
                let class = extractor
                    .extract_class(&unit.text, &name)?
                    .with_context(|| format!("Class '{}' not found in {}", name, path.display()))?;
                let methods = extractor.methods_of(&unit.text, &name)?;
                Ok((unit, class, methods))
            })
            .await?;

        let methods: Vec<Value> = methods
            .iter()
            .map(|m| json!({ "name": m.name, "lines": m.line_span(), "signature": m.signature }))
            .collect();
        json_content(&json!({
            "name": class.name,
            "type": class.kind,
            "code": code_of(&unit, &class),
            "lines": class.line_span(),
            "docstring": class.docstring,
            "decorators": class.decorators,
            "methods": methods,
        }))
    }

    /// Handle get_signature tool
    pub async fn handle_get_signature(&self, args: &Value) -> Result<Vec<Content>> {
        let path = required_path(args, "file_path")?;
        let name = required_str(args, "function_name")?.to_string();

        let function = self
            .blocking(move |engine| {
                let unit = load(engine, &path)?;
                engine
                    .extractor(unit.language)?
                    .extract_function(&unit.text, &name)?
                    .with_context(|| format!("Function '{}' not found in {}", name, path.display()))
            })
            .await?;

        json_content(&json!({
            "name": function.name,
            "signature": function.signature,
            "lines": function.line_span(),
        }))
    }

    /// Handle get_lines tool
    pub async fn handle_get_lines(&self, args: &Value) -> Result<Vec<Content>> {
        let path = required_path(args, "file_path")?;
        let start = required_u64(args, "start_line")? as usize;
        let end = required_u64(args, "end_line")? as usize;

        let text = self
            .blocking(move |engine| {
                engine
                    .read_text(&path, None)
                    .with_context(|| format!("Failed to read {}", path.display()))
            })
            .await?;

        let (code, end) = line_range(&text, start, end)?;
        json_content(&json!({
            "code": code,
            "start_line": start,
            "end_line": end,
            "lines": format!("{}-{}", start, end),
        }))
    }

    /// Handle search_code tool
    pub async fn handle_search_code(&self, args: &Value) -> Result<Vec<Content>> {
        let params = self.search_parameters(args)?;

        let report = self
            .blocking(move |engine| {
                if params.scope.is_dir() {
                    Ok(ScopeWalker::new(engine).walk(&params.scope, &params)?)
                } else {
                    let results = engine.search_file(&params.scope, &params)?;
                    Ok(DirectoryReport {
                        files_searched: 1,
                        results,
                        ..Default::default()
                    })
                }
            })
            .await?;

        if report.results.is_empty() && report.failures.is_empty() {
            return Ok(vec![Content::Text {
                text: "No results found.".to_string(),
            }]);
        }

        json_content(&json!({
            "total": report.results.len(),
            "truncated": report.truncated,
            "files_searched": report.files_searched,
            "failures": report.failures,
            "results": report.results,
        }))
    }

    fn search_parameters(&self, args: &Value) -> Result<SearchParameters> {
        let kind = required_str(args, "search_type")?
            .parse::<SearchKind>()
            .map_err(anyhow::Error::msg)?;
        let target = required_str(args, "target")?;
        let scope = required_path(args, "scope")?;

        let mut params =
            SearchParameters::new(kind, target, scope).configured(self.engine.config());
        if let Some(language) = args.get("language").and_then(|v| v.as_str()) {
            params = params.with_language(language);
        }
        if let Some(revision) = args.get("git_revision").and_then(|v| v.as_str()) {
            params = params.with_revision(revision);
        }
        params = params
            .with_include(string_list(args, "file_patterns"))
            .with_exclude(string_list(args, "exclude_patterns"));
        if let Some(max) = args.get("max_results").and_then(|v| v.as_u64()) {
            params = params.with_max_results(max as usize);
        }
        if let Some(lines) = args.get("context_lines").and_then(|v| v.as_u64()) {
            params.context_lines = lines as usize;
        }
        params.include_context = args
            .get("include_context")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        Ok(params)
    }
}

fn load(engine: &SearchEngine, path: &Path) -> Result<SourceUnit> {
    engine
        .load(path, None)
        .with_context(|| format!("Failed to load {}", path.display()))
}

fn code_of(unit: &SourceUnit, symbol: &Symbol) -> String {
    unit.text
        .get(symbol.start_byte..symbol.end_byte)
        .unwrap_or_default()
        .to_string()
}

fn symbol_summary(symbol: &Symbol) -> Value {
    json!({
        "name": symbol.name,
        "type": symbol.kind,
        "lines": symbol.line_span(),
        "parent": symbol.parent,
        "signature": symbol.signature,
    })
}

/// 1-based inclusive slice; the end is clipped to the file
fn line_range(text: &str, start: usize, end: usize) -> Result<(String, usize)> {
    if start == 0 || end == 0 {
        anyhow::bail!("Line numbers start at 1");
    }
    if start > end {
        anyhow::bail!("start_line {} is after end_line {}", start, end);
    }
    let lines: Vec<&str> = text.lines().collect();
    if start > lines.len() {
        anyhow::bail!(
            "start_line {} is past the end of the file ({} lines)",
            start,
            lines.len()
        );
    }
    let end = end.min(lines.len());
    Ok((lines[start - 1..end].join("\n"), end))
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .with_context(|| format!("Missing '{}' argument", key))
}

fn required_u64(args: &Value, key: &str) -> Result<u64> {
    args.get(key)
        .and_then(|v| v.as_u64())
        .with_context(|| format!("Missing '{}' argument", key))
}

fn required_path(args: &Value, key: &str) -> Result<PathBuf> {
    required_str(args, key).map(PathBuf::from)
}

fn string_list(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn json_content(value: &Value) -> Result<Vec<Content>> {
    Ok(vec![Content::Text {
        text: serde_json::to_string_pretty(value)?,
    }])
}
