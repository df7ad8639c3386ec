//! Directory searches.
//!
//! Files are enumerated up front, filtered, sorted by relative path and then
//! searched one by one against a single scope-wide result budget.

use super::{FileOutcome, SearchEngine, SearchParameters, SearchResult, SkipReason};
use crate::error::{Result, SearchError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file that could not be searched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// Everything a directory search produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectoryReport {
    pub results: Vec<SearchResult>,
    pub files_searched: usize,
    pub files_skipped: usize,
    pub failures: Vec<FileFailure>,
    /// The cap was reached before every candidate file was searched
    pub truncated: bool,
}

pub struct ScopeWalker<'e> {
    engine: &'e SearchEngine,
}

impl<'e> ScopeWalker<'e> {
    pub fn new(engine: &'e SearchEngine) -> Self {
        Self { engine }
    }

    pub fn walk(&self, root: &Path, params: &SearchParameters) -> Result<DirectoryReport> {
        if !root.is_dir() {
            return Err(SearchError::NotFound(root.display().to_string()));
        }
        let filter = PathFilter::new(&params.include_patterns, &params.exclude_patterns)?;
        let candidates = self.candidates(root, &filter, params);
        tracing::debug!(
            "Searching {} candidate files under {}",
            candidates.len(),
            root.display()
        );

        let mut report = DirectoryReport::default();
        for (relative, path) in &candidates {
            let remaining = params.max_results.saturating_sub(report.results.len());
            if remaining == 0 {
                report.truncated = true;
                break;
            }

            match self.engine.file_outcome(path, params, remaining)? {
                FileOutcome::Searched(results) => {
                    report.files_searched += 1;
                    report.results.extend(results);
                }
                FileOutcome::Skipped(_) => report.files_skipped += 1,
                FileOutcome::Failed(reason) => report.failures.push(FileFailure {
                    path: relative.clone(),
                    reason,
                }),
            }
        }

        tracing::debug!(
            "Directory search finished: {} results from {} files",
            report.results.len(),
            report.files_searched
        );
        Ok(report)
    }

    /// Filtered files as (relative path, full path), in relative path order
    fn candidates(&self, root: &Path, filter: &PathFilter, params: &SearchParameters) -> Vec<(String, PathBuf)> {
        let respect_ignore = self.engine.config().respect_gitignore;
        let walker = WalkBuilder::new(root)
            .standard_filters(respect_ignore)
            .require_git(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        let mut files: Vec<(String, PathBuf)> = walker
            .flatten()
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|entry| {
                let path = entry.into_path();
                let relative = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                filter.accepts(&relative).then_some((relative, path))
            })
            .filter(|(_, path)| {
                let supported = self.engine.resolve_language(path, params).is_some();
                if !supported {
                    tracing::debug!("Skipping {}: {:?}", path.display(), SkipReason::Unsupported);
                }
                supported
            })
            .collect();

        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }
}

/// Include and exclude globs, each tested against the relative path and
/// the bare file name
struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: build_globset(include)?,
            exclude: build_globset(exclude)?,
        })
    }

    fn accepts(&self, relative: &str) -> bool {
        let name = relative.rsplit('/').next().unwrap_or(relative);
        let hit = |set: &GlobSet| set.is_match(relative) || set.is_match(name);

        if let Some(include) = &self.include {
            if !hit(include) {
                return false;
            }
        }
        !self.exclude.as_ref().is_some_and(hit)
    }
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}
