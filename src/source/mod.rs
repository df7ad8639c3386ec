use crate::error::{Result, SearchError};
use git2::Repository;
use std::path::{Path, PathBuf};

/// Where file bytes come from: the working tree, or a git revision
pub trait ContentSource: Send + Sync {
    fn read(&self, path: &Path, revision: Option<&str>) -> Result<Vec<u8>>;
}

/// Reads from disk, or from the enclosing git repository when a revision is given
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkspaceSource;

impl ContentSource for WorkspaceSource {
    fn read(&self, path: &Path, revision: Option<&str>) -> Result<Vec<u8>> {
        match revision {
            None => std::fs::read(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    SearchError::NotFound(path.display().to_string())
                }
                _ => SearchError::Io(e),
            }),
            Some(rev) => read_at_revision(path, rev),
        }
    }
}

fn read_at_revision(path: &Path, revision: &str) -> Result<Vec<u8>> {
    let absolute = absolute_path(path)?;
    let repo = Repository::discover(absolute.parent().unwrap_or(&absolute))
        .map_err(|_| SearchError::NotFound(format!("no repository for {}", path.display())))?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| SearchError::NotFound("bare repository".to_string()))?;
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());

    let relative = absolute
        .strip_prefix(&workdir)
        .map_err(|_| SearchError::NotFound(format!("{} is outside the repository", path.display())))?;
    let spec = format!(
        "{}:{}",
        revision,
        relative.to_string_lossy().replace('\\', "/")
    );

    let blob = repo
        .revparse_single(&spec)
        .and_then(|object| object.peel_to_blob())
        .map_err(|_| SearchError::NotFound(spec.clone()))?;
    Ok(blob.content().to_vec())
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    // The file may exist only at the requested revision
    let base = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir()?
    };
    let joined = base.join(path);
    match (joined.parent(), joined.file_name()) {
        (Some(parent), Some(name)) => Ok(parent
            .canonicalize()
            .unwrap_or_else(|_| parent.to_path_buf())
            .join(name)),
        _ => Ok(joined),
    }
}

/// Check if content appears to be binary
pub fn is_binary(content: &[u8]) -> bool {
    let check_len = content.len().min(8192);
    content[..check_len].contains(&0)
}

/// Decode bytes as UTF-8 text, treating NUL bytes or invalid UTF-8 as binary
pub fn decode_text(path: &Path, bytes: Vec<u8>) -> Result<String> {
    if is_binary(&bytes) {
        return Err(SearchError::Binary(path.to_path_buf()));
    }
    String::from_utf8(bytes).map_err(|_| SearchError::Binary(path.to_path_buf()))
}
