//! File-system collaborator used by the file tools.
//!
//! Handlers depend on [`WorkspaceOps`] rather than the file system directly
//! so the pipeline can be exercised against a mock in tests. The real
//! implementation walks with the `ignore` crate and reads through `tokio::fs`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

/// Matches top-level declarations across the languages the agent commonly
/// reads. Used to build the structural outline for truncated files.
static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:export\s+)?(?:default\s+)?(?:fn|struct|enum|trait|impl|mod|class|def|function|interface|type|const)\b",
    )
    .expect("declaration regex is valid")
});

/// File-system operations the file tools need.
#[async_trait]
pub trait WorkspaceOps: Send + Sync {
    /// List entries under `path` up to `limit`, returning the entries and
    /// whether the limit was hit. Entries are returned relative to `path`.
    async fn list_files(
        &self,
        path: &Path,
        recursive: bool,
        limit: usize,
    ) -> io::Result<(Vec<PathBuf>, bool)>;

    /// Count the lines in a file without keeping its content.
    async fn count_lines(&self, path: &Path) -> io::Result<usize>;

    /// Read a slice of a file. `start` is a 0-based inclusive index (`None`
    /// reads from the beginning), `end` is 1-based inclusive (`None` reads to
    /// the end).
    async fn read_lines(
        &self,
        path: &Path,
        start: Option<usize>,
        end: Option<usize>,
    ) -> io::Result<String>;

    /// Extract a structural outline of top-level declarations.
    async fn outline(&self, path: &Path) -> io::Result<String>;
}

/// [`WorkspaceOps`] backed by the local file system.
#[derive(Debug, Default)]
pub struct LocalWorkspace;

impl LocalWorkspace {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WorkspaceOps for LocalWorkspace {
    async fn list_files(
        &self,
        path: &Path,
        recursive: bool,
        limit: usize,
    ) -> io::Result<(Vec<PathBuf>, bool)> {
        let root = path.to_path_buf();

        // The walker is synchronous; keep it off the async runtime.
        tokio::task::spawn_blocking(move || {
            if !root.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such directory: {}", root.display()),
                ));
            }

            let mut walker = ignore::WalkBuilder::new(&root);
            walker.standard_filters(false).hidden(false);
            if !recursive {
                walker.max_depth(Some(1));
            }

            let mut entries = Vec::new();
            let mut limit_hit = false;

            for entry in walker.build() {
                let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
                if entry.path() == root {
                    continue;
                }
                if entries.len() >= limit {
                    limit_hit = true;
                    break;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                let relative = entry
                    .path()
                    .strip_prefix(&root)
                    .unwrap_or(entry.path())
                    .to_path_buf();
                entries.push(if is_dir {
                    // Trailing separator marks directories in the listing.
                    PathBuf::from(format!("{}/", relative.display()))
                } else {
                    relative
                });
            }

            entries.sort();
            Ok((entries, limit_hit))
        })
        .await
        .map_err(|e| io::Error::other(e.to_string()))?
    }

    async fn count_lines(&self, path: &Path) -> io::Result<usize> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(content.lines().count())
    }

    async fn read_lines(
        &self,
        path: &Path,
        start: Option<usize>,
        end: Option<usize>,
    ) -> io::Result<String> {
        let content = tokio::fs::read_to_string(path).await?;
        let start = start.unwrap_or(0);

        let selected: Vec<&str> = match end {
            Some(end) => content.lines().take(end).skip(start).collect(),
            None => content.lines().skip(start).collect(),
        };

        Ok(selected.join("\n"))
    }

    async fn outline(&self, path: &Path) -> io::Result<String> {
        let content = tokio::fs::read_to_string(path).await?;

        let lines: Vec<String> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| DECLARATION.is_match(line))
            .map(|(idx, line)| format!("{} | {}", idx + 1, line.trim_end()))
            .collect();

        Ok(lines.join("\n"))
    }
}
