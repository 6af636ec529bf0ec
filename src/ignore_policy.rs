//! Workspace ignore rules.
//!
//! A `.agentignore` file at the workspace root restricts which paths tools
//! may touch, using gitignore syntax. The policy is owned by the active task
//! and read-only to handlers; handlers evaluate it fresh per call and never
//! cache the decision.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Name of the ignore file at the workspace root.
pub const IGNORE_FILE: &str = ".agentignore";

/// Compiled workspace ignore rules.
#[derive(Debug)]
pub struct IgnorePolicy {
    root: PathBuf,
    matcher: Gitignore,
}

impl IgnorePolicy {
    /// Load the policy for a workspace root.
    ///
    /// A missing ignore file yields an empty policy that allows everything.
    /// Malformed lines are skipped with a warning, matching gitignore
    /// semantics.
    #[must_use]
    pub fn load(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut builder = GitignoreBuilder::new(&root);

        let ignore_file = root.join(IGNORE_FILE);
        if ignore_file.is_file() {
            if let Some(err) = builder.add(&ignore_file) {
                tracing::warn!(error = %err, "failed to parse workspace ignore file");
            }
        }

        let matcher = builder.build().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to build ignore matcher, allowing all paths");
            Gitignore::empty()
        });

        Self { root, matcher }
    }

    /// An empty policy that allows every path.
    #[must_use]
    pub fn allow_all(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            matcher: Gitignore::empty(),
        }
    }

    /// The workspace root this policy was loaded for.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether access to `path` is permitted.
    ///
    /// Accepts absolute paths inside the workspace or paths relative to the
    /// root. Paths outside the workspace are allowed; the ignore file only
    /// speaks for the workspace it lives in.
    #[must_use]
    pub fn allows(&self, path: &Path) -> bool {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => return true,
            }
        } else {
            path
        };

        let is_dir = self.root.join(relative).is_dir();
        !self
            .matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn workspace_with_rules(rules: &str) -> (tempfile::TempDir, IgnorePolicy) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILE), rules).unwrap();
        let policy = IgnorePolicy::load(dir.path());
        (dir, policy)
    }

    #[test]
    fn missing_ignore_file_allows_everything() {
        let dir = tempfile::tempdir().unwrap();
        let policy = IgnorePolicy::load(dir.path());
        assert!(policy.allows(Path::new("secrets.env")));
        assert!(policy.allows(&dir.path().join("src/lib.rs")));
    }

    #[test]
    fn matching_paths_are_denied() {
        let (_dir, policy) = workspace_with_rules("secrets.env\ntarget/\n");
        assert!(!policy.allows(Path::new("secrets.env")));
        assert!(policy.allows(Path::new("src/lib.rs")));
    }

    #[test]
    fn parent_directory_rules_apply_to_children() {
        let (dir, policy) = workspace_with_rules("vendor/\n");
        fs::create_dir_all(dir.path().join("vendor/lib")).unwrap();
        assert!(!policy.allows(Path::new("vendor/lib/mod.rs")));
    }

    #[test]
    fn absolute_paths_inside_workspace_are_resolved() {
        let (dir, policy) = workspace_with_rules("*.key\n");
        assert!(!policy.allows(&dir.path().join("deploy.key")));
        assert!(policy.allows(&dir.path().join("deploy.pub")));
    }

    #[test]
    fn paths_outside_workspace_are_allowed() {
        let (_dir, policy) = workspace_with_rules("*\n");
        assert!(policy.allows(Path::new("/etc/hostname")));
    }
}
