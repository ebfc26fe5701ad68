//! Exclude patterns and the project ignore-file merged into one matcher.

use crate::{Result, ScoutError};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Compiled exclusion rules for one scan.
///
/// Combines explicit exclude globs with the base directory's ignore-file
/// when detection is enabled. Rebuilt per scan, never shared across
/// queries.
pub struct IgnoreRules {
    matcher: Gitignore,
}

impl IgnoreRules {
    /// Compile exclude patterns plus, optionally, `<base_dir>/<ignore_file>`.
    ///
    /// A missing or unreadable ignore-file contributes no rules; an invalid
    /// exclude pattern is an error.
    pub fn build(base_dir: &Path, excludes: &[String], ignore_file: Option<&str>) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(base_dir);
        for pattern in excludes {
            builder
                .add_line(None, pattern)
                .map_err(|e| ScoutError::GlobPattern(e.to_string()))?;
        }
        if let Some(name) = ignore_file {
            let path = base_dir.join(name);
            if path.is_file() && builder.add(&path).is_some() {
                tracing::debug!("skipping unreadable ignore file {}", path.display());
            }
        }
        let matcher = builder
            .build()
            .map_err(|e| ScoutError::GlobPattern(e.to_string()))?;
        Ok(Self { matcher })
    }

    /// Whether a base-relative path is excluded.
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}
