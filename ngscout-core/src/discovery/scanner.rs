//! Dual-mode file scanners: streaming walk for local disks, per-pattern
//! bounded passes for virtual/remote folders.

use super::ignore_rules::IgnoreRules;
use super::query::NormalizedQuery;
use super::WorkspaceFolder;
use crate::{Result, ScoutError};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Everything one scan needs: the canonical query, compiled ignore rules,
/// and engine-level limits.
pub struct ScanContext<'a> {
    pub query: &'a NormalizedQuery,
    pub rules: &'a IgnoreRules,
    /// Global result cap shared across all include patterns.
    pub max_results: usize,
    pub follow_symlinks: bool,
    /// Anchor for the dotfile filter: the owning workspace folder root when
    /// one matches, otherwise the base directory itself.
    pub workspace_root: &'a Path,
}

/// One scan strategy. Implementations enumerate candidates under
/// `ctx.query.base_dir`, apply the shared post-filters, and return a
/// deduplicated, sorted, capped file list. Walk errors propagate; they are
/// only caught at the engine's `discover()` boundary.
pub trait Scanner: Send + Sync {
    fn scan(&self, ctx: &ScanContext) -> Result<Vec<PathBuf>>;
}

/// Which scan strategy a base directory routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Direct local disk: one streaming walk across all patterns.
    Local,
    /// Remote/virtual provider: one bounded pass per pattern.
    Virtual,
}

impl ScanMode {
    /// Classify by the owning workspace folder's URI scheme. No owning
    /// folder, or a `file` scheme, means local.
    pub fn classify(base_dir: &Path, folders: &[WorkspaceFolder]) -> Self {
        match owning_folder(base_dir, folders) {
            Some(folder) if !folder.is_local() => Self::Virtual,
            _ => Self::Local,
        }
    }
}

/// Longest-prefix lookup of the workspace folder containing `base_dir`.
pub fn owning_folder<'a>(
    base_dir: &Path,
    folders: &'a [WorkspaceFolder],
) -> Option<&'a WorkspaceFolder> {
    folders
        .iter()
        .filter(|folder| base_dir.starts_with(&folder.root))
        .max_by_key(|folder| folder.root.components().count())
}

/// Local-mode strategy: a single streaming walk with all include patterns
/// compiled into one glob set, stopping early once the cap is reached.
pub struct StreamScanner;

impl Scanner for StreamScanner {
    fn scan(&self, ctx: &ScanContext) -> Result<Vec<PathBuf>> {
        let include = build_glob_set(&ctx.query.include)?;
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for entry in walker(ctx).build() {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&ctx.query.base_dir) else {
                continue;
            };
            if !include.is_match(relative) {
                continue;
            }
            if !passes_filters(relative, path, ctx) {
                continue;
            }
            seen.insert(path.to_path_buf());
            if seen.len() >= ctx.max_results {
                break;
            }
        }

        Ok(finalize(seen, ctx.max_results))
    }
}

/// Remote/virtual-mode strategy: one bounded walk per include pattern so
/// each pattern can be scoped on its own, merging into a shared
/// deduplicated set. Each pass requests only the remaining budget.
pub struct PerPatternScanner;

impl Scanner for PerPatternScanner {
    fn scan(&self, ctx: &ScanContext) -> Result<Vec<PathBuf>> {
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for pattern in &ctx.query.include {
            if seen.len() >= ctx.max_results {
                break;
            }
            let budget = ctx.max_results - seen.len();
            let matcher = build_glob(pattern)?;
            self.scan_pattern(ctx, &matcher, budget, &mut seen)?;
        }

        Ok(finalize(seen, ctx.max_results))
    }
}

impl PerPatternScanner {
    fn scan_pattern(
        &self,
        ctx: &ScanContext,
        matcher: &GlobMatcher,
        budget: usize,
        seen: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        let mut taken = 0usize;
        for entry in walker(ctx).build() {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&ctx.query.base_dir) else {
                continue;
            };
            if !matcher.is_match(relative) {
                continue;
            }
            if !passes_filters(relative, path, ctx) {
                continue;
            }
            if seen.insert(path.to_path_buf()) {
                taken += 1;
                if taken >= budget {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Walk the base directory with all automatic ignore machinery off; the
/// explicit `IgnoreRules` matcher is the single source of exclusions.
fn walker(ctx: &ScanContext) -> WalkBuilder {
    let mut builder = WalkBuilder::new(&ctx.query.base_dir);
    builder
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(ctx.follow_symlinks);
    if let Some(depth) = walk_depth_hint(ctx.query) {
        builder.max_depth(Some(depth));
    }
    builder
}

/// Walker depth bound implied by the query. Files sit one level below
/// their folder, so folder depth `d` allows walk depth `d + 1`.
fn walk_depth_hint(query: &NormalizedQuery) -> Option<usize> {
    if query.disable_recursive {
        Some(1)
    } else {
        query.max_depth.map(|depth| depth + 1)
    }
}

/// Shared post-filters, in order: depth, dotfile, ignore rules.
fn passes_filters(relative: &Path, absolute: &Path, ctx: &ScanContext) -> bool {
    let segments = relative.components().count();
    if ctx.query.disable_recursive && segments > 1 {
        return false;
    }
    if let Some(max_depth) = ctx.query.max_depth {
        if segments.saturating_sub(1) > max_depth {
            return false;
        }
    }
    if !ctx.query.include_dotfiles {
        let anchored = absolute.strip_prefix(ctx.workspace_root).unwrap_or(relative);
        let dotted = anchored
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
        if dotted {
            return false;
        }
    }
    !ctx.rules.is_ignored(relative, false)
}

/// Dedup happened in the set; sort and cap here.
fn finalize(seen: HashSet<PathBuf>, max_results: usize) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = seen.into_iter().collect();
    files.sort();
    files.truncate(max_results);
    files
}

// `literal_separator` keeps `*` from crossing `/`, matching editor-style
// glob semantics rather than globset's default.
fn build_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| ScoutError::GlobPattern(e.to_string()))?;
    Ok(glob.compile_matcher())
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ScoutError::GlobPattern(e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ScoutError::GlobPattern(e.to_string()))
}

fn walk_error(err: ignore::Error) -> ScoutError {
    ScoutError::Io(io::Error::other(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::query::DiscoveryOptions;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn query(base: &Path, include: &[&str]) -> NormalizedQuery {
        NormalizedQuery::from_options(
            &DiscoveryOptions::new(base).with_include(include.iter().copied()),
        )
    }

    fn scan(scanner: &dyn Scanner, query: &NormalizedQuery, max_results: usize) -> Vec<PathBuf> {
        let rules = IgnoreRules::build(&query.base_dir, &query.exclude, None).unwrap();
        let ctx = ScanContext {
            query,
            rules: &rules,
            max_results,
            follow_symlinks: false,
            workspace_root: &query.base_dir,
        };
        scanner.scan(&ctx).unwrap()
    }

    fn relative(files: &[PathBuf], base: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(base)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn stream_scanner_returns_sorted_matches() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/z.ts");
        touch(tmp.path(), "src/a.ts");
        touch(tmp.path(), "main.ts");
        touch(tmp.path(), "readme.md");

        let query = query(tmp.path(), &["ts"]);
        let files = scan(&StreamScanner, &query, 5000);
        assert_eq!(relative(&files, tmp.path()), vec!["main.ts", "src/a.ts", "src/z.ts"]);
    }

    #[test]
    fn stream_scanner_honors_cap() {
        let tmp = TempDir::new().unwrap();
        for i in 0..10 {
            touch(tmp.path(), &format!("f{i}.ts"));
        }
        let query = query(tmp.path(), &["ts"]);
        let files = scan(&StreamScanner, &query, 3);
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn disable_recursive_keeps_only_direct_children() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "top.ts");
        touch(tmp.path(), "a/one.ts");
        touch(tmp.path(), "a/b/two.ts");

        let options = DiscoveryOptions::new(tmp.path())
            .with_include(["ts"])
            .non_recursive();
        let query = NormalizedQuery::from_options(&options);
        let files = scan(&StreamScanner, &query, 5000);
        assert_eq!(relative(&files, tmp.path()), vec!["top.ts"]);
    }

    #[test]
    fn max_depth_bounds_folder_depth() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "top.ts");
        touch(tmp.path(), "a/one.ts");
        touch(tmp.path(), "a/b/two.ts");

        let options = DiscoveryOptions::new(tmp.path())
            .with_include(["ts"])
            .with_max_depth(1);
        let query = NormalizedQuery::from_options(&options);
        let files = scan(&StreamScanner, &query, 5000);
        assert_eq!(relative(&files, tmp.path()), vec!["a/one.ts", "top.ts"]);
    }

    #[test]
    fn dotfiles_are_filtered_unless_requested() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.ts");
        touch(tmp.path(), ".hidden/b.ts");
        touch(tmp.path(), "src/.env.ts");

        let plain = query(tmp.path(), &["ts"]);
        let files = scan(&StreamScanner, &plain, 5000);
        assert_eq!(relative(&files, tmp.path()), vec!["src/a.ts"]);

        let options = DiscoveryOptions::new(tmp.path())
            .with_include(["ts"])
            .with_dotfiles(true);
        let dotted = NormalizedQuery::from_options(&options);
        let files = scan(&StreamScanner, &dotted, 5000);
        assert_eq!(
            relative(&files, tmp.path()),
            vec![".hidden/b.ts", "src/.env.ts", "src/a.ts"]
        );
    }

    #[test]
    fn ignore_rules_are_applied() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.ts");
        touch(tmp.path(), "node_modules/x/b.ts");

        let options = DiscoveryOptions::new(tmp.path())
            .with_include(["ts"])
            .with_exclude(["**/node_modules/**"]);
        let query = NormalizedQuery::from_options(&options);
        let files = scan(&StreamScanner, &query, 5000);
        assert_eq!(relative(&files, tmp.path()), vec!["src/a.ts"]);
    }

    #[test]
    fn per_pattern_scanner_dedups_overlapping_patterns() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.ts");
        touch(tmp.path(), "src/b.html");

        let query = query(tmp.path(), &["ts", "src/*.ts", "html"]);
        let files = scan(&PerPatternScanner, &query, 5000);
        assert_eq!(relative(&files, tmp.path()), vec!["src/a.ts", "src/b.html"]);
    }

    #[test]
    fn per_pattern_scanner_spends_remaining_budget_only() {
        let tmp = TempDir::new().unwrap();
        for i in 0..4 {
            touch(tmp.path(), &format!("a{i}.ts"));
            touch(tmp.path(), &format!("b{i}.html"));
        }
        let query = query(tmp.path(), &["ts", "html"]);
        let files = scan(&PerPatternScanner, &query, 5);
        assert_eq!(files.len(), 5);
    }

    #[test]
    fn literal_separator_keeps_star_within_one_segment() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "top.ts");
        touch(tmp.path(), "src/deep.ts");

        let query = query(tmp.path(), &["*.ts"]);
        let files = scan(&StreamScanner, &query, 5000);
        assert_eq!(relative(&files, tmp.path()), vec!["top.ts"]);
    }

    #[test]
    fn classify_routes_non_file_schemes_to_virtual() {
        let folders = vec![
            WorkspaceFolder::local("/work/local"),
            WorkspaceFolder::remote("/work/remote", "vscode-remote"),
        ];
        assert_eq!(
            ScanMode::classify(Path::new("/work/local/app"), &folders),
            ScanMode::Local
        );
        assert_eq!(
            ScanMode::classify(Path::new("/work/remote/app"), &folders),
            ScanMode::Virtual
        );
        assert_eq!(
            ScanMode::classify(Path::new("/elsewhere"), &folders),
            ScanMode::Local
        );
    }

    #[test]
    fn owning_folder_prefers_longest_prefix() {
        let folders = vec![
            WorkspaceFolder::local("/work"),
            WorkspaceFolder::remote("/work/remote", "ssh"),
        ];
        let owner = owning_folder(Path::new("/work/remote/src"), &folders).unwrap();
        assert_eq!(owner.root, Path::new("/work/remote"));
    }
}
