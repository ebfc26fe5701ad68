//! Discovery queries and their canonical cache keys.

use super::patterns;
use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// One file-listing request against the engine.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub base_dir: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub disable_recursive: bool,
    pub max_depth: Option<usize>,
    pub include_dotfiles: bool,
    pub detect_ignore_file: bool,
}

impl DiscoveryOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            include: Vec::new(),
            exclude: Vec::new(),
            disable_recursive: false,
            max_depth: None,
            include_dotfiles: false,
            detect_ignore_file: true,
        }
    }

    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict results to direct children of the base directory.
    pub fn non_recursive(mut self) -> Self {
        self.disable_recursive = true;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_dotfiles(mut self, include: bool) -> Self {
        self.include_dotfiles = include;
        self
    }

    pub fn with_ignore_detection(mut self, detect: bool) -> Self {
        self.detect_ignore_file = detect;
        self
    }
}

/// Canonical form of a query; equal queries serialize to equal keys.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedQuery {
    #[serde(serialize_with = "serialize_slash_path")]
    pub base_dir: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub disable_recursive: bool,
    pub max_depth: Option<usize>,
    pub include_dotfiles: bool,
    pub detect_ignore_file: bool,
}

impl NormalizedQuery {
    pub fn from_options(options: &DiscoveryOptions) -> Self {
        let mut include = patterns::normalize_includes(&options.include);
        include.sort();
        let mut exclude = patterns::normalize_excludes(&options.exclude);
        exclude.sort();
        Self {
            base_dir: options.base_dir.clone(),
            include,
            exclude,
            disable_recursive: options.disable_recursive,
            max_depth: options.max_depth.filter(|depth| *depth > 0),
            include_dotfiles: options.include_dotfiles,
            detect_ignore_file: options.detect_ignore_file,
        }
    }

    /// Canonical JSON cache key.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).expect("query serializes to JSON")
    }
}

fn serialize_slash_path<S>(path: &PathBuf, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&path.to_string_lossy().replace('\\', "/"))
}
