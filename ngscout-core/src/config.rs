//! Configuration for ngscout

use crate::discovery::{
    DiscoveryOptions, EngineConfig, DEFAULT_MAX_CACHE_ENTRIES, DEFAULT_MAX_RESULTS, DEFAULT_TTL,
};
use crate::ScoutError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# ngscout Configuration

[discovery]
# Include patterns: globs, paths, or bare extensions ("ts" becomes **/*.ts)
include = ["ts"]
# Exclude patterns (gitignore syntax)
exclude = ["**/node_modules/**", "**/dist/**", "**/.git/**"]
# Project ignore file read from the base directory
ignore_file = ".gitignore"
# Whether the ignore file is read at all
detect_ignore_file = true
# Include dotfiles and files under dot-directories
include_dotfiles = false
# Maximum folder depth below the base directory (0 = unlimited)
max_depth = 0
# Follow symbolic links while walking
follow_symlinks = false
# Time-to-live for cached scan results (e.g., "30s", "5m", "1h")
ttl = "5m"
# Maximum number of files returned by one scan
max_results = 5000
# Maximum number of cached scan results
max_cache_entries = 100

[navigator]
# Regex marking a module declaration; the next class declaration names it
module_marker = "@NgModule\\s*\\("
# Regex capturing a route path literal in group 1
route_pattern = "\\bpath\\s*:\\s*['\"]([^'\"]*)['\"]"
# Files above this size (bytes) are skipped by the navigator
max_file_bytes = 1000000
"#;

/// ngscout configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub navigator: NavigatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,
    #[serde(default = "default_detect_ignore")]
    pub detect_ignore_file: bool,
    #[serde(default)]
    pub include_dotfiles: bool,
    #[serde(default)]
    pub max_depth: usize,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_ttl")]
    pub ttl: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorConfig {
    #[serde(default = "default_module_marker")]
    pub module_marker: String,
    #[serde(default = "default_route_pattern")]
    pub route_pattern: String,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

// Default value functions
fn default_include() -> Vec<String> {
    vec!["ts".to_string()]
}
fn default_exclude() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/dist/**".to_string(),
        "**/.git/**".to_string(),
    ]
}
fn default_ignore_file() -> String {
    ".gitignore".to_string()
}
fn default_detect_ignore() -> bool {
    true
}
fn default_ttl() -> String {
    "5m".to_string()
}
fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_max_cache_entries() -> usize {
    DEFAULT_MAX_CACHE_ENTRIES
}
fn default_module_marker() -> String {
    r"@NgModule\s*\(".to_string()
}
fn default_route_pattern() -> String {
    r#"\bpath\s*:\s*['"]([^'"]*)['"]"#.to_string()
}
fn default_max_file_bytes() -> u64 {
    1_000_000
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            ignore_file: default_ignore_file(),
            detect_ignore_file: default_detect_ignore(),
            include_dotfiles: false,
            max_depth: 0,
            follow_symlinks: false,
            ttl: default_ttl(),
            max_results: default_max_results(),
            max_cache_entries: default_max_cache_entries(),
        }
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            module_marker: default_module_marker(),
            route_pattern: default_route_pattern(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| ScoutError::ConfigParse(e.to_string()))
    }

    /// Get TTL as Duration
    pub fn ttl_duration(&self) -> Duration {
        parse_duration(&self.discovery.ttl).unwrap_or(DEFAULT_TTL)
    }

    /// Engine settings derived from this config. Workspace folders are
    /// supplied by the caller.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ttl: self.ttl_duration(),
            max_cache_entries: self.discovery.max_cache_entries,
            max_results: self.discovery.max_results,
            ignore_file: self.discovery.ignore_file.clone(),
            follow_symlinks: self.discovery.follow_symlinks,
            folders: Vec::new(),
        }
    }

    /// Default discovery query for a base directory.
    pub fn discovery_options(&self, base_dir: &Path) -> DiscoveryOptions {
        let mut options = DiscoveryOptions::new(base_dir)
            .with_include(self.discovery.include.clone())
            .with_exclude(self.discovery.exclude.clone())
            .with_dotfiles(self.discovery.include_dotfiles)
            .with_ignore_detection(self.discovery.detect_ignore_file);
        if self.discovery.max_depth > 0 {
            options.max_depth = Some(self.discovery.max_depth);
        }
        options
    }
}

/// Parse duration string (e.g., "30s", "5m", "1h", "1d")
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: u64 = num_str.parse().ok()?;

    match unit {
        "s" => Some(Duration::from_secs(num)),
        "m" => Some(Duration::from_secs(num * 60)),
        "h" => Some(Duration::from_secs(num * 3600)),
        "d" => Some(Duration::from_secs(num * 86400)),
        _ => None,
    }
}
