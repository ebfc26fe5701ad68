//! Project navigator: module and route listings extracted by scanning the
//! text of discovered files. Listings share the engine's result cache, so
//! one scan serves file, module, and route views alike.

use crate::config::NavigatorConfig;
use crate::discovery::{DiscoveryEngine, DiscoveryOptions};
use crate::{Result, ScoutError};
use regex::Regex;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// A module declaration found in a source file.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleEntry {
    pub name: String,
    pub file: PathBuf,
    /// 1-based line of the module marker.
    pub line: usize,
}

/// A route declaration found in a source file.
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    pub path: String,
    pub component: Option<String>,
    pub file: PathBuf,
    pub line: usize,
}

#[derive(Clone)]
pub struct ProjectNavigator {
    engine: DiscoveryEngine,
    module_marker: Regex,
    route_pattern: Regex,
    class_pattern: Regex,
    component_pattern: Regex,
    max_file_bytes: u64,
}

impl ProjectNavigator {
    pub fn new(engine: DiscoveryEngine, config: &NavigatorConfig) -> Result<Self> {
        Ok(Self {
            engine,
            module_marker: compile(&config.module_marker)?,
            route_pattern: compile(&config.route_pattern)?,
            class_pattern: compile(r"\bclass\s+([A-Za-z_][A-Za-z0-9_]*)")?,
            component_pattern: compile(r"\bcomponent\s*:\s*([A-Za-z_][A-Za-z0-9_]*)")?,
            max_file_bytes: config.max_file_bytes,
        })
    }

    pub fn engine(&self) -> &DiscoveryEngine {
        &self.engine
    }

    /// Plain file listing, straight from the engine.
    pub async fn files(&self, options: &DiscoveryOptions) -> Arc<[PathBuf]> {
        self.engine.discover(options).await
    }

    /// List module declarations: a module-marker match followed by the
    /// next class declaration, which names the module.
    pub async fn modules(&self, options: &DiscoveryOptions) -> Result<Vec<ModuleEntry>> {
        let files = self.engine.discover(options).await;
        let marker = self.module_marker.clone();
        let class = self.class_pattern.clone();
        let max_bytes = self.max_file_bytes;

        run_extraction(move || {
            let mut entries = Vec::new();
            for file in files.iter() {
                let Some(text) = read_source(file, max_bytes) else {
                    continue;
                };
                let mut pending_marker: Option<usize> = None;
                for (index, line) in text.lines().enumerate() {
                    if marker.is_match(line) {
                        pending_marker = Some(index + 1);
                        continue;
                    }
                    if let Some(marker_line) = pending_marker {
                        if let Some(captures) = class.captures(line) {
                            entries.push(ModuleEntry {
                                name: captures[1].to_string(),
                                file: file.clone(),
                                line: marker_line,
                            });
                            pending_marker = None;
                        }
                    }
                }
            }
            entries
        })
        .await
    }

    /// List route declarations: every route-path literal, paired with a
    /// component name when one appears on the same line.
    pub async fn routes(&self, options: &DiscoveryOptions) -> Result<Vec<RouteEntry>> {
        let files = self.engine.discover(options).await;
        let route = self.route_pattern.clone();
        let component = self.component_pattern.clone();
        let max_bytes = self.max_file_bytes;

        run_extraction(move || {
            let mut entries = Vec::new();
            for file in files.iter() {
                let Some(text) = read_source(file, max_bytes) else {
                    continue;
                };
                for (index, line) in text.lines().enumerate() {
                    if let Some(captures) = route.captures(line) {
                        entries.push(RouteEntry {
                            path: captures[1].to_string(),
                            component: component
                                .captures(line)
                                .map(|c| c[1].to_string()),
                            file: file.clone(),
                            line: index + 1,
                        });
                    }
                }
            }
            entries
        })
        .await
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ScoutError::RegexPattern(e.to_string()))
}

/// Unreadable or oversized files contribute nothing; the listing degrades
/// rather than failing.
fn read_source(file: &PathBuf, max_bytes: u64) -> Option<String> {
    let metadata = std::fs::metadata(file).ok()?;
    if metadata.len() > max_bytes {
        tracing::debug!("skipping oversized file {}", file.display());
        return None;
    }
    std::fs::read_to_string(file).ok()
}

async fn run_extraction<T, F>(scan: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(scan)
        .await
        .map_err(|err| ScoutError::Io(io::Error::other(format!("scan task failed: {err}"))))
}
