//! File discovery engine: normalized glob queries, TTL-cached results,
//! and single-flight coalescing of concurrent identical scans.

pub mod ignore_rules;
pub mod patterns;
pub mod query;
pub mod scanner;

pub use ignore_rules::IgnoreRules;
pub use query::{DiscoveryOptions, NormalizedQuery};
pub use scanner::{PerPatternScanner, ScanContext, ScanMode, Scanner, StreamScanner};

use crate::Result;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_RESULTS: usize = 5000;
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 100;

/// A root the engine knows about, with the URI scheme of its provider.
/// Anything other than `file` routes to the per-pattern scanner.
#[derive(Debug, Clone)]
pub struct WorkspaceFolder {
    pub root: PathBuf,
    pub scheme: String,
}

impl WorkspaceFolder {
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scheme: "file".to_string(),
        }
    }

    pub fn remote(root: impl Into<PathBuf>, scheme: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            scheme: scheme.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.scheme == "file"
    }
}

/// Engine-level settings; per-query knobs live in [`DiscoveryOptions`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub ttl: Duration,
    pub max_cache_entries: usize,
    pub max_results: usize,
    /// Name of the project ignore-file read from the base directory.
    pub ignore_file: String,
    pub follow_symlinks: bool,
    pub folders: Vec<WorkspaceFolder>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            max_results: DEFAULT_MAX_RESULTS,
            ignore_file: ".gitignore".to_string(),
            follow_symlinks: false,
            folders: Vec::new(),
        }
    }
}

/// User-facing error sink for failures masked by `discover()`.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Default sink: structured log only.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Read-only cache introspection for diagnostics and tests.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_secs: u64,
}

struct CacheEntry {
    files: Arc<[PathBuf]>,
    created: Instant,
}

type ScanFuture = Shared<BoxFuture<'static, Arc<[PathBuf]>>>;

struct EngineState {
    cache: Mutex<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, ScanFuture>>,
    generation: AtomicU64,
}

/// The discovery engine. Cheap to clone; clones share cache and in-flight
/// state. Construct one per test for isolation.
#[derive(Clone)]
pub struct DiscoveryEngine {
    config: Arc<EngineConfig>,
    state: Arc<EngineState>,
    notifier: Arc<dyn Notifier>,
    scanner_override: Option<Arc<dyn Scanner>>,
}

impl DiscoveryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(EngineState {
                cache: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
            notifier: Arc::new(LogNotifier),
            scanner_override: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace mode-based scanner selection with a fixed scanner. Used by
    /// tests to count invocations.
    pub fn with_scanner(mut self, scanner: Arc<dyn Scanner>) -> Self {
        self.scanner_override = Some(scanner);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Discover files for a query. Never errors: unexpected failures are
    /// logged, forwarded to the notifier, and masked as an empty result.
    ///
    /// Identical concurrent queries share one scan; results younger than
    /// the TTL are served from cache, returning the same `Arc`.
    pub async fn discover(&self, options: &DiscoveryOptions) -> Arc<[PathBuf]> {
        let query = NormalizedQuery::from_options(options);
        if query.include.is_empty() {
            return empty_result();
        }
        let key = query.cache_key();

        if let Some(pending) = self.pending_scan(&key) {
            return pending.await;
        }

        if let Some(files) = self.cached(&key) {
            return files;
        }

        let shared = {
            let mut in_flight = self.state.in_flight.lock().expect("in-flight lock");
            // A racing caller may have started the scan between the checks
            // above and this lock.
            match in_flight.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let shared = self.spawn_scan(query, key.clone());
                    in_flight.insert(key, shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    /// Drop all cached results and in-flight bookkeeping. Scans already
    /// running will finish but not repopulate the cache.
    pub fn invalidate_all(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state
            .in_flight
            .lock()
            .expect("in-flight lock")
            .clear();
        self.state.cache.lock().expect("cache lock").clear();
        tracing::debug!("discovery cache invalidated");
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.state.cache.lock().expect("cache lock");
        CacheStats {
            size: cache.len(),
            max_size: self.config.max_cache_entries,
            ttl_secs: self.config.ttl.as_secs(),
        }
    }

    fn pending_scan(&self, key: &str) -> Option<ScanFuture> {
        self.state
            .in_flight
            .lock()
            .expect("in-flight lock")
            .get(key)
            .cloned()
    }

    fn cached(&self, key: &str) -> Option<Arc<[PathBuf]>> {
        let cache = self.state.cache.lock().expect("cache lock");
        let entry = cache.get(key)?;
        if entry.created.elapsed() < self.config.ttl {
            Some(Arc::clone(&entry.files))
        } else {
            None
        }
    }

    /// Run the scan as a detached task so it settles, stores, and cleans
    /// its in-flight entry even if every awaiting caller is dropped.
    fn spawn_scan(&self, query: NormalizedQuery, key: String) -> ScanFuture {
        let engine = self.clone();
        let generation = self.state.generation.load(Ordering::SeqCst);

        let task = tokio::spawn(async move {
            let outcome = engine.run_scan(query).await;
            let files = match outcome {
                Ok(files) => {
                    let files: Arc<[PathBuf]> = Arc::from(files);
                    engine.store(&key, Arc::clone(&files), generation);
                    files
                }
                Err(err) => {
                    tracing::error!(error = %err, "file discovery failed");
                    engine.notifier.error(&format!("File discovery failed: {err}"));
                    empty_result()
                }
            };
            // Only this scan's own entry may be removed; after an
            // invalidation the slot may belong to a newer scan.
            if engine.state.generation.load(Ordering::SeqCst) == generation {
                engine
                    .state
                    .in_flight
                    .lock()
                    .expect("in-flight lock")
                    .remove(&key);
            }
            files
        });

        async move {
            match task.await {
                Ok(files) => files,
                Err(err) => {
                    tracing::error!(error = %err, "discovery task aborted");
                    empty_result()
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn run_scan(&self, query: NormalizedQuery) -> Result<Vec<PathBuf>> {
        let config = Arc::clone(&self.config);
        let scanner_override = self.scanner_override.clone();

        tokio::task::spawn_blocking(move || {
            let ignore_file = query
                .detect_ignore_file
                .then(|| config.ignore_file.as_str());
            let rules = IgnoreRules::build(&query.base_dir, &query.exclude, ignore_file)?;

            let workspace_root = scanner::owning_folder(&query.base_dir, &config.folders)
                .map(|folder| folder.root.clone())
                .unwrap_or_else(|| query.base_dir.clone());

            let scanner: Arc<dyn Scanner> = match scanner_override {
                Some(scanner) => scanner,
                None => match ScanMode::classify(&query.base_dir, &config.folders) {
                    ScanMode::Local => Arc::new(StreamScanner),
                    ScanMode::Virtual => Arc::new(PerPatternScanner),
                },
            };

            let ctx = ScanContext {
                query: &query,
                rules: &rules,
                max_results: config.max_results,
                follow_symlinks: config.follow_symlinks,
                workspace_root: &workspace_root,
            };
            scanner.scan(&ctx)
        })
        .await
        .map_err(|err| crate::ScoutError::Io(io::Error::other(format!("scan task failed: {err}"))))?
    }

    /// Insert a fresh entry, evicting expired then oldest-by-creation
    /// entries first. Skipped when an invalidation happened mid-scan.
    fn store(&self, key: &str, files: Arc<[PathBuf]>, generation: u64) {
        if self.state.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("discarding scan result from before invalidation");
            return;
        }
        let mut cache = self.state.cache.lock().expect("cache lock");
        evict_for_insert(&mut cache, self.config.ttl, self.config.max_cache_entries);
        cache.insert(
            key.to_string(),
            CacheEntry {
                files,
                created: Instant::now(),
            },
        );
    }
}

fn empty_result() -> Arc<[PathBuf]> {
    Arc::from(Vec::new())
}

/// Two-phase eviction: drop every expired entry, then drop oldest entries
/// by creation time until one slot is free. Creation time, not access
/// time, drives the second phase.
fn evict_for_insert(cache: &mut HashMap<String, CacheEntry>, ttl: Duration, max_entries: usize) {
    cache.retain(|_, entry| entry.created.elapsed() < ttl);
    while cache.len() >= max_entries.max(1) {
        let oldest = cache
            .iter()
            .min_by_key(|(_, entry)| entry.created)
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                cache.remove(&key);
            }
            None => break,
        }
    }
}
