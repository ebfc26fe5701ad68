//! Integration tests for the discovery engine's public contract: caching,
//! coalescing, invalidation, filters, and the never-errors boundary.

use ngscout_core::discovery::ScanContext;
use ngscout_core::{
    DiscoveryEngine, DiscoveryOptions, EngineConfig, Notifier, Scanner, WorkspaceFolder,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

struct CountingScanner {
    calls: AtomicUsize,
    delay: Duration,
    results: Vec<PathBuf>,
}

impl CountingScanner {
    fn new(results: Vec<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            results,
        })
    }

    fn slow(results: Vec<PathBuf>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            results,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Scanner for CountingScanner {
    fn scan(&self, _ctx: &ScanContext) -> ngscout_core::Result<Vec<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.results.clone())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"").unwrap();
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

#[tokio::test(flavor = "multi_thread")]
async fn empty_include_list_short_circuits() {
    let scanner = CountingScanner::new(vec![PathBuf::from("/repo/a.ts")]);
    let engine = DiscoveryEngine::new(EngineConfig::default()).with_scanner(scanner.clone());

    let files = engine.discover(&DiscoveryOptions::new("/repo")).await;
    assert!(files.is_empty());
    assert_eq!(scanner.calls(), 0);
    assert_eq!(engine.cache_stats().size, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_queries_share_one_scan() {
    let scanner = CountingScanner::slow(
        vec![PathBuf::from("/repo/a.ts")],
        Duration::from_millis(100),
    );
    let engine = DiscoveryEngine::new(EngineConfig::default()).with_scanner(scanner.clone());
    let options = DiscoveryOptions::new("/repo").with_include(["ts"]);

    let (first, second) = tokio::join!(engine.discover(&options), engine.discover(&options));
    assert_eq!(scanner.calls(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.as_ref(), [PathBuf::from("/repo/a.ts")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_query_is_served_from_cache() {
    let scanner = CountingScanner::new(vec![PathBuf::from("/repo/a.ts")]);
    let engine = DiscoveryEngine::new(EngineConfig::default()).with_scanner(scanner.clone());
    let options = DiscoveryOptions::new("/repo").with_include(["ts"]);

    let first = engine.discover(&options).await;
    let second = engine.discover(&options).await;
    assert_eq!(scanner.calls(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(engine.cache_stats().size, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn equivalent_queries_share_a_cache_entry() {
    let scanner = CountingScanner::new(vec![PathBuf::from("/repo/a.ts")]);
    let engine = DiscoveryEngine::new(EngineConfig::default()).with_scanner(scanner.clone());

    let a = DiscoveryOptions::new("/repo").with_include(["ts", "html"]);
    let b = DiscoveryOptions::new("/repo").with_include(["html", "**/*.ts"]);
    engine.discover(&a).await;
    engine.discover(&b).await;
    assert_eq!(scanner.calls(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalidate_all_forces_a_rescan() {
    let scanner = CountingScanner::new(vec![PathBuf::from("/repo/a.ts")]);
    let engine = DiscoveryEngine::new(EngineConfig::default()).with_scanner(scanner.clone());
    let options = DiscoveryOptions::new("/repo").with_include(["ts"]);

    engine.discover(&options).await;
    assert_eq!(engine.cache_stats().size, 1);

    engine.invalidate_all();
    assert_eq!(engine.cache_stats().size, 0);

    engine.discover(&options).await;
    assert_eq!(scanner.calls(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_entries_are_rescanned() {
    let scanner = CountingScanner::new(vec![PathBuf::from("/repo/a.ts")]);
    let config = EngineConfig {
        ttl: Duration::from_millis(40),
        ..EngineConfig::default()
    };
    let engine = DiscoveryEngine::new(config).with_scanner(scanner.clone());
    let options = DiscoveryOptions::new("/repo").with_include(["ts"]);

    engine.discover(&options).await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    engine.discover(&options).await;
    assert_eq!(scanner.calls(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn eviction_keeps_the_table_bounded() {
    let scanner = CountingScanner::new(vec![PathBuf::from("/repo/a.ts")]);
    let engine = DiscoveryEngine::new(EngineConfig::default()).with_scanner(scanner.clone());

    for i in 0..101 {
        let options = DiscoveryOptions::new("/repo").with_include([format!("ext{i}")]);
        engine.discover(&options).await;
    }
    assert_eq!(scanner.calls(), 101);
    assert!(engine.cache_stats().size <= 100);

    // The first query was the oldest entry and has been evicted.
    let oldest = DiscoveryOptions::new("/repo").with_include(["ext0"]);
    engine.discover(&oldest).await;
    assert_eq!(scanner.calls(), 102);

    // The most recent query is still cached.
    let newest = DiscoveryOptions::new("/repo").with_include(["ext100"]);
    engine.discover(&newest).await;
    assert_eq!(scanner.calls(), 102);
}

#[tokio::test(flavor = "multi_thread")]
async fn node_modules_scenario_excludes_and_dedups() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "src/a.ts");
    touch(tmp.path(), "node_modules/x/b.ts");

    // Virtual folder routes to the per-pattern scanner; the overlapping
    // patterns would yield src/a.ts twice without deduplication.
    let config = EngineConfig {
        folders: vec![WorkspaceFolder::remote(tmp.path(), "vscode-vfs")],
        ..EngineConfig::default()
    };
    let engine = DiscoveryEngine::new(config);
    let options = DiscoveryOptions::new(tmp.path())
        .with_include(["ts", "src/*.ts"])
        .with_exclude(["**/node_modules/**"])
        .with_ignore_detection(false);

    let files = engine.discover(&options).await;
    assert_eq!(relative(&files, tmp.path()), vec!["src/a.ts"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn results_are_sorted_unique_and_capped() {
    let tmp = TempDir::new().unwrap();
    for name in ["b", "a", "d", "c", "e"] {
        touch(tmp.path(), &format!("{name}.ts"));
    }

    let config = EngineConfig {
        max_results: 3,
        ..EngineConfig::default()
    };
    let engine = DiscoveryEngine::new(config);
    let options = DiscoveryOptions::new(tmp.path())
        .with_include(["ts"])
        .with_ignore_detection(false);

    let files = engine.discover(&options).await;
    assert_eq!(files.len(), 3);
    let mut sorted = files.to_vec();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.as_slice(), files.as_ref());
}

#[tokio::test(flavor = "multi_thread")]
async fn depth_and_dotfile_filters_apply_through_the_engine() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "top.ts");
    touch(tmp.path(), "a/b/deep.ts");
    touch(tmp.path(), ".git/config.ts");

    let engine = DiscoveryEngine::new(EngineConfig::default());

    let flat = DiscoveryOptions::new(tmp.path())
        .with_include(["ts"])
        .with_ignore_detection(false)
        .non_recursive();
    let files = engine.discover(&flat).await;
    assert_eq!(relative(&files, tmp.path()), vec!["top.ts"]);

    let dotted = DiscoveryOptions::new(tmp.path())
        .with_include(["ts"])
        .with_ignore_detection(false)
        .with_dotfiles(true);
    let files = engine.discover(&dotted).await;
    assert_eq!(
        relative(&files, tmp.path()),
        vec![".git/config.ts", "a/b/deep.ts", "top.ts"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn project_ignore_file_is_honored() {
    let tmp = TempDir::new().unwrap();
    touch(tmp.path(), "src/a.ts");
    touch(tmp.path(), "dist/out.ts");
    std::fs::write(tmp.path().join(".gitignore"), "dist/\n").unwrap();

    let engine = DiscoveryEngine::new(EngineConfig::default());
    let options = DiscoveryOptions::new(tmp.path()).with_include(["ts"]);
    let files = engine.discover(&options).await;
    assert_eq!(relative(&files, tmp.path()), vec!["src/a.ts"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn scan_failure_is_masked_and_notified() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = DiscoveryEngine::new(EngineConfig::default()).with_notifier(notifier.clone());

    // An unbalanced bracket makes glob compilation fail inside the scan.
    let options = DiscoveryOptions::new("/repo").with_include(["src/["]);
    let files = engine.discover(&options).await;
    assert!(files.is_empty());
    assert_eq!(notifier.messages.lock().unwrap().len(), 1);

    // Failures are not cached; the next call tries again.
    assert_eq!(engine.cache_stats().size, 0);
}
