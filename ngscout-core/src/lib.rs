//! ngscout Core - Workspace file discovery and navigation
//!
//! This library provides the core functionality behind ngscout: glob-based
//! file discovery with ignore rules, TTL-cached and coalesced scans, plus
//! the text-scan navigator and JSON-to-TypeScript transform built on top.

pub mod config;
pub mod discovery;
pub mod error;
pub mod navigator;
pub mod transform;

pub use config::Config;
pub use discovery::{
    CacheStats, DiscoveryEngine, DiscoveryOptions, EngineConfig, LogNotifier, Notifier, ScanMode,
    Scanner, WorkspaceFolder,
};
pub use error::ScoutError;
pub use navigator::{ModuleEntry, ProjectNavigator, RouteEntry};
pub use transform::json_to_interfaces;

/// Result type alias for ngscout operations
pub type Result<T> = std::result::Result<T, ScoutError>;
