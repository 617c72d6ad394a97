//! Tree Audit Binary
//!
//! Loads a JSON snapshot of container nodes and checks it for structural and
//! visibility inconsistencies.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tree-audit -- path/to/snapshot.json
//!
//! # Show traversal details
//! RUST_LOG=debug cargo run --bin tree-audit -- path/to/snapshot.json
//! ```
//!
//! Exits with status 1 when any issue is found.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use catalog_core::config::TreeEngineConfig;
use catalog_core::db::InMemoryTreeStore;
use catalog_core::services::TreeService;

fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let path: PathBuf = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Usage: tree-audit <snapshot.json>"))?;

    tracing::info!("Auditing snapshot {}", path.display());

    let store = InMemoryTreeStore::from_snapshot_file(&path)?;
    let service = TreeService::new(store, TreeEngineConfig::from_env())?;
    let report = service.audit()?;

    for issue in &report.issues {
        tracing::warn!("{}", issue);
    }

    if report.is_clean() {
        tracing::info!("{} nodes checked, no issues", report.nodes_checked);
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::info!(
            "{} nodes checked, {} issue(s) found",
            report.nodes_checked,
            report.issues.len()
        );
        Ok(ExitCode::FAILURE)
    }
}
