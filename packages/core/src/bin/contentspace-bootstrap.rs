//! Bootstrap dry run
//!
//! Runs the repository bootstrap against an in-memory store and prints the
//! resulting documents tree as JSON. Useful for checking a seed directory
//! and a node type schema before pointing them at a real repository.
//!
//! # Usage
//!
//! ```bash
//! # Config path as argument
//! cargo run --bin contentspace-bootstrap -- contentspace.json
//!
//! # Or through the environment
//! CONTENTSPACE_CONFIG=contentspace.json cargo run --bin contentspace-bootstrap
//! ```
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use contentspace_core::{
    db::MemoryTreeStore,
    services::{select_attachment_source, BootstrapSeeder, ContentRepository, SeedIndex},
    EcmConfig,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Environment variable naming the config file
const ENV_CONFIG: &str = "CONTENTSPACE_CONFIG";

/// Config file used when neither argument nor environment name one
const DEFAULT_CONFIG: &str = "contentspace.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ENV_CONFIG).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let config = EcmConfig::from_json_file(&config_path)
        .await
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    let config = Arc::new(config);

    let attachments = select_attachment_source(&config, None);
    let seeds = Arc::new(SeedIndex::load(&config, attachments.as_ref()).await);
    println!("📦 Loaded {} seed records", seeds.len());

    let store = Arc::new(MemoryTreeStore::new());
    let repository = Arc::new(ContentRepository::from_store(store, config.clone()));

    let report = BootstrapSeeder::new(repository.clone(), seeds)
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Bootstrap failed: {}", e))?;
    println!("✅ Bootstrap finished");
    println!("{}", serde_json::to_string_pretty(&report)?);

    let tree = repository
        .get_documents_tree()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read documents tree: {}", e))?;
    println!("{}", serde_json::to_string_pretty(&tree)?);

    Ok(())
}
