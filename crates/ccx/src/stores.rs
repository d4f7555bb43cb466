//! 🔌 Stores: where the bytes actually live.
//!
//! 🎭 The casting agency for object stores. Need a bucket that lives and dies with
//! the test process? In-memory. A directory on disk that pretends to be a bucket?
//! Local. A real (or LocalStack-flavoured, or MinIO-flavoured) S3 endpoint? S3.
//!
//! 🧠 Knowledge graph:
//! - Pattern: config enum → `build_store` → `Arc<dyn ObjectStore>` → `StorageClient`
//! - Config co-located with the backend that uses it (`in_mem.rs`, `local.rs`, `s3.rs`)
//! - TOML shape: `[store.local]`, `[store.s3]`, `[store.in_memory]`
//! - `probe` builds one of each kind to prove the client libraries link and construct

mod in_mem;
mod local;
mod s3;

use std::sync::Arc;

use anyhow::Result;
use object_store::ObjectStore;
use serde::Deserialize;
use tracing::debug;

pub use in_mem::InMemoryStoreConfig;
pub use local::LocalStoreConfig;
pub use s3::S3StoreConfig;

/// 🎭 The many faces of a store. Externally tagged, so the TOML table name picks the variant.
///
/// Table names are snake_case only. Figment lowercases env keys, so `CCX_STORE__S3__REGION`
/// lands on `store.s3.region`; a `[store.S3]` table would sit next to it as a separate key
/// and one of the two would quietly lose.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    InMemory(InMemoryStoreConfig),
    Local(LocalStoreConfig),
    S3(S3StoreConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        // -- 💤 no config at all: a bucket made of RAM and good intentions
        StoreConfig::InMemory(InMemoryStoreConfig::default())
    }
}

impl StoreConfig {
    /// 🏷️ Short backend name for logs and probe tables.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreConfig::InMemory(_) => "in-memory",
            StoreConfig::Local(_) => "local",
            StoreConfig::S3(_) => "s3",
        }
    }

    /// 📍 Where this store points, minus anything secret.
    pub fn describe(&self) -> String {
        match self {
            StoreConfig::InMemory(_) => "memory://".to_string(),
            StoreConfig::Local(config) => format!("file://{}", config.root.display()),
            StoreConfig::S3(config) => config.describe(),
        }
    }
}

/// 🚀 Build the object store a config describes. No I/O beyond what the backend's
/// constructor does itself (local: maybe a `create_dir_all`).
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    debug!("🔌 building {} store at {}", config.kind(), config.describe());
    match config {
        StoreConfig::InMemory(in_mem_config) => in_mem::build(in_mem_config),
        StoreConfig::Local(local_config) => local::build(local_config),
        StoreConfig::S3(s3_config) => s3::build(s3_config),
    }
}
