//! 📂 A directory on disk, dressed up as a bucket.
//!
//! Handy for tests that want to look at the output with `ls` afterwards, and
//! for jobs that wrote to a local path instead of a bucket.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use object_store::{ObjectStore, local::LocalFileSystem};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct LocalStoreConfig {
    /// Every object path is resolved under this directory.
    pub root: PathBuf,
    /// Create `root` if it is missing, instead of failing.
    #[serde(default = "default_create_root")]
    pub create_root: bool,
}

fn default_create_root() -> bool {
    true
}

pub(super) fn build(config: &LocalStoreConfig) -> Result<Arc<dyn ObjectStore>> {
    if config.create_root {
        std::fs::create_dir_all(&config.root).with_context(|| {
            format!(
                "💀 could not create local store root '{}'",
                config.root.display()
            )
        })?;
    }
    let store = LocalFileSystem::new_with_prefix(&config.root).with_context(|| {
        format!(
            "💀 local store root '{}' is not a usable directory. It exists in our hearts, \
             but apparently not on disk.",
            config.root.display()
        )
    })?;
    Ok(Arc::new(store))
}
