use std::sync::Arc;

use anyhow::Result;
use object_store::{ObjectStore, memory::InMemory};
use serde::Deserialize;

/// 🧠 The in-memory store has no knobs. It exists, then it doesn't.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InMemoryStoreConfig {}

pub(super) fn build(_config: &InMemoryStoreConfig) -> Result<Arc<dyn ObjectStore>> {
    Ok(Arc::new(InMemory::new()))
}
