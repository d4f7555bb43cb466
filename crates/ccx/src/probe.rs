//! 🩺 probe.rs: can we even build a client for every kind of store?
//!
//! Version drift between storage client libraries shows up at the worst possible
//! moment: halfway through a job, on the first request to the one backend nobody
//! exercised locally. So before any job runs, we construct one store of each kind
//! from a harmless offline config, plus the configured one, and report.
//!
//! 🧠 Knowledge graph:
//! - `probe_backends`: construction only, no network I/O
//! - `probe_roundtrip`: the configured store, for real: write, read, list, delete
//! - `render_probe_table`: comfy-table, for the CLI

use anyhow::{Result, bail, ensure};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use object_store::path::Path;
use tracing::{info, warn};

use crate::client::StorageClient;
use crate::stores::{
    InMemoryStoreConfig, LocalStoreConfig, S3StoreConfig, StoreConfig, build_store,
};

/// 📋 One line of the probe report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub backend: String,
    pub ok: bool,
    pub detail: String,
}

/// 🧪 One harmless config per backend kind. Nothing here reaches the network.
fn representative_configs() -> Vec<StoreConfig> {
    vec![
        StoreConfig::InMemory(InMemoryStoreConfig::default()),
        // -- 📂 a directory that already exists, so probing leaves nothing behind on disk
        StoreConfig::Local(LocalStoreConfig {
            root: std::env::temp_dir(),
            create_root: false,
        }),
        StoreConfig::S3(S3StoreConfig {
            bucket: "ccx-probe".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some("http://127.0.0.1:9".to_string()),
            access_key_id: Some("ccx-probe".to_string()),
            secret_access_key: Some("ccx-probe".to_string()),
            allow_http: true,
            virtual_hosted_style: false,
        }),
    ]
}

fn probe_one(label: String, config: &StoreConfig) -> ProbeOutcome {
    match build_store(config) {
        Ok(store) => ProbeOutcome {
            backend: label,
            ok: true,
            detail: store.to_string(),
        },
        Err(err) => {
            warn!("🩺 {} failed to build: {:#}", label, err);
            ProbeOutcome {
                backend: label,
                ok: false,
                detail: format!("{:#}", err),
            }
        }
    }
}

/// 🩺 Build one store of each kind, plus `configured` when given.
pub fn probe_backends(configured: Option<&StoreConfig>) -> Vec<ProbeOutcome> {
    let mut outcomes: Vec<ProbeOutcome> = representative_configs()
        .iter()
        .map(|config| probe_one(config.kind().to_string(), config))
        .collect();
    if let Some(config) = configured {
        outcomes.push(probe_one(format!("configured ({})", config.kind()), config));
    }
    let healthy = outcomes.iter().filter(|o| o.ok).count();
    info!("🩺 {}/{} backend(s) built cleanly", healthy, outcomes.len());
    outcomes
}

/// 🔁 Write, read back, list, delete one object under `scratch_dir` on the real store.
pub async fn probe_roundtrip(client: &StorageClient, scratch_dir: &Path) -> Result<()> {
    let probe_path = scratch_dir.child("ccx-probe.txt");
    let payload = "ccx probe: if you can read this, the store can too";

    client.put_string(&probe_path, payload).await?;
    let read_back = client.read_string(&probe_path).await?;
    ensure!(
        read_back == payload,
        "💀 wrote {} bytes to '{}' but read back {} different bytes",
        payload.len(),
        probe_path,
        read_back.len()
    );

    let listed = client.list_files_vec(scratch_dir, false).await?;
    if !listed.iter().any(|status| status.location == probe_path) {
        bail!("💀 '{}' was written but does not show up in a listing", probe_path);
    }

    client.delete(&probe_path).await?;
    ensure!(
        !client.exists(&probe_path).await?,
        "💀 '{}' survived its own deletion",
        probe_path
    );
    info!("🔁 round trip through '{}' ok", scratch_dir);
    Ok(())
}

/// 🍽️ The report, as a table.
pub fn render_probe_table(outcomes: &[ProbeOutcome]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["backend", "status", "detail"]);
    for outcome in outcomes {
        table.add_row(vec![
            Cell::new(&outcome.backend),
            Cell::new(if outcome.ok { "ok" } else { "FAILED" }),
            Cell::new(&outcome.detail),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use object_store::memory::InMemory;

    #[test]
    fn the_one_where_every_backend_kind_shows_up_for_roll_call() {
        let outcomes = probe_backends(None);
        let backends: Vec<&str> = outcomes.iter().map(|o| o.backend.as_str()).collect();
        assert_eq!(backends, vec!["in-memory", "local", "s3"]);
        assert!(
            outcomes.iter().all(|o| o.ok),
            "💀 a backend failed to build: {:?}",
            outcomes
        );
    }

    #[test]
    fn the_one_where_the_local_stand_in_never_creates_directories() {
        let local = representative_configs()
            .into_iter()
            .find_map(|config| match config {
                StoreConfig::Local(local) => Some(local),
                _ => None,
            })
            .expect("💀 roll call is missing the local backend");
        assert!(!local.create_root);
        assert_eq!(local.root, std::env::temp_dir());
    }

    #[test]
    fn the_one_where_a_broken_configured_store_is_reported_not_raised() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let broken = StoreConfig::Local(LocalStoreConfig {
            root: temp_dir.path().join("missing"),
            create_root: false,
        });
        let outcomes = probe_backends(Some(&broken));
        let last = outcomes.last().expect("💀 the configured store vanished from the report");
        assert_eq!(last.backend, "configured (local)");
        assert!(!last.ok);
        assert!(render_probe_table(&outcomes).to_string().contains("FAILED"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_roundtrip_leaves_no_trace() -> Result<()> {
        let client = StorageClient::new(Arc::new(InMemory::new()));
        probe_roundtrip(&client, &Path::from("scratch")).await?;
        assert!(client.list_all(&Path::from("scratch")).await?.is_empty());
        Ok(())
    }
}
