//! 🚀 ccx: the front door. Loads config, sets up logging, and lets the library
//! do the judging.

mod args;

use anyhow::{Context, Result, bail};
use ccx::app_config::{AppConfig, load_config};
use ccx::probe::{probe_backends, probe_roundtrip, render_probe_table};
use ccx::stats::render_statistics_table;
use ccx::stores::build_store;
use ccx::{RetryPolicy, StorageClient, StorePath, SuccessExpectations, verify_success_marker};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // 📡 logs go to stderr so stdout stays clean for listings and `cat`
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion, one layer at a time
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let app_config = load_config(cli.config.as_deref())
        .context("💀 could not load the ccx config; check the file and the CCX_* env vars")?;

    // -- 💤 the store is built by the first command that needs it; `probe` may never ask
    let mut client = None;
    let outcome = dispatch(&cli.command, &app_config, &mut client).await;

    if cli.stats {
        if let Some(client) = &client {
            eprintln!("{}", render_statistics_table(&client.statistics()));
        }
    }
    outcome
}

/// 🔌 The configured store's client, built on first use and kept in `slot` for `--stats`.
fn connect<'a>(
    slot: &'a mut Option<StorageClient>,
    app_config: &AppConfig,
) -> Result<&'a StorageClient> {
    let client = match slot.take() {
        Some(client) => client,
        None => StorageClient::new(build_store(&app_config.store)?),
    };
    Ok(slot.insert(client))
}

async fn dispatch(
    command: &Command,
    app_config: &AppConfig,
    client: &mut Option<StorageClient>,
) -> Result<()> {
    match command {
        Command::Verify {
            destination,
            committer,
            files,
            expect_files,
            allow_empty,
            no_wait,
        } => {
            let client = connect(client, app_config)?;
            let expectations = SuccessExpectations {
                committer: committer.clone(),
                file_count: *files,
                expected_files: expect_files.clone(),
                require_non_empty: !allow_empty,
            };
            let retry = if *no_wait {
                RetryPolicy::no_retry()
            } else {
                app_config.verify.clone()
            };
            let verdict = verify_success_marker(
                client,
                &StorePath::from(destination.as_str()),
                &expectations,
                &retry,
            )
            .await?;
            match verdict {
                Some(marker) => println!("{}", marker.to_json()?),
                None => println!("empty _SUCCESS marker under '{}'", destination),
            }
        }
        Command::Ls { path, recursive } => {
            let client = connect(client, app_config)?;
            for status in client
                .list_files_vec(&StorePath::from(path.as_str()), *recursive)
                .await?
            {
                println!(
                    "{:>12}  {}  {}",
                    status.size, status.last_modified, status.location
                );
            }
        }
        Command::Cat { path } => {
            let client = connect(client, app_config)?;
            print!("{}", client.read_string(&StorePath::from(path.as_str())).await?);
        }
        Command::Put { path, text } => {
            let client = connect(client, app_config)?;
            client
                .put_string(&StorePath::from(path.as_str()), text.as_str())
                .await?;
        }
        Command::Probe { roundtrip } => {
            // -- 🩺 the report comes first; a configured store that cannot be built is a FAILED row
            let outcomes = probe_backends(Some(&app_config.store));
            println!("{}", render_probe_table(&outcomes));
            let failed = outcomes.iter().filter(|o| !o.ok).count();
            if failed > 0 {
                bail!("{} storage backend(s) failed to build", failed);
            }
            if let Some(scratch) = roundtrip {
                let client = connect(client, app_config)?;
                probe_roundtrip(client, &StorePath::from(scratch.as_str())).await?;
                println!("round trip through '{}' ok", scratch);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccx::stores::{LocalStoreConfig, StoreConfig};

    fn config_with_a_missing_local_root(dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            store: StoreConfig::Local(LocalStoreConfig {
                root: dir.path().join("not-there"),
                create_root: false,
            }),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn the_one_where_probe_reports_a_broken_store_instead_of_tripping_on_it() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let app_config = config_with_a_missing_local_root(&dir);
        let mut client = None;

        let outcome = dispatch(
            &Command::Probe { roundtrip: None },
            &app_config,
            &mut client,
        )
        .await;

        let message = format!("{:#}", outcome.expect_err("💀 a broken store should fail the probe"));
        assert!(message.contains("1 storage backend(s) failed to build"), "{}", message);
        assert!(client.is_none(), "💀 probe built a client it never needed");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_other_commands_still_need_a_working_store() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let app_config = config_with_a_missing_local_root(&dir);
        let mut client = None;

        let outcome = dispatch(
            &Command::Cat {
                path: "anything.txt".to_string(),
            },
            &app_config,
            &mut client,
        )
        .await;

        let message = format!("{:#}", outcome.expect_err("💀 cat on an unbuildable store"));
        assert!(message.contains("not-there"), "{}", message);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_client_is_built_once_and_kept_for_the_stats() -> Result<()> {
        let app_config = AppConfig::default();
        let mut client = None;

        dispatch(
            &Command::Put {
                path: "notes/hello.txt".to_string(),
                text: "hello".to_string(),
            },
            &app_config,
            &mut client,
        )
        .await?;

        let Some(kept) = &client else {
            panic!("💀 put ran but no client was kept around");
        };
        assert!(
            kept.statistics()
                .iter()
                .any(|s| s.name == "object_put_request" && s.value == 1)
        );
        Ok(())
    }
}
