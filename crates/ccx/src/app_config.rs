//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! ```toml
//! [store.s3]
//! bucket = "job-output"
//! endpoint = "http://localhost:4566"
//! allow_http = true
//!
//! [verify]
//! max_attempts = 10
//! initial_backoff_ms = 200
//! ```

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::retry::RetryPolicy;
use crate::stores::StoreConfig;

/// 📦 Everything the toolkit needs to know about itself.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// 🪣 Which store to talk to. Defaults to in-memory, which is honest but forgetful.
    #[serde(default)]
    pub store: StoreConfig,
    /// ⏳ How patiently to wait for markers to appear.
    #[serde(default, alias = "retry")]
    pub verify: RetryPolicy,
}

/// 🚀 Load the config: env vars (`CCX_*`, nested with `__`) plus an optional TOML file.
///
/// 📐 No file → env vars only. File → env + TOML merged, TOML wins on conflicts.
/// Nobody gets a surprise default `ccx.toml` they never asked for.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("CCX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (CCX_*). \
             Check the store table name (in_memory, local, s3) and the field names under it.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (CCX_*). \
                 No file was provided, so this one's all on the environment."
            .to_string(),
    };

    config.extract().context(context_msg)
}
