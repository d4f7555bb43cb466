//! 🧾 success.rs: the receipt a committing job leaves behind.
//!
//! When a job commits its output, the framework's committer drops a `_SUCCESS`
//! file at the root of the destination. Old committers leave it empty (a
//! zero-byte "trust me"). Newer ones write JSON: which committer ran, which
//! files it published, a bag of metrics, a bag of diagnostics.
//!
//! We never write these in production. We read them, once, and judge.
//! The `to_json` side exists so tests can plant fixtures.
//!
//! ```text
//! {
//!   "name" : "org.apache.hadoop.fs.s3a.commit.files.SuccessData/1",
//!   "committer" : "magic",
//!   "filenames" : [ "/out/part-0000" ],
//!   "metrics" : { "files_committed" : 1 },
//!   "diagnostics" : { "fs.s3a.committer.magic.enabled" : "true" }
//! }
//! ```

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use object_store::path::Path;
use serde::{Deserialize, Serialize};

/// 🏷️ The well-known marker name, relative to the job's output directory.
pub const SUCCESS_MARKER_NAME: &str = "_SUCCESS";

/// 🗺️ Where the marker for `destination` lives.
pub fn marker_path(destination: &Path) -> Path {
    destination.child(SUCCESS_MARKER_NAME)
}

/// 🧾 A parsed success marker. Unknown fields are ignored; missing ones default.
///
/// `filenames` stays an `Option` on purpose: a marker that never listed its files
/// and a marker that listed zero files are different verdicts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessMarker {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub committer: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "jobId", default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, i64>,
    #[serde(default)]
    pub diagnostics: BTreeMap<String, String>,
    #[serde(default)]
    pub filenames: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iostatistics: Option<serde_json::Value>,
}

impl SuccessMarker {
    /// 🔍 Parse marker bytes. Empty input is not a marker; callers handle that first.
    pub fn parse(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// 🖨️ Pretty JSON, the way the committers write it.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("💀 success marker refused to become JSON")
    }

    /// 📏 Number of listed files; `None` when the marker never listed any.
    pub fn file_count(&self) -> Option<usize> {
        self.filenames.as_ref().map(Vec::len)
    }

    /// 🔎 Does the file list mention `file`? Matches the whole entry or its final segment,
    /// since committers disagree on whether entries are absolute.
    pub fn lists_file(&self, file: &str) -> bool {
        let wanted = file.trim_start_matches('/');
        self.filenames.iter().flatten().any(|listed| {
            let listed = listed.trim_start_matches('/');
            listed == wanted || listed.rsplit('/').next() == Some(wanted)
        })
    }

    /// 🧪 Fixture builder: a committer name and some files. Everything else defaults.
    pub fn new(committer: impl Into<String>, filenames: Vec<String>) -> Self {
        Self {
            name: "ccx.SuccessMarker/1".to_string(),
            committer: committer.into(),
            filenames: Some(filenames),
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: i64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    pub fn with_diagnostic(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.diagnostics.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Display for SuccessMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "committer '{}'", self.committer)?;
        match self.file_count() {
            Some(count) => write!(f, ", {} file(s)", count)?,
            None => write!(f, ", no file list")?,
        }
        if !self.metrics.is_empty() {
            write!(f, ", {} metric(s)", self.metrics.len())?;
        }
        Ok(())
    }
}
