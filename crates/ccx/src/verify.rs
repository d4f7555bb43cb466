//! ✅ verify.rs: did the job really commit what it says it committed?
//!
//! Given a destination directory, find `<dest>/_SUCCESS`, wait a little if the
//! store has not caught up yet, parse it, and hold it up against what the test
//! expected: which committer, how many files, which files.
//!
//! ```text
//!   poll _SUCCESS ──not found──▶ nap ──▶ poll ... ──budget gone──▶ NotFound
//!        │
//!        ├── zero bytes ──▶ require_non_empty? EmptyMarker : Ok(None)
//!        │
//!        └── bytes ──▶ parse ──▶ committer? ──▶ filenames present? ──▶ count? ──▶ files? ──▶ Ok(Some)
//! ```
//!
//! No side effects apart from logging. Same marker in, same verdict out.
//! 🦆 The duck is the final reviewer. The duck approves only `Ok(Some(_))`.

use object_store::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{StorageClient, is_not_found};
use crate::retry::{Poll, Polled, RetryPolicy};
use crate::success::{SuccessMarker, marker_path};

/// 💀 Every way a success marker can disappoint us, by name.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The marker never became visible within the polling budget.
    #[error("success marker not found at '{path}' after {attempts} attempt(s)")]
    NotFound { path: String, attempts: u32 },

    /// Zero-length marker while a JSON one was required.
    #[error("success marker at '{path}' is empty; the job did not use a committer that writes one")]
    EmptyMarker { path: String },

    #[error("success marker at '{path}' is not valid JSON: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("success marker at '{path}' was written by committer '{actual}', expected '{expected}'")]
    CommitterMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("success marker at '{path}' has no file list")]
    MissingFileList { path: String },

    #[error("success marker at '{path}' lists {actual} file(s), expected {expected}")]
    FileCountMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("success marker at '{path}' does not list expected file '{file}'")]
    MissingFile { path: String, file: String },

    /// Anything the store threw that was not "not found". Not retried.
    #[error("could not read success marker at '{path}': {source}")]
    Storage {
        path: String,
        #[source]
        source: object_store::Error,
    },
}

impl VerifyError {
    /// 🔎 The distinguished "it never showed up" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VerifyError::NotFound { .. })
    }
}

/// 🎯 What the test expects to find in the marker. Everything optional is skipped when `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessExpectations {
    pub committer: Option<String>,
    pub file_count: Option<usize>,
    pub expected_files: Vec<String>,
    /// A zero-length marker fails when set; otherwise it means "no committer used".
    pub require_non_empty: bool,
}

impl SuccessExpectations {
    /// 🧾 Demand a JSON marker and nothing more specific.
    pub fn non_empty() -> Self {
        Self {
            require_non_empty: true,
            ..Self::default()
        }
    }

    pub fn committer(mut self, committer: impl Into<String>) -> Self {
        self.committer = Some(committer.into());
        self
    }

    pub fn file_count(mut self, count: usize) -> Self {
        self.file_count = Some(count);
        self
    }

    pub fn expect_file(mut self, file: impl Into<String>) -> Self {
        self.expected_files.push(file.into());
        self
    }

    pub fn allow_empty(mut self) -> Self {
        self.require_non_empty = false;
        self
    }
}

/// ✅ Locate, load, and judge the success marker under `destination`.
///
/// Returns `Ok(None)` only for a zero-length marker when `require_non_empty` is false.
pub async fn verify_success_marker(
    client: &StorageClient,
    destination: &Path,
    expectations: &SuccessExpectations,
    retry: &RetryPolicy,
) -> Result<Option<SuccessMarker>, VerifyError> {
    let marker = marker_path(destination);
    let shown = marker.to_string();

    // -- 🔁 the closure runs once per attempt, so it borrows; the marker path outlives the poll
    let marker = &marker;
    let polled = retry
        .poll(&shown, move || async move {
            match client.get_bytes(marker).await {
                Ok(bytes) => Poll::Ready(bytes),
                // 💤 not there yet might mean "not visible yet". Nap and look again.
                Err(err) if is_not_found(&err) => Poll::Pending,
                // 💀 access denied or no such bucket: retrying won't help
                Err(err) => Poll::Failed(err),
            }
        })
        .await;

    let bytes = match polled {
        Polled::Ready(bytes) => bytes,
        Polled::Exhausted { attempts } => {
            return Err(VerifyError::NotFound {
                path: shown,
                attempts,
            });
        }
        Polled::Failed(source) => return Err(VerifyError::Storage { path: shown, source }),
    };

    // -- 📭 zero bytes: the old committers' "trust me" marker
    if bytes.is_empty() {
        if expectations.require_non_empty {
            return Err(VerifyError::EmptyMarker { path: shown });
        }
        info!("📭 '{}' is empty: no committer-written marker, accepted", shown);
        return Ok(None);
    }

    let success = SuccessMarker::parse(&bytes).map_err(|source| VerifyError::Malformed {
        path: shown.clone(),
        source,
    })?;
    debug!("🧾 '{}': {}", shown, success);

    check_marker(&shown, &success, expectations)?;

    info!("✅ '{}' verified: {}", shown, success);
    Ok(Some(success))
}

/// ⚖️ The pure part: hold a parsed marker against the expectations.
pub fn check_marker(
    path: &str,
    success: &SuccessMarker,
    expectations: &SuccessExpectations,
) -> Result<(), VerifyError> {
    if let Some(expected) = &expectations.committer {
        if &success.committer != expected {
            return Err(VerifyError::CommitterMismatch {
                path: path.to_string(),
                expected: expected.clone(),
                actual: success.committer.clone(),
            });
        }
    }

    // -- 📋 no file list at all is its own failure, distinct from a list of the wrong length
    let Some(actual) = success.file_count() else {
        return Err(VerifyError::MissingFileList {
            path: path.to_string(),
        });
    };

    if let Some(expected) = expectations.file_count {
        if actual != expected {
            return Err(VerifyError::FileCountMismatch {
                path: path.to_string(),
                expected,
                actual,
            });
        }
    }

    // -- 🔎 first missing file wins; the error names it so the test log says which one
    if let Some(file) = expectations
        .expected_files
        .iter()
        .find(|file| !success.lists_file(file))
    {
        return Err(VerifyError::MissingFile {
            path: path.to_string(),
            file: file.clone(),
        });
    }

    Ok(())
}
