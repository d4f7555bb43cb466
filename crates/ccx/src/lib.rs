//! 🪣 ccx: the commit checker. The job says it committed. We ask for the receipt.
//!
//! 🧠 Knowledge graph:
//! - `stores`: config → `Arc<dyn ObjectStore>` (in-memory, local disk, S3-compatible)
//! - `client`: `StorageClient`, the helper ops every test leans on, with statistics
//! - `remote_iter`: listings that page from the store, adapted into streams and Vecs
//! - `tabular`: save/load little record datasets as `part-NNNNN` files
//! - `success` + `verify`: the `_SUCCESS` marker and the assertions over it
//! - `retry`: the bounded poll that forgives eventual consistency, briefly
//! - `probe`: can every storage backend even be built? ask before the job does
//!
//! 🦆 The duck reads every `_SUCCESS` file. It has never once been surprised.

pub mod app_config;
pub mod client;
pub mod probe;
pub mod remote_iter;
pub mod retry;
pub mod stats;
pub mod stores;
pub mod success;
pub mod tabular;
pub mod verify;

pub use client::{FileStatus, StorageClient};
pub use object_store::path::Path as StorePath;
pub use retry::RetryPolicy;
pub use stats::StorageStatistic;
pub use success::{SUCCESS_MARKER_NAME, SuccessMarker};
pub use verify::{SuccessExpectations, VerifyError, verify_success_marker};
