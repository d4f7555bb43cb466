//! 📊 stats.rs: "how many requests did that test actually make?" answered with counters.
//!
//! Every call the `StorageClient` makes against the store bumps one of these.
//! Snapshots come out sorted by name, descending, so two snapshots compare
//! line by line without anyone having to sort them at 3am.
//!
//! 🦆 The duck counts too. It just never writes anything down.

use std::sync::atomic::{AtomicU64, Ordering};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;

/// 🏷️ A single name/value pair. Read-only once it leaves the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStatistic {
    pub name: String,
    pub value: u64,
}

const STATISTIC_COUNT: usize = 8;

/// 🔢 Every counter the client keeps. The order here is irrelevant; snapshots sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    ObjectPutRequest,
    ObjectGetRequest,
    ObjectMetadataRequest,
    ObjectListRequest,
    ObjectDeleteRequest,
    ObjectNotFound,
    StreamReadBytes,
    StreamWriteBytes,
}

impl Statistic {
    pub const ALL: [Statistic; STATISTIC_COUNT] = [
        Statistic::ObjectPutRequest,
        Statistic::ObjectGetRequest,
        Statistic::ObjectMetadataRequest,
        Statistic::ObjectListRequest,
        Statistic::ObjectDeleteRequest,
        Statistic::ObjectNotFound,
        Statistic::StreamReadBytes,
        Statistic::StreamWriteBytes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectPutRequest => "object_put_request",
            Self::ObjectGetRequest => "object_get_request",
            Self::ObjectMetadataRequest => "object_metadata_request",
            Self::ObjectListRequest => "object_list_request",
            Self::ObjectDeleteRequest => "object_delete_request",
            Self::ObjectNotFound => "object_not_found",
            Self::StreamReadBytes => "stream_read_bytes",
            Self::StreamWriteBytes => "stream_write_bytes",
        }
    }

    fn slot(&self) -> usize {
        // -- 🎯 position in ALL doubles as the counter index
        Self::ALL
            .iter()
            .position(|s| s == self)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 📦 The counters themselves. Atomics, so a shared `StorageClient` stays `Send + Sync`
/// without a Mutex standing in the hallway.
#[derive(Debug, Default)]
pub(crate) struct StatisticsCounters {
    counters: [AtomicU64; STATISTIC_COUNT],
}

impl StatisticsCounters {
    pub(crate) fn increment(&self, statistic: Statistic) {
        self.add(statistic, 1);
    }

    pub(crate) fn add(&self, statistic: Statistic, amount: u64) {
        // -- 🐌 Relaxed: nobody orders other memory around these, they only ever add up
        self.counters[statistic.slot()].fetch_add(amount, Ordering::Relaxed);
    }

    pub(crate) fn get(&self, statistic: Statistic) -> u64 {
        self.counters[statistic.slot()].load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        // -- 🧽 one counter at a time; a concurrent call may land before or after the wipe
        for counter in &self.counters {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// 📸 Freeze the counters into a list, sorted by name descending.
    pub(crate) fn snapshot(&self) -> Vec<StorageStatistic> {
        sorted_statistics(Statistic::ALL.iter().map(|s| StorageStatistic {
            name: s.as_str().to_string(),
            value: self.get(*s),
        }))
    }
}

/// 🔃 Sort any bag of statistics by name, descending. Deterministic, boring, correct.
pub fn sorted_statistics(
    statistics: impl IntoIterator<Item = StorageStatistic>,
) -> Vec<StorageStatistic> {
    let mut statistics: Vec<StorageStatistic> = statistics.into_iter().collect();
    // -- 🔃 b before a: descending, so `stream_*` leads and `object_delete_request` brings up the rear
    statistics.sort_by(|a, b| b.name.cmp(&a.name));
    statistics
}

/// 🍽️ Render a snapshot as a table for humans. Machines get the Vec.
pub fn render_statistics_table(statistics: &[StorageStatistic]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["statistic", "value"]);
    // 📏 numbers right-aligned, like an accountant would want
    for statistic in statistics {
        table.add_row(vec![
            Cell::new(&statistic.name),
            Cell::new(statistic.value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
