//! 📡 NDJSON: one JSON document per line. Every line is lonely. No brackets to hold them.

use anyhow::{Context, Result};
use serde_json::Value;

use super::RecordCodec;

#[derive(Debug, Clone, Copy)]
pub struct NdjsonCodec;

impl RecordCodec for NdjsonCodec {
    fn encode(&self, rows: &[String]) -> String {
        // 🧮 Pre-allocate: every row plus its newline. No reallocs. No drama.
        let estimated_size: usize = rows.iter().map(|s| s.len() + 1).sum();
        let mut payload = String::with_capacity(estimated_size);
        for row in rows {
            payload.push_str(row);
            payload.push('\n');
        }
        payload
    }

    fn decode(&self, payload: &str) -> Result<Vec<Value>> {
        let bytes = payload.as_bytes();
        let mut values = Vec::new();
        let mut line_start = 0usize;
        // -- 🔍 memchr finds the newlines; the final line may not have one
        let line_ends = memchr::memchr_iter(b'\n', bytes).chain(std::iter::once(bytes.len()));
        for (line_number, line_end) in line_ends.enumerate() {
            let line = payload[line_start..line_end].trim_end_matches('\r').trim();
            line_start = line_end + 1;
            if line.is_empty() {
                continue;
            }
            let value = serde_json::from_str(line)
                .with_context(|| format!("💀 line {} is not JSON", line_number + 1))?;
            values.push(value);
        }
        Ok(values)
    }
}
