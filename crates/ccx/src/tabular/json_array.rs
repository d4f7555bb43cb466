//! 📦 JSON array: `[row,row,row]`. Valid JSON, for readers that insist on it.

use anyhow::Result;
use serde_json::Value;

use super::RecordCodec;

#[derive(Debug, Clone, Copy)]
pub struct JsonArrayCodec;

impl RecordCodec for JsonArrayCodec {
    fn encode(&self, rows: &[String]) -> String {
        // 🧮 brackets(2) + rows + commas(n-1). The rows are already JSON; we only frame them.
        let commas = rows.len().saturating_sub(1);
        let estimated_size: usize = 2 + rows.iter().map(|s| s.len()).sum::<usize>() + commas;
        let mut payload = String::with_capacity(estimated_size);
        payload.push('[');
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                payload.push(',');
            }
            payload.push_str(row);
        }
        payload.push(']');
        payload
    }

    fn decode(&self, payload: &str) -> Result<Vec<Value>> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_rows_get_brackets_and_commas() {
        assert_eq!(
            JsonArrayCodec.encode(&["1".into(), "2".into(), "3".into()]),
            "[1,2,3]"
        );
        assert_eq!(JsonArrayCodec.encode(&[]), "[]");
    }

    #[test]
    fn the_one_where_an_array_decodes_and_an_object_does_not() -> Result<()> {
        assert_eq!(
            JsonArrayCodec.decode(r#"[{"a":1},{"b":2}]"#)?,
            vec![json!({"a": 1}), json!({"b": 2})]
        );
        assert!(JsonArrayCodec.decode(r#"{"a":1}"#).is_err());
        Ok(())
    }
}
