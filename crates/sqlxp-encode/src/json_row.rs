//! Row-oriented JSON: `[{"col": value, ...}, ...]`

use std::io::Write;

use indexmap::IndexMap;
use sqlxp_core::RowSource;

use crate::encoder::{drain_rows, read_columns};
use crate::{CanonicalValue, EncodeError, EncodeSummary, Encoder, normalize};

/// Encodes each row as an object keyed by column name.
///
/// The whole document is built in memory and written with a single call, so
/// nothing reaches the sink when encoding fails. Keys keep the column order;
/// a repeated column name keeps its first position and its last value.
#[derive(Debug, Clone, Default)]
pub struct JsonRowEncoder;

impl JsonRowEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for JsonRowEncoder {
    fn name(&self) -> &'static str {
        "json-row"
    }

    fn encode(
        &self,
        rows: &mut dyn RowSource,
        sink: &mut dyn Write,
    ) -> Result<EncodeSummary, EncodeError> {
        let columns = read_columns(rows)?;

        let mut records: Vec<IndexMap<&str, CanonicalValue>> = Vec::new();
        let count = drain_rows(rows, columns.len(), |slots| {
            let record = columns
                .iter()
                .zip(slots.iter_mut())
                .map(|(name, value)| (name.as_str(), normalize(std::mem::take(value))))
                .collect();
            records.push(record);
            Ok(())
        })?;

        let document = serde_json::to_vec(&records)?;
        sink.write_all(&document)?;
        sink.flush()?;

        tracing::debug!(rows = count, bytes = document.len(), "json row export complete");
        Ok(EncodeSummary { rows: count })
    }
}
