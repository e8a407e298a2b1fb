//! Column-oriented JSON: `{"col": [value, ...], ...}`

use std::io::Write;

use indexmap::IndexMap;
use sqlxp_core::RowSource;

use crate::encoder::{drain_rows, read_columns};
use crate::{CanonicalValue, EncodeError, EncodeSummary, Encoder, normalize};

/// Encodes the result as one object mapping each column to its values.
///
/// Every column gets a key even when there are no rows. Keys follow the
/// column order; when a name repeats, the key is filled from the last column
/// carrying it so every array has exactly one entry per row.
#[derive(Debug, Clone, Default)]
pub struct JsonColumnEncoder;

impl JsonColumnEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for JsonColumnEncoder {
    fn name(&self) -> &'static str {
        "json-column"
    }

    fn encode(
        &self,
        rows: &mut dyn RowSource,
        sink: &mut dyn Write,
    ) -> Result<EncodeSummary, EncodeError> {
        let columns = read_columns(rows)?;

        // Column name -> index of the last column with that name.
        let mut sources: IndexMap<&str, usize> = IndexMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            sources.insert(name.as_str(), idx);
        }

        let mut document: IndexMap<&str, Vec<CanonicalValue>> = sources
            .keys()
            .map(|name| (*name, Vec::new()))
            .collect();

        let count = drain_rows(rows, columns.len(), |slots| {
            for ((_, idx), values) in sources.iter().zip(document.values_mut()) {
                values.push(normalize(std::mem::take(&mut slots[*idx])));
            }
            Ok(())
        })?;

        let bytes = serde_json::to_vec(&document)?;
        sink.write_all(&bytes)?;
        sink.flush()?;

        tracing::debug!(
            rows = count,
            columns = document.len(),
            bytes = bytes.len(),
            "json column export complete"
        );
        Ok(EncodeSummary { rows: count })
    }
}
