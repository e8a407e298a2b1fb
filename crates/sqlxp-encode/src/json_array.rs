//! Array-of-arrays JSON: `[[value, ...], ...]`

use std::io::{BufWriter, Write};

use sqlxp_core::RowSource;

use crate::encoder::{drain_rows, read_columns};
use crate::{CanonicalValue, EncodeError, EncodeSummary, Encoder, normalize};

/// How [`JsonArrayEncoder`] produces its document.
///
/// Both strategies write the same bytes for a successful pass. They differ
/// in memory use and in what a failure leaves behind: `Buffered` writes
/// nothing, `Streamed` leaves the rows encoded so far (without the closing
/// bracket).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayStrategy {
    /// Collect every row, then write once
    #[default]
    Buffered,
    /// Write each row as soon as it is scanned
    Streamed,
}

/// Encodes rows positionally, without column names
#[derive(Debug, Clone, Default)]
pub struct JsonArrayEncoder {
    strategy: ArrayStrategy,
}

impl JsonArrayEncoder {
    pub fn new(strategy: ArrayStrategy) -> Self {
        Self { strategy }
    }

    fn encode_buffered(
        rows: &mut dyn RowSource,
        width: usize,
        sink: &mut dyn Write,
    ) -> Result<u64, EncodeError> {
        let mut records: Vec<Vec<CanonicalValue>> = Vec::new();
        let count = drain_rows(rows, width, |slots| {
            records.push(
                slots
                    .iter_mut()
                    .map(|value| normalize(std::mem::take(value)))
                    .collect(),
            );
            Ok(())
        })?;

        let document = serde_json::to_vec(&records)?;
        sink.write_all(&document)?;
        sink.flush()?;
        Ok(count)
    }

    fn encode_streamed(
        rows: &mut dyn RowSource,
        width: usize,
        sink: &mut dyn Write,
    ) -> Result<u64, EncodeError> {
        let mut out = BufWriter::new(sink);
        out.write_all(b"[")?;

        let mut record: Vec<CanonicalValue> = Vec::with_capacity(width);
        let mut first = true;
        let result = drain_rows(rows, width, |slots| {
            record.clear();
            record.extend(slots.iter_mut().map(|value| normalize(std::mem::take(value))));
            // Serialize before writing so a bad value never leaves half a row.
            let encoded = serde_json::to_vec(&record)?;
            if !first {
                out.write_all(b",")?;
            }
            first = false;
            out.write_all(&encoded)?;
            Ok(())
        });

        match result {
            Ok(count) => {
                out.write_all(b"]")?;
                out.flush()?;
                Ok(count)
            }
            Err(err) => {
                if let Err(flush_err) = out.flush() {
                    tracing::warn!(error = %flush_err, "failed to flush partial json output");
                }
                Err(err)
            }
        }
    }
}

impl Encoder for JsonArrayEncoder {
    fn name(&self) -> &'static str {
        "json-array"
    }

    fn encode(
        &self,
        rows: &mut dyn RowSource,
        sink: &mut dyn Write,
    ) -> Result<EncodeSummary, EncodeError> {
        let columns = read_columns(rows)?;
        let count = match self.strategy {
            ArrayStrategy::Buffered => Self::encode_buffered(rows, columns.len(), sink)?,
            ArrayStrategy::Streamed => Self::encode_streamed(rows, columns.len(), sink)?,
        };

        tracing::debug!(rows = count, strategy = ?self.strategy, "json array export complete");
        Ok(EncodeSummary { rows: count })
    }
}
