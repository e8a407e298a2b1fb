//! CSV encoding
//!
//! The header record is written before the first row is requested and every
//! row is written as soon as it is scanned, so a late failure leaves the
//! already-encoded records in the sink.

use std::io::Write;

use sqlxp_core::RowSource;

use crate::encoder::{drain_rows, read_columns};
use crate::{EncodeError, EncodeSummary, Encoder, normalize};

/// Field and record separators for CSV output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter byte
    pub delimiter: u8,
    /// Terminate records with `\r\n` instead of `\n`
    pub crlf: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            crlf: false,
        }
    }
}

impl CsvOptions {
    fn terminator(&self) -> csv::Terminator {
        if self.crlf {
            csv::Terminator::CRLF
        } else {
            csv::Terminator::Any(b'\n')
        }
    }
}

/// Streams rows as CSV records, preceded by a header of column names
#[derive(Debug, Clone, Default)]
pub struct CsvEncoder {
    options: CsvOptions,
}

impl CsvEncoder {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }
}

impl Encoder for CsvEncoder {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn encode(
        &self,
        rows: &mut dyn RowSource,
        sink: &mut dyn Write,
    ) -> Result<EncodeSummary, EncodeError> {
        let columns = read_columns(rows)?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .terminator(self.options.terminator())
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(sink);

        writer.write_record(&columns)?;
        writer.flush()?;

        let mut record: Vec<String> = Vec::with_capacity(columns.len());
        let result = drain_rows(rows, columns.len(), |slots| {
            record.clear();
            record.extend(
                slots
                    .iter_mut()
                    .map(|value| normalize(std::mem::take(value)).into_csv_field()),
            );
            writer.write_record(&record)?;
            Ok(())
        });

        match result {
            Ok(count) => {
                writer.flush()?;
                tracing::debug!(rows = count, columns = columns.len(), "csv export complete");
                Ok(EncodeSummary { rows: count })
            }
            Err(err) => {
                // Records encoded before the failure still reach the sink.
                if let Err(flush_err) = writer.flush() {
                    tracing::warn!(error = %flush_err, "failed to flush partial csv output");
                }
                Err(err)
            }
        }
    }
}
