//! Encoder trait, error taxonomy and output format selection

use std::io::Write;
use std::str::FromStr;

use sqlxp_core::{RowSource, SqlxpError, Value};
use thiserror::Error;

use crate::{ArrayStrategy, CsvEncoder, CsvOptions, JsonArrayEncoder, JsonColumnEncoder, JsonRowEncoder};

/// Errors during encoding
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to read result columns: {0}")]
    Metadata(#[source] SqlxpError),

    #[error("failed to scan row {row}: {source}")]
    Scan {
        row: u64,
        #[source]
        source: SqlxpError,
    },

    #[error("failed to serialize output: {0}")]
    Serialization(String),

    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("result cursor failed: {0}")]
    Cursor(#[source] SqlxpError),
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            EncodeError::Write(err.into())
        } else {
            EncodeError::Serialization(err.to_string())
        }
    }
}

impl From<csv::Error> for EncodeError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            EncodeError::Write(err.into())
        } else {
            EncodeError::Serialization(err.to_string())
        }
    }
}

/// Outcome of a successful encoding pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeSummary {
    /// Data rows written (the CSV header is not counted)
    pub rows: u64,
}

/// Trait for output encoders.
///
/// An encoder drains the row source completely and writes one document to
/// the sink. Encoders keep no state between calls.
pub trait Encoder: Send + Sync {
    /// Format label used in logs
    fn name(&self) -> &'static str;

    /// Encode every remaining row of `rows` into `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first failure from the row source or the sink; no further
    /// rows are consumed after it.
    ///
    /// # Panics
    ///
    /// This call blocks while the row source waits for rows. A [`RowStream`]
    /// panics when it is drained on a Tokio runtime thread, so async callers
    /// run the encoder inside `tokio::task::spawn_blocking`.
    ///
    /// [`RowStream`]: sqlxp_core::RowStream
    fn encode(
        &self,
        rows: &mut dyn RowSource,
        sink: &mut dyn Write,
    ) -> Result<EncodeSummary, EncodeError>;
}

pub(crate) fn read_columns(rows: &mut dyn RowSource) -> Result<Vec<String>, EncodeError> {
    rows.columns().map_err(EncodeError::Metadata)
}

/// Scan every row into a reused slot buffer and hand it to `on_row`.
///
/// The callback may move values out of the slots; they are overwritten by
/// the next scan. Returns the number of rows visited.
pub(crate) fn drain_rows<F>(
    rows: &mut dyn RowSource,
    width: usize,
    mut on_row: F,
) -> Result<u64, EncodeError>
where
    F: FnMut(&mut [Value]) -> Result<(), EncodeError>,
{
    let mut slots = vec![Value::Null; width];
    let mut count: u64 = 0;

    while rows.advance() {
        rows.scan(&mut slots).map_err(|source| EncodeError::Scan {
            row: count + 1,
            source,
        })?;
        on_row(&mut slots)?;
        count += 1;
    }

    if let Some(err) = rows.final_error() {
        return Err(EncodeError::Cursor(err));
    }

    Ok(count)
}

/// Errors while choosing an output format
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFormatError {
    #[error("unsupported output format '{0}'")]
    UnsupportedFormat(String),

    #[error("invalid json orientation '{0}'")]
    InvalidOrientation(String),
}

/// Shape of a JSON document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// `[{"col": v, ...}, ...]`
    #[default]
    Row,
    /// `{"col": [v, ...], ...}`
    Column,
    /// `[[v, ...], ...]`
    Array,
}

impl FromStr for Orientation {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "r" | "row" | "rows" => Ok(Orientation::Row),
            "c" | "col" | "column" | "columns" => Ok(Orientation::Column),
            "a" | "arr" | "array" | "arrays" => Ok(Orientation::Array),
            other => Err(ParseFormatError::InvalidOrientation(other.to_string())),
        }
    }
}

/// Requested output document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json(Orientation),
}

impl OutputFormat {
    /// Resolve a format name (`csv`, `json`) and, for JSON, an orientation.
    pub fn parse(format: &str, orientation: &str) -> Result<Self, ParseFormatError> {
        match format {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json(orientation.parse()?)),
            other => Err(ParseFormatError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Format name implied by an output path: everything after the last `.`,
    /// or the whole name when there is none.
    pub fn extension_of(path: &str) -> &str {
        match path.rfind('.') {
            Some(idx) => &path[idx + 1..],
            None => path,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json(Orientation::Row) => "json-row",
            OutputFormat::Json(Orientation::Column) => "json-column",
            OutputFormat::Json(Orientation::Array) => "json-array",
        }
    }
}

/// Knobs shared by [`encoder_for`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderOptions {
    pub csv: CsvOptions,
    pub array_strategy: ArrayStrategy,
}

/// Get the encoder for an output format.
pub fn encoder_for(format: OutputFormat, options: &EncoderOptions) -> Box<dyn Encoder> {
    tracing::debug!(format = format.name(), "selecting encoder");
    match format {
        OutputFormat::Csv => Box::new(CsvEncoder::new(options.csv)),
        OutputFormat::Json(Orientation::Row) => Box::new(JsonRowEncoder::new()),
        OutputFormat::Json(Orientation::Column) => Box::new(JsonColumnEncoder::new()),
        OutputFormat::Json(Orientation::Array) => {
            Box::new(JsonArrayEncoder::new(options.array_strategy))
        }
    }
}
