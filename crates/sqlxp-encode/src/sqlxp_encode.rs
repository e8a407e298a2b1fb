//! sqlxp row encoders
//!
//! Turns a [`RowSource`](sqlxp_core::RowSource) into a complete document in
//! one of four shapes:
//!
//! ```text
//! csv          id,name\n1,Alice\nNULL,Bob\n
//! json rows    [{"id":1,"name":"Alice"},{"id":null,"name":"Bob"}]
//! json columns {"id":[1,null],"name":["Alice","Bob"]}
//! json arrays  [[1,"Alice"],[null,"Bob"]]
//! ```
//!
//! Every cell passes through [`normalize`] first, so all four encoders agree
//! on how driver values map to text, numbers and nulls.
//!
//! # Example
//!
//! ```rust,ignore
//! let format = OutputFormat::Json(Orientation::Column);
//! let encoder = encoder_for(format, &EncoderOptions::default());
//! encoder.encode(&mut rows, &mut std::io::stdout().lock())?;
//! ```

mod csv_export;
mod encoder;
mod json_array;
mod json_column;
mod json_row;
mod value_encoding;

pub use csv_export::{CsvEncoder, CsvOptions};
pub use encoder::{
    EncodeError, EncodeSummary, Encoder, EncoderOptions, Orientation, OutputFormat,
    ParseFormatError, encoder_for,
};
pub use json_array::{ArrayStrategy, JsonArrayEncoder};
pub use json_column::JsonColumnEncoder;
pub use json_row::JsonRowEncoder;
pub use value_encoding::{CanonicalValue, format_float, normalize};
