//! Delimited bulk-load wire format

use super::types::quote_literal;
use crate::config::LoaderConfig;
use crate::error::Result;
use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;

/// Timestamps as the store parses them
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Delimited text with a reserved null token
///
/// Empty strings are written as empty fields and SQL NULL as the token, so
/// the two stay distinguishable. Fields holding the delimiter, a quote or a
/// line break are double-quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFormat {
    delimiter: u8,
    null_token: String,
}

impl Default for WireFormat {
    fn default() -> Self {
        Self::from_config(&LoaderConfig::default())
    }
}

impl WireFormat {
    /// Delimiter and null token from loader settings
    ///
    /// `LoaderConfig::validate` guarantees an ASCII delimiter.
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            delimiter: config.delimiter as u8,
            null_token: config.null_token.clone(),
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter as char
    }

    pub fn null_token(&self) -> &str {
        &self.null_token
    }

    /// Serialize a batch, no header row
    pub fn encode(&self, batch: &RecordBatch) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .with_header(false)
            .with_delimiter(self.delimiter)
            .with_null(self.null_token.clone())
            .with_timestamp_format(TIMESTAMP_FORMAT.to_string())
            .build(Vec::new());
        writer.write(batch)?;
        Ok(writer.into_inner())
    }

    /// Reader options for a DuckDB `COPY ... FROM` of this format
    pub fn copy_options(&self) -> String {
        format!(
            "(FORMAT CSV, HEADER false, DELIMITER {}, QUOTE '\"', ESCAPE '\"', NULLSTR {})",
            quote_literal(&self.delimiter().to_string()),
            quote_literal(&self.null_token)
        )
    }
}
