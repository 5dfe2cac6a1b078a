//! Destination store abstraction

use super::wire::WireFormat;
use crate::error::Result;

/// A SQL store that accepts delimited bulk loads, one transaction at a time
///
/// Exactly one transaction is open between `begin` and `commit`/`rollback`.
pub trait DestinationStore {
    /// Human-readable description, credentials masked
    fn describe(&self) -> String;

    /// Open a transaction
    fn begin(&mut self) -> Result<()>;

    /// Bulk-load a delimited payload into `table`'s named columns;
    /// returns the number of rows loaded
    fn copy_delimited(
        &mut self,
        table: &str,
        columns: &[String],
        payload: &[u8],
        format: &WireFormat,
    ) -> Result<u64>;

    /// Commit the open transaction
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction; a no-op when none is open
    fn rollback(&mut self) -> Result<()>;

    /// Base tables, sorted by name
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of a table in declaration order, `None` if the table does not exist
    fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>>;

    /// Row count of a table
    fn row_count(&self, table: &str) -> Result<u64>;

    /// One row of the named columns rendered as text, `None` for an empty table
    fn sample_row(&self, table: &str, columns: &[String]) -> Result<Option<Vec<Option<String>>>>;
}

/// Quote a SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
