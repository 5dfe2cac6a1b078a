//! Record transformation
//!
//! Per-batch canonicalization of column names, types and shapes so a batch
//! can be bulk-inserted as is. All value coercions are non-strict.

mod coerce;
mod dates;
mod transformer;
mod types;

pub use coerce::{
    binary_to_hex, bool_to_int32, cast_to_int64, list_to_string, parse_datetime_column,
    split_interval_column, TIMESTAMP_TYPE,
};
pub use dates::{complete_interval_end, parse_datetime, parse_interval};
pub use transformer::RecordTransformer;
pub use types::CoercionStats;
