//! Column-level coercions
//!
//! Every function here is non-strict: a value that cannot be converted
//! becomes null. Functions that can lose values also return how many.

use super::dates::{parse_datetime, parse_interval};
use crate::error::Result;
use arrow::array::{
    Array, ArrayRef, AsArray, Int64Array, StringArray, StringBuilder, TimestampMicrosecondArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, TimeUnit};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::NaiveDateTime;
use std::ops::Range;
use std::sync::Arc;

/// Canonical timestamp type of parsed date columns
pub const TIMESTAMP_TYPE: DataType = DataType::Timestamp(TimeUnit::Microsecond, None);

pub fn is_list(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(_, _)
    )
}

pub fn is_binary(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Binary
            | DataType::LargeBinary
            | DataType::FixedSizeBinary(_)
            | DataType::BinaryView
    )
}

pub fn is_text(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

fn is_nested(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Struct(_) | DataType::Map(_, _) | DataType::Union(_, _)
    )
}

/// Booleans as 4-byte integers: false → 0, true → 1, null stays null
pub fn bool_to_int32(array: &ArrayRef) -> Result<ArrayRef> {
    Ok(cast(array, &DataType::Int32)?)
}

/// Flatten lists, binaries and other nested values into text
///
/// Returns `None` when the column needs no change.
pub fn flatten(array: &ArrayRef) -> Result<Option<ArrayRef>> {
    let data_type = array.data_type();
    if is_list(data_type) {
        return list_to_string(array).map(Some);
    }
    if is_binary(data_type) {
        return binary_to_hex(array).map(Some);
    }
    if is_nested(data_type) {
        return display_to_string(array).map(Some);
    }
    if let DataType::Dictionary(_, value_type) = data_type {
        let unpacked = cast(array, value_type)?;
        return Ok(Some(flatten(&unpacked)?.unwrap_or(unpacked)));
    }
    Ok(None)
}

/// Each list becomes its non-null elements joined by `,`; a null list stays null
pub fn list_to_string(array: &ArrayRef) -> Result<ArrayRef> {
    match array.data_type() {
        DataType::List(_) => {
            let list = array.as_list::<i32>();
            let offsets = list.value_offsets();
            join_elements(
                list.values(),
                (0..list.len())
                    .map(|i| list.is_valid(i).then(|| offsets[i] as usize..offsets[i + 1] as usize)),
            )
        }
        DataType::LargeList(_) => {
            let list = array.as_list::<i64>();
            let offsets = list.value_offsets();
            join_elements(
                list.values(),
                (0..list.len())
                    .map(|i| list.is_valid(i).then(|| offsets[i] as usize..offsets[i + 1] as usize)),
            )
        }
        DataType::FixedSizeList(_, size) => {
            let list = array.as_fixed_size_list();
            let size = *size as usize;
            join_elements(
                list.values(),
                (0..list.len()).map(|i| {
                    list.is_valid(i).then(|| {
                        let start = list.value_offset(i) as usize;
                        start..start + size
                    })
                }),
            )
        }
        _ => Ok(array.clone()),
    }
}

fn join_elements(
    values: &ArrayRef,
    rows: impl Iterator<Item = Option<Range<usize>>>,
) -> Result<ArrayRef> {
    let formatter = ArrayFormatter::try_new(values.as_ref(), &FormatOptions::default())?;
    let mut builder = StringBuilder::new();
    for row in rows {
        match row {
            None => builder.append_null(),
            Some(range) => {
                let elements: Vec<String> = range
                    .filter(|i| values.is_valid(*i))
                    .map(|i| formatter.value(i).to_string())
                    .collect();
                builder.append_value(elements.join(","));
            }
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Binary values as lowercase hexadecimal strings
pub fn binary_to_hex(array: &ArrayRef) -> Result<ArrayRef> {
    let hexed: StringArray = match array.data_type() {
        DataType::Binary => array.as_binary::<i32>().iter().map(|v| v.map(hex::encode)).collect(),
        DataType::LargeBinary => array
            .as_binary::<i64>()
            .iter()
            .map(|v| v.map(hex::encode))
            .collect(),
        DataType::FixedSizeBinary(_) => array
            .as_fixed_size_binary()
            .iter()
            .map(|v| v.map(hex::encode))
            .collect(),
        DataType::BinaryView => array
            .as_binary_view()
            .iter()
            .map(|v| v.map(hex::encode))
            .collect(),
        _ => return Ok(array.clone()),
    };
    Ok(Arc::new(hexed))
}

/// Struct, map and union values rendered with Arrow's display formatter
pub fn display_to_string(array: &ArrayRef) -> Result<ArrayRef> {
    let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
    let rendered: StringArray = (0..array.len())
        .map(|i| array.is_valid(i).then(|| formatter.value(i).to_string()))
        .collect();
    Ok(Arc::new(rendered))
}

/// Text values as `Utf8`, casting other string encodings
fn as_utf8(array: &ArrayRef) -> Result<ArrayRef> {
    match array.data_type() {
        DataType::Utf8 => Ok(array.clone()),
        _ => Ok(cast(array, &DataType::Utf8)?),
    }
}

fn timestamps(values: impl Iterator<Item = Option<NaiveDateTime>>) -> ArrayRef {
    let micros: TimestampMicrosecondArray = values
        .map(|v| v.map(|dt| dt.and_utc().timestamp_micros()))
        .collect();
    Arc::new(micros)
}

/// Parse a text column with the tolerant date parser
///
/// Returns the timestamp column and the number of values that failed.
pub fn parse_datetime_column(array: &ArrayRef) -> Result<(ArrayRef, u64)> {
    let text = as_utf8(array)?;
    let text = text.as_string::<i32>();
    let mut failed = 0u64;
    let parsed = timestamps(text.iter().map(|value| {
        let value = value?;
        let parsed = parse_datetime(value);
        if parsed.is_none() && !value.trim().is_empty() {
            failed += 1;
        }
        parsed
    }));
    Ok((parsed, failed))
}

/// Split an interval column into start and end timestamps
///
/// Text is parsed with [`parse_interval`]; already-typed dates and
/// timestamps become a zero-width interval. Returns `(start, end, failed)`.
pub fn split_interval_column(array: &ArrayRef) -> Result<(ArrayRef, ArrayRef, u64)> {
    match array.data_type() {
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let start = cast(array, &TIMESTAMP_TYPE)?;
            Ok((start.clone(), start, 0))
        }
        _ => {
            let text = as_utf8(array)?;
            let text = text.as_string::<i32>();
            let mut failed = 0u64;
            let mut ends = Vec::with_capacity(text.len());
            let starts = timestamps(text.iter().map(|value| {
                let (start, end) = parse_interval(value);
                let present = value.is_some_and(|v| !v.trim().is_empty());
                if present && start.is_none() && end.is_none() {
                    failed += 1;
                }
                ends.push(end);
                start
            }));
            Ok((starts, timestamps(ends.into_iter()), failed))
        }
    }
}

/// Cast to 64-bit integers; values that do not fit or parse become null
///
/// Text holding an integral float (`"12.0"`) is accepted.
pub fn cast_to_int64(array: &ArrayRef) -> Result<(ArrayRef, u64)> {
    if array.data_type() == &DataType::Int64 {
        return Ok((array.clone(), 0));
    }

    let cast_array: ArrayRef = if is_text(array.data_type()) {
        let text = as_utf8(array)?;
        let ints: Int64Array = text
            .as_string::<i32>()
            .iter()
            .map(|v| v.and_then(parse_integer))
            .collect();
        Arc::new(ints)
    } else {
        cast(array, &DataType::Int64)?
    };

    let failed = cast_array.null_count().saturating_sub(array.null_count()) as u64;
    Ok((cast_array, failed))
}

fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}
