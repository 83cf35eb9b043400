use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Value;

use crate::binder::value::{temporal_from_date, temporal_from_datetime, temporal_from_time};
use crate::error::ExecutorError;
use crate::types::{OutputColumn, WireType};

use super::params::{DATE_FORMAT, DATETIME_FORMAT};

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Integer(_) => "INTEGER",
        Value::Real(_) => "REAL",
        Value::Text(_) => "TEXT",
        Value::Blob(_) => "BLOB",
    }
}

fn mismatch(value: &Value, column: &OutputColumn) -> ExecutorError {
    ExecutorError::Fetch(format!(
        "cannot read {} into a {:?} column",
        type_name(value),
        column.wire_type
    ))
}

// The float round-trips to the same integer only when the conversion was exact.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn exact_f32(i: i64) -> Option<f32> {
    let f = i as f32;
    (f as i128 == i128::from(i)).then_some(f)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn exact_f64(i: i64) -> Option<f64> {
    let f = i as f64;
    (f as i128 == i128::from(i)).then_some(f)
}

fn integer_bytes(i: i64, column: &OutputColumn) -> Result<Vec<u8>, ExecutorError> {
    let out_of_range = || {
        ExecutorError::Fetch(format!(
            "value {i} out of range for {}{:?} column",
            if column.is_unsigned { "unsigned " } else { "" },
            column.wire_type
        ))
    };
    let inexact = || {
        ExecutorError::Fetch(format!(
            "value {i} has no exact {:?} representation",
            column.wire_type
        ))
    };
    let bytes = match (column.wire_type, column.is_unsigned) {
        (WireType::Tiny, false) => i8::try_from(i).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        (WireType::Tiny, true) => u8::try_from(i).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        (WireType::Short, false) => i16::try_from(i).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        (WireType::Short, true) => u16::try_from(i).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        (WireType::Long, false) => i32::try_from(i).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        (WireType::Long, true) => u32::try_from(i).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        (WireType::LongLong, false) => i.to_le_bytes().to_vec(),
        (WireType::LongLong, true) => u64::try_from(i).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        (WireType::Float, _) => exact_f32(i).ok_or_else(inexact)?.to_le_bytes().to_vec(),
        (WireType::Double, _) => exact_f64(i).ok_or_else(inexact)?.to_le_bytes().to_vec(),
        (WireType::String | WireType::Json | WireType::Blob, _) => i.to_string().into_bytes(),
        _ => return Err(mismatch(&Value::Integer(i), column)),
    };
    Ok(bytes)
}

fn temporal_bytes(text: &str, column: &OutputColumn) -> Result<Vec<u8>, ExecutorError> {
    let unparsable = || {
        ExecutorError::Fetch(format!(
            "'{text}' is not a valid {:?} value",
            column.wire_type
        ))
    };
    let wire = match column.wire_type {
        WireType::DateTime => {
            let dt = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
                .or_else(|_| {
                    NaiveDate::parse_from_str(text, DATE_FORMAT)
                        .map(|d| d.and_time(NaiveTime::default()))
                })
                .map_err(|_| unparsable())?;
            temporal_from_datetime(&dt).map_err(|e| ExecutorError::Fetch(e.to_string()))?
        }
        WireType::Date => {
            let date = NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| unparsable())?;
            temporal_from_date(&date).map_err(|e| ExecutorError::Fetch(e.to_string()))?
        }
        _ => {
            let time = NaiveTime::parse_from_str(text, "%H:%M:%S%.f").map_err(|_| unparsable())?;
            temporal_from_time(&time)
        }
    };
    Ok(wire.to_bytes())
}

/// Write one `SQLite` value into an output column in the column's wire type.
/// Values larger than the buffer are copied partially and flagged as truncated.
///
/// # Errors
/// Returns [`ExecutorError::Fetch`] if the value cannot be represented in the column's type.
pub fn fill_column(value: &Value, column: &mut OutputColumn) -> Result<(), ExecutorError> {
    let bytes = match value {
        Value::Null => {
            column.set_null();
            return Ok(());
        }
        Value::Integer(i) => integer_bytes(*i, column)?,
        Value::Real(f) => match column.wire_type {
            #[allow(clippy::cast_possible_truncation)]
            WireType::Float => (*f as f32).to_le_bytes().to_vec(),
            WireType::Double => f.to_le_bytes().to_vec(),
            WireType::String | WireType::Json => f.to_string().into_bytes(),
            _ => return Err(mismatch(value, column)),
        },
        Value::Text(s) => match column.wire_type {
            WireType::String | WireType::Json | WireType::Blob => s.as_bytes().to_vec(),
            t if t.is_temporal() => temporal_bytes(s, column)?,
            _ => return Err(mismatch(value, column)),
        },
        Value::Blob(b) => match column.wire_type {
            WireType::String | WireType::Json | WireType::Blob => b.clone(),
            _ => return Err(mismatch(value, column)),
        },
    };
    column.fill(&bytes);
    Ok(())
}

/// Extract a raw `Value` from a `SQLite` row.
///
/// # Errors
///
/// Returns `ExecutorError::Fetch` if the value cannot be read.
pub fn sqlite_extract_value_sync(row: &rusqlite::Row, idx: usize) -> Result<Value, ExecutorError> {
    row.get::<_, Value>(idx)
        .map_err(|e| ExecutorError::Fetch(e.to_string()))
}
