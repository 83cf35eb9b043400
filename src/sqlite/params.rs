use rusqlite::types::Value;

use crate::binder::value::{date_from_temporal, time_from_temporal};
use crate::error::ExecutorError;
use crate::types::{BindDescriptor, WireTemporal, WireType};

/// Text layouts used to store temporal values in `SQLite`.
pub(crate) const DATETIME_FORMAT: &str = "%F %T%.f";
pub(crate) const DATE_FORMAT: &str = "%F";
pub(crate) const TIME_FORMAT: &str = "%T%.f";

fn int_from_le(bytes: &[u8], unsigned: bool) -> Result<i64, ExecutorError> {
    let mut raw = [0u8; 8];
    let width = bytes.len();
    if !matches!(width, 1 | 2 | 4 | 8) {
        return Err(ExecutorError::Bind(format!("integer parameter of {width} bytes")));
    }
    raw[..width].copy_from_slice(bytes);
    let negative = !unsigned && bytes[width - 1] & 0x80 != 0;
    if negative {
        raw[width..].fill(0xff);
    }
    if unsigned {
        let value = u64::from_le_bytes(raw);
        i64::try_from(value).map_err(|_| {
            ExecutorError::Bind(format!("unsigned value {value} does not fit SQLite INTEGER"))
        })
    } else {
        Ok(i64::from_le_bytes(raw))
    }
}

fn utf8(bytes: &[u8]) -> Result<String, ExecutorError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ExecutorError::Bind(format!("text parameter is not UTF-8: {e}")))
}

fn temporal_text(desc: &BindDescriptor) -> Result<String, ExecutorError> {
    let t = WireTemporal::from_bytes(desc.data())
        .map_err(|e| ExecutorError::Bind(e.to_string()))?;
    let text = match desc.wire_type {
        WireType::Date => date_from_temporal(&t)
            .map_err(|e| ExecutorError::Bind(e.to_string()))?
            .format(DATE_FORMAT)
            .to_string(),
        WireType::Time => time_from_temporal(&t)
            .map_err(|e| ExecutorError::Bind(e.to_string()))?
            .format(TIME_FORMAT)
            .to_string(),
        _ => {
            let date = date_from_temporal(&t).map_err(|e| ExecutorError::Bind(e.to_string()))?;
            let time = time_from_temporal(&t).map_err(|e| ExecutorError::Bind(e.to_string()))?;
            date.and_time(time).format(DATETIME_FORMAT).to_string()
        }
    };
    Ok(text)
}

/// Convert one bind descriptor into a rusqlite `Value`.
///
/// # Errors
/// Returns [`ExecutorError::Bind`] if the buffer does not match its wire type, or an
/// unsigned 64-bit value exceeds `i64::MAX`.
pub fn descriptor_to_sqlite_value(desc: &BindDescriptor) -> Result<Value, ExecutorError> {
    if desc.is_null {
        return Ok(Value::Null);
    }
    let bytes = desc.data();
    let value = match desc.wire_type {
        WireType::Null => Value::Null,
        WireType::Tiny | WireType::Short | WireType::Long | WireType::LongLong => {
            Value::Integer(int_from_le(bytes, desc.is_unsigned)?)
        }
        WireType::Float => {
            let raw: [u8; 4] = bytes
                .try_into()
                .map_err(|_| ExecutorError::Bind("FLOAT parameter must be 4 bytes".into()))?;
            Value::Real(f64::from(f32::from_le_bytes(raw)))
        }
        WireType::Double => {
            let raw: [u8; 8] = bytes
                .try_into()
                .map_err(|_| ExecutorError::Bind("DOUBLE parameter must be 8 bytes".into()))?;
            Value::Real(f64::from_le_bytes(raw))
        }
        WireType::String | WireType::Json => Value::Text(utf8(bytes)?),
        WireType::Blob => Value::Blob(bytes.to_vec()),
        WireType::Date | WireType::Time | WireType::DateTime => Value::Text(temporal_text(desc)?),
    };
    Ok(value)
}

/// Unified `SQLite` parameter container.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<Value>);

impl Params {
    /// Convert bind descriptors into `SQLite` values.
    ///
    /// # Errors
    ///
    /// Returns `ExecutorError::Bind` if any descriptor cannot be converted.
    pub fn convert(params: &[BindDescriptor]) -> Result<Self, ExecutorError> {
        let mut vec_values = Vec::with_capacity(params.len());
        for p in params {
            vec_values.push(descriptor_to_sqlite_value(p)?);
        }
        Ok(Params(vec_values))
    }

    /// Borrow the underlying values.
    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::BindValue;
    use chrono::NaiveDate;

    #[test]
    fn integers_are_sign_extended() {
        assert_eq!(
            descriptor_to_sqlite_value(&(-5_i8).describe().unwrap()).unwrap(),
            Value::Integer(-5)
        );
        assert_eq!(
            descriptor_to_sqlite_value(&200_u8.describe().unwrap()).unwrap(),
            Value::Integer(200)
        );
        assert_eq!(
            descriptor_to_sqlite_value(&i32::MIN.describe().unwrap()).unwrap(),
            Value::Integer(i64::from(i32::MIN))
        );
        assert_eq!(
            descriptor_to_sqlite_value(&u32::MAX.describe().unwrap()).unwrap(),
            Value::Integer(i64::from(u32::MAX))
        );
    }

    #[test]
    fn oversized_unsigned_is_a_bind_error() {
        let err = descriptor_to_sqlite_value(&u64::MAX.describe().unwrap()).unwrap_err();
        assert!(matches!(err, ExecutorError::Bind(_)));
    }

    #[test]
    fn temporal_values_become_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(
            descriptor_to_sqlite_value(&dt.describe().unwrap()).unwrap(),
            Value::Text("2024-05-06 07:08:09".into())
        );
        assert_eq!(
            descriptor_to_sqlite_value(&dt.date().describe().unwrap()).unwrap(),
            Value::Text("2024-05-06".into())
        );
    }

    #[test]
    fn null_and_text() {
        assert_eq!(
            descriptor_to_sqlite_value(&None::<String>.describe().unwrap()).unwrap(),
            Value::Null
        );
        let params = Params::convert(&["x".describe().unwrap(), 1.5_f64.describe().unwrap()]).unwrap();
        assert_eq!(
            params.as_values(),
            &[Value::Text("x".into()), Value::Real(1.5)]
        );
    }
}
