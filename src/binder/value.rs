//! Per-type mapping between Rust values and wire buffers.
//!
//! The set of bindable types is closed: [`BindValue`] and [`ColumnValue`] are sealed,
//! so asking for an unsupported type is a compile error rather than a runtime one.
//!
//! ```compile_fail
//! use sql_typed_executor::binder::ColumnValue;
//!
//! fn column<T: ColumnValue>() {}
//! column::<std::time::Duration>();
//! ```

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::Value as JsonValue;

use crate::config::ExecutorOptions;
use crate::error::ExecutorError;
use crate::types::{BindDescriptor, WireTemporal, WireType};

mod sealed {
    pub trait Sealed {}
}

/// A value that can be bound to a statement placeholder.
pub trait BindValue: sealed::Sealed {
    const WIRE_TYPE: WireType;
    const UNSIGNED: bool = false;

    /// Wire bytes of the value.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Bind`] if the value has no wire representation,
    /// e.g. a date whose year does not fit the 16-bit year field.
    fn encode(&self) -> Result<Vec<u8>, ExecutorError>;

    /// Descriptor owning a copy of the encoded value.
    ///
    /// # Errors
    /// Same as [`encode`](Self::encode).
    fn describe(&self) -> Result<BindDescriptor, ExecutorError> {
        Ok(BindDescriptor::new(
            Self::WIRE_TYPE,
            self.encode()?,
            Self::UNSIGNED,
        ))
    }
}

/// A type a result column can be decoded into.
pub trait ColumnValue: Sized + sealed::Sealed {
    const WIRE_TYPE: WireType;
    const UNSIGNED: bool = false;

    /// Starting buffer size for this column.
    #[must_use]
    fn capacity(options: &ExecutorOptions) -> usize {
        Self::WIRE_TYPE
            .fixed_width()
            .unwrap_or(options.initial_column_capacity)
    }

    /// What a SQL NULL decodes to.
    fn null_value() -> Self;

    /// Decode a non-NULL column.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Fetch`] if the bytes are not a valid encoding of `Self`.
    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError>;
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], ExecutorError> {
    bytes.try_into().map_err(|_| {
        ExecutorError::Fetch(format!("expected {N} bytes, got {}", bytes.len()))
    })
}

macro_rules! impl_numeric {
    ($($ty:ty => $wire:ident, $unsigned:expr);+ $(;)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl BindValue for $ty {
                const WIRE_TYPE: WireType = WireType::$wire;
                const UNSIGNED: bool = $unsigned;

                fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
                    Ok(self.to_le_bytes().to_vec())
                }
            }

            impl ColumnValue for $ty {
                const WIRE_TYPE: WireType = WireType::$wire;
                const UNSIGNED: bool = $unsigned;

                fn null_value() -> Self {
                    <$ty>::default()
                }

                fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
                    Ok(<$ty>::from_le_bytes(fixed(bytes)?))
                }
            }
        )+
    };
}

impl_numeric! {
    i8 => Tiny, false;
    u8 => Tiny, true;
    i16 => Short, false;
    u16 => Short, true;
    i32 => Long, false;
    u32 => Long, true;
    i64 => LongLong, false;
    u64 => LongLong, true;
    f32 => Float, false;
    f64 => Double, false;
}

impl sealed::Sealed for bool {}

impl BindValue for bool {
    const WIRE_TYPE: WireType = WireType::Tiny;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(vec![u8::from(*self)])
    }
}

impl ColumnValue for bool {
    const WIRE_TYPE: WireType = WireType::Tiny;

    fn null_value() -> Self {
        false
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
        let [b] = fixed::<1>(bytes)?;
        Ok(b != 0)
    }
}

impl sealed::Sealed for str {}
impl sealed::Sealed for String {}

impl BindValue for str {
    const WIRE_TYPE: WireType = WireType::String;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl BindValue for String {
    const WIRE_TYPE: WireType = WireType::String;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl ColumnValue for String {
    const WIRE_TYPE: WireType = WireType::String;

    fn null_value() -> Self {
        String::new()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ExecutorError::Fetch(format!("invalid UTF-8 in string column: {e}")))
    }
}

impl sealed::Sealed for [u8] {}
impl sealed::Sealed for Vec<u8> {}

impl BindValue for [u8] {
    const WIRE_TYPE: WireType = WireType::Blob;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(self.to_vec())
    }
}

impl BindValue for Vec<u8> {
    const WIRE_TYPE: WireType = WireType::Blob;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(self.clone())
    }
}

impl ColumnValue for Vec<u8> {
    const WIRE_TYPE: WireType = WireType::Blob;

    fn null_value() -> Self {
        Vec::new()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
        Ok(bytes.to_vec())
    }
}

impl sealed::Sealed for JsonValue {}

impl BindValue for JsonValue {
    const WIRE_TYPE: WireType = WireType::Json;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(self.to_string().into_bytes())
    }
}

impl ColumnValue for JsonValue {
    const WIRE_TYPE: WireType = WireType::Json;

    fn null_value() -> Self {
        JsonValue::Null
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ExecutorError::Fetch(format!("invalid JSON column: {e}")))
    }
}

/// Split a timestamp into its wire fields.
///
/// # Errors
/// Same as [`temporal_from_date`].
pub fn temporal_from_datetime(dt: &NaiveDateTime) -> Result<WireTemporal, ExecutorError> {
    let mut t = temporal_from_date(&dt.date())?;
    let time = temporal_from_time(&dt.time());
    t.hour = time.hour;
    t.minute = time.minute;
    t.second = time.second;
    t.micros = time.micros;
    Ok(t)
}

/// Split a date into its wire fields.
///
/// # Errors
/// Returns [`ExecutorError::Bind`] if the year is outside `0..=65535`.
pub fn temporal_from_date(date: &NaiveDate) -> Result<WireTemporal, ExecutorError> {
    let year = u16::try_from(date.year()).map_err(|_| {
        ExecutorError::Bind(format!(
            "year {} of {date} is outside the supported range 0..=65535",
            date.year()
        ))
    })?;
    Ok(WireTemporal {
        year,
        month: date.month() as u8,
        day: date.day() as u8,
        ..WireTemporal::default()
    })
}

#[must_use]
pub fn temporal_from_time(time: &NaiveTime) -> WireTemporal {
    WireTemporal {
        hour: time.hour() as u8,
        minute: time.minute() as u8,
        second: time.second() as u8,
        // leap-second nanos run past 1e9; keep them inside the last second
        micros: (time.nanosecond() / 1_000).min(999_999),
        ..WireTemporal::default()
    }
}

/// Rebuild a date from wire fields.
///
/// # Errors
/// Returns [`ExecutorError::Fetch`] if the fields do not form a calendar date.
pub fn date_from_temporal(t: &WireTemporal) -> Result<NaiveDate, ExecutorError> {
    NaiveDate::from_ymd_opt(i32::from(t.year), u32::from(t.month), u32::from(t.day)).ok_or_else(
        || {
            ExecutorError::Fetch(format!(
                "invalid date {:04}-{:02}-{:02}",
                t.year, t.month, t.day
            ))
        },
    )
}

/// Rebuild a time of day from wire fields.
///
/// # Errors
/// Returns [`ExecutorError::Fetch`] if the fields are out of range.
pub fn time_from_temporal(t: &WireTemporal) -> Result<NaiveTime, ExecutorError> {
    NaiveTime::from_hms_micro_opt(
        u32::from(t.hour),
        u32::from(t.minute),
        u32::from(t.second),
        t.micros,
    )
    .ok_or_else(|| {
        ExecutorError::Fetch(format!(
            "invalid time {:02}:{:02}:{:02}.{:06}",
            t.hour, t.minute, t.second, t.micros
        ))
    })
}

impl sealed::Sealed for NaiveDateTime {}
impl sealed::Sealed for NaiveDate {}
impl sealed::Sealed for NaiveTime {}

impl BindValue for NaiveDateTime {
    const WIRE_TYPE: WireType = WireType::DateTime;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(temporal_from_datetime(self)?.to_bytes())
    }
}

impl ColumnValue for NaiveDateTime {
    const WIRE_TYPE: WireType = WireType::DateTime;

    fn null_value() -> Self {
        NaiveDateTime::default()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
        let t = WireTemporal::from_bytes(bytes)?;
        Ok(NaiveDateTime::new(
            date_from_temporal(&t)?,
            time_from_temporal(&t)?,
        ))
    }
}

impl BindValue for NaiveDate {
    const WIRE_TYPE: WireType = WireType::Date;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(temporal_from_date(self)?.to_bytes())
    }
}

impl ColumnValue for NaiveDate {
    const WIRE_TYPE: WireType = WireType::Date;

    fn null_value() -> Self {
        NaiveDate::default()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
        date_from_temporal(&WireTemporal::from_bytes(bytes)?)
    }
}

impl BindValue for NaiveTime {
    const WIRE_TYPE: WireType = WireType::Time;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        Ok(temporal_from_time(self).to_bytes())
    }
}

impl ColumnValue for NaiveTime {
    const WIRE_TYPE: WireType = WireType::Time;

    fn null_value() -> Self {
        NaiveTime::default()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
        time_from_temporal(&WireTemporal::from_bytes(bytes)?)
    }
}

impl<T: BindValue + ?Sized> sealed::Sealed for &T {}

impl<T: BindValue + ?Sized> BindValue for &T {
    const WIRE_TYPE: WireType = T::WIRE_TYPE;
    const UNSIGNED: bool = T::UNSIGNED;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        (**self).encode()
    }

    fn describe(&self) -> Result<BindDescriptor, ExecutorError> {
        (**self).describe()
    }
}

impl<T: sealed::Sealed> sealed::Sealed for Option<T> {}

/// `None` binds as NULL.
impl<T: BindValue> BindValue for Option<T> {
    const WIRE_TYPE: WireType = T::WIRE_TYPE;
    const UNSIGNED: bool = T::UNSIGNED;

    fn encode(&self) -> Result<Vec<u8>, ExecutorError> {
        self.as_ref().map_or_else(|| Ok(Vec::new()), BindValue::encode)
    }

    fn describe(&self) -> Result<BindDescriptor, ExecutorError> {
        match self {
            Some(value) => value.describe(),
            None => Ok(BindDescriptor::null(T::WIRE_TYPE, T::UNSIGNED)),
        }
    }
}

/// NULL decodes as `None`.
impl<T: ColumnValue> ColumnValue for Option<T> {
    const WIRE_TYPE: WireType = T::WIRE_TYPE;
    const UNSIGNED: bool = T::UNSIGNED;

    fn capacity(options: &ExecutorOptions) -> usize {
        T::capacity(options)
    }

    fn null_value() -> Self {
        None
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExecutorError> {
        T::decode(bytes).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_carry_width_and_sign_from_their_type() {
        let d = 5_i32.describe().unwrap();
        assert_eq!(d.wire_type, WireType::Long);
        assert_eq!(d.length, 4);
        assert!(!d.is_unsigned);
        assert_eq!(d.data(), &5_i32.to_le_bytes());

        let d = u16::MAX.describe().unwrap();
        assert_eq!(d.wire_type, WireType::Short);
        assert!(d.is_unsigned);

        assert_eq!(<u64 as ColumnValue>::decode(&u64::MAX.to_le_bytes()).unwrap(), u64::MAX);
        assert!(<i64 as ColumnValue>::decode(&[1, 2, 3]).is_err());
    }

    #[test]
    fn strings_bind_by_value_copy() {
        let s = String::from("x");
        let d = (&s).describe().unwrap();
        drop(s);
        assert_eq!(d.wire_type, WireType::String);
        assert_eq!(d.data(), b"x");
        assert_eq!(d.length, 1);

        let d = "hello".describe().unwrap();
        assert_eq!(d.data(), b"hello");
    }

    #[test]
    fn none_binds_null_with_type() {
        let d = None::<u32>.describe().unwrap();
        assert!(d.is_null);
        assert_eq!(d.wire_type, WireType::Long);
        assert!(d.is_unsigned);
        assert_eq!(d.length, 0);

        let d = Some(3_i8).describe().unwrap();
        assert!(!d.is_null);
        assert_eq!(d.data(), &[3]);
    }

    #[test]
    fn null_values_are_zero_values() {
        assert_eq!(<i32 as ColumnValue>::null_value(), 0);
        assert_eq!(<f64 as ColumnValue>::null_value(), 0.0);
        assert!(!<bool as ColumnValue>::null_value());
        assert_eq!(<String as ColumnValue>::null_value(), "");
        assert!(<Vec<u8> as ColumnValue>::null_value().is_empty());
        assert_eq!(<JsonValue as ColumnValue>::null_value(), JsonValue::Null);
        assert_eq!(
            <NaiveDateTime as ColumnValue>::null_value(),
            NaiveDateTime::default()
        );
        assert_eq!(<Option<String> as ColumnValue>::null_value(), None);
    }

    #[test]
    fn datetime_survives_the_wire_layout() {
        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_micro_opt(8, 30, 15, 250_000)
            .unwrap();
        let d = dt.describe().unwrap();
        assert_eq!(d.wire_type, WireType::DateTime);
        assert_eq!(d.length, WireTemporal::WIDTH);
        assert_eq!(<NaiveDateTime as ColumnValue>::decode(d.data()).unwrap(), dt);

        let bogus = WireTemporal {
            year: 2023,
            month: 13,
            day: 1,
            ..WireTemporal::default()
        };
        assert!(<NaiveDate as ColumnValue>::decode(&bogus.to_bytes()).is_err());
    }

    #[test]
    fn variable_columns_use_configured_capacity() {
        let opts = ExecutorOptions::builder().initial_column_capacity(32).finish();
        assert_eq!(<String as ColumnValue>::capacity(&opts), 32);
        assert_eq!(<Option<Vec<u8>> as ColumnValue>::capacity(&opts), 32);
        assert_eq!(<i16 as ColumnValue>::capacity(&opts), 2);
        assert_eq!(<NaiveTime as ColumnValue>::capacity(&opts), WireTemporal::WIDTH);
    }

    #[test]
    fn bad_utf8_and_json_are_fetch_errors() {
        assert!(matches!(
            <String as ColumnValue>::decode(&[0xff, 0xfe]),
            Err(ExecutorError::Fetch(_))
        ));
        assert!(<JsonValue as ColumnValue>::decode(b"{not json").is_err());
        assert_eq!(
            <JsonValue as ColumnValue>::decode(br#"{"a":1}"#).unwrap(),
            serde_json::json!({"a": 1})
        );
    }

    #[test]
    fn years_outside_the_wire_range_are_bind_errors() {
        let before_year_zero = NaiveDate::from_ymd_opt(-5, 3, 4).unwrap();
        assert!(matches!(
            before_year_zero.describe(),
            Err(ExecutorError::Bind(msg)) if msg.contains("-5")
        ));

        let far_future = NaiveDate::from_ymd_opt(70_000, 1, 1).unwrap();
        assert!(matches!(far_future.describe(), Err(ExecutorError::Bind(_))));
        assert!(matches!(
            far_future.and_hms_opt(0, 0, 0).unwrap().describe(),
            Err(ExecutorError::Bind(_))
        ));
        assert!(Some(far_future).describe().is_err());

        let edge = NaiveDate::from_ymd_opt(65_535, 12, 31).unwrap();
        let d = edge.describe().unwrap();
        assert_eq!(<NaiveDate as ColumnValue>::decode(d.data()).unwrap(), edge);
        let zero = NaiveDate::from_ymd_opt(0, 1, 1).unwrap();
        assert_eq!(
            <NaiveDate as ColumnValue>::decode(zero.describe().unwrap().data()).unwrap(),
            zero
        );
    }
}
