use crate::error::ExecutorError;

/// Column and parameter type codes, numbered as in the MySQL binary protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Tiny = 1,
    Short = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    LongLong = 8,
    Date = 10,
    Time = 11,
    DateTime = 12,
    Json = 245,
    Blob = 252,
    String = 254,
}

impl WireType {
    /// Numeric type code sent on the wire.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Exact byte width for fixed-size types, `None` for variable-length ones.
    #[must_use]
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            WireType::Tiny => Some(1),
            WireType::Short => Some(2),
            WireType::Long | WireType::Float => Some(4),
            WireType::LongLong | WireType::Double => Some(8),
            WireType::Date | WireType::Time | WireType::DateTime => Some(WireTemporal::WIDTH),
            WireType::Null => Some(0),
            WireType::Json | WireType::Blob | WireType::String => None,
        }
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            WireType::Tiny | WireType::Short | WireType::Long | WireType::LongLong
        )
    }

    #[must_use]
    pub fn is_temporal(self) -> bool {
        matches!(self, WireType::Date | WireType::Time | WireType::DateTime)
    }

    #[must_use]
    pub fn is_variable(self) -> bool {
        self.fixed_width().is_none()
    }
}

/// Date/time value in its 11-byte wire layout:
/// `year:u16 LE, month, day, hour, minute, second, micros:u32 LE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireTemporal {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub micros: u32,
}

impl WireTemporal {
    pub const WIDTH: usize = 11;

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::WIDTH);
        out.extend_from_slice(&self.year.to_le_bytes());
        out.extend_from_slice(&[self.month, self.day, self.hour, self.minute, self.second]);
        out.extend_from_slice(&self.micros.to_le_bytes());
        out
    }

    /// Parse the wire layout.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Fetch`] if `bytes` is not exactly [`WireTemporal::WIDTH`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExecutorError> {
        if bytes.len() != Self::WIDTH {
            return Err(ExecutorError::Fetch(format!(
                "temporal value needs {} bytes, got {}",
                Self::WIDTH,
                bytes.len()
            )));
        }
        Ok(Self {
            year: u16::from_le_bytes([bytes[0], bytes[1]]),
            month: bytes[2],
            day: bytes[3],
            hour: bytes[4],
            minute: bytes[5],
            second: bytes[6],
            micros: u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]),
        })
    }
}

/// Describes one input parameter for the protocol layer.
///
/// The buffer is an owned copy of the caller's value, so the descriptor can outlive
/// the borrow it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct BindDescriptor {
    pub wire_type: WireType,
    pub buffer: Vec<u8>,
    pub length: usize,
    pub is_unsigned: bool,
    pub is_null: bool,
}

impl BindDescriptor {
    #[must_use]
    pub fn new(wire_type: WireType, buffer: Vec<u8>, is_unsigned: bool) -> Self {
        Self {
            wire_type,
            length: buffer.len(),
            buffer,
            is_unsigned,
            is_null: false,
        }
    }

    /// NULL parameter that still carries the type it would have had.
    #[must_use]
    pub fn null(wire_type: WireType, is_unsigned: bool) -> Self {
        Self {
            wire_type,
            buffer: Vec::new(),
            length: 0,
            is_unsigned,
            is_null: true,
        }
    }

    /// Bytes of the bound value.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.length.min(self.buffer.len())]
    }
}

/// Owned output buffer for one result column, plus the length, NULL and
/// truncation cells the protocol layer fills on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub wire_type: WireType,
    pub is_unsigned: bool,
    buffer: Vec<u8>,
    length: usize,
    is_null: bool,
    truncated: bool,
}

impl OutputColumn {
    #[must_use]
    pub fn with_capacity(wire_type: WireType, capacity: usize, is_unsigned: bool) -> Self {
        Self {
            wire_type,
            is_unsigned,
            buffer: vec![0; capacity],
            length: 0,
            is_null: false,
            truncated: false,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Full length of the last value written, which may exceed [`capacity`](Self::capacity).
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The part of the buffer holding the last value.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.length.min(self.buffer.len())]
    }

    /// Copy a value into the buffer. Copies at most `capacity` bytes and flags the
    /// column as truncated when `bytes` does not fit.
    pub fn fill(&mut self, bytes: &[u8]) {
        let copied = bytes.len().min(self.buffer.len());
        self.buffer[..copied].copy_from_slice(&bytes[..copied]);
        self.length = bytes.len();
        self.is_null = false;
        self.truncated = bytes.len() > self.buffer.len();
    }

    pub fn set_null(&mut self) {
        self.length = 0;
        self.is_null = true;
        self.truncated = false;
    }

    /// Enlarge the buffer to hold at least `capacity` bytes. Never shrinks.
    pub fn grow(&mut self, capacity: usize) {
        if capacity > self.buffer.len() {
            self.buffer.resize(capacity, 0);
        }
    }
}

/// Outcome of one fetch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// A row was written into the bound output columns.
    Row,
    /// At least one column did not fit its buffer; see [`OutputColumn::is_truncated`].
    Truncated,
    EndOfData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_flags_truncation_and_keeps_full_length() {
        let mut col = OutputColumn::with_capacity(WireType::String, 4, false);
        col.fill(b"abcdef");
        assert!(col.is_truncated());
        assert_eq!(col.length(), 6);
        assert_eq!(col.data(), b"abcd");

        col.grow(6);
        col.fill(b"abcdef");
        assert!(!col.is_truncated());
        assert_eq!(col.data(), b"abcdef");
    }

    #[test]
    fn set_null_clears_previous_value() {
        let mut col = OutputColumn::with_capacity(WireType::Long, 4, false);
        col.fill(&7_i32.to_le_bytes());
        col.set_null();
        assert!(col.is_null());
        assert!(col.data().is_empty());
    }

    #[test]
    fn temporal_layout_is_eleven_bytes() {
        let t = WireTemporal {
            year: 2024,
            month: 2,
            day: 29,
            hour: 23,
            minute: 59,
            second: 58,
            micros: 123_456,
        };
        let bytes = t.to_bytes();
        assert_eq!(bytes.len(), WireTemporal::WIDTH);
        assert_eq!(WireTemporal::from_bytes(&bytes).unwrap(), t);
        assert!(WireTemporal::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn fixed_widths() {
        assert_eq!(WireType::Tiny.fixed_width(), Some(1));
        assert_eq!(WireType::LongLong.fixed_width(), Some(8));
        assert_eq!(WireType::DateTime.fixed_width(), Some(11));
        assert!(WireType::String.is_variable());
        assert_eq!(WireType::String.code(), 254);
    }
}
