//! Typed binding between Rust values and statement buffers.
//!
//! - `value`: per-type wire mapping (the closed set of bindable types)
//! - `params`: input tuples to parameter descriptors
//! - `row`: output buffers, the fetch loop and row decoding
//! - `macros`: tuple implementations of [`Params`] and [`OutputRow`]

mod macros;
pub mod params;
pub mod row;
pub mod value;

pub use params::{ParamBinder, Params};
pub(crate) use row::decode_text_row;
pub use row::{FetchedRows, OutputRow, ResultBinder};
pub use value::{BindValue, ColumnValue};
