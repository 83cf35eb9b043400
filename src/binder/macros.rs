use crate::config::ExecutorOptions;
use crate::error::ExecutorError;
use crate::types::{BindDescriptor, OutputColumn};

use super::params::Params;
use super::row::{OutputRow, decode_column, output_column};
use super::value::{BindValue, ColumnValue};

macro_rules! impl_tuple_binding {
    ($count:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name: BindValue),+> Params for ($($name,)+) {
            const COUNT: usize = $count;

            fn describe(&self) -> Result<Vec<BindDescriptor>, ExecutorError> {
                Ok(vec![$(self.$idx.describe()?),+])
            }
        }

        impl<$($name: ColumnValue),+> OutputRow for ($($name,)+) {
            const ARITY: usize = $count;

            fn columns(options: &ExecutorOptions) -> Vec<OutputColumn> {
                vec![$(output_column::<$name>(options)),+]
            }

            fn decode(columns: &[OutputColumn]) -> Result<Self, ExecutorError> {
                Ok(($(decode_column::<$name>(columns, $idx)?,)+))
            }
        }
    };
}

impl_tuple_binding!(1; A: 0);
impl_tuple_binding!(2; A: 0, B: 1);
impl_tuple_binding!(3; A: 0, B: 1, C: 2);
impl_tuple_binding!(4; A: 0, B: 1, C: 2, D: 3);
impl_tuple_binding!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple_binding!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_tuple_binding!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_tuple_binding!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
impl_tuple_binding!(9; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
impl_tuple_binding!(10; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
impl_tuple_binding!(11; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
impl_tuple_binding!(12; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);
