//! `Hashmap` / `HashmapE` with fixed-width keys.
//!
//! Only full build and full parse are supported; see
//! https://docs.ton.org/develop/data-formats/tl-b-types#hashmap

mod builder;
mod label;
mod parser;
pub mod predefined_readers;
pub mod predefined_writers;

use num_bigint::BigUint;

pub(crate) use builder::DictBuilder;
pub(crate) use parser::DictParser;

use crate::cell::{CellBuilder, CellParser, TonCellError};

pub type KeyReader<K> = fn(&BigUint) -> Result<K, TonCellError>;
pub type ValReader<V> = fn(&mut CellParser) -> Result<V, TonCellError>;
pub type ValWriter<V> = fn(&mut CellBuilder, V) -> Result<(), TonCellError>;

#[cfg(test)]
mod tests;
