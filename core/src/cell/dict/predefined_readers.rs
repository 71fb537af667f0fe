use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;

use crate::cell::TonCellError::InvalidInput;
use crate::cell::{ArcCell, Cell, CellParser, TonCellError};
use crate::types::TON_HASH_BYTES;
use crate::TonHash;

fn narrow<T>(raw_key: &BigUint, convert: fn(&BigUint) -> Option<T>) -> Result<T, TonCellError> {
    convert(raw_key).ok_or_else(|| {
        InvalidInput(format!(
            "Dict key {raw_key} does not fit {}",
            std::any::type_name::<T>()
        ))
    })
}

pub fn key_reader_u8(raw_key: &BigUint) -> Result<u8, TonCellError> {
    narrow(raw_key, BigUint::to_u8)
}

pub fn key_reader_u16(raw_key: &BigUint) -> Result<u16, TonCellError> {
    narrow(raw_key, BigUint::to_u16)
}

pub fn key_reader_u32(raw_key: &BigUint) -> Result<u32, TonCellError> {
    narrow(raw_key, BigUint::to_u32)
}

pub fn key_reader_u64(raw_key: &BigUint) -> Result<u64, TonCellError> {
    narrow(raw_key, BigUint::to_u64)
}

/// 256-bit keys such as account ids and library hashes.
pub fn key_reader_256bit(raw_key: &BigUint) -> Result<TonHash, TonCellError> {
    let digits = raw_key.to_bytes_be();
    if digits.len() > TON_HASH_BYTES {
        return Err(InvalidInput(format!(
            "Dict key {raw_key} does not fit {TON_HASH_BYTES} bytes"
        )));
    }
    let mut key = [0u8; TON_HASH_BYTES];
    key[TON_HASH_BYTES - digits.len()..].copy_from_slice(&digits);
    Ok(key)
}

pub fn key_reader_uint(raw_key: &BigUint) -> Result<BigUint, TonCellError> {
    Ok(raw_key.clone())
}

pub fn val_reader_cell(parser: &mut CellParser) -> Result<Cell, TonCellError> {
    parser.load_remaining()
}

pub fn val_reader_ref_cell(parser: &mut CellParser) -> Result<ArcCell, TonCellError> {
    parser.next_reference()
}

/// Reads all remaining bits of the leaf as an unsigned integer.
pub fn val_reader_uint(parser: &mut CellParser) -> Result<BigUint, TonCellError> {
    let remaining = parser.remaining_bits();
    parser.load_uint(remaining)
}

pub fn val_reader_int(parser: &mut CellParser) -> Result<BigInt, TonCellError> {
    let remaining = parser.remaining_bits();
    parser.load_int(remaining)
}
