// builder and parser are checked against each other, so they share one test module
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use num_bigint::{BigInt, BigUint};
use tokio_test::assert_ok;

use crate::cell::dict::predefined_readers::{
    key_reader_256bit, key_reader_u16, key_reader_u32, key_reader_u8, key_reader_uint,
    val_reader_int, val_reader_ref_cell, val_reader_uint,
};
use crate::cell::dict::predefined_writers::{
    val_writer_ref_cell, val_writer_signed_min_size, val_writer_unsigned_min_size,
};
use crate::cell::dict::ValWriter;
use crate::cell::{BagOfCells, Cell, CellBuilder, CellParser, TonCellError};

fn write_u8(builder: &mut CellBuilder, val: u8) -> Result<(), TonCellError> {
    builder.store_u8(8, val)?;
    Ok(())
}

fn write_u16(builder: &mut CellBuilder, val: BigUint) -> Result<(), TonCellError> {
    builder.store_uint(16, &val)?;
    Ok(())
}

fn read_u8(parser: &mut CellParser) -> Result<u8, TonCellError> {
    parser.load_u8(8)
}

fn dict_cell<K, V>(
    key_len_bits: usize,
    writer: ValWriter<V>,
    data: HashMap<K, V>,
) -> Result<Cell, TonCellError>
where
    BigUint: From<K>,
{
    CellBuilder::new().store_dict(key_len_bits, writer, data)?.build()
}

#[test]
fn test_blockchain_data() -> anyhow::Result<()> {
    let expected_data = HashMap::from([
        (0u8, BigUint::from(25965603044000000000u128)),
        (1, BigUint::from(5173255344000000000u64)),
        (2, BigUint::from(344883687000000000u64)),
    ]);
    let boc_b64 = "te6cckEBBgEAWgABGccNPKUADZm5MepOjMABAgHNAgMCASAEBQAnQAAAAAAAAAAAAAABMlF4tR2RgCAAJgAAAAAAAAAAAAABaFhaZZhr6AAAJgAAAAAAAAAAAAAAR8sYU4eC4AA1PIC5";
    let root = BagOfCells::parse_base64(boc_b64)?.single_root()?;
    let mut parser = root.parser();
    let header = parser.load_uint(96)?;
    let parsed = assert_ok!(parser.load_dict(8, key_reader_u8, val_reader_uint));
    parser.ensure_empty()?;
    assert_eq!(parsed, expected_data);

    // values are stored as 150-bit integers
    let writer = |builder: &mut CellBuilder, val: BigUint| {
        builder.store_uint(150, &val)?;
        Ok(())
    };
    let mut builder = CellBuilder::new();
    builder.store_uint(96, &header)?;
    builder.store_dict(8, writer, expected_data)?;
    let rebuilt = builder.build()?;
    assert_eq!(rebuilt, *root);
    assert_eq!(rebuilt.to_boc(true)?, STANDARD.decode(boc_b64)?);
    Ok(())
}

#[test]
fn test_dict_layout() -> anyhow::Result<()> {
    let data = HashMap::from([(1u8, 0xAAu8), (5, 0xBB), (200, 0xCC)]);
    let cell = dict_cell(8, write_u8, data.clone())?;
    assert_eq!(
        cell.to_boc_hex(true)?,
        "b5ee9c7241010601001b000101c00102012002030201d204050005bc8cc8000366aa000366ee0a8065b5"
    );

    let root = cell.reference(0)?;
    assert_eq!(root.to_bit_string(), "00");
    // 0000_01 and 0000_101 share a 4-bit run of zeros
    assert_eq!(root.reference(0)?.to_bit_string(), "110100");
    assert_eq!(root.reference(1)?.to_bit_string(), "10111100100011001100");

    let parsed = cell.parser().load_dict(8, key_reader_u8, read_u8)?;
    assert_eq!(parsed, data);
    Ok(())
}

#[test]
fn test_dict_with_same_label() -> anyhow::Result<()> {
    let data = HashMap::from([(0u32, BigUint::from(7u32)), (1, BigUint::from(9u32))]);
    let cell = dict_cell(32, write_u16, data.clone())?;
    assert_eq!(
        cell.to_boc_hex(true)?,
        "b5ee9c72410104010014000101c0010203cfc0020300050001e00005000260d34d08b1"
    );

    let root = cell.reference(0)?;
    let parsed = root
        .parser()
        .load_dict_data(32, key_reader_u32, val_reader_uint)?;
    assert_eq!(parsed, data);
    Ok(())
}

#[test]
fn test_empty_dict() -> anyhow::Result<()> {
    let cell = dict_cell(16, write_u8, HashMap::<u16, u8>::new())?;
    assert_eq!(cell.bit_len(), 1);
    assert_eq!(cell.to_bit_string(), "0");
    assert!(cell.references().is_empty());

    let parsed = cell.parser().load_dict(16, key_reader_u16, read_u8)?;
    assert!(parsed.is_empty());
    Ok(())
}

#[test]
fn test_key_width_independent_of_key_type() -> anyhow::Result<()> {
    let data = HashMap::from([
        (0u16, BigUint::from(4u32)),
        (1, BigUint::from(5u32)),
        (2, BigUint::from(6u32)),
        (10, BigUint::from(7u32)),
        (127, BigUint::from(8u32)),
    ]);
    for key_len_bits in [7, 16, 32, 64, 111] {
        let cell = dict_cell(key_len_bits, val_writer_unsigned_min_size, data.clone())?;
        let parsed = cell
            .parser()
            .load_dict(key_len_bits, key_reader_u16, val_reader_uint)?;
        assert_eq!(parsed, data, "key_len_bits: {key_len_bits}");
    }
    Ok(())
}

#[test]
fn test_key_wider_than_dict_is_rejected() {
    let data = HashMap::from([(256u16, 1u8)]);
    let mut builder = CellBuilder::new();
    let result = builder.store_dict(8, write_u8, data).map(|_| ());
    assert!(matches!(result, Err(TonCellError::InvalidInput(_))));
}

#[test]
fn test_key_wider_than_reader_is_rejected() -> anyhow::Result<()> {
    let data = HashMap::from([(300u16, 1u8)]);
    let cell = dict_cell(16, write_u8, data)?;
    let result = cell.parser().load_dict(16, key_reader_u8, read_u8);
    assert!(matches!(result, Err(TonCellError::InvalidInput(_))));
    Ok(())
}

#[test]
fn test_256bit_keys() -> anyhow::Result<()> {
    let mut data = HashMap::new();
    for i in 1..=4u8 {
        let mut key = [i; 32];
        key[31] = 0;
        data.insert(key, BigUint::from(i));
    }
    // small key: leading zero bytes must survive the round trip
    let mut small = [0u8; 32];
    small[31] = 1;
    data.insert(small, BigUint::from(5u32));

    let serial = data
        .iter()
        .map(|(k, v)| (BigUint::from_bytes_be(k), v.clone()))
        .collect::<HashMap<_, _>>();
    let cell = dict_cell(256, val_writer_unsigned_min_size, serial)?;
    let parsed = cell
        .parser()
        .load_dict(256, key_reader_256bit, val_reader_uint)?;
    assert_eq!(parsed, data);
    Ok(())
}

#[test]
fn test_signed_values() -> anyhow::Result<()> {
    let data = HashMap::from([
        (BigUint::from(3u32), BigInt::from(-1)),
        (BigUint::from(4u32), BigInt::from(1)),
        (BigUint::from(9u32), BigInt::from(-1000)),
        (BigUint::from(12u32), BigInt::from(0)),
    ]);
    let cell = dict_cell(4, val_writer_signed_min_size, data.clone())?;
    let parsed = cell.parser().load_dict(4, key_reader_uint, val_reader_int)?;
    assert_eq!(parsed, data);
    Ok(())
}

#[test]
fn test_ref_cell_values() -> anyhow::Result<()> {
    let mut data = HashMap::new();
    for key in [0u32, 1, 2, 6] {
        let value = CellBuilder::new().store_u32(20, key)?.build()?.to_arc();
        data.insert(BigUint::from(key), value);
    }
    let cell = dict_cell(8, val_writer_ref_cell, data.clone())?;
    let parsed = cell
        .parser()
        .load_dict(8, key_reader_uint, val_reader_ref_cell)?;
    assert_eq!(parsed, data);
    Ok(())
}
