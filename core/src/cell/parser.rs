use std::collections::HashMap;
use std::hash::Hash;
use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader, Numeric};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

use crate::cell::dict::{DictParser, KeyReader, ValReader};
use crate::cell::util::*;
use crate::cell::{ArcCell, Cell, CellBuilder, MapTonCellError, TonCellError};
use crate::types::{TonHash, TON_HASH_BYTES};
use crate::TonAddress;

/// Read cursor over a single cell.
///
/// Bits and references are consumed front to back; nothing is ever re-read.
pub struct CellParser<'a> {
    pub(crate) bit_len: usize,
    pub(crate) bit_reader: BitReader<Cursor<&'a [u8]>, BigEndian>,
    references: &'a [ArcCell],
    next_ref: usize,
}

impl<'a> CellParser<'a> {
    pub fn new(cell: &'a Cell) -> CellParser<'a> {
        CellParser {
            bit_len: cell.bit_len(),
            bit_reader: BitReader::new(Cursor::new(cell.data())),
            references: cell.references(),
            next_ref: 0,
        }
    }

    pub fn remaining_bits(&mut self) -> usize {
        let pos = self.bit_reader.position_in_bits().unwrap_or_default() as usize;
        self.bit_len.saturating_sub(pos)
    }

    /// Return number of full bytes remaining
    pub fn remaining_bytes(&mut self) -> usize {
        self.remaining_bits() / 8
    }

    pub fn remaining_refs(&self) -> usize {
        self.references.len() - self.next_ref
    }

    pub fn load_bit(&mut self) -> Result<bool, TonCellError> {
        self.ensure_enough_bits(1)?;
        self.bit_reader.read_bit().map_cell_parser_error()
    }

    pub fn load_u8(&mut self, bit_len: usize) -> Result<u8, TonCellError> {
        self.load_number(bit_len)
    }

    pub fn load_i8(&mut self, bit_len: usize) -> Result<i8, TonCellError> {
        Ok(self.load_signed(bit_len, 8)? as i8)
    }

    pub fn load_u16(&mut self, bit_len: usize) -> Result<u16, TonCellError> {
        self.load_number(bit_len)
    }

    pub fn load_i16(&mut self, bit_len: usize) -> Result<i16, TonCellError> {
        Ok(self.load_signed(bit_len, 16)? as i16)
    }

    pub fn load_u32(&mut self, bit_len: usize) -> Result<u32, TonCellError> {
        self.load_number(bit_len)
    }

    pub fn load_i32(&mut self, bit_len: usize) -> Result<i32, TonCellError> {
        Ok(self.load_signed(bit_len, 32)? as i32)
    }

    pub fn load_u64(&mut self, bit_len: usize) -> Result<u64, TonCellError> {
        self.load_number(bit_len)
    }

    pub fn load_i64(&mut self, bit_len: usize) -> Result<i64, TonCellError> {
        self.load_signed(bit_len, 64)
    }

    pub fn load_uint(&mut self, bit_len: usize) -> Result<BigUint, TonCellError> {
        self.ensure_enough_bits(bit_len)?;
        if bit_len == 0 {
            return Ok(BigUint::zero());
        }
        let bytes = self.load_bits(bit_len)?;
        let padding = bytes.len() * 8 - bit_len;
        Ok(BigUint::from_bytes_be(&bytes) >> padding)
    }

    /// Loads a two's complement integer of `bit_len` bits.
    pub fn load_int(&mut self, bit_len: usize) -> Result<BigInt, TonCellError> {
        let unsigned = self.load_uint(bit_len)?;
        let negative = bit_len > 0 && unsigned.bits() as usize == bit_len;
        let value = BigInt::from(unsigned);
        if negative {
            Ok(value - (BigInt::one() << bit_len))
        } else {
            Ok(value)
        }
    }

    pub fn load_byte(&mut self) -> Result<u8, TonCellError> {
        self.load_u8(8)
    }

    pub fn load_slice(&mut self, slice: &mut [u8]) -> Result<(), TonCellError> {
        self.ensure_enough_bits(slice.len() * 8)?;
        self.bit_reader.read_bytes(slice).map_cell_parser_error()
    }

    pub fn load_bytes(&mut self, num_bytes: usize) -> Result<Vec<u8>, TonCellError> {
        let mut res = vec![0_u8; num_bytes];
        self.load_slice(res.as_mut_slice())?;
        Ok(res)
    }

    pub fn load_tonhash(&mut self) -> Result<TonHash, TonCellError> {
        let mut res = [0_u8; TON_HASH_BYTES];
        self.load_slice(&mut res)?;
        Ok(res)
    }

    pub fn load_bits_to_slice(
        &mut self,
        num_bits: usize,
        slice: &mut [u8],
    ) -> Result<(), TonCellError> {
        self.ensure_enough_bits(num_bits)?;
        self.bit_reader.read_bits(num_bits, slice)?;
        Ok(())
    }

    /// Loads `num_bits` bits into a left-aligned buffer.
    pub fn load_bits(&mut self, num_bits: usize) -> Result<Vec<u8>, TonCellError> {
        let total_bytes = num_bits.div_ceil(8);
        let mut res = vec![0_u8; total_bytes];
        self.load_bits_to_slice(num_bits, res.as_mut_slice())?;
        Ok(res)
    }

    pub fn load_utf8(&mut self, num_bytes: usize) -> Result<String, TonCellError> {
        let bytes = self.load_bytes(num_bytes)?;
        String::from_utf8(bytes).map_cell_parser_error()
    }

    pub fn load_coins(&mut self) -> Result<BigUint, TonCellError> {
        let num_bytes = self.load_u8(4)?;
        if num_bytes == 0 {
            Ok(BigUint::zero())
        } else {
            self.load_uint(num_bytes as usize * 8)
        }
    }

    /// Loads `addr_none$00` as `None` or a standard address.
    pub fn load_address(&mut self) -> Result<Option<TonAddress>, TonCellError> {
        self.ensure_enough_bits(2)?;
        let tp = self.bit_reader.read::<u8>(2).map_cell_parser_error()?;
        match tp {
            0 => Ok(None),
            2 => {
                self.ensure_enough_bits(1 + 8 + TON_HASH_BYTES * 8)?;
                if self.load_bit()? {
                    return Err(TonCellError::InvalidAddress(
                        "Anycast addresses are not supported".to_owned(),
                    ));
                }
                let wc = self.load_i8(8)?;
                let hash_part = self.load_tonhash()?;
                Ok(Some(TonAddress::new(wc as i32, &hash_part)))
            }
            _ => Err(TonCellError::InvalidAddress(format!(
                "Unsupported address type: {tp:#04b}"
            ))),
        }
    }

    pub fn load_unary_length(&mut self) -> Result<usize, TonCellError> {
        let mut res = 0;
        while self.load_bit()? {
            res += 1;
        }
        Ok(res)
    }

    pub fn next_reference(&mut self) -> Result<ArcCell, TonCellError> {
        let reference = self
            .references
            .get(self.next_ref)
            .ok_or(TonCellError::refs_underflow(1, 0))?;
        self.next_ref += 1;
        Ok(reference.clone())
    }

    // https://docs.ton.org/develop/data-formats/tl-b-types#maybe
    pub fn load_maybe_cell_ref(&mut self) -> Result<Option<ArcCell>, TonCellError> {
        if self.load_bit()? {
            Ok(Some(self.next_reference()?))
        } else {
            Ok(None)
        }
    }

    /// Loads a `HashmapE`: an empty map for `0`, otherwise the map stored in the next reference.
    pub fn load_dict<K: Eq + Hash, V>(
        &mut self,
        key_len_bits: usize,
        key_reader: KeyReader<K>,
        val_reader: ValReader<V>,
    ) -> Result<HashMap<K, V>, TonCellError> {
        if !self.load_bit()? {
            return Ok(HashMap::new());
        }
        let dict_cell = self.next_reference()?;
        let mut dict_parser = dict_cell.parser();
        DictParser::new(key_len_bits, key_reader, val_reader).parse(&mut dict_parser)
    }

    /// Loads a non-empty `Hashmap` whose root starts at the current position.
    pub fn load_dict_data<K: Eq + Hash, V>(
        &mut self,
        key_len_bits: usize,
        key_reader: KeyReader<K>,
        val_reader: ValReader<V>,
    ) -> Result<HashMap<K, V>, TonCellError> {
        DictParser::new(key_len_bits, key_reader, val_reader).parse(self)
    }

    pub fn load_remaining(&mut self) -> Result<Cell, TonCellError> {
        CellBuilder::new().store_remaining(self)?.build()
    }

    pub fn ensure_empty(&mut self) -> Result<(), TonCellError> {
        let remaining_bits = self.remaining_bits();
        let remaining_refs = self.remaining_refs();
        if remaining_bits == 0 && remaining_refs == 0 {
            Ok(())
        } else {
            Err(TonCellError::NonEmptyReader {
                remaining_bits,
                remaining_refs,
            })
        }
    }

    pub fn skip_bits(&mut self, num_bits: usize) -> Result<(), TonCellError> {
        self.ensure_enough_bits(num_bits)?;
        self.bit_reader
            .skip(num_bits as u32)
            .map_cell_parser_error()
    }

    fn load_number<N: Numeric>(&mut self, bit_len: usize) -> Result<N, TonCellError> {
        self.ensure_enough_bits(bit_len)?;
        if bit_len == 0 {
            return Ok(N::default());
        }

        self.bit_reader
            .read::<N>(bit_len as u32)
            .map_cell_parser_error()
    }

    fn load_signed(&mut self, bit_len: usize, max_bits: usize) -> Result<i64, TonCellError> {
        if bit_len > max_bits {
            return Err(TonCellError::InvalidInput(format!(
                "Can't load {bit_len} bits into {max_bits}-bit integer"
            )));
        }
        if bit_len == 0 {
            self.ensure_enough_bits(0)?;
            return Ok(0);
        }
        let raw: u64 = self.load_number(bit_len)?;
        let shift = 64 - bit_len;
        Ok(((raw << shift) as i64) >> shift)
    }

    fn ensure_enough_bits(&mut self, bit_len: usize) -> Result<(), TonCellError> {
        let remaining = self.remaining_bits();
        if remaining < bit_len {
            return Err(TonCellError::bits_underflow(bit_len, remaining));
        }
        Ok(())
    }
}
