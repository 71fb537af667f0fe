use std::collections::HashMap;
use std::sync::Arc;

use bitstream_io::{BigEndian, BitWrite, BitWriter};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::cell::dict::{DictBuilder, ValWriter};
use crate::cell::error::{MapTonCellError, TonCellError};
use crate::cell::{ArcCell, Cell, CellParser, MAX_CELL_BITS, MAX_CELL_REFERENCES};
use crate::TonAddress;

const ADDRESS_BITS: usize = 2 + 1 + 8 + 32 * 8;

pub struct CellBuilder {
    bit_writer: BitWriter<Vec<u8>, BigEndian>,
    bits_to_write: usize,
    references: Vec<ArcCell>,
}

#[derive(Clone, Debug, PartialEq, Copy)]
pub enum EitherCellLayout {
    Native,
    ToRef,
    ToCell,
}

impl CellBuilder {
    pub fn new() -> CellBuilder {
        let bit_writer = BitWriter::endian(Vec::new(), BigEndian);
        CellBuilder {
            bit_writer,
            bits_to_write: 0,
            references: Vec::new(),
        }
    }

    pub fn store_bit(&mut self, val: bool) -> Result<&mut Self, TonCellError> {
        self.ensure_bits(1)?;
        self.bit_writer.write_bit(val).map_cell_builder_error()?;
        self.bits_to_write += 1;
        Ok(self)
    }

    pub fn store_u8(&mut self, bit_len: usize, val: u8) -> Result<&mut Self, TonCellError> {
        self.store_u64(bit_len, val as u64)
    }

    pub fn store_i8(&mut self, bit_len: usize, val: i8) -> Result<&mut Self, TonCellError> {
        self.store_i64(bit_len, val as i64)
    }

    pub fn store_u32(&mut self, bit_len: usize, val: u32) -> Result<&mut Self, TonCellError> {
        self.store_u64(bit_len, val as u64)
    }

    pub fn store_i32(&mut self, bit_len: usize, val: i32) -> Result<&mut Self, TonCellError> {
        self.store_i64(bit_len, val as i64)
    }

    pub fn store_u64(&mut self, bit_len: usize, val: u64) -> Result<&mut Self, TonCellError> {
        if bit_len > 64 {
            return self.store_uint(bit_len, &BigUint::from(val));
        }
        if bit_len < 64 && val >> bit_len != 0 {
            return Err(TonCellError::value_out_of_range(val, bit_len));
        }
        self.ensure_bits(bit_len)?;
        self.write_u64_unchecked(bit_len, val)?;
        Ok(self)
    }

    pub fn store_i64(&mut self, bit_len: usize, val: i64) -> Result<&mut Self, TonCellError> {
        if bit_len > 64 {
            return self.store_int(bit_len, &BigInt::from(val));
        }
        if !signed_fits(val, bit_len) {
            return Err(TonCellError::value_out_of_range(val, bit_len));
        }
        self.ensure_bits(bit_len)?;
        let mask = if bit_len == 64 {
            u64::MAX
        } else {
            (1u64 << bit_len) - 1
        };
        self.write_u64_unchecked(bit_len, (val as u64) & mask)?;
        Ok(self)
    }

    pub fn store_uint(&mut self, bit_len: usize, val: &BigUint) -> Result<&mut Self, TonCellError> {
        if val.bits() as usize > bit_len {
            return Err(TonCellError::value_out_of_range(val, bit_len));
        }
        self.ensure_bits(bit_len)?;
        if bit_len == 0 {
            return Ok(self);
        }

        // right-align the value in ceil(bit_len / 8) bytes
        let value_bytes = val.to_bytes_be();
        let total_bytes = bit_len.div_ceil(8);
        let mut padded = vec![0u8; total_bytes];
        if !val.is_zero() {
            padded[total_bytes - value_bytes.len()..].copy_from_slice(&value_bytes);
        }

        let first_byte_bits = bit_len - (total_bytes - 1) * 8;
        self.write_u64_unchecked(first_byte_bits, padded[0] as u64)?;
        self.bit_writer
            .write_bytes(&padded[1..])
            .map_cell_builder_error()?;
        self.bits_to_write += (total_bytes - 1) * 8;
        Ok(self)
    }

    /// Stores `val` as a two's complement integer of `bit_len` bits.
    pub fn store_int(&mut self, bit_len: usize, val: &BigInt) -> Result<&mut Self, TonCellError> {
        let fits = if bit_len == 0 {
            val.is_zero()
        } else {
            let bound = BigInt::one() << (bit_len - 1);
            val >= &-bound.clone() && val < &bound
        };
        if !fits {
            return Err(TonCellError::value_out_of_range(val, bit_len));
        }
        let unsigned = if val.sign() == Sign::Minus {
            (BigInt::one() << bit_len) + val
        } else {
            val.clone()
        };
        let unsigned = unsigned.to_biguint().ok_or_else(|| {
            TonCellError::InternalError(format!("Failed to convert {val} to two's complement"))
        })?;
        self.store_uint(bit_len, &unsigned)
    }

    pub fn store_byte(&mut self, val: u8) -> Result<&mut Self, TonCellError> {
        self.store_u8(8, val)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, TonCellError> {
        self.ensure_bits(bytes.len() * 8)?;
        self.bit_writer
            .write_bytes(bytes)
            .map_cell_builder_error()?;
        self.bits_to_write += bytes.len() * 8;
        Ok(self)
    }

    /// Stores the first `bit_len` bits of a left-aligned buffer.
    pub fn store_bits(&mut self, bit_len: usize, slice: &[u8]) -> Result<&mut Self, TonCellError> {
        let full_bytes = bit_len / 8;
        let last_byte_len = bit_len % 8;
        if slice.len() < bit_len.div_ceil(8) {
            return Err(TonCellError::InvalidInput(format!(
                "Can't store {bit_len} bits from buffer of {} bytes",
                slice.len()
            )));
        }
        self.ensure_bits(bit_len)?;
        self.bit_writer
            .write_bytes(&slice[..full_bytes])
            .map_cell_builder_error()?;
        self.bits_to_write += full_bytes * 8;
        if last_byte_len != 0 {
            let last_byte = slice[full_bytes] >> (8 - last_byte_len);
            self.write_u64_unchecked(last_byte_len, last_byte as u64)?;
        }
        Ok(self)
    }

    pub fn store_string(&mut self, val: &str) -> Result<&mut Self, TonCellError> {
        self.store_bytes(val.as_bytes())
    }

    pub fn store_coins(&mut self, val: &BigUint) -> Result<&mut Self, TonCellError> {
        if val.is_zero() {
            return self.store_u8(4, 0);
        }
        let num_bytes = (val.bits() as usize).div_ceil(8);
        if num_bytes > 15 {
            return Err(TonCellError::ValueOutOfRange(format!(
                "Coins value {val} takes {num_bytes} bytes, at most 15 allowed"
            )));
        }
        self.ensure_bits(4 + num_bytes * 8)?;
        self.store_u8(4, num_bytes as u8)?;
        self.store_uint(num_bytes * 8, val)
    }

    /// Stores `addr_std$10 anycast:0 workchain_id:int8 address:bits256`.
    pub fn store_raw_address(&mut self, val: &TonAddress) -> Result<&mut Self, TonCellError> {
        let wc = i8::try_from(val.workchain).map_err(|_| {
            TonCellError::InvalidAddress(format!(
                "Workchain {} doesn't fit in 8 bits",
                val.workchain
            ))
        })?;
        self.ensure_bits(ADDRESS_BITS)?;
        self.store_u8(2, 0b10u8)?;
        self.store_bit(false)?;
        self.store_i8(8, wc)?;
        self.store_bytes(&val.hash_part)?;
        Ok(self)
    }

    /// Stores `addr_none$00` for `None`, the standard address otherwise.
    pub fn store_address(&mut self, val: Option<&TonAddress>) -> Result<&mut Self, TonCellError> {
        match val {
            Some(addr) => self.store_raw_address(addr),
            None => self.store_u8(2, 0),
        }
    }

    /// Adds reference to an existing `Cell`.
    ///
    /// The reference is passed as `ArcCell` so it might be references from other cells.
    pub fn store_reference(&mut self, cell: &ArcCell) -> Result<&mut Self, TonCellError> {
        self.ensure_refs(1)?;
        self.references.push(cell.clone());
        Ok(self)
    }

    pub fn store_references(&mut self, refs: &[ArcCell]) -> Result<&mut Self, TonCellError> {
        self.ensure_refs(refs.len())?;
        self.references.extend(refs.iter().cloned());
        Ok(self)
    }

    /// Adds a reference to a newly constructed `Cell`.
    ///
    /// The cell is wrapped it the `Arc`.
    pub fn store_child(&mut self, cell: Cell) -> Result<&mut Self, TonCellError> {
        self.store_reference(&Arc::new(cell))
    }

    /// Moves everything the parser has not consumed yet into this builder.
    pub fn store_remaining(&mut self, parser: &mut CellParser) -> Result<&mut Self, TonCellError> {
        let num_bits = parser.remaining_bits();
        let num_refs = parser.remaining_refs();
        self.ensure_bits(num_bits)?;
        self.ensure_refs(num_refs)?;
        let bits = parser.load_bits(num_bits)?;
        self.store_bits(num_bits, &bits)?;
        for _ in 0..num_refs {
            let reference = parser.next_reference()?;
            self.references.push(reference);
        }
        Ok(self)
    }

    /// Appends all bits and references of `cell`.
    pub fn store_cell(&mut self, cell: &Cell) -> Result<&mut Self, TonCellError> {
        self.ensure_bits(cell.bit_len())?;
        self.ensure_refs(cell.references().len())?;
        self.store_bits(cell.bit_len(), cell.data())?;
        self.store_references(cell.references())
    }

    /// Whether `cell` can be spliced in after `reserved_bits` more bits are written.
    pub fn can_store_inline(&self, cell: &Cell, reserved_bits: usize) -> bool {
        self.remaining_bits() >= cell.bit_len() + reserved_bits
            && self.remaining_refs() >= cell.references().len()
    }

    // https://docs.ton.org/develop/data-formats/tl-b-types#either
    pub fn store_either_cell_or_cell_ref(
        &mut self,
        cell: &ArcCell,
        layout: EitherCellLayout,
    ) -> Result<&mut Self, TonCellError> {
        match layout {
            EitherCellLayout::Native => {
                if self.can_store_inline(cell, 1) {
                    self.store_either_cell_or_cell_ref(cell, EitherCellLayout::ToCell)?;
                } else {
                    self.store_either_cell_or_cell_ref(cell, EitherCellLayout::ToRef)?;
                }
            }
            EitherCellLayout::ToRef => {
                self.ensure_bits(1)?;
                self.ensure_refs(1)?;
                self.store_bit(true)?;
                self.store_reference(cell)?;
            }
            EitherCellLayout::ToCell => {
                self.ensure_bits(1 + cell.bit_len())?;
                self.ensure_refs(cell.references().len())?;
                self.store_bit(false)?;
                self.store_cell(cell)?;
            }
        }

        Ok(self)
    }

    // https://docs.ton.org/develop/data-formats/tl-b-types#maybe
    pub fn store_maybe_cell_ref(
        &mut self,
        maybe_cell: &Option<ArcCell>,
    ) -> Result<&mut Self, TonCellError> {
        if let Some(cell) = maybe_cell {
            self.ensure_bits(1)?;
            self.ensure_refs(1)?;
            self.store_bit(true)?;
            self.store_reference(cell)?;
        } else {
            self.store_bit(false)?;
        }

        Ok(self)
    }

    /// Stores a `HashmapE`: `0` for an empty map, `1` and a reference to the root otherwise.
    pub fn store_dict<K, V>(
        &mut self,
        key_len_bits: usize,
        value_writer: ValWriter<V>,
        data: HashMap<K, V>,
    ) -> Result<&mut Self, TonCellError>
    where
        BigUint: From<K>,
    {
        if data.is_empty() {
            return self.store_empty_dict();
        }
        self.ensure_bits(1)?;
        self.ensure_refs(1)?;
        let dict_cell = DictBuilder::new(key_len_bits, value_writer, data)?.build()?;
        self.store_bit(true)?;
        self.store_child(dict_cell)
    }

    pub fn store_empty_dict(&mut self) -> Result<&mut Self, TonCellError> {
        self.store_bit(false)
    }

    pub fn remaining_bits(&self) -> usize {
        MAX_CELL_BITS - self.bits_to_write
    }

    pub fn remaining_refs(&self) -> usize {
        MAX_CELL_REFERENCES - self.references.len()
    }

    pub fn build(&mut self) -> Result<Cell, TonCellError> {
        while !self.bit_writer.byte_aligned() {
            self.bit_writer.write_bit(false).map_cell_builder_error()?;
        }

        match self.bit_writer.writer() {
            Some(vec) => Cell::new(
                vec.clone(),
                self.bits_to_write,
                self.references.clone(),
            ),
            None => Err(TonCellError::cell_builder_error(
                "Stream is not byte-aligned",
            )),
        }
    }

    fn ensure_bits(&self, bit_len: usize) -> Result<(), TonCellError> {
        if bit_len > MAX_CELL_BITS {
            return Err(TonCellError::CapacityExceeded(format!(
                "Can't store {bit_len} bits, a cell holds at most {MAX_CELL_BITS}"
            )));
        }
        let remaining = self.remaining_bits();
        if bit_len > remaining {
            return Err(TonCellError::OutOfBits {
                requested: bit_len,
                remaining,
            });
        }
        Ok(())
    }

    fn ensure_refs(&self, ref_count: usize) -> Result<(), TonCellError> {
        if ref_count > self.remaining_refs() {
            return Err(TonCellError::TooManyRefs(
                self.references.len() + ref_count,
            ));
        }
        Ok(())
    }

    // caller checks capacity and range
    fn write_u64_unchecked(&mut self, bit_len: usize, val: u64) -> Result<(), TonCellError> {
        if bit_len == 0 {
            return Ok(());
        }
        self.bit_writer
            .write(bit_len as u32, val)
            .map_cell_builder_error()?;
        self.bits_to_write += bit_len;
        Ok(())
    }
}

fn signed_fits(val: i64, bit_len: usize) -> bool {
    match bit_len {
        0 => val == 0,
        64.. => true,
        _ => {
            let bound = 1i128 << (bit_len - 1);
            (-bound..bound).contains(&(val as i128))
        }
    }
}

impl Default for CellBuilder {
    fn default() -> Self {
        Self::new()
    }
}
