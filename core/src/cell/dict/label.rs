use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::cell::TonCellError::InvalidInput;
use crate::cell::{CellBuilder, CellParser, TonCellError};

/// Edge label: the `len` lowest bits of `bits`, most significant first.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Label {
    pub bits: BigUint,
    pub len: usize,
}

#[derive(Debug, PartialEq)]
enum LabelType {
    Short, // 0
    Long,  // 10
    Same,  // 11
}

/// Bits needed to store a label length in `0..=max_len` (`ceil(log2(max_len + 1))`).
pub(super) fn label_len_bits(max_len: usize) -> usize {
    (usize::BITS - max_len.leading_zeros()) as usize
}

impl Label {
    pub fn new(bits: BigUint, len: usize) -> Self {
        Label { bits, len }
    }

    fn same_bit(&self) -> Option<bool> {
        if self.len == 0 {
            return None;
        }
        if self.bits.is_zero() {
            return Some(false);
        }
        let all_ones = (BigUint::from(1u32) << self.len) - 1u32;
        (self.bits == all_ones).then_some(true)
    }

    /// Shortest encoding, `hml_short` winning ties over `hml_long`, and both over `hml_same`.
    fn choose_type(&self, max_len: usize) -> LabelType {
        let len_bits = label_len_bits(max_len);
        let short = 2 + 2 * self.len;
        let long = 2 + len_bits + self.len;
        let (mut label_type, mut size) = if long < short {
            (LabelType::Long, long)
        } else {
            (LabelType::Short, short)
        };
        if self.same_bit().is_some() && 3 + len_bits < size {
            label_type = LabelType::Same;
            size = 3 + len_bits;
        }
        log::trace!("label of {} bits stored as {label_type:?} in {size} bits", self.len);
        label_type
    }

    pub fn write(&self, builder: &mut CellBuilder, max_len: usize) -> Result<(), TonCellError> {
        let len_bits = label_len_bits(max_len);
        match self.choose_type(max_len) {
            LabelType::Short => {
                builder.store_bit(false)?;
                for _ in 0..self.len {
                    builder.store_bit(true)?;
                }
                builder.store_bit(false)?;
                builder.store_uint(self.len, &self.bits)?;
            }
            LabelType::Long => {
                builder.store_u8(2, 0b10)?;
                builder.store_u32(len_bits, self.len as u32)?;
                builder.store_uint(self.len, &self.bits)?;
            }
            LabelType::Same => {
                builder.store_u8(2, 0b11)?;
                builder.store_bit(self.same_bit() == Some(true))?;
                builder.store_u32(len_bits, self.len as u32)?;
            }
        }
        Ok(())
    }

    pub fn read(parser: &mut CellParser, max_len: usize) -> Result<Self, TonCellError> {
        if !parser.load_bit()? {
            let len = parser.load_unary_length()?;
            ensure_fits(len, max_len)?;
            let bits = parser.load_uint(len)?;
            return Ok(Label::new(bits, len));
        }
        let is_same = parser.load_bit()?;
        let same_bit = if is_same { parser.load_bit()? } else { false };
        let len = parser.load_uint(label_len_bits(max_len))?;
        let len = len
            .to_usize()
            .ok_or_else(|| InvalidInput(format!("Label length {len} does not fit usize")))?;
        ensure_fits(len, max_len)?;
        let bits = match (is_same, same_bit) {
            (false, _) => parser.load_uint(len)?,
            (true, false) => BigUint::zero(),
            (true, true) => (BigUint::from(1u32) << len) - 1u32,
        };
        Ok(Label::new(bits, len))
    }
}

fn ensure_fits(len: usize, max_len: usize) -> Result<(), TonCellError> {
    if len > max_len {
        return Err(InvalidInput(format!(
            "Label of {len} bits exceeds remaining key length {max_len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(label: &Label, max_len: usize) -> anyhow::Result<String> {
        let mut builder = CellBuilder::new();
        label.write(&mut builder, max_len)?;
        Ok(builder.build()?.to_bit_string())
    }

    #[test]
    fn test_label_len_bits() {
        assert_eq!(label_len_bits(0), 0);
        assert_eq!(label_len_bits(1), 1);
        assert_eq!(label_len_bits(7), 3);
        assert_eq!(label_len_bits(8), 4);
        assert_eq!(label_len_bits(32), 6);
        assert_eq!(label_len_bits(255), 8);
        assert_eq!(label_len_bits(256), 9);
    }

    #[test]
    fn test_label_encodings() -> anyhow::Result<()> {
        // empty
        assert_eq!(written(&Label::new(BigUint::zero(), 0), 8)?, "00");
        // short wins the tie with long
        assert_eq!(written(&Label::new(BigUint::from(0b01u32), 2), 2)?, "011001");
        assert_eq!(
            written(&Label::new(BigUint::from(0b1001000u32), 7), 7)?,
            "101111001000"
        );
        assert_eq!(written(&Label::new(BigUint::zero(), 4), 7)?, "110100");
        assert_eq!(written(&Label::new(BigUint::zero(), 31), 32)?, "110011111");
        assert_eq!(written(&Label::new(BigUint::from(0b111u32), 3), 3)?, "11111");
        Ok(())
    }

    #[test]
    fn test_label_read_back() -> anyhow::Result<()> {
        for (label, max_len) in [
            (Label::new(BigUint::zero(), 0), 0),
            (Label::new(BigUint::from(0b1011u32), 4), 16),
            (Label::new(BigUint::from(0b1111_1111u32), 8), 200),
            (Label::new(BigUint::zero(), 100), 256),
        ] {
            let mut builder = CellBuilder::new();
            label.write(&mut builder, max_len)?;
            let cell = builder.build()?;
            let mut parser = cell.parser();
            assert_eq!(Label::read(&mut parser, max_len)?, label);
            parser.ensure_empty()?;
        }
        Ok(())
    }

    #[test]
    fn test_label_longer_than_key_is_rejected() -> anyhow::Result<()> {
        // unary length 3
        let cell = CellBuilder::new().store_u8(6, 0b011100)?.build()?;
        assert!(Label::read(&mut cell.parser(), 2).is_err());
        Ok(())
    }
}
