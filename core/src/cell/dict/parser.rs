use std::collections::HashMap;
use std::hash::Hash;

use num_bigint::BigUint;

use super::label::Label;
use crate::cell::dict::{KeyReader, ValReader};
use crate::cell::{CellParser, TonCellError};

pub(crate) struct DictParser<K, V> {
    key_len_bits: usize,
    key_reader: KeyReader<K>,
    val_reader: ValReader<V>,
}

impl<K: Eq + Hash, V> DictParser<K, V> {
    pub(crate) fn new(
        key_len_bits: usize,
        key_reader: KeyReader<K>,
        val_reader: ValReader<V>,
    ) -> DictParser<K, V> {
        DictParser {
            key_len_bits,
            key_reader,
            val_reader,
        }
    }

    pub(crate) fn parse(&self, parser: &mut CellParser) -> Result<HashMap<K, V>, TonCellError> {
        let mut result = HashMap::new();
        self.parse_node(parser, BigUint::default(), self.key_len_bits, &mut result)?;
        Ok(result)
    }

    // `prefix` holds the key bits consumed above this node, `key_len` the bits still to read
    fn parse_node(
        &self,
        parser: &mut CellParser,
        prefix: BigUint,
        key_len: usize,
        dst: &mut HashMap<K, V>,
    ) -> Result<(), TonCellError> {
        let label = Label::read(parser, key_len)?;
        let prefix = (prefix << label.len) | label.bits;
        let rest_len = key_len - label.len;

        if rest_len == 0 {
            let key = (self.key_reader)(&prefix)?;
            let value = (self.val_reader)(parser)?;
            dst.insert(key, value);
            return Ok(());
        }

        let left = parser.next_reference()?;
        let right = parser.next_reference()?;
        let left_prefix = &prefix << 1;
        let right_prefix = &left_prefix | BigUint::from(1u32);
        self.parse_node(&mut left.parser(), left_prefix, rest_len - 1, dst)?;
        self.parse_node(&mut right.parser(), right_prefix, rest_len - 1, dst)
    }
}
