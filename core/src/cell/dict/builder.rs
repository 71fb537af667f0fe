use std::collections::HashMap;

use num_bigint::BigUint;

use super::label::Label;
use crate::cell::dict::ValWriter;
use crate::cell::TonCellError::{InternalError, InvalidInput};
use crate::cell::{Cell, CellBuilder, TonCellError};

/// Builds the root cell of a non-empty `Hashmap`.
///
/// Every node splits its sorted keys by the first bit after the longest
/// common prefix: the prefix becomes the node label, keys with `0` go to the
/// left reference and keys with `1` to the right one.
pub(crate) struct DictBuilder<V> {
    key_len_bits: usize,
    value_writer: ValWriter<V>,
    entries: Vec<(BigUint, V)>,
}

impl<V> DictBuilder<V> {
    pub(crate) fn new<K>(
        key_len_bits: usize,
        value_writer: ValWriter<V>,
        data: HashMap<K, V>,
    ) -> Result<Self, TonCellError>
    where
        BigUint: From<K>,
    {
        let mut entries = Vec::with_capacity(data.len());
        for (key, val) in data {
            let key = BigUint::from(key);
            if key.bits() as usize > key_len_bits {
                return Err(InvalidInput(format!(
                    "Dict key {key} does not fit {key_len_bits} bits"
                )));
            }
            entries.push((key, val));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(DictBuilder {
            key_len_bits,
            value_writer,
            entries,
        })
    }

    pub(crate) fn build(self) -> Result<Cell, TonCellError> {
        if self.entries.is_empty() {
            return Err(InvalidInput(
                "Hashmap root can't be built from empty data".to_owned(),
            ));
        }
        log::trace!(
            "building hashmap of {} entries with {}-bit keys",
            self.entries.len(),
            self.key_len_bits
        );
        build_node(self.entries, self.key_len_bits, self.value_writer)
    }
}

// keys in `entries` are sorted and hold only their lowest `key_len` bits
fn build_node<V>(
    mut entries: Vec<(BigUint, V)>,
    key_len: usize,
    value_writer: ValWriter<V>,
) -> Result<Cell, TonCellError> {
    let mut builder = CellBuilder::new();
    if entries.len() == 1 {
        let (key, val) = entries
            .pop()
            .ok_or_else(|| InternalError("Hashmap leaf without value".to_owned()))?;
        Label::new(key, key_len).write(&mut builder, key_len)?;
        value_writer(&mut builder, val)?;
        return builder.build();
    }

    let (first, last) = match (entries.first(), entries.last()) {
        (Some(first), Some(last)) => (&first.0, &last.0),
        _ => return Err(InternalError("Hashmap fork without keys".to_owned())),
    };
    let diff_bits = (first ^ last).bits() as usize;
    if diff_bits == 0 {
        return Err(InternalError("Hashmap keys are not unique".to_owned()));
    }
    let prefix_len = key_len - diff_bits;
    let rest_len = diff_bits - 1;
    Label::new(first >> diff_bits, prefix_len).write(&mut builder, key_len)?;

    let suffix_mask = (BigUint::from(1u32) << rest_len) - 1u32;
    let split = entries.partition_point(|(key, _)| !key.bit(rest_len as u64));
    let right = entries.split_off(split);
    let strip = |part: Vec<(BigUint, V)>| -> Vec<(BigUint, V)> {
        part.into_iter()
            .map(|(key, val)| (key & &suffix_mask, val))
            .collect()
    };

    let left_cell = build_node(strip(entries), rest_len, value_writer)?;
    let right_cell = build_node(strip(right), rest_len, value_writer)?;
    builder.store_child(left_cell)?;
    builder.store_child(right_cell)?;
    builder.build()
}
