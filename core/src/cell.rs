use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

pub use bag_of_cells::*;
pub use builder::*;
pub use error::*;
pub use parser::*;
pub(crate) use raw::*;
pub use util::*;

use crate::crypto::{HashFunctions, Sha2HashFunctions};
use crate::types::TonHash;

mod bag_of_cells;
mod builder;
pub mod dict;
mod error;
mod parser;
mod raw;
mod raw_boc_from_boc;
mod util;

pub const MAX_CELL_BITS: usize = 1023;
pub const MAX_CELL_REFERENCES: usize = 4;
pub const MAX_CELL_DEPTH: u16 = 1024;

pub type ArcCell = Arc<Cell>;

/// Immutable ordinary cell.
///
/// Children are shared through [`ArcCell`], so a parent can only reference
/// cells that already exist and cycles cannot be constructed.
/// The representation hash is computed on first use and cached for the
/// lifetime of the cell. Equality and hashing are defined by that hash.
#[derive(Clone)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<ArcCell>,
    depth: u16,
    hash: OnceLock<TonHash>,
}

impl Cell {
    pub fn new(
        mut data: Vec<u8>,
        bit_len: usize,
        references: Vec<ArcCell>,
    ) -> Result<Self, TonCellError> {
        if bit_len > MAX_CELL_BITS {
            return Err(TonCellError::CapacityExceeded(format!(
                "Cell must contain at most {MAX_CELL_BITS} bits, got {bit_len}"
            )));
        }
        if references.len() > MAX_CELL_REFERENCES {
            return Err(TonCellError::CapacityExceeded(format!(
                "Cell must contain at most {MAX_CELL_REFERENCES} references, got {}",
                references.len()
            )));
        }
        let expected_len = bit_len.div_ceil(8);
        if data.len() != expected_len {
            return Err(TonCellError::InvalidCellData(format!(
                "Cell with {bit_len} bits must contain {expected_len} data bytes, got {}",
                data.len()
            )));
        }
        let rest_bits = bit_len % 8;
        if let (Some(last), true) = (data.last_mut(), rest_bits != 0) {
            *last &= 0xffu8 << (8 - rest_bits);
        }

        let depth = references
            .iter()
            .map(|r| r.depth)
            .max()
            .map_or(0, |max_depth| max_depth.saturating_add(1));
        if depth > MAX_CELL_DEPTH {
            return Err(TonCellError::CapacityExceeded(format!(
                "Cell depth must be at most {MAX_CELL_DEPTH}, got {depth}"
            )));
        }

        Ok(Self {
            data,
            bit_len,
            references,
            depth,
            hash: OnceLock::new(),
        })
    }

    pub fn parser(&self) -> CellParser<'_> {
        CellParser::new(self)
    }

    pub fn parse_fully<F, T>(&self, parse: F) -> Result<T, TonCellError>
    where
        F: FnOnce(&mut CellParser) -> Result<T, TonCellError>,
    {
        let mut reader = self.parser();
        let res = parse(&mut reader)?;
        reader.ensure_empty()?;
        Ok(res)
    }

    pub fn reference(&self, idx: usize) -> Result<&ArcCell, TonCellError> {
        self.references.get(idx).ok_or(TonCellError::InvalidIndex {
            idx,
            ref_count: self.references.len(),
        })
    }

    /// Raw payload, left-aligned; bits past `bit_len` are zero.
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn references(&self) -> &[ArcCell] {
        self.references.as_slice()
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn cell_hash(&self) -> TonHash {
        if let Some(hash) = self.hash.get() {
            return *hash;
        }
        // post-order walk, so children are cached before their parents
        let mut pending: Vec<(&Cell, bool)> =
            self.references.iter().map(|r| (r.as_ref(), false)).collect();
        while let Some((cell, expanded)) = pending.pop() {
            if cell.hash.get().is_some() {
                continue;
            }
            if expanded {
                cell.init_hash();
            } else {
                pending.push((cell, true));
                pending.extend(cell.references.iter().map(|r| (r.as_ref(), false)));
            }
        }
        self.init_hash()
    }

    fn init_hash(&self) -> TonHash {
        *self.hash.get_or_init(|| {
            let child_hashes: Vec<TonHash> =
                self.references.iter().map(|r| r.cell_hash()).collect();
            Sha2HashFunctions.sha256(&self.representation(&child_hashes))
        })
    }

    /// Computes the representation hash with a caller supplied digest.
    ///
    /// Shared sub-cells are hashed once per call; nothing is cached in the cells.
    pub fn cell_hash_with(&self, hashes: &dyn HashFunctions) -> TonHash {
        let mut visited = HashMap::new();
        hash_with_memo(self, hashes, &mut visited)
    }

    pub fn cell_hash_hex(&self) -> String {
        hex::encode(self.cell_hash())
    }

    /// Payload as a string of `0` and `1` characters.
    pub fn to_bit_string(&self) -> String {
        (0..self.bit_len)
            .map(|i| {
                if self.data[i / 8] & (0x80 >> (i % 8)) != 0 {
                    '1'
                } else {
                    '0'
                }
            })
            .collect()
    }

    pub fn to_arc(self) -> ArcCell {
        Arc::new(self)
    }

    pub fn from_boc(boc: &[u8]) -> Result<ArcCell, TonCellError> {
        BagOfCells::parse(boc)?.single_root()
    }

    pub fn from_boc_hex(boc_hex: &str) -> Result<ArcCell, TonCellError> {
        BagOfCells::parse_hex(boc_hex)?.single_root()
    }

    pub fn to_boc(&self, has_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        BagOfCells::from_root(self.clone()).serialize(has_crc32)
    }

    pub fn to_boc_hex(&self, has_crc32: bool) -> Result<String, TonCellError> {
        Ok(hex::encode(self.to_boc(has_crc32)?))
    }

    /// Standard representation: descriptors, padded data, child depths, child hashes.
    /// See https://docs.ton.org/tvm.pdf 3.1.4 - 3.1.5
    fn representation(&self, child_hashes: &[TonHash]) -> Vec<u8> {
        let mut repr =
            Vec::with_capacity(2 + self.data.len() + (2 + 32) * self.references.len());
        repr.push(refs_descriptor(self.references.len()));
        repr.push(bits_descriptor(self.bit_len));
        repr.extend_from_slice(&self.data);
        let rest_bits = self.bit_len % 8;
        if rest_bits != 0 {
            if let Some(last) = repr.last_mut() {
                *last |= 1 << (7 - rest_bits);
            }
        }
        for reference in &self.references {
            repr.extend_from_slice(&reference.depth.to_be_bytes());
        }
        for child_hash in child_hashes {
            repr.extend_from_slice(child_hash);
        }
        repr
    }
}

fn hash_with_memo(
    root: &Cell,
    hashes: &dyn HashFunctions,
    visited: &mut HashMap<*const Cell, TonHash>,
) -> TonHash {
    let mut pending: Vec<(&Cell, bool)> = vec![(root, false)];
    while let Some((cell, expanded)) = pending.pop() {
        let key = cell as *const Cell;
        if visited.contains_key(&key) {
            continue;
        }
        if !expanded {
            pending.push((cell, true));
            pending.extend(cell.references.iter().map(|r| (r.as_ref(), false)));
            continue;
        }
        let child_hashes: Vec<TonHash> = cell
            .references
            .iter()
            .filter_map(|r| visited.get(&(r.as_ref() as *const Cell)).copied())
            .collect();
        let hash = hashes.sha256(&cell.representation(&child_hashes));
        visited.insert(key, hash);
    }
    visited
        .get(&(root as *const Cell))
        .copied()
        .unwrap_or_default()
}

/// d1 of an ordinary cell with level 0: just the reference count.
pub(crate) fn refs_descriptor(ref_count: usize) -> u8 {
    ref_count as u8
}

/// d2: `floor(b / 8) + ceil(b / 8)`, odd when the last byte is incomplete.
pub(crate) fn bits_descriptor(bit_len: usize) -> u8 {
    (bit_len / 8 + bit_len.div_ceil(8)) as u8
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.bit_len == other.bit_len && self.cell_hash() == other.cell_hash()
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell_hash().hash(state)
    }
}

impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Trailing `_` only marks an incomplete last byte
        let completion_tag = if self.bit_len % 8 != 0 { "_" } else { "" };
        writeln!(
            f,
            "Cell x{{ data: [{}{}]\n, bit_len: {}\n, references: [",
            hex::encode_upper(&self.data),
            completion_tag,
            self.bit_len,
        )?;

        for reference in &self.references {
            writeln!(
                f,
                "    {}\n",
                format!("{:?}", reference).replace('\n', "\n    ")
            )?;
        }

        write!(f, "]\n depth: {}\n }}", self.depth)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            bit_len: 0,
            references: Vec::new(),
            depth: 0,
            hash: OnceLock::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const EMPTY_CELL_HASH: &str =
        "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7";

    struct CountingHashes {
        calls: AtomicUsize,
    }

    impl HashFunctions for CountingHashes {
        fn sha256(&self, data: &[u8]) -> TonHash {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Sha2HashFunctions.sha256(data)
        }

        fn sha512(&self, data: &[u8]) -> [u8; 64] {
            Sha2HashFunctions.sha512(data)
        }
    }

    #[test]
    fn default_cell() -> Result<(), TonCellError> {
        let result = Cell::default();
        let expected = Cell::new(vec![], 0, vec![])?;
        assert_eq!(result, expected);
        assert_eq!(result.cell_hash_hex(), EMPTY_CELL_HASH);
        assert_eq!(result.depth(), 0);
        Ok(())
    }

    #[test]
    fn descriptors() {
        assert_eq!(refs_descriptor(0), 0);
        assert_eq!(refs_descriptor(4), 4);
        assert_eq!(bits_descriptor(0), 0);
        assert_eq!(bits_descriptor(1), 1);
        assert_eq!(bits_descriptor(8), 2);
        assert_eq!(bits_descriptor(1023), 255);
    }

    #[test]
    fn new_validates_capacity() {
        let too_many_bits = Cell::new(vec![0; 128], 1024, vec![]);
        assert!(matches!(
            too_many_bits,
            Err(TonCellError::CapacityExceeded(_))
        ));

        let child = Cell::default().to_arc();
        let too_many_refs = Cell::new(vec![], 0, vec![child; 5]);
        assert!(matches!(
            too_many_refs,
            Err(TonCellError::CapacityExceeded(_))
        ));

        let wrong_data_len = Cell::new(vec![0; 2], 8, vec![]);
        assert!(matches!(
            wrong_data_len,
            Err(TonCellError::InvalidCellData(_))
        ));
    }

    #[test]
    fn new_clears_bits_past_bit_len() -> Result<(), TonCellError> {
        let dirty = Cell::new(vec![0b1011_1111], 3, vec![])?;
        let clean = Cell::new(vec![0b1010_0000], 3, vec![])?;
        assert_eq!(dirty.data(), &[0b1010_0000]);
        assert_eq!(dirty, clean);
        assert_eq!(dirty.to_bit_string(), "101");
        Ok(())
    }

    #[test]
    fn depth_follows_references() -> Result<(), TonCellError> {
        let leaf = Cell::default().to_arc();
        let middle = Cell::new(vec![], 0, vec![leaf.clone()])?.to_arc();
        let root = Cell::new(vec![], 0, vec![leaf, middle])?;
        assert_eq!(root.depth(), 2);
        Ok(())
    }

    #[test]
    fn depth_is_capped() -> Result<(), TonCellError> {
        let mut level = Cell::default().to_arc();
        for _ in 0..MAX_CELL_DEPTH {
            level = Cell::new(vec![], 0, vec![level])?.to_arc();
        }
        assert_eq!(level.depth(), MAX_CELL_DEPTH);
        assert_eq!(level.cell_hash(), level.cell_hash_with(&Sha2HashFunctions));

        let result = Cell::new(vec![], 0, vec![level]);
        assert!(matches!(result, Err(TonCellError::CapacityExceeded(_))));
        Ok(())
    }

    #[test]
    fn hash_with_injected_digest_matches_cached_hash() -> Result<(), TonCellError> {
        let leaf = Cell::new(vec![0xAB], 8, vec![])?.to_arc();
        let mut level = leaf;
        // every level references the previous one twice
        for _ in 0..16 {
            level = Cell::new(vec![], 0, vec![level.clone(), level])?.to_arc();
        }

        let hashes = CountingHashes {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(level.cell_hash_with(&hashes), level.cell_hash());
        assert_eq!(hashes.calls.load(Ordering::SeqCst), 17);

        // memoisation does not leak between calls
        assert_eq!(level.cell_hash_with(&hashes), level.cell_hash());
        assert_eq!(hashes.calls.load(Ordering::SeqCst), 34);
        Ok(())
    }
}
