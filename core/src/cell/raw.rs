use std::io::Cursor;

use bitstream_io::{BigEndian, BitWrite, BitWriter, ByteRead, ByteReader};
use crc::Crc;
use lazy_static::lazy_static;

use crate::cell::{MapTonCellError, TonCellError, MAX_CELL_REFERENCES};

lazy_static! {
    pub static ref CRC_32_ISCSI: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_ISCSI);
}

/// Raw representation of Cell.
///
/// References are stored as indices in BagOfCells.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub(crate) struct RawCell {
    pub(crate) data: Vec<u8>,
    pub(crate) bit_len: usize,
    pub(crate) references: Vec<usize>,
}

/// Raw representation of BagOfCells.
///
/// `cells` must be topologically sorted: every reference points to a later cell.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub(crate) struct RawBagOfCells {
    pub(crate) cells: Vec<RawCell>,
    pub(crate) roots: Vec<usize>,
}

const GENERIC_BOC_MAGIC: u32 = 0xb5ee9c72;
const CRC_BYTES: usize = 4;
const MAX_SIZE_BYTES: u8 = 4;
const MAX_OFFSET_BYTES: u8 = 8;

impl RawBagOfCells {
    pub(crate) fn parse(serial: &[u8]) -> Result<RawBagOfCells, TonCellError> {
        let cursor = Cursor::new(serial);

        let mut reader: ByteReader<Cursor<&[u8]>, BigEndian> =
            ByteReader::endian(cursor, BigEndian);
        // serialized_boc#b5ee9c72
        let magic = reader.read::<u32>().map_boc_deserialization_error()?;
        if magic != GENERIC_BOC_MAGIC {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Unsupported cell magic number: {:#x}",
                magic
            )));
        }
        // has_idx:(## 1) has_crc32c:(## 1) has_cache_bits:(## 1) flags:(## 2) { flags = 0 }
        let header = reader.read::<u8>().map_boc_deserialization_error()?;
        let has_idx = (header >> 7) & 1 == 1;
        let has_crc32c = (header >> 6) & 1 == 1;
        // size:(## 3) { size <= 4 }
        let size = header & 0b0000_0111;
        if size == 0 || size > MAX_SIZE_BYTES {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Invalid reference size: {size} bytes"
            )));
        }
        // off_bytes:(## 8) { off_bytes <= 8 }
        let off_bytes = reader.read::<u8>().map_boc_deserialization_error()?;
        if off_bytes == 0 || off_bytes > MAX_OFFSET_BYTES {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Invalid offset size: {off_bytes} bytes"
            )));
        }
        // cells:(##(size * 8))
        let cells = read_var_size(&mut reader, size)?;
        // roots:(##(size * 8)) { roots >= 1 }
        let roots = read_var_size(&mut reader, size)?;
        if roots == 0 {
            return Err(TonCellError::boc_deserialization_error(
                "BoC must contain at least one root",
            ));
        }
        if roots > cells {
            return Err(TonCellError::boc_deserialization_error(format!(
                "BoC declares {roots} roots but only {cells} cells"
            )));
        }
        // absent:(##(size * 8)) { roots + absent <= cells }
        let absent = read_var_size(&mut reader, size)?;
        if absent != 0 {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Absent cells are not supported, got {absent}"
            )));
        }
        // tot_cells_size:(##(off_bytes * 8))
        let tot_cells_size = read_var_size(&mut reader, off_bytes)?;

        let header_len = 4
            + 1
            + 1
            + 3 * size as usize
            + off_bytes as usize
            + roots * size as usize
            + if has_idx { cells * off_bytes as usize } else { 0 };
        let crc_len = if has_crc32c { CRC_BYTES } else { 0 };
        let expected_len = header_len
            .checked_add(tot_cells_size)
            .and_then(|len| len.checked_add(crc_len));
        if expected_len != Some(serial.len()) {
            return Err(TonCellError::boc_deserialization_error(format!(
                "BoC length mismatch: header declares {:?} bytes, got {}",
                expected_len,
                serial.len()
            )));
        }
        // every cell takes at least two descriptor bytes
        if cells > tot_cells_size / 2 {
            return Err(TonCellError::boc_deserialization_error(format!(
                "{cells} cells can't fit in {tot_cells_size} bytes"
            )));
        }

        // crc32c:has_crc32c?uint32
        if has_crc32c {
            let (body, crc) = serial.split_at(serial.len() - CRC_BYTES);
            let expected = u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]);
            let actual = CRC_32_ISCSI.checksum(body);
            if expected != actual {
                return Err(TonCellError::boc_deserialization_error(format!(
                    "CRC32C mismatch: expected {expected:#010x}, calculated {actual:#010x}"
                )));
            }
        }

        // root_list:(roots * ##(size * 8))
        let mut root_list = Vec::with_capacity(roots);
        for _ in 0..roots {
            let root = read_var_size(&mut reader, size)?;
            if root >= cells {
                return Err(TonCellError::boc_deserialization_error(format!(
                    "Root index {root} is out of range, BoC contains {cells} cells"
                )));
            }
            root_list.push(root);
        }
        // index:has_idx?(cells * ##(off_bytes * 8))
        if has_idx {
            for _ in 0..cells {
                read_var_size(&mut reader, off_bytes)?;
            }
        }
        // cell_data:(tot_cells_size * [ uint8 ])
        let mut cell_vec = Vec::with_capacity(cells);
        let mut cells_size = 0;
        for cell_index in 0..cells {
            let cell = read_cell(&mut reader, size, cell_index, cells)?;
            cells_size += raw_cell_size(&cell, size as usize);
            cell_vec.push(cell);
        }
        if cells_size != tot_cells_size {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Cell data takes {cells_size} bytes, header declares {tot_cells_size}"
            )));
        }

        log::trace!(
            "Parsed BoC: {} cells, {} roots, crc32c: {}",
            cells,
            roots,
            has_crc32c
        );

        Ok(RawBagOfCells {
            cells: cell_vec,
            roots: root_list,
        })
    }

    pub(crate) fn serialize(&self, has_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        // no index, no cache bits, optional crc32c footer
        if self.roots.is_empty() {
            return Err(TonCellError::boc_serialization_error(
                "BoC must contain at least one root",
            ));
        }

        let num_ref_bytes = bytes_for_value(self.cells.len() as u64);
        if num_ref_bytes > MAX_SIZE_BYTES as usize {
            return Err(TonCellError::boc_serialization_error(format!(
                "Too many cells: {}",
                self.cells.len()
            )));
        }

        let full_size: usize = self
            .cells
            .iter()
            .map(|cell| raw_cell_size(cell, num_ref_bytes))
            .sum();
        let num_offset_bytes = bytes_for_value(full_size as u64);

        let mut writer = BitWriter::endian(Vec::new(), BigEndian);

        writer
            .write(32, GENERIC_BOC_MAGIC)
            .map_boc_serialization_error()?;

        //write flags byte
        let has_idx = false;
        let has_cache_bits = false;
        let flags: u8 = 0;
        writer.write_bit(has_idx).map_boc_serialization_error()?;
        writer.write_bit(has_crc32).map_boc_serialization_error()?;
        writer
            .write_bit(has_cache_bits)
            .map_boc_serialization_error()?;
        writer.write(2, flags).map_boc_serialization_error()?;
        writer
            .write(3, num_ref_bytes as u8)
            .map_boc_serialization_error()?;
        writer
            .write(8, num_offset_bytes as u8)
            .map_boc_serialization_error()?;
        write_var_size(&mut writer, self.cells.len(), num_ref_bytes)?;
        write_var_size(&mut writer, self.roots.len(), num_ref_bytes)?;
        write_var_size(&mut writer, 0, num_ref_bytes)?; // Complete BOCs only
        write_var_size(&mut writer, full_size, num_offset_bytes)?;
        for root in &self.roots {
            write_var_size(&mut writer, *root, num_ref_bytes)?;
        }

        for cell in &self.cells {
            write_raw_cell(&mut writer, cell, num_ref_bytes)?;
        }

        if has_crc32 {
            let bytes = writer.writer().ok_or_else(|| {
                TonCellError::boc_serialization_error("Stream is not byte-aligned")
            })?;
            let cs = CRC_32_ISCSI.checksum(bytes.as_slice());
            writer
                .write_bytes(cs.to_le_bytes().as_slice())
                .map_boc_serialization_error()?;
        }
        writer.byte_align().map_boc_serialization_error()?;
        let res = writer
            .writer()
            .ok_or_else(|| TonCellError::boc_serialization_error("Stream is not byte-aligned"))?;

        log::trace!(
            "Serialized BoC: {} cells, {} roots, {} bytes",
            self.cells.len(),
            self.roots.len(),
            res.len()
        );
        Ok(res.clone())
    }
}

fn read_cell(
    reader: &mut ByteReader<Cursor<&[u8]>, BigEndian>,
    size: u8,
    cell_index: usize,
    cell_count: usize,
) -> Result<RawCell, TonCellError> {
    let d1 = reader.read::<u8>().map_boc_deserialization_error()?;
    let d2 = reader.read::<u8>().map_boc_deserialization_error()?;

    let ref_num = (d1 & 0x07) as usize;
    if d1 & !0x07 != 0 {
        return Err(TonCellError::boc_deserialization_error(format!(
            "Cell {cell_index}: exotic cells, stored hashes and levels are not supported (d1: {d1:#04x})"
        )));
    }
    if ref_num > MAX_CELL_REFERENCES {
        return Err(TonCellError::boc_deserialization_error(format!(
            "Cell {cell_index} has {ref_num} references, at most {MAX_CELL_REFERENCES} allowed"
        )));
    }
    let data_size = ((d2 >> 1) + (d2 & 1)).into();
    let full_bytes = (d2 & 0x01) == 0;

    let mut data = reader
        .read_to_vec(data_size)
        .map_boc_deserialization_error()?;

    let data_len = data.len();
    let padding_len = if data_len > 0 && !full_bytes {
        // strip the completion tag from the last byte
        let num_zeros = data[data_len - 1].trailing_zeros();
        if num_zeros >= 8 {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Cell {cell_index}: last byte must contain a completion tag"
            )));
        }
        data[data_len - 1] &= !(1 << num_zeros);
        num_zeros + 1
    } else {
        0
    };
    let bit_len = data.len() * 8 - padding_len as usize;
    let mut references: Vec<usize> = Vec::with_capacity(ref_num);
    for _ in 0..ref_num {
        let reference = read_var_size(reader, size)?;
        if reference <= cell_index || reference >= cell_count {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Cell {cell_index} has invalid reference {reference}, references must point to later cells (total {cell_count})"
            )));
        }
        references.push(reference);
    }
    Ok(RawCell {
        data,
        bit_len,
        references,
    })
}

fn raw_cell_size(cell: &RawCell, ref_size_bytes: usize) -> usize {
    2 + cell.bit_len.div_ceil(8) + cell.references.len() * ref_size_bytes
}

fn write_raw_cell(
    writer: &mut BitWriter<Vec<u8>, BigEndian>,
    cell: &RawCell,
    ref_size_bytes: usize,
) -> Result<(), TonCellError> {
    let d1 = crate::cell::refs_descriptor(cell.references.len());
    let d2 = crate::cell::bits_descriptor(cell.bit_len);

    let padding_bits = cell.bit_len % 8;
    let full_bytes = padding_bits == 0;
    let data = cell.data.as_slice();
    let data_len = cell.bit_len.div_ceil(8);

    writer.write(8, d1).map_boc_serialization_error()?;
    writer.write(8, d2).map_boc_serialization_error()?;
    if !full_bytes {
        writer
            .write_bytes(&data[..data_len - 1])
            .map_boc_serialization_error()?;
        let last_byte = data[data_len - 1];
        let l = last_byte | 1 << (8 - padding_bits - 1);
        writer.write(8, l).map_boc_serialization_error()?;
    } else {
        writer
            .write_bytes(&data[..data_len])
            .map_boc_serialization_error()?;
    }

    for r in cell.references.as_slice() {
        write_var_size(writer, *r, ref_size_bytes)?;
    }

    Ok(())
}

/// Minimal number of bytes to hold `value`, at least one.
fn bytes_for_value(value: u64) -> usize {
    let bits = (u64::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8).max(1)
}

fn write_var_size(
    writer: &mut BitWriter<Vec<u8>, BigEndian>,
    value: usize,
    n: usize,
) -> Result<(), TonCellError> {
    writer
        .write(8 * n as u32, value as u64)
        .map_boc_serialization_error()
}

fn read_var_size(
    reader: &mut ByteReader<Cursor<&[u8]>, BigEndian>,
    n: u8,
) -> Result<usize, TonCellError> {
    let bytes = reader
        .read_to_vec(n.into())
        .map_boc_deserialization_error()?;

    let mut result: u64 = 0;
    for &byte in &bytes {
        result <<= 8;
        result |= u64::from(byte);
    }
    usize::try_from(result).map_boc_deserialization_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cell_boc(has_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        RawBagOfCells {
            cells: vec![RawCell {
                data: vec![],
                bit_len: 0,
                references: vec![],
            }],
            roots: vec![0],
        }
        .serialize(has_crc32)
    }

    #[test]
    fn serialize_single_empty_cell() -> Result<(), TonCellError> {
        assert_eq!(
            hex::encode(empty_cell_boc(false)?),
            "b5ee9c72010101010002000000"
        );
        assert_eq!(
            hex::encode(empty_cell_boc(true)?),
            "b5ee9c724101010100020000004cacb9cd"
        );
        Ok(())
    }

    #[test]
    fn bytes_for_value_is_minimal() {
        assert_eq!(bytes_for_value(0), 1);
        assert_eq!(bytes_for_value(1), 1);
        assert_eq!(bytes_for_value(255), 1);
        assert_eq!(bytes_for_value(256), 2);
        assert_eq!(bytes_for_value(u32::MAX as u64 + 1), 5);
    }

    #[test]
    fn parse_checks_crc() -> Result<(), TonCellError> {
        let mut boc = empty_cell_boc(true)?;
        assert!(RawBagOfCells::parse(&boc).is_ok());
        let last = boc.len() - 1;
        boc[last] ^= 0x01;
        assert!(matches!(
            RawBagOfCells::parse(&boc),
            Err(TonCellError::MalformedBoc(_))
        ));
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_headers() -> Result<(), TonCellError> {
        let cases = [
            // bad magic
            "b5ee9c73010101010002000000",
            // size = 0
            "b5ee9c72000101010002000000",
            // size = 5
            "b5ee9c72050101010002000000",
            // off_bytes = 0
            "b5ee9c72010001010002000000",
            // no roots
            "b5ee9c720101010000020000",
            // absent cells
            "b5ee9c72010101010102000000",
            // root index out of range
            "b5ee9c72010101010002010000",
            // trailing garbage
            "b5ee9c7201010101000200000000",
            // truncated cell data
            "b5ee9c720101010100020000",
            // tot_cells_size mismatch
            "b5ee9c7201010101000300000000",
        ];
        for case in cases {
            let bytes = hex::decode(case).map_boc_deserialization_error()?;
            assert!(
                matches!(
                    RawBagOfCells::parse(&bytes),
                    Err(TonCellError::MalformedBoc(_))
                ),
                "{case}"
            );
        }
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_cells() -> Result<(), TonCellError> {
        let cases = [
            // reference to itself
            "b5ee9c7201010101000300010000",
            // reference backwards
            "b5ee9c7201010201000600010001010000",
            // reference out of range
            "b5ee9c7201010101000300010001",
            // exotic cell
            "b5ee9c72010101010002000800",
            // level 1
            "b5ee9c72010101010002002000",
            // five references
            "b5ee9c72010106010011000500010203040500000000000000000000",
            // zero last byte without completion tag
            "b5ee9c7201010101000300000100",
        ];
        for case in cases {
            let bytes = hex::decode(case).map_boc_deserialization_error()?;
            assert!(
                matches!(
                    RawBagOfCells::parse(&bytes),
                    Err(TonCellError::MalformedBoc(_))
                ),
                "{case}"
            );
        }
        Ok(())
    }
}
