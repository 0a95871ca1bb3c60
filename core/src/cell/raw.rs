use std::io::Cursor;

use bitstream_io::{BigEndian, ByteRead, ByteReader};
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
/// `cells` must be topologically sorted: every reference points to a cell
/// with a greater index.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub(crate) struct RawBagOfCells {
    pub(crate) cells: Vec<RawCell>,
    pub(crate) roots: Vec<usize>,
}

const GENERIC_BOC_MAGIC: u32 = 0xb5ee9c72;
const CRC32_BYTES: usize = 4;
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
                "Invalid reference size: {}",
                size
            )));
        }

        let body = if has_crc32c {
            verify_crc32c(serial)?
        } else {
            serial
        };

        //   off_bytes:(## 8) { off_bytes <= 8 }
        let off_bytes = reader.read::<u8>().map_boc_deserialization_error()?;
        if off_bytes == 0 || off_bytes > MAX_OFFSET_BYTES {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Invalid offset size: {}",
                off_bytes
            )));
        }
        //cells:(##(size * 8))
        let cells = read_var_size(&mut reader, size)?;
        //   roots:(##(size * 8)) { roots >= 1 }
        let roots = read_var_size(&mut reader, size)?;
        //   absent:(##(size * 8)) { roots + absent <= cells }
        let absent = read_var_size(&mut reader, size)?;
        if roots == 0 || roots + absent > cells {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Invalid header (cells: {}, roots: {}, absent: {})",
                cells, roots, absent
            )));
        }
        if absent != 0 {
            return Err(TonCellError::boc_deserialization_error(
                "Absent cells are not supported",
            ));
        }
        // every cell takes at least its two descriptor bytes
        if cells > body.len() / 2 {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Cell count {} exceeds what {} bytes can hold",
                cells,
                body.len()
            )));
        }
        //   tot_cells_size:(##(off_bytes * 8))
        let tot_cells_size = read_var_size(&mut reader, off_bytes)?;
        //   root_list:(roots * ##(size * 8))
        let mut root_list = Vec::with_capacity(roots);
        for _ in 0..roots {
            let root = read_var_size(&mut reader, size)?;
            if root >= cells {
                return Err(TonCellError::boc_deserialization_error(format!(
                    "Root index {} is out of range (cells: {})",
                    root, cells
                )));
            }
            root_list.push(root)
        }
        //   index:has_idx?(cells * ##(off_bytes * 8))
        if has_idx {
            for _ in 0..cells {
                read_var_size(&mut reader, off_bytes)?;
            }
        }
        //   cell_data:(tot_cells_size * [ uint8 ])
        let size_bytes = size as usize;
        let off_size = off_bytes as usize;
        let cells_start = 4
            + 2
            + 3 * size_bytes
            + off_size
            + roots * size_bytes
            + if has_idx { cells * off_size } else { 0 };
        let mut cells_size = 0;
        let mut cell_vec = Vec::with_capacity(cells);
        for cell_index in 0..cells {
            let cell = read_cell(&mut reader, size)?;
            for &reference in &cell.references {
                if reference <= cell_index || reference >= cells {
                    return Err(TonCellError::boc_deserialization_error(format!(
                        "Cell {} references cell {} (cells: {})",
                        cell_index, reference, cells
                    )));
                }
            }
            cells_size += 2 + cell.data.len() + cell.references.len() * size_bytes;
            cell_vec.push(cell);
        }
        if cells_size != tot_cells_size {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Cell data size mismatch (declared: {}, actual: {})",
                tot_cells_size, cells_size
            )));
        }
        let cells_end = cells_start + cells_size;
        //   crc32c:has_crc32c?uint32
        if cells_end != body.len() {
            return Err(TonCellError::boc_deserialization_error(format!(
                "Unexpected {} trailing bytes",
                body.len().saturating_sub(cells_end)
            )));
        }

        Ok(RawBagOfCells {
            cells: cell_vec,
            roots: root_list,
        })
    }

    pub(crate) fn serialize(&self, has_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        if self.roots.is_empty() {
            return Err(TonCellError::boc_serialization_error(
                "At least one root expected",
            ));
        }

        let num_ref_bytes = min_bytes_for(self.cells.len());

        let mut full_size = 0usize;
        for cell in &self.cells {
            full_size += raw_cell_size(cell, num_ref_bytes);
        }
        let num_offset_bytes = min_bytes_for(full_size);

        let mut writer = Vec::with_capacity(full_size + 32);
        writer.extend(GENERIC_BOC_MAGIC.to_be_bytes());

        // has_idx = 0, has_cache_bits = 0, flags = 0
        let flags = ((has_crc32 as u8) << 6) | num_ref_bytes as u8;
        writer.push(flags);
        writer.push(num_offset_bytes as u8);
        write_var_size(&mut writer, self.cells.len(), num_ref_bytes);
        write_var_size(&mut writer, self.roots.len(), num_ref_bytes);
        // Complete BOCs only
        write_var_size(&mut writer, 0, num_ref_bytes);
        write_var_size(&mut writer, full_size, num_offset_bytes);
        for &root in &self.roots {
            write_var_size(&mut writer, root, num_ref_bytes);
        }

        for cell in &self.cells {
            write_raw_cell(&mut writer, cell, num_ref_bytes)?;
        }

        if has_crc32 {
            let cs = CRC_32_ISCSI.checksum(writer.as_slice());
            writer.extend(cs.to_le_bytes());
        }
        Ok(writer)
    }
}

/// Checks the trailing little-endian CRC32C and returns the covered bytes.
fn verify_crc32c(serial: &[u8]) -> Result<&[u8], TonCellError> {
    if serial.len() < CRC32_BYTES {
        return Err(TonCellError::boc_deserialization_error(
            "Not enough bytes for crc32c",
        ));
    }
    let (body, tail) = serial.split_at(serial.len() - CRC32_BYTES);
    let mut expected = [0u8; CRC32_BYTES];
    expected.copy_from_slice(tail);
    let expected = u32::from_le_bytes(expected);
    let actual = CRC_32_ISCSI.checksum(body);
    if expected != actual {
        return Err(TonCellError::boc_deserialization_error(format!(
            "crc32c mismatch (expected: {:#010x}, actual: {:#010x})",
            expected, actual
        )));
    }
    Ok(body)
}

fn read_cell(
    reader: &mut ByteReader<Cursor<&[u8]>, BigEndian>,
    size: u8,
) -> Result<RawCell, TonCellError> {
    let d1 = reader.read::<u8>().map_boc_deserialization_error()?;
    let d2 = reader.read::<u8>().map_boc_deserialization_error()?;

    let level = d1 >> 5;
    let is_exotic = (d1 & 8) != 0;
    let ref_num = (d1 & 0x07) as usize;
    if is_exotic || level != 0 {
        return Err(TonCellError::boc_deserialization_error(format!(
            "Only ordinary cells of level 0 are supported (d1: {:#04x})",
            d1
        )));
    }
    if ref_num > MAX_CELL_REFERENCES {
        return Err(TonCellError::boc_deserialization_error(format!(
            "Cell has {} references",
            ref_num
        )));
    }
    let data_size = ((d2 >> 1) + (d2 & 1)).into();
    let full_bytes = (d2 & 0x01) == 0;

    let mut data = reader
        .read_to_vec(data_size)
        .map_boc_deserialization_error()?;

    let data_len = data.len();
    let padding_len = if data_len > 0 && !full_bytes {
        // The last byte carries the completion tag: strip the final 1 bit and the zeros after it
        let num_zeros = data[data_len - 1].trailing_zeros();
        if num_zeros >= 8 {
            return Err(TonCellError::boc_deserialization_error(
                "Last byte of binary must not be zero if full_byte flag is not set",
            ));
        }
        data[data_len - 1] &= !(1 << num_zeros);
        num_zeros + 1
    } else {
        0
    };
    let bit_len = data.len() * 8 - padding_len as usize;
    let mut references: Vec<usize> = Vec::with_capacity(ref_num);
    for _ in 0..ref_num {
        references.push(read_var_size(reader, size)?);
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
    writer: &mut Vec<u8>,
    cell: &RawCell,
    ref_size_bytes: usize,
) -> Result<(), TonCellError> {
    if cell.references.len() > MAX_CELL_REFERENCES {
        return Err(TonCellError::boc_serialization_error(format!(
            "Cell has {} references",
            cell.references.len()
        )));
    }
    // ordinary cells of level 0 only: d1 is the reference count
    let d1 = cell.references.len() as u8;
    let d2 = (cell.bit_len / 8 + cell.bit_len.div_ceil(8)) as u8;

    writer.push(d1);
    writer.push(d2);
    writer.extend(super::pad_to_byte(&cell.data, cell.bit_len));

    for &r in &cell.references {
        write_var_size(writer, r, ref_size_bytes);
    }

    Ok(())
}

/// Smallest byte count that can hold `value`, at least 1.
fn min_bytes_for(value: usize) -> usize {
    let bits = usize::BITS - value.leading_zeros();
    (bits as usize).div_ceil(8).max(1)
}

fn write_var_size(writer: &mut Vec<u8>, value: usize, n: usize) {
    let bytes = (value as u64).to_be_bytes();
    writer.extend(&bytes[bytes.len() - n..]);
}

fn read_var_size(
    reader: &mut ByteReader<Cursor<&[u8]>, BigEndian>,
    n: u8,
) -> Result<usize, TonCellError> {
    let bytes = reader
        .read_to_vec(n.into())
        .map_boc_deserialization_error()?;

    let mut result = 0;
    for &byte in &bytes {
        result <<= 8;
        result |= usize::from(byte);
    }
    Ok(result)
}
