use std::io;

use bitstream_io::{BitRead, BitReader, Endianness};

use crate::cell::{MapTonCellError, TonCellError};

pub trait BitReadExt {
    fn read_bits(&mut self, num_bits: usize, slice: &mut [u8]) -> Result<(), TonCellError>;
}

impl<R: io::Read, E: Endianness> BitReadExt for BitReader<R, E> {
    fn read_bits(&mut self, num_bits: usize, slice: &mut [u8]) -> Result<(), TonCellError> {
        let total_bytes = num_bits.div_ceil(8);
        if total_bytes > slice.len() {
            let msg = format!(
                "Attempt to read {} bits into buffer {} bytes",
                num_bits,
                slice.len()
            );
            return Err(TonCellError::CellParserError(msg));
        }
        let full_bytes = num_bits / 8;
        self.read_bytes(&mut slice[0..full_bytes])
            .map_cell_parser_error()?;
        let last_byte_len = num_bits % 8;
        if last_byte_len != 0 {
            let last_byte = self
                .read::<u8>(last_byte_len as u32)
                .map_cell_parser_error()?;
            slice[full_bytes] = last_byte << (8 - last_byte_len);
        }
        Ok(())
    }
}

/// Completes `bit_len` bits of `data` to whole bytes.
///
/// When `bit_len` is not a multiple of 8, a single `1` bit is appended right
/// after the last data bit and the rest of the byte is zero. Byte-aligned
/// input is returned as is. Bits of `data` past `bit_len` are ignored, missing
/// bytes read as zero.
pub fn pad_to_byte(data: &[u8], bit_len: usize) -> Vec<u8> {
    let full_bytes = bit_len / 8;
    let rest_bits = bit_len % 8;

    let mut padded: Vec<u8> = data.iter().copied().take(full_bytes).collect();
    padded.resize(full_bytes, 0);
    if rest_bits != 0 {
        let last = data.get(full_bytes).copied().unwrap_or(0) & (0xff << (8 - rest_bits));
        padded.push(last | 1 << (7 - rest_bits));
    }
    padded
}
