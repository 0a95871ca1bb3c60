use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader};
use num_bigint::BigUint;
use num_traits::identities::Zero;

use crate::cell::util::*;
use crate::cell::{ArcCell, Cell, MapTonCellError, TonCellError};
use crate::TonAddress;

/// Sequential reader over the bits and references of a cell.
pub struct CellParser<'a> {
    cell: &'a Cell,
    bit_reader: BitReader<Cursor<&'a [u8]>, BigEndian>,
    next_ref: usize,
}

impl<'a> CellParser<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        let cursor = Cursor::new(cell.data());
        CellParser {
            cell,
            bit_reader: BitReader::endian(cursor, BigEndian),
            next_ref: 0,
        }
    }

    pub fn remaining_bits(&mut self) -> usize {
        let pos = self.bit_reader.position_in_bits().unwrap_or_default() as usize;
        self.cell.bit_len().saturating_sub(pos)
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.references().len() - self.next_ref
    }

    pub fn load_bit(&mut self) -> Result<bool, TonCellError> {
        self.ensure_enough_bits(1)?;
        self.bit_reader.read_bit().map_cell_parser_error()
    }

    pub fn load_u8(&mut self, bit_len: usize) -> Result<u8, TonCellError> {
        Ok(self.load_raw(bit_len, 8)? as u8)
    }

    pub fn load_i8(&mut self, bit_len: usize) -> Result<i8, TonCellError> {
        Ok(self.load_signed(bit_len, 8)? as i8)
    }

    pub fn load_u16(&mut self, bit_len: usize) -> Result<u16, TonCellError> {
        Ok(self.load_raw(bit_len, 16)? as u16)
    }

    pub fn load_u32(&mut self, bit_len: usize) -> Result<u32, TonCellError> {
        Ok(self.load_raw(bit_len, 32)? as u32)
    }

    pub fn load_i32(&mut self, bit_len: usize) -> Result<i32, TonCellError> {
        Ok(self.load_signed(bit_len, 32)? as i32)
    }

    pub fn load_u64(&mut self, bit_len: usize) -> Result<u64, TonCellError> {
        self.load_raw(bit_len, 64)
    }

    pub fn load_uint(&mut self, bit_len: usize) -> Result<BigUint, TonCellError> {
        let bytes = self.load_bits(bit_len)?;
        let rest_bits = bit_len % 8;
        let value = BigUint::from_bytes_be(&bytes);
        if rest_bits == 0 {
            Ok(value)
        } else {
            Ok(value >> (8 - rest_bits))
        }
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

    pub fn load_bits_to_slice(
        &mut self,
        num_bits: usize,
        slice: &mut [u8],
    ) -> Result<(), TonCellError> {
        self.ensure_enough_bits(num_bits)?;
        self.bit_reader.read_bits(num_bits, slice)?;
        Ok(())
    }

    /// Loads `num_bits` bits, left-aligned, the unused tail of the last byte is zero.
    pub fn load_bits(&mut self, num_bits: usize) -> Result<Vec<u8>, TonCellError> {
        let mut res = vec![0_u8; num_bits.div_ceil(8)];
        self.load_bits_to_slice(num_bits, res.as_mut_slice())?;
        Ok(res)
    }

    pub fn load_coins(&mut self) -> Result<BigUint, TonCellError> {
        let num_bytes = self.load_u8(4)?;
        if num_bytes == 0 {
            Ok(BigUint::zero())
        } else {
            self.load_uint(num_bytes as usize * 8)
        }
    }

    /// Loads `addr_none` as [`TonAddress::NULL`] or `addr_std` without anycast.
    pub fn load_address(&mut self) -> Result<TonAddress, TonCellError> {
        let tp = self.load_u8(2)?;
        match tp {
            0 => Ok(TonAddress::null()),
            2 => {
                self.ensure_enough_bits(1 + 8 + 32 * 8)?;
                if self.load_bit()? {
                    return Err(TonCellError::CellParserError(
                        "Anycast addresses are not supported".to_string(),
                    ));
                }
                let wc = self.load_i8(8)?;
                let mut hash_part = [0_u8; 32];
                self.load_slice(&mut hash_part)?;
                Ok(TonAddress::new(wc as i32, &hash_part))
            }
            _ => Err(TonCellError::InvalidAddressType(tp)),
        }
    }

    pub fn next_reference(&mut self) -> Result<ArcCell, TonCellError> {
        let reference = self.cell.reference(self.next_ref)?.clone();
        self.next_ref += 1;
        Ok(reference)
    }

    pub fn load_maybe_cell_ref(&mut self) -> Result<Option<ArcCell>, TonCellError> {
        if self.load_bit()? {
            Ok(Some(self.next_reference()?))
        } else {
            Ok(None)
        }
    }

    /// Collects the unread bits and references into a standalone cell.
    pub fn load_remaining(&mut self) -> Result<Cell, TonCellError> {
        let bit_len = self.remaining_bits();
        let data = self.load_bits(bit_len)?;
        let references = self.cell.references()[self.next_ref..].to_vec();
        self.next_ref = self.cell.references().len();
        Cell::new(data, bit_len, references)
    }

    /// `Either X ^X`: the rest of this cell, or the next reference.
    pub fn load_either_cell_or_cell_ref(&mut self) -> Result<ArcCell, TonCellError> {
        if self.load_bit()? {
            self.next_reference()
        } else {
            Ok(self.load_remaining()?.to_arc())
        }
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

    fn load_raw(&mut self, bit_len: usize, max_bit_len: usize) -> Result<u64, TonCellError> {
        if bit_len > max_bit_len {
            return Err(TonCellError::CellParserError(format!(
                "Can't load {} bits into a {} bit number",
                bit_len, max_bit_len
            )));
        }
        self.ensure_enough_bits(bit_len)?;
        if bit_len == 0 {
            return Ok(0);
        }
        self.bit_reader
            .read::<u64>(bit_len as u32)
            .map_cell_parser_error()
    }

    fn load_signed(&mut self, bit_len: usize, max_bit_len: usize) -> Result<i64, TonCellError> {
        if bit_len == 0 {
            return Err(TonCellError::CellParserError(
                "Signed number must have at least 1 bit".to_string(),
            ));
        }
        let raw = self.load_raw(bit_len, max_bit_len)?;
        let shift = 64 - bit_len as u32;
        Ok(((raw << shift) as i64) >> shift)
    }

    fn ensure_enough_bits(&mut self, bit_len: usize) -> Result<(), TonCellError> {
        if self.remaining_bits() < bit_len {
            return Err(TonCellError::CellParserError(
                "Not enough bits to read".to_owned(),
            ));
        }
        Ok(())
    }
}
