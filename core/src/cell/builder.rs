use bitstream_io::{BigEndian, BitWrite, BitWriter};
use num_bigint::BigUint;
use num_traits::Zero;

use crate::cell::error::{MapTonCellError, TonCellError};
use crate::cell::{ArcCell, Cell, MAX_CELL_BITS, MAX_CELL_REFERENCES};
use crate::TonAddress;

/// Accumulates bits and references for a single cell.
///
/// Every append checks the 1023 bit / 4 reference limits up front, a failed
/// append leaves the builder unchanged.
pub struct CellBuilder {
    bit_writer: BitWriter<Vec<u8>, BigEndian>,
    bits_to_write: usize,
    references: Vec<ArcCell>,
}

/// Placement of a child cell stored as `Either X ^X`.
#[derive(Clone, Debug, PartialEq, Copy)]
pub enum EitherCellLayout {
    /// Inline when the child fits into the remaining space, reference otherwise.
    Native,
    ToRef,
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
        self.ensure_capacity(1, 0)?;
        self.bit_writer.write_bit(val).map_cell_builder_error()?;
        self.bits_to_write += 1;
        Ok(self)
    }

    pub fn store_u8(&mut self, bit_len: usize, val: u8) -> Result<&mut Self, TonCellError> {
        self.store_number(bit_len, val as u64, 8)
    }

    /// Stores `val` as a two's complement integer of `bit_len` bits.
    pub fn store_i8(&mut self, bit_len: usize, val: i8) -> Result<&mut Self, TonCellError> {
        let raw = signed_to_raw(val as i64, bit_len, 8)?;
        self.store_number(bit_len, raw, 8)
    }

    pub fn store_u16(&mut self, bit_len: usize, val: u16) -> Result<&mut Self, TonCellError> {
        self.store_number(bit_len, val as u64, 16)
    }

    pub fn store_u32(&mut self, bit_len: usize, val: u32) -> Result<&mut Self, TonCellError> {
        self.store_number(bit_len, val as u64, 32)
    }

    /// Stores `val` as a two's complement integer of `bit_len` bits.
    pub fn store_i32(&mut self, bit_len: usize, val: i32) -> Result<&mut Self, TonCellError> {
        let raw = signed_to_raw(val as i64, bit_len, 32)?;
        self.store_number(bit_len, raw, 32)
    }

    pub fn store_u64(&mut self, bit_len: usize, val: u64) -> Result<&mut Self, TonCellError> {
        self.store_number(bit_len, val, 64)
    }

    /// Stores an unsigned integer of arbitrary width, most significant bit first.
    pub fn store_uint(&mut self, bit_len: usize, val: &BigUint) -> Result<&mut Self, TonCellError> {
        if val.bits() as usize > bit_len {
            return Err(TonCellError::value_out_of_range(val, bit_len));
        }
        self.ensure_capacity(bit_len, 0)?;
        for i in (0..bit_len).rev() {
            self.bit_writer
                .write_bit(val.bit(i as u64))
                .map_cell_builder_error()?;
        }
        self.bits_to_write += bit_len;
        Ok(self)
    }

    pub fn store_slice(&mut self, slice: &[u8]) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(slice.len() * 8, 0)?;
        self.bit_writer.write_bytes(slice).map_cell_builder_error()?;
        self.bits_to_write += slice.len() * 8;
        Ok(self)
    }

    /// Stores the first `bit_len` bits of `slice`.
    pub fn store_bits(&mut self, bit_len: usize, slice: &[u8]) -> Result<&mut Self, TonCellError> {
        let full_bytes = bit_len / 8;
        let last_byte_len = bit_len % 8;
        if slice.len() < bit_len.div_ceil(8) {
            return Err(TonCellError::InvalidInput(format!(
                "Can't store {} bits from a {} byte slice",
                bit_len,
                slice.len()
            )));
        }
        self.ensure_capacity(bit_len, 0)?;
        self.store_slice(&slice[0..full_bytes])?;
        if last_byte_len != 0 {
            let last_byte = slice[full_bytes] >> (8 - last_byte_len);
            self.store_u8(last_byte_len, last_byte)?;
        }
        Ok(self)
    }

    /// Stores `Grams`: a 4-bit byte length followed by the value bytes.
    pub fn store_coins(&mut self, val: &BigUint) -> Result<&mut Self, TonCellError> {
        if val.is_zero() {
            self.store_u8(4, 0)
        } else {
            let num_bytes = (val.bits() as usize).div_ceil(8);
            if num_bytes > 15 {
                return Err(TonCellError::value_out_of_range(val, 120));
            }
            self.ensure_capacity(4 + num_bytes * 8, 0)?;
            self.store_u8(4, num_bytes as u8)?;
            self.store_uint(num_bytes * 8, val)
        }
    }

    /// Stores `addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256`,
    /// anycast is always absent.
    pub fn store_raw_address(&mut self, val: &TonAddress) -> Result<&mut Self, TonCellError> {
        let workchain = i8::try_from(val.workchain)
            .map_err(|_| TonCellError::value_out_of_range(val.workchain, 8))?;
        self.ensure_capacity(2 + 1 + 8 + 256, 0)?;
        self.store_u8(2, 0b10u8)?;
        self.store_bit(false)?;
        self.store_i8(8, workchain)?;
        self.store_slice(&val.hash_part)?;
        Ok(self)
    }

    /// Stores `addr_none$00` for [`TonAddress::NULL`] and `addr_std` otherwise.
    pub fn store_address(&mut self, val: &TonAddress) -> Result<&mut Self, TonCellError> {
        if val == &TonAddress::NULL {
            self.store_u8(2, 0)?;
        } else {
            self.store_raw_address(val)?;
        }
        Ok(self)
    }

    pub fn store_reference(&mut self, cell: &ArcCell) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(0, 1)?;
        self.references.push(cell.clone());
        Ok(self)
    }

    pub fn store_references(&mut self, refs: &[ArcCell]) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(0, refs.len())?;
        for r in refs {
            self.store_reference(r)?;
        }
        Ok(self)
    }

    pub fn store_cell_data(&mut self, cell: &Cell) -> Result<&mut Self, TonCellError> {
        self.store_bits(cell.bit_len(), cell.data())
    }

    /// Appends the bits and the references of `cell`.
    pub fn store_cell(&mut self, cell: &Cell) -> Result<&mut Self, TonCellError> {
        self.ensure_capacity(cell.bit_len(), cell.references().len())?;
        self.store_cell_data(cell)?;
        self.store_references(cell.references())?;
        Ok(self)
    }

    /// Appends everything accumulated by `other`.
    pub fn store_builder(&mut self, mut other: CellBuilder) -> Result<&mut Self, TonCellError> {
        let cell = other.build()?;
        self.store_cell(&cell)
    }

    pub fn store_either_cell_or_cell_ref(
        &mut self,
        cell: &ArcCell,
        layout: EitherCellLayout,
    ) -> Result<&mut Self, TonCellError> {
        match layout {
            EitherCellLayout::Native => {
                let fits_refs =
                    self.references.len() + cell.references().len() <= MAX_CELL_REFERENCES;
                if cell.bit_len() < self.remaining_bits() && fits_refs {
                    self.store_bit(false)?;
                    self.store_cell(cell)?;
                } else {
                    self.store_bit(true)?;
                    self.store_reference(cell)?;
                }
            }
            EitherCellLayout::ToRef => {
                self.ensure_capacity(1, 1)?;
                self.store_bit(true)?;
                self.store_reference(cell)?;
            }
        }

        Ok(self)
    }

    pub fn store_maybe_cell_ref(
        &mut self,
        maybe_cell: &Option<ArcCell>,
    ) -> Result<&mut Self, TonCellError> {
        if let Some(cell) = maybe_cell {
            self.ensure_capacity(1, 1)?;
            self.store_bit(true)?;
            self.store_reference(cell)?;
        } else {
            self.store_bit(false)?;
        }

        Ok(self)
    }

    pub fn bit_len(&self) -> usize {
        self.bits_to_write
    }

    pub fn remaining_bits(&self) -> usize {
        MAX_CELL_BITS - self.bits_to_write
    }

    pub fn remaining_refs(&self) -> usize {
        MAX_CELL_REFERENCES - self.references.len()
    }

    /// Finishes the cell. The accumulated content is moved into the result
    /// and the builder is reset to the state of [`CellBuilder::new`]: it can
    /// be reused, but it no longer holds anything of the returned cell.
    pub fn build(&mut self) -> Result<Cell, TonCellError> {
        let bit_len = self.bits_to_write;
        let references = std::mem::take(&mut self.references);
        let mut bit_writer = std::mem::replace(
            &mut self.bit_writer,
            BitWriter::endian(Vec::new(), BigEndian),
        );
        self.bits_to_write = 0;

        bit_writer.byte_align().map_cell_builder_error()?;
        Cell::new(bit_writer.into_writer(), bit_len, references)
    }

    fn store_number(
        &mut self,
        bit_len: usize,
        val: u64,
        max_bit_len: usize,
    ) -> Result<&mut Self, TonCellError> {
        if bit_len > max_bit_len || (bit_len < 64 && val >> bit_len != 0) {
            return Err(TonCellError::value_out_of_range(val, bit_len));
        }
        self.ensure_capacity(bit_len, 0)?;
        if bit_len > 0 {
            self.bit_writer
                .write(bit_len as u32, val)
                .map_cell_builder_error()?;
        }
        self.bits_to_write += bit_len;
        Ok(self)
    }

    fn ensure_capacity(&self, bits: usize, refs: usize) -> Result<(), TonCellError> {
        let bit_len = self.bits_to_write + bits;
        let ref_count = self.references.len() + refs;
        if bit_len > MAX_CELL_BITS || ref_count > MAX_CELL_REFERENCES {
            Err(TonCellError::CapacityExceeded { bit_len, ref_count })
        } else {
            Ok(())
        }
    }
}

/// Two's complement bits of `val` truncated to `bit_len`, if `val` fits.
fn signed_to_raw(val: i64, bit_len: usize, max_bit_len: usize) -> Result<u64, TonCellError> {
    if bit_len == 0 || bit_len > max_bit_len {
        return Err(TonCellError::value_out_of_range(val, bit_len));
    }
    let min = -(1i64 << (bit_len - 1));
    let max = (1i64 << (bit_len - 1)) - 1;
    if val < min || val > max {
        return Err(TonCellError::value_out_of_range(val, bit_len));
    }
    let mask = if bit_len == 64 {
        u64::MAX
    } else {
        (1u64 << bit_len) - 1
    };
    Ok(val as u64 & mask)
}

impl Default for CellBuilder {
    fn default() -> Self {
        Self::new()
    }
}
