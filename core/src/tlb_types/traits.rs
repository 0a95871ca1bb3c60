use std::ops::Deref;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;

use crate::cell::{BagOfCells, Cell, CellBuilder, CellParser, TonCellError};
use crate::TonHash;

/// Object with a TL-B layout that can be read from and written to a cell.
pub trait TLBObject: Sized {
    /// Constructor tag stored in front of the object, [`TLBPrefix::NULL`] if none.
    const PREFIX: TLBPrefix = TLBPrefix::NULL;

    /// Reads the fields following the prefix.
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError>;

    /// Writes the fields following the prefix.
    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError>;

    fn read(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Self::verify_prefix(parser)?;
        Self::read_definition(parser)
    }

    fn write(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        Self::write_prefix(dst)?;
        self.write_definition(dst)
    }

    /// Utilities
    ///
    fn cell_hash(&self) -> Result<TonHash, TonCellError> {
        Ok(self.to_cell()?.cell_hash())
    }

    /// Parsing
    ///
    fn from_cell(cell: &Cell) -> Result<Self, TonCellError> {
        Self::read(&mut cell.parser())
    }

    fn from_boc(boc: &[u8]) -> Result<Self, TonCellError> {
        let cell = BagOfCells::parse(boc)?.into_single_root()?;
        Self::from_cell(cell.deref())
    }

    fn from_boc_hex(boc_hex: &str) -> Result<Self, TonCellError> {
        let cell = BagOfCells::parse_hex(boc_hex)?.into_single_root()?;
        Self::from_cell(cell.deref())
    }

    fn from_boc_b64(boc_b64: &str) -> Result<Self, TonCellError> {
        let cell = BagOfCells::parse_base64(boc_b64)?.into_single_root()?;
        Self::from_cell(cell.deref())
    }

    /// Serialization
    ///
    fn to_cell(&self) -> Result<Cell, TonCellError> {
        let mut builder = CellBuilder::new();
        self.write(&mut builder)?;
        builder.build()
    }

    fn to_boc(&self, add_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        BagOfCells::from_root(self.to_cell()?).serialize(add_crc32)
    }

    fn to_boc_hex(&self, add_crc32: bool) -> Result<String, TonCellError> {
        Ok(hex::encode(self.to_boc(add_crc32)?))
    }

    fn to_boc_b64(&self, add_crc32: bool) -> Result<String, TonCellError> {
        Ok(BASE64_STANDARD.encode(self.to_boc(add_crc32)?))
    }

    /// Helpers - for internal use
    ///
    fn verify_prefix(parser: &mut CellParser) -> Result<(), TonCellError> {
        if Self::PREFIX == TLBPrefix::NULL {
            return Ok(());
        }

        let remaining_bits = parser.remaining_bits();
        if remaining_bits < Self::PREFIX.bit_len {
            return Err(TonCellError::tlb_prefix_error(
                Self::PREFIX,
                0,
                remaining_bits,
            ));
        }

        let actual_prefix = parser.load_u64(Self::PREFIX.bit_len)?;
        if actual_prefix != Self::PREFIX.value {
            return Err(TonCellError::tlb_prefix_error(
                Self::PREFIX,
                actual_prefix,
                remaining_bits,
            ));
        }
        Ok(())
    }

    fn write_prefix(builder: &mut CellBuilder) -> Result<(), TonCellError> {
        if Self::PREFIX != TLBPrefix::NULL {
            builder.store_u64(Self::PREFIX.bit_len, Self::PREFIX.value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TLBPrefix {
    pub bit_len: usize,
    pub value: u64,
}

impl TLBPrefix {
    pub const NULL: TLBPrefix = TLBPrefix::new(0, 0);

    pub const fn new(bit_len: usize, value: u64) -> Self {
        TLBPrefix { bit_len, value }
    }
}
