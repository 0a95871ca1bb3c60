use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub use bag_of_cells::*;
pub use builder::*;
pub use error::*;
use lazy_static::lazy_static;
pub use parser::*;
pub use raw::*;
use sha2::{Digest, Sha256};
pub use util::*;

use crate::types::{TON_HASH_BYTES, ZERO_HASH};
use crate::TonHash;

mod bag_of_cells;
mod builder;
mod error;
mod parser;
mod raw;
mod raw_boc_from_boc;
mod util;

pub const MAX_CELL_BITS: usize = 1023;
pub const MAX_CELL_REFERENCES: usize = 4;
pub const DEPTH_BYTES: usize = 2;

pub type ArcCell = Arc<Cell>;

lazy_static! {
    pub static ref EMPTY_ARC_CELL: ArcCell = Arc::new(Cell::default());
}

/// Ordinary cell: up to 1023 data bits and up to 4 references.
///
/// A cell is immutable once created, its representation hash and depth are
/// computed in [`Cell::new`] and cached.
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<ArcCell>,
    hash: TonHash,
    depth: u16,
}

impl Cell {
    pub fn new(
        data: Vec<u8>,
        bit_len: usize,
        references: Vec<ArcCell>,
    ) -> Result<Self, TonCellError> {
        if bit_len > MAX_CELL_BITS || references.len() > MAX_CELL_REFERENCES {
            return Err(TonCellError::CapacityExceeded {
                bit_len,
                ref_count: references.len(),
            });
        }
        if data.len() != bit_len.div_ceil(8) {
            return Err(TonCellError::InvalidCellData(format!(
                "data length {} bytes doesn't match bit_len {}",
                data.len(),
                bit_len
            )));
        }
        let mut data = data;
        let rest_bits = bit_len % 8;
        if rest_bits != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xff << (8 - rest_bits);
            }
        }

        let depth = references
            .iter()
            .map(|r| r.depth + 1)
            .max()
            .unwrap_or(0);
        let repr = get_repr_for_data(&data, bit_len, &references)?;
        let hash = sha256(&repr);

        Ok(Cell {
            data,
            bit_len,
            references,
            hash,
            depth,
        })
    }

    pub fn parser(&self) -> CellParser {
        CellParser::new(self)
    }

    pub fn reference(&self, idx: usize) -> Result<&ArcCell, TonCellError> {
        self.references.get(idx).ok_or(TonCellError::InvalidIndex {
            idx,
            ref_count: self.references.len(),
        })
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn references(&self) -> &[ArcCell] {
        self.references.as_slice()
    }

    pub fn cell_depth(&self) -> u16 {
        self.depth
    }

    pub fn cell_hash(&self) -> TonHash {
        self.hash
    }

    pub fn cell_hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn to_arc(self) -> ArcCell {
        Arc::new(self)
    }

    /// Serializes the tree rooted at this cell as a single-root bag of cells.
    pub fn to_boc(&self, has_crc32: bool) -> Result<Vec<u8>, TonCellError> {
        BagOfCells::from_root(self.clone()).serialize(has_crc32)
    }

    pub fn to_boc_hex(&self, has_crc32: bool) -> Result<String, TonCellError> {
        Ok(hex::encode(self.to_boc(has_crc32)?))
    }

    pub fn to_boc_b64(&self, has_crc32: bool) -> Result<String, TonCellError> {
        BagOfCells::from_root(self.clone()).serialize_base64(has_crc32)
    }

    pub fn from_boc(boc: &[u8]) -> Result<ArcCell, TonCellError> {
        BagOfCells::parse(boc)?.into_single_root()
    }

    pub fn from_boc_hex(boc: &str) -> Result<ArcCell, TonCellError> {
        BagOfCells::parse_hex(boc)?.into_single_root()
    }

    pub fn from_boc_b64(boc: &str) -> Result<ArcCell, TonCellError> {
        BagOfCells::parse_base64(boc)?.into_single_root()
    }
}

impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // "_" marks an incomplete last byte, the completion tag itself is not printed
        let completion_tag = if self.bit_len % 8 != 0 { "_" } else { "" };
        writeln!(
            f,
            "Cell {{ data: [{}{}]\n, bit_len: {}\n, references: [",
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

        write!(
            f,
            "]\n hash: {}\n depth: {}\n }}",
            hex::encode_upper(self.hash),
            self.depth
        )
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            data: vec![],
            bit_len: 0,
            references: vec![],
            hash: sha256(&[0, 0]),
            depth: 0,
        }
    }
}

fn sha256(data: &[u8]) -> TonHash {
    let mut hash = ZERO_HASH;
    hash.copy_from_slice(&Sha256::digest(data));
    hash
}

/// Representation of an ordinary cell as hashed: descriptors, padded data,
/// then the depth and the hash of every reference.
fn get_repr_for_data(
    data: &[u8],
    bit_len: usize,
    refs: &[ArcCell],
) -> Result<Vec<u8>, TonCellError> {
    let data_len = bit_len.div_ceil(8);
    let mut repr =
        Vec::with_capacity(2 + data_len + refs.len() * (DEPTH_BYTES + TON_HASH_BYTES));

    repr.push(get_refs_descriptor(refs.len())?);
    repr.push(get_bits_descriptor(bit_len)?);
    repr.extend(pad_to_byte(data, bit_len));

    for r in refs {
        repr.extend(r.cell_depth().to_be_bytes());
    }
    for r in refs {
        repr.extend(r.cell_hash());
    }
    Ok(repr)
}

/// d1 for an ordinary cell of level 0: just the reference count.
fn get_refs_descriptor(ref_count: usize) -> Result<u8, TonCellError> {
    if ref_count > MAX_CELL_REFERENCES {
        Err(TonCellError::InvalidCellData(
            "Cell must contain at most 4 references".to_string(),
        ))
    } else {
        Ok(ref_count as u8)
    }
}

fn get_bits_descriptor(bit_len: usize) -> Result<u8, TonCellError> {
    if bit_len > MAX_CELL_BITS {
        Err(TonCellError::InvalidCellData(
            "Cell data length should not contain more than 1023 bits".to_string(),
        ))
    } else {
        let d2 = bit_len / 8 + bit_len.div_ceil(8);
        Ok(d2 as u8)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{get_bits_descriptor, get_refs_descriptor, Cell, CellBuilder, TonCellError};

    #[test]
    fn default_cell() {
        let result = Cell::default();
        let expected = Cell::new(vec![], 0, vec![]).unwrap();

        assert_eq!(result, expected);
        assert_eq!(
            result.cell_hash_hex(),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
        assert_eq!(result.cell_depth(), 0);
    }

    #[test]
    fn d1_descriptor_test() {
        assert_eq!(get_refs_descriptor(0).unwrap(), 0);
        assert_eq!(get_refs_descriptor(4).unwrap(), 4);
        assert!(get_refs_descriptor(5).is_err());
    }

    #[test]
    fn d2_descriptor_test() {
        assert_eq!(get_bits_descriptor(0).unwrap(), 0);
        assert_eq!(get_bits_descriptor(1023).unwrap(), 255);
        assert_eq!(get_bits_descriptor(8).unwrap(), 2);
        assert_eq!(get_bits_descriptor(7).unwrap(), 1);
        assert!(get_bits_descriptor(1024).is_err());
    }

    #[test]
    fn new_rejects_inconsistent_data() {
        assert!(matches!(
            Cell::new(vec![0; 2], 8, vec![]),
            Err(TonCellError::InvalidCellData(_))
        ));
        assert!(matches!(
            Cell::new(vec![0; 128], 1024, vec![]),
            Err(TonCellError::CapacityExceeded { .. })
        ));
        let child = Arc::new(Cell::default());
        assert!(matches!(
            Cell::new(vec![], 0, vec![child; 5]),
            Err(TonCellError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn unused_bits_do_not_change_hash() -> anyhow::Result<()> {
        let masked = Cell::new(vec![0b1010_0000], 3, vec![])?;
        let dirty = Cell::new(vec![0b1011_1111], 3, vec![])?;
        assert_eq!(masked, dirty);
        assert_eq!(masked.cell_hash(), dirty.cell_hash());
        Ok(())
    }

    #[test]
    fn depth_counts_longest_reference_chain() -> anyhow::Result<()> {
        let leaf = Arc::new(Cell::default());
        let mid = CellBuilder::new().store_reference(&leaf)?.build()?.to_arc();
        let mut builder = CellBuilder::new();
        builder.store_reference(&leaf)?;
        builder.store_reference(&mid)?;
        let root = builder.build()?;

        assert_eq!(leaf.cell_depth(), 0);
        assert_eq!(mid.cell_depth(), 1);
        assert_eq!(root.cell_depth(), 2);
        Ok(())
    }

    fn two_level_tree(leaf_bits: &[u8], leaf_bit_len: usize) -> anyhow::Result<Cell> {
        let leaf = CellBuilder::new()
            .store_bits(leaf_bit_len, leaf_bits)?
            .build()?
            .to_arc();
        let mid = CellBuilder::new()
            .store_u32(32, 0x7369676e)?
            .store_reference(&leaf)?
            .build()?
            .to_arc();
        Ok(CellBuilder::new()
            .store_bit(true)?
            .store_reference(&mid)?
            .store_reference(&Arc::new(Cell::default()))?
            .build()?)
    }

    #[test]
    fn identical_trees_hash_identically() -> anyhow::Result<()> {
        let first = two_level_tree(&[0xDE, 0xAD, 0xBE, 0xE0], 29)?;
        let second = two_level_tree(&[0xDE, 0xAD, 0xBE, 0xE0], 29)?;
        assert_eq!(first.cell_hash(), second.cell_hash());
        assert_eq!(first.cell_depth(), 2);
        Ok(())
    }

    #[test]
    fn single_bit_flip_changes_hash() -> anyhow::Result<()> {
        let leaf_bits = [0xDE, 0xAD, 0xBE, 0xE0];
        let reference = two_level_tree(&leaf_bits, 29)?;
        for bit in 0..29 {
            let mut flipped = leaf_bits;
            flipped[bit / 8] ^= 0x80 >> (bit % 8);
            let tree = two_level_tree(&flipped, 29)?;
            assert_ne!(tree.cell_hash(), reference.cell_hash(), "bit {bit}");
        }
        Ok(())
    }

    #[test]
    fn hash_covers_references() -> anyhow::Result<()> {
        let a = Arc::new(CellBuilder::new().store_u8(8, 1)?.build()?);
        let b = Arc::new(CellBuilder::new().store_u8(8, 2)?.build()?);
        let with_a = CellBuilder::new().store_reference(&a)?.build()?;
        let with_b = CellBuilder::new().store_reference(&b)?.build()?;
        assert_ne!(with_a.cell_hash(), with_b.cell_hash());
        Ok(())
    }
}
