use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cell::{ArcCell, BagOfCells, RawBagOfCells, RawCell, TonCellError};
use crate::TonHash;

/// Flattens a bag of cells into indexed form.
///
/// Identical subtrees are stored once. Cells are ordered depth-first with the
/// roots first, so every reference points to a greater index and the order is
/// the one produced by common TON serializers.
pub(crate) fn convert_to_raw_boc(boc: &BagOfCells) -> Result<RawBagOfCells, TonCellError> {
    let sorted = topological_sort(&boc.roots);
    let index_by_hash: HashMap<TonHash, usize> = sorted
        .iter()
        .enumerate()
        .map(|(index, cell)| (cell.cell_hash(), index))
        .collect();

    let mut raw_cells = Vec::with_capacity(sorted.len());
    for (index, cell) in sorted.iter().enumerate() {
        let mut references = Vec::with_capacity(cell.references().len());
        for reference in cell.references() {
            let ref_index = lookup(&index_by_hash, reference)?;
            if ref_index <= index {
                return Err(TonCellError::boc_serialization_error(format!(
                    "Cell {} references cell {} placed before it",
                    index, ref_index
                )));
            }
            references.push(ref_index);
        }
        raw_cells.push(RawCell {
            data: cell.data().to_vec(),
            bit_len: cell.bit_len(),
            references,
        });
    }

    let roots = boc
        .roots
        .iter()
        .map(|root| lookup(&index_by_hash, root))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawBagOfCells {
        cells: raw_cells,
        roots,
    })
}

/// Reverse post-order of a depth-first walk that visits references last to first.
fn topological_sort(roots: &[ArcCell]) -> Vec<ArcCell> {
    let mut visited = HashSet::new();
    let mut post_order = Vec::new();
    for root in roots.iter().rev() {
        visit(root, &mut visited, &mut post_order);
    }
    post_order.reverse();
    post_order
}

fn visit(cell: &ArcCell, visited: &mut HashSet<TonHash>, post_order: &mut Vec<ArcCell>) {
    if !visited.insert(cell.cell_hash()) {
        return;
    }
    for reference in cell.references().iter().rev() {
        visit(reference, visited, post_order);
    }
    post_order.push(Arc::clone(cell));
}

fn lookup(index_by_hash: &HashMap<TonHash, usize>, cell: &ArcCell) -> Result<usize, TonCellError> {
    index_by_hash.get(&cell.cell_hash()).copied().ok_or_else(|| {
        TonCellError::boc_serialization_error(format!(
            "Cell {} is missing from the index",
            cell.cell_hash_hex()
        ))
    })
}
