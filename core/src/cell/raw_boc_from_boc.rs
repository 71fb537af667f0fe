use std::collections::{HashMap, VecDeque};

use crate::cell::{ArcCell, BagOfCells, RawBagOfCells, RawCell, TonCellError};
use crate::TonHash;

/// Orders the distinct cells of `boc` and replaces references with indices.
///
/// Cells are deduplicated by hash. Starting from the roots, a cell is appended
/// once every reference to it has been emitted, in breadth-first order. For a
/// tree this is plain BFS; the result depends on structure only.
pub(crate) fn convert_to_raw_boc(boc: &BagOfCells) -> Result<RawBagOfCells, TonCellError> {
    let (cells_by_hash, mut in_degree) = collect_cells(&boc.roots);

    let mut queue = VecDeque::new();
    for root in &boc.roots {
        let hash = root.cell_hash();
        if in_degree.get(&hash) == Some(&0) && !queue.contains(&hash) {
            queue.push_back(hash);
        }
    }

    let mut order: Vec<TonHash> = Vec::with_capacity(cells_by_hash.len());
    while let Some(hash) = queue.pop_front() {
        let cell = cell_by_hash(&cells_by_hash, &hash)?;
        for reference in cell.references() {
            let ref_hash = reference.cell_hash();
            let degree = in_degree.get_mut(&ref_hash).ok_or_else(|| {
                TonCellError::boc_serialization_error(format!(
                    "Couldn't find cell with hash {} while ordering",
                    hex::encode(ref_hash)
                ))
            })?;
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(ref_hash);
            }
        }
        order.push(hash);
    }

    if order.len() != cells_by_hash.len() {
        return Err(TonCellError::boc_serialization_error(format!(
            "Ordered {} cells out of {}",
            order.len(),
            cells_by_hash.len()
        )));
    }

    let index_by_hash: HashMap<TonHash, usize> = order
        .iter()
        .enumerate()
        .map(|(index, hash)| (*hash, index))
        .collect();

    let cells = order
        .iter()
        .map(|hash| {
            let cell = cell_by_hash(&cells_by_hash, hash)?;
            let references = cell
                .references()
                .iter()
                .map(|r| index_of(&index_by_hash, &r.cell_hash()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RawCell {
                data: cell.data().to_vec(),
                bit_len: cell.bit_len(),
                references,
            })
        })
        .collect::<Result<Vec<_>, TonCellError>>()?;

    let roots = boc
        .roots
        .iter()
        .map(|root| index_of(&index_by_hash, &root.cell_hash()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawBagOfCells { cells, roots })
}

/// Returns distinct cells by hash and the number of references to each.
fn collect_cells(roots: &[ArcCell]) -> (HashMap<TonHash, ArcCell>, HashMap<TonHash, usize>) {
    let mut cells_by_hash = HashMap::new();
    let mut in_degree = HashMap::new();
    let mut pending: Vec<ArcCell> = Vec::new();

    for root in roots {
        let hash = root.cell_hash();
        if !cells_by_hash.contains_key(&hash) {
            cells_by_hash.insert(hash, root.clone());
            in_degree.entry(hash).or_insert(0);
            pending.push(root.clone());
        }
    }

    while let Some(cell) = pending.pop() {
        for reference in cell.references() {
            let hash = reference.cell_hash();
            *in_degree.entry(hash).or_insert(0) += 1;
            if !cells_by_hash.contains_key(&hash) {
                cells_by_hash.insert(hash, reference.clone());
                pending.push(reference.clone());
            }
        }
    }

    (cells_by_hash, in_degree)
}

fn cell_by_hash<'a>(
    cells_by_hash: &'a HashMap<TonHash, ArcCell>,
    hash: &TonHash,
) -> Result<&'a ArcCell, TonCellError> {
    cells_by_hash.get(hash).ok_or_else(|| {
        TonCellError::boc_serialization_error(format!(
            "Couldn't find cell with hash {}",
            hex::encode(hash)
        ))
    })
}

fn index_of(index_by_hash: &HashMap<TonHash, usize>, hash: &TonHash) -> Result<usize, TonCellError> {
    index_by_hash.get(hash).copied().ok_or_else(|| {
        TonCellError::boc_serialization_error(format!(
            "Couldn't find index of cell with hash {}",
            hex::encode(hash)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellBuilder};

    fn leaf(tag: u8) -> Result<ArcCell, TonCellError> {
        Ok(CellBuilder::new().store_u8(8, tag)?.build()?.to_arc())
    }

    fn node(tag: u8, refs: &[ArcCell]) -> Result<ArcCell, TonCellError> {
        Ok(CellBuilder::new()
            .store_u8(8, tag)?
            .store_references(refs)?
            .build()?
            .to_arc())
    }

    #[test]
    fn tree_is_ordered_breadth_first() -> Result<(), TonCellError> {
        let c = leaf(3)?;
        let a = node(1, &[c])?;
        let b = leaf(2)?;
        let root = node(0, &[a, b])?;

        let raw = convert_to_raw_boc(&BagOfCells::new(&[root]))?;
        let tags: Vec<u8> = raw.cells.iter().map(|c| c.data[0]).collect();
        assert_eq!(tags, vec![0, 1, 2, 3]);
        assert_eq!(raw.cells[0].references, vec![1, 2]);
        assert_eq!(raw.cells[1].references, vec![3]);
        assert_eq!(raw.roots, vec![0]);
        Ok(())
    }

    #[test]
    fn shared_cell_is_emitted_after_all_parents() -> Result<(), TonCellError> {
        let shared = leaf(9)?;
        let deep = node(2, &[shared.clone()])?;
        let a = node(1, &[deep])?;
        let root = node(0, &[a, shared])?;

        let raw = convert_to_raw_boc(&BagOfCells::new(&[root]))?;
        let tags: Vec<u8> = raw.cells.iter().map(|c| c.data[0]).collect();
        assert_eq!(tags, vec![0, 1, 2, 9]);
        for (index, cell) in raw.cells.iter().enumerate() {
            assert!(cell.references.iter().all(|r| *r > index));
        }
        Ok(())
    }

    #[test]
    fn equal_cells_are_stored_once() -> Result<(), TonCellError> {
        let first = leaf(7)?;
        let second = leaf(7)?;
        let root = node(0, &[first.clone(), second, first])?;

        let raw = convert_to_raw_boc(&BagOfCells::new(&[root]))?;
        assert_eq!(raw.cells.len(), 2);
        assert_eq!(raw.cells[0].references, vec![1, 1, 1]);
        Ok(())
    }

    #[test]
    fn root_reachable_from_another_root() -> Result<(), TonCellError> {
        let child = leaf(1)?;
        let root = node(0, &[child.clone()])?;
        let raw = convert_to_raw_boc(&BagOfCells::new(&[root, child, Cell::default().to_arc()]))?;
        assert_eq!(raw.cells.len(), 3);
        assert_eq!(raw.roots, vec![0, 2, 1]);
        Ok(())
    }
}
