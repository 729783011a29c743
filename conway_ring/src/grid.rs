// grid.rs - Grid types for the distributed Game of Life

use std::ops::Range;

use crate::error::SeedError;

/// A single automaton cell: `true` is alive.
pub type Cell = bool;

/// The canonical D x D toroidal grid, row-major.
///
/// Only the coordinator (and the launcher, after a run) ever holds one of
/// these; ranks work on [`LocalBlock`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalGrid {
    dimension: usize,
    cells: Vec<Cell>,
}

impl GlobalGrid {
    /// An all-dead grid.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            cells: vec![false; dimension * dimension],
        }
    }

    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, SeedError> {
        let Some(first) = rows.first() else {
            return Err(SeedError::Empty);
        };
        let cols = first.len();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != cols {
                return Err(SeedError::Ragged {
                    row,
                    expected: cols,
                    found: cells.len(),
                });
            }
        }
        if rows.len() != cols {
            return Err(SeedError::NotSquare {
                rows: rows.len(),
                cols,
            });
        }
        Ok(Self {
            dimension: cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Live cells given as (row, col); coordinates wrap around the torus.
    pub fn from_live_cells(dimension: usize, live: &[(usize, usize)]) -> Self {
        let mut grid = Self::new(dimension);
        for &(row, col) in live {
            grid.set(row % dimension, col % dimension, true);
        }
        grid
    }

    /// Concatenates per-rank slabs in ascending rank order.
    pub fn concat_slabs<I, S>(dimension: usize, slabs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[Cell]>,
    {
        let mut cells = Vec::with_capacity(dimension * dimension);
        for slab in slabs {
            cells.extend_from_slice(slab.as_ref());
        }
        debug_assert_eq!(cells.len(), dimension * dimension);
        Self { dimension, cells }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.dimension + col]
    }

    pub fn set(&mut self, row: usize, col: usize, alive: Cell) {
        self.cells[row * self.dimension + col] = alive;
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        let start = row * self.dimension;
        &self.cells[start..start + self.dimension]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.dimension.max(1))
    }

    /// The flattened cells of a contiguous run of rows.
    pub fn slab(&self, rows: Range<usize>) -> &[Cell] {
        &self.cells[rows.start * self.dimension..rows.end * self.dimension]
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(index, _)| (index / self.dimension, index % self.dimension))
            .collect()
    }

    /// The same pattern shifted by (rows, cols) on the torus.
    pub fn translated(&self, rows: usize, cols: usize) -> Self {
        let mut shifted = Self::new(self.dimension);
        for (row, col) in self.live_cells() {
            shifted.set(
                (row + rows) % self.dimension,
                (col + cols) % self.dimension,
                true,
            );
        }
        shifted
    }
}

/// One rank's slab plus a halo row above and below, in a single
/// (num_rows + 2) x D buffer.
///
/// Padded row 0 is the upper halo, rows 1..=num_rows are owned, row
/// num_rows + 1 is the lower halo. Halos are only ever written by
/// `install_*_halo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBlock {
    dimension: usize,
    num_rows: usize,
    cells: Vec<Cell>,
}

impl LocalBlock {
    pub fn from_slab(dimension: usize, slab: &[Cell]) -> Self {
        debug_assert!(dimension > 0 && slab.len() % dimension == 0);
        let mut cells = Vec::with_capacity(slab.len() + 2 * dimension);
        cells.resize(dimension, false);
        cells.extend_from_slice(slab);
        cells.resize(slab.len() + 2 * dimension, false);
        Self {
            dimension,
            num_rows: slab.len() / dimension,
            cells,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn upper_halo(&self) -> &[Cell] {
        self.padded_row(0)
    }

    pub fn lower_halo(&self) -> &[Cell] {
        self.padded_row(self.num_rows + 1)
    }

    /// Owned row `j`, 0-based within the slab.
    pub fn owned_row(&self, j: usize) -> &[Cell] {
        self.padded_row(j + 1)
    }

    pub fn first_owned_row(&self) -> &[Cell] {
        self.owned_row(0)
    }

    pub fn last_owned_row(&self) -> &[Cell] {
        self.owned_row(self.num_rows - 1)
    }

    /// Row `i` of the padded block, halos included.
    pub fn padded_row(&self, i: usize) -> &[Cell] {
        &self.cells[self.padded_range(i..i + 1)]
    }

    /// The whole padded buffer, upper halo first.
    pub fn padded(&self) -> &[Cell] {
        &self.cells
    }

    pub fn owned(&self) -> &[Cell] {
        &self.cells[self.owned_range()]
    }

    pub fn install_upper_halo(&mut self, row: &[Cell]) {
        let range = self.padded_range(0..1);
        self.cells[range].copy_from_slice(row);
    }

    pub fn install_lower_halo(&mut self, row: &[Cell]) {
        let range = self.padded_range(self.num_rows + 1..self.num_rows + 2);
        self.cells[range].copy_from_slice(row);
    }

    /// Replaces the owned rows with `next` in one ranged swap; `next` gets
    /// the old generation back and can be reused as scratch.
    pub fn commit(&mut self, next: &mut [Cell]) {
        let range = self.owned_range();
        self.cells[range].swap_with_slice(next);
    }

    pub fn into_owned(self) -> Vec<Cell> {
        self.owned().to_vec()
    }

    fn owned_range(&self) -> Range<usize> {
        self.padded_range(1..self.num_rows + 1)
    }

    fn padded_range(&self, rows: Range<usize>) -> Range<usize> {
        rows.start * self.dimension..rows.end * self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_and_rectangular_input() {
        assert_eq!(GlobalGrid::from_rows(vec![]), Err(SeedError::Empty));
        assert_eq!(
            GlobalGrid::from_rows(vec![vec![true, false], vec![true]]),
            Err(SeedError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            GlobalGrid::from_rows(vec![vec![true, false, false]]),
            Err(SeedError::NotSquare { rows: 1, cols: 3 })
        );
    }

    #[test]
    fn live_cells_wrap_onto_the_torus() {
        let grid = GlobalGrid::from_live_cells(4, &[(5, 1), (0, 7)]);
        assert!(grid.get(1, 1));
        assert!(grid.get(0, 3));
        assert_eq!(grid.live_count(), 2);
    }

    #[test]
    fn translation_wraps() {
        let grid = GlobalGrid::from_live_cells(4, &[(3, 3)]);
        assert_eq!(grid.translated(1, 1).live_cells(), vec![(0, 0)]);
    }

    #[test]
    fn slabs_concatenate_in_order() {
        let grid = GlobalGrid::from_live_cells(4, &[(0, 0), (1, 1), (2, 2), (3, 3)]);
        let rebuilt = GlobalGrid::concat_slabs(4, [grid.slab(0..2), grid.slab(2..4)]);
        assert_eq!(rebuilt, grid);
    }

    #[test]
    fn block_accessors_hide_halo_offsets() {
        let grid = GlobalGrid::from_live_cells(3, &[(0, 0), (2, 2)]);
        let mut block = LocalBlock::from_slab(3, grid.slab(0..3));
        block.install_upper_halo(&[true, true, false]);
        block.install_lower_halo(&[false, true, true]);

        assert_eq!(block.num_rows(), 3);
        assert_eq!(block.padded_row(0), &[true, true, false]);
        assert_eq!(block.padded_row(1), block.first_owned_row());
        assert_eq!(block.padded_row(3), block.last_owned_row());
        assert_eq!(block.padded_row(4), &[false, true, true]);
        assert_eq!(block.first_owned_row(), &[true, false, false]);
        assert_eq!(block.last_owned_row(), &[false, false, true]);
    }

    #[test]
    fn commit_swaps_whole_slab() {
        let mut block = LocalBlock::from_slab(2, &[true, true, false, false]);
        let mut next = vec![false, true, true, false];
        block.commit(&mut next);
        assert_eq!(block.owned(), &[false, true, true, false]);
        assert_eq!(next, vec![true, true, false, false]);
    }

    #[test]
    fn block_is_one_padded_buffer() {
        let mut block = LocalBlock::from_slab(2, &[true, false, false, true]);
        block.install_upper_halo(&[true, true]);
        block.install_lower_halo(&[false, true]);

        assert_eq!(block.padded().len(), (block.num_rows() + 2) * block.dimension());
        assert_eq!(block.padded(), &[true, true, true, false, false, true, false, true]);

        let mut next = vec![false, false, true, true];
        block.commit(&mut next);
        assert_eq!(block.padded(), &[true, true, false, false, true, true, false, true]);
        assert_eq!(block.into_owned(), vec![false, false, true, true]);
    }
}
