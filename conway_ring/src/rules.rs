// rules.rs - B3/S23 update rule over a toroidal 3x3 neighbourhood

use crate::grid::{Cell, GlobalGrid, LocalBlock};

/// Live neighbours of column `k`, wrapping horizontally.
pub fn live_neighbors(upper: &[Cell], this: &[Cell], lower: &[Cell], k: usize) -> u8 {
    let d = this.len();
    let left = (k + d - 1) % d;
    let right = (k + 1) % d;
    let neighbors = [
        upper[left], upper[k], upper[right],
        this[left],            this[right],
        lower[left], lower[k], lower[right],
    ];
    neighbors.iter().filter(|&&alive| alive).count() as u8
}

pub fn next_state(upper: &[Cell], this: &[Cell], lower: &[Cell], k: usize, value: Cell) -> Cell {
    match (value, live_neighbors(upper, this, lower, k)) {
        (true, 2) | (true, 3) => true, // Survival
        (false, 3)            => true, // Birth
        _                     => false, // Death or stays dead
    }
}

/// Computes every owned cell of `block` into `scratch`.
///
/// Reads only from `block`, so no cell sees next-generation values.
pub fn step_block(block: &LocalBlock, scratch: &mut Vec<Cell>) {
    scratch.clear();
    for j in 0..block.num_rows() {
        let upper = block.padded_row(j);
        let this = block.padded_row(j + 1);
        let lower = block.padded_row(j + 2);
        for (k, &value) in this.iter().enumerate() {
            scratch.push(next_state(upper, this, lower, k, value));
        }
    }
}

/// Single-process reference step over the whole torus.
pub fn step_global(grid: &GlobalGrid) -> GlobalGrid {
    let d = grid.dimension();
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(d);
    for r in 0..d {
        let upper = grid.row((r + d - 1) % d);
        let this = grid.row(r);
        let lower = grid.row((r + 1) % d);
        rows.push(
            this.iter()
                .enumerate()
                .map(|(k, &value)| next_state(upper, this, lower, k, value))
                .collect(),
        );
    }
    GlobalGrid::concat_slabs(d, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEAD: [Cell; 5] = [false; 5];

    #[test]
    fn counts_wrap_across_the_row_edge() {
        let this = [true, false, false, false, true];
        assert_eq!(live_neighbors(&DEAD, &this, &DEAD, 0), 1);
        assert_eq!(live_neighbors(&DEAD, &this, &DEAD, 4), 1);
        let upper = [false, false, false, false, true];
        assert_eq!(live_neighbors(&upper, &this, &DEAD, 0), 2);
    }

    #[test]
    fn birth_needs_exactly_three() {
        let upper = [true, true, true, false, false];
        assert!(next_state(&upper, &DEAD, &DEAD, 1, false));
        let upper = [true, true, false, false, false];
        assert!(!next_state(&upper, &DEAD, &DEAD, 1, false));
        let lower = [true, true, true, true, false];
        assert!(!next_state(&upper, &DEAD, &lower, 1, false));
    }

    #[test]
    fn survival_needs_two_or_three() {
        let this = [true, true, true, false, false];
        assert!(next_state(&DEAD, &this, &DEAD, 1, true));
        let upper = [false, true, false, false, false];
        assert!(next_state(&upper, &this, &DEAD, 1, true));
        let lower = [true, false, false, false, false];
        assert!(!next_state(&upper, &this, &lower, 1, true));
        assert!(!next_state(&DEAD, &[false, true, false, false, false], &DEAD, 1, true));
    }

    #[test]
    fn step_block_reads_halos_but_never_writes_them() {
        // Vertical blinker whose ends live in the halos.
        let mut block = LocalBlock::from_slab(5, &[false, false, true, false, false]);
        block.install_upper_halo(&[false, false, true, false, false]);
        block.install_lower_halo(&[false, false, true, false, false]);

        let mut scratch = Vec::new();
        step_block(&block, &mut scratch);

        assert_eq!(scratch, vec![false, true, true, true, false]);
        assert_eq!(block.upper_halo(), &[false, false, true, false, false]);
    }

    #[test]
    fn global_blinker_oscillates() {
        let grid = GlobalGrid::from_live_cells(5, &[(2, 1), (2, 2), (2, 3)]);
        let once = step_global(&grid);
        assert_eq!(once.live_cells(), vec![(1, 2), (2, 2), (3, 2)]);
        assert_eq!(step_global(&once), grid);
    }
}
