// patterns.rs - Seed patterns and seed file parsing

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::SeedError;
use crate::grid::GlobalGrid;

/// Live cells relative to the pattern's top-left corner.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Glider",
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        name: "Toad",
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(0, 2), (1, 1), (1, 2), (2, 0), (2, 1)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top section
            (0, 2), (0, 3), (0, 4), (0, 8), (0, 9), (0, 10),
            (2, 0), (2, 5), (2, 7), (2, 12),
            (3, 0), (3, 5), (3, 7), (3, 12),
            (4, 0), (4, 5), (4, 7), (4, 12),
            (5, 2), (5, 3), (5, 4), (5, 8), (5, 9), (5, 10),
            // Bottom section (mirrored)
            (7, 2), (7, 3), (7, 4), (7, 8), (7, 9), (7, 10),
            (8, 0), (8, 5), (8, 7), (8, 12),
            (9, 0), (9, 5), (9, 7), (9, 12),
            (10, 0), (10, 5), (10, 7), (10, 12),
            (12, 2), (12, 3), (12, 4), (12, 8), (12, 9), (12, 10),
        ],
    },
];

/// Looks a pattern up by name, ignoring case and `-`/`_`.
pub fn find(name: &str) -> Option<&'static Pattern> {
    let wanted = normalize(name);
    PATTERNS.iter().find(|pattern| normalize(pattern.name) == wanted)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Places `pattern` on an empty grid with its corner at `origin`, wrapping
/// around the torus.
pub fn apply_pattern(dimension: usize, pattern: &Pattern, origin: (usize, usize)) -> GlobalGrid {
    let (row, col) = (origin.0 % dimension, origin.1 % dimension);
    let cells: Vec<_> = pattern
        .cells
        .iter()
        .map(|&(r, c)| (row + r, col + c))
        .collect();
    GlobalGrid::from_live_cells(dimension, &cells)
}

/// Deterministic pseudo-random fill, roughly a third of the cells alive.
pub fn apply_random_pattern(dimension: usize, seed_value: u64) -> GlobalGrid {
    let mut grid = GlobalGrid::new(dimension);

    let mut hasher = DefaultHasher::new();
    seed_value.hash(&mut hasher);
    let mut seed = hasher.finish();

    for row in 0..dimension {
        for col in 0..dimension {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            grid.set(row, col, (seed >> 16) % 3 == 0);
        }
    }
    grid
}

/// Reads D lines of D comma-separated 0/1 values; blank lines are skipped.
/// This is also the format the text reporter writes.
pub fn parse_seed(text: &str) -> Result<GlobalGrid, SeedError> {
    let mut rows = Vec::new();
    for (line_index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split(',')
            .enumerate()
            .map(|(column, token)| match token.trim() {
                "0" => Ok(false),
                "1" => Ok(true),
                other => Err(SeedError::InvalidCell {
                    line: line_index + 1,
                    column: column + 1,
                    token: other.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    GlobalGrid::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_forgiving() {
        assert_eq!(find("glider").map(|p| p.name), Some("Glider"));
        assert_eq!(find("r_pentomino").map(|p| p.name), Some("R-pentomino"));
        assert_eq!(find("RPENTOMINO").map(|p| p.name), Some("R-pentomino"));
        assert!(find("spaceship").is_none());
    }

    #[test]
    fn patterns_wrap_at_the_origin() {
        let glider = find("glider").unwrap();
        let grid = apply_pattern(4, glider, (3, 3));
        assert_eq!(grid.live_count(), 5);
        assert!(grid.get(3, 0)); // (0, 1) shifted by (3, 3)
        assert!(grid.get(1, 1)); // (2, 2) shifted by (3, 3)
    }

    #[test]
    fn far_away_origin_wraps_without_overflow() {
        let glider = find("glider").unwrap();
        let far = apply_pattern(8, glider, (usize::MAX, usize::MAX));
        // usize::MAX is 7 modulo 8.
        assert_eq!(far, apply_pattern(8, glider, (7, 7)));
        assert_eq!(far.live_count(), 5);
    }

    #[test]
    fn random_fill_is_deterministic() {
        let a = apply_random_pattern(12, 7);
        assert_eq!(a, apply_random_pattern(12, 7));
        assert_ne!(a, apply_random_pattern(12, 8));
        assert!(a.live_count() > 0 && a.live_count() < 144);
    }

    #[test]
    fn parses_the_report_format() {
        let grid = parse_seed("0, 1, 0\n0, 0, 1\n\n1, 1, 1\n").unwrap();
        assert_eq!(grid.live_cells(), vec![(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert_eq!(
            parse_seed("0,1\n1,x\n"),
            Err(SeedError::InvalidCell {
                line: 2,
                column: 2,
                token: "x".to_string()
            })
        );
        assert_eq!(
            parse_seed("0,1\n1\n"),
            Err(SeedError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }
}
