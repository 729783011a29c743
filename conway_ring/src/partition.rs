// partition.rs - Row-slab decomposition of the grid over a ring of ranks

use std::ops::Range;

use crate::error::ConfigError;

/// Identity of one process in the ring, 0..P.
pub type Rank = usize;

/// The rank that assembles the global grid.
pub const COORDINATOR: Rank = 0;

/// Which rows one rank owns and who its ring neighbours are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    dimension: usize,
    processes: usize,
    rank: Rank,
    num_rows: usize,
}

impl Partition {
    pub fn new(dimension: usize, processes: usize, rank: Rank) -> Result<Self, ConfigError> {
        if dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if processes == 0 {
            return Err(ConfigError::ZeroProcesses);
        }
        if dimension % processes != 0 {
            return Err(ConfigError::IndivisibleDimension {
                dimension,
                processes,
            });
        }
        if rank >= processes {
            return Err(ConfigError::RankOutOfRange { rank, processes });
        }
        Ok(Self {
            dimension,
            processes,
            rank,
            num_rows: dimension / processes,
        })
    }

    /// Every rank's partition, in rank order.
    pub fn all(dimension: usize, processes: usize) -> Result<Vec<Self>, ConfigError> {
        (0..processes.max(1))
            .map(|rank| Self::new(dimension, processes, rank))
            .collect()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn processes(&self) -> usize {
        self.processes
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Index of this slab's first cell in the flattened global grid.
    pub fn offset(&self) -> usize {
        self.rank * self.num_rows * self.dimension
    }

    pub fn first_row(&self) -> usize {
        self.rank * self.num_rows
    }

    pub fn rows(&self) -> Range<usize> {
        self.first_row()..self.first_row() + self.num_rows
    }

    pub fn slab_len(&self) -> usize {
        self.num_rows * self.dimension
    }

    pub fn next(&self) -> Rank {
        (self.rank + 1) % self.processes
    }

    pub fn prev(&self) -> Rank {
        (self.rank + self.processes - 1) % self.processes
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }
}
