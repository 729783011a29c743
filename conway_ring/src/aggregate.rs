// aggregate.rs - Collective gather of the global grid on the coordinator
//
// Aggregation is observational only: skipping it changes what an observer
// sees, never the trajectory itself.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{self, Expected};
use crate::error::Result;
use crate::grid::{GlobalGrid, LocalBlock};
use crate::halo::{receive, send};
use crate::partition::{COORDINATOR, Partition};
use crate::transport::{Communicator, Envelope, Tag};

/// When the coordinator assembles the global grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregation {
    /// Never; only the launcher's final assembly is available.
    Off,
    /// The seed, then after every generation.
    #[default]
    EveryGeneration,
    /// The seed and the state after the last generation.
    FinalOnly,
}

impl Aggregation {
    /// Whether a gather happens once `generation` has been committed
    /// (generation 0 is the seed).
    pub fn gathers(self, generation: u64, iterations: u64) -> bool {
        match self {
            Aggregation::Off => false,
            Aggregation::EveryGeneration => true,
            Aggregation::FinalOnly => generation == 0 || generation == iterations,
        }
    }
}

/// Receives assembled grids on the coordinator.
pub trait GridObserver: Send {
    fn observe(&mut self, generation: u64, grid: &GlobalGrid);
}

impl<F> GridObserver for F
where
    F: FnMut(u64, &GlobalGrid) + Send,
{
    fn observe(&mut self, generation: u64, grid: &GlobalGrid) {
        self(generation, grid)
    }
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl GridObserver for Discard {
    fn observe(&mut self, _generation: u64, _grid: &GlobalGrid) {}
}

/// Records every observed frame.
#[derive(Debug, Default, Clone)]
pub struct Trajectory {
    frames: Vec<(u64, GlobalGrid)>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[(u64, GlobalGrid)] {
        &self.frames
    }

    pub fn grids(&self) -> impl Iterator<Item = &GlobalGrid> {
        self.frames.iter().map(|(_, grid)| grid)
    }

    pub fn last(&self) -> Option<&GlobalGrid> {
        self.frames.last().map(|(_, grid)| grid)
    }

    pub fn into_frames(self) -> Vec<(u64, GlobalGrid)> {
        self.frames
    }
}

impl GridObserver for Trajectory {
    fn observe(&mut self, generation: u64, grid: &GlobalGrid) {
        self.frames.push((generation, grid.clone()));
    }
}

/// Collective gather. Every rank contributes its owned slab; the coordinator
/// takes them in ascending rank order, then releases the others. Nobody
/// returns before the coordinator holds every slab for `generation`.
///
/// Returns the assembled grid on the coordinator and `None` elsewhere.
pub async fn gather<C: Communicator>(
    comm: &mut C,
    partition: &Partition,
    block: &LocalBlock,
    generation: u64,
) -> Result<Option<GlobalGrid>> {
    let rank = partition.rank();
    let contribution = Envelope::new(rank, Tag::Gather, generation, codec::encode(block.owned()));
    send(comm, COORDINATOR, contribution)?;

    if !partition.is_coordinator() {
        receive(comm, Expected {
            source: COORDINATOR,
            tag: Tag::Release,
            generation,
            cells: 0,
        })
        .await?;
        return Ok(None);
    }

    let mut slabs = Vec::with_capacity(partition.processes());
    for source in 0..partition.processes() {
        let slab = receive(comm, Expected {
            source,
            tag: Tag::Gather,
            generation,
            cells: partition.slab_len(),
        })
        .await?;
        slabs.push(slab);
    }
    for dest in (0..partition.processes()).filter(|&dest| dest != COORDINATOR) {
        send(comm, dest, Envelope::new(COORDINATOR, Tag::Release, generation, Vec::new()))?;
    }

    let grid = GlobalGrid::concat_slabs(partition.dimension(), &slabs);
    debug!(generation, live = grid.live_count(), "global grid assembled");
    Ok(Some(grid))
}
