// simulation.rs - Generation loop for one rank and the launcher for a ring
//
// Each rank runs Idle -> {Exchanging -> Updating -> Committed} x N -> Done.
// Ranks are tokio tasks sharing nothing; all coordination goes through
// their `Communicator`.

use std::collections::HashMap;
use std::future::Future;

use tokio::task::{Id, JoinSet};
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::aggregate::{self, Aggregation, Discard, GridObserver};
use crate::config::SimConfig;
use crate::error::{ConfigError, ProtocolError, Result, SimError, Violation};
use crate::grid::{Cell, GlobalGrid, LocalBlock};
use crate::halo;
use crate::partition::{Partition, Rank};
use crate::rules;
use crate::transport::{Communicator, Fabric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Exchanging,
    Updating,
    Committed,
    Done,
}

impl Phase {
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Exchanging)
                | (Phase::Exchanging, Phase::Updating)
                | (Phase::Updating, Phase::Committed)
                | (Phase::Committed, Phase::Exchanging)
                | (Phase::Committed, Phase::Done)
        )
    }
}

/// What a rank hands back once its loop is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankOutcome {
    pub rank: Rank,
    pub slab: Vec<Cell>,
    pub frames_observed: usize,
}

/// One rank of the ring: its slab, its links and its place in the loop.
pub struct RankWorker<C> {
    comm: C,
    partition: Partition,
    block: LocalBlock,
    scratch: Vec<Cell>,
    phase: Phase,
    generation: u64,
}

impl<C: Communicator> RankWorker<C> {
    /// Takes this rank's rows out of `seed`.
    pub fn new(comm: C, partition: Partition, seed: &GlobalGrid) -> Self {
        let block = LocalBlock::from_slab(partition.dimension(), seed.slab(partition.rows()));
        Self {
            comm,
            partition,
            block,
            scratch: Vec::with_capacity(partition.slab_len()),
            phase: Phase::Idle,
            generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn advance(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_advance_to(next) {
            return Err(SimError::Protocol(ProtocolError {
                rank: self.partition.rank(),
                peer: self.partition.rank(),
                generation: self.generation,
                violation: Violation::Phase {
                    from: self.phase,
                    to: next,
                },
            }));
        }
        trace!(generation = self.generation, from = ?self.phase, to = ?next, "phase");
        self.phase = next;
        Ok(())
    }

    /// Runs exactly `iterations` generations. `observer` is only consulted on
    /// the coordinator.
    pub async fn run(
        mut self,
        iterations: u64,
        aggregation: Aggregation,
        mut observer: Option<&mut dyn GridObserver>,
    ) -> Result<RankOutcome> {
        let mut frames_observed = 0;
        if aggregation.gathers(0, iterations) {
            let grid = self.publish().await?;
            frames_observed += deliver(&mut observer, 0, grid);
        }

        for generation in 1..=iterations {
            self.generation = generation;

            self.advance(Phase::Exchanging)?;
            halo::exchange(&mut self.comm, &self.partition, &mut self.block, generation).await?;

            self.advance(Phase::Updating)?;
            rules::step_block(&self.block, &mut self.scratch);
            self.block.commit(&mut self.scratch);
            self.advance(Phase::Committed)?;

            if aggregation.gathers(generation, iterations) {
                let grid = self.publish().await?;
                frames_observed += deliver(&mut observer, generation, grid);
            }
            if self.partition.is_coordinator() {
                debug!(generation, "generation committed");
            }

            tokio::task::yield_now().await; // Let the other ranks move
        }

        self.advance(Phase::Done)?;
        Ok(RankOutcome {
            rank: self.partition.rank(),
            slab: self.block.into_owned(),
            frames_observed,
        })
    }

    async fn publish(&mut self) -> Result<Option<GlobalGrid>> {
        aggregate::gather(&mut self.comm, &self.partition, &self.block, self.generation).await
    }
}

fn deliver(
    observer: &mut Option<&mut dyn GridObserver>,
    generation: u64,
    grid: Option<GlobalGrid>,
) -> usize {
    match (grid, observer.as_mut()) {
        (Some(grid), Some(observer)) => {
            observer.observe(generation, &grid);
            1
        }
        _ => 0,
    }
}

/// The spawned ranks of a run, remembered by task id so a panic can be
/// pinned on its rank.
#[derive(Default)]
struct RankTasks {
    tasks: JoinSet<Result<RankOutcome>>,
    ranks: HashMap<Id, Rank>,
}

impl RankTasks {
    fn spawn<F>(&mut self, rank: Rank, task: F)
    where
        F: Future<Output = Result<RankOutcome>> + Send + 'static,
    {
        let handle = self.tasks.spawn(task);
        self.ranks.insert(handle.id(), rank);
    }

    fn abort_all(&mut self) {
        self.tasks.abort_all();
    }

    /// Next finished rank. Cancelled ranks are skipped; a panic becomes
    /// `RankPanicked`.
    async fn join_next(&mut self) -> Option<Result<RankOutcome>> {
        loop {
            match self.tasks.join_next_with_id().await? {
                Ok((id, outcome)) => {
                    self.ranks.remove(&id);
                    return Some(outcome);
                }
                Err(join_error) => {
                    let rank = self.ranks.remove(&join_error.id());
                    if join_error.is_cancelled() {
                        continue;
                    }
                    match rank {
                        Some(rank) => {
                            warn!(rank, error = %join_error, "rank task panicked");
                            return Some(Err(SimError::RankPanicked { rank }));
                        }
                        // Its missing slab is reported once the ring is drained.
                        None => warn!(error = %join_error, "unknown task failed"),
                    }
                }
            }
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// State after the last generation, assembled from every rank's slab.
    pub final_grid: GlobalGrid,
    pub generations: u64,
    pub frames_observed: usize,
}

/// Launches a ring of ranks over an in-process fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
    processes: usize,
    iterations: u64,
    aggregation: Aggregation,
}

impl Simulation {
    pub fn new(processes: usize, iterations: u64) -> Self {
        Self {
            processes,
            iterations,
            aggregation: Aggregation::default(),
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.processes, config.iterations).with_aggregation(config.aggregation)
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn processes(&self) -> usize {
        self.processes
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Runs without an observer.
    pub async fn run_unobserved(&self, seed: &GlobalGrid) -> Result<RunSummary> {
        self.run(seed, &mut Discard).await
    }

    /// Runs the ring to completion. The coordinator runs on the calling task
    /// so it can borrow `observer`; every other rank is spawned.
    pub async fn run(
        &self,
        seed: &GlobalGrid,
        observer: &mut dyn GridObserver,
    ) -> Result<RunSummary> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations.into());
        }
        let dimension = seed.dimension();
        let partitions = Partition::all(dimension, self.processes)?;
        info!(
            dimension,
            processes = self.processes,
            iterations = self.iterations,
            aggregation = ?self.aggregation,
            "starting ring"
        );

        let mut endpoints = Fabric::new(self.processes).into_iter();
        let Some(coordinator_link) = endpoints.next() else {
            return Err(ConfigError::ZeroProcesses.into());
        };

        let mut ranks = RankTasks::default();
        for (comm, partition) in endpoints.zip(partitions.iter().skip(1).copied()) {
            let worker = RankWorker::new(comm, partition, seed);
            let (iterations, aggregation) = (self.iterations, self.aggregation);
            let span = info_span!("rank", rank = partition.rank());
            let task = worker.run(iterations, aggregation, None).instrument(span);
            ranks.spawn(partition.rank(), task);
        }

        let coordinator = RankWorker::new(coordinator_link, partitions[0], seed);
        let root = coordinator
            .run(self.iterations, self.aggregation, Some(observer))
            .instrument(info_span!("rank", rank = 0))
            .await;

        let mut slabs: Vec<Option<Vec<Cell>>> = vec![None; self.processes];
        let mut frames_observed = 0;
        let mut failure: Option<SimError> = None;
        match root {
            Ok(outcome) => {
                frames_observed = outcome.frames_observed;
                slabs[outcome.rank] = Some(outcome.slab);
            }
            Err(error) => {
                ranks.abort_all();
                failure = Some(error);
            }
        }

        while let Some(joined) = ranks.join_next().await {
            let error = match joined {
                Ok(outcome) => {
                    slabs[outcome.rank] = Some(outcome.slab);
                    continue;
                }
                Err(error) => error,
            };
            ranks.abort_all();
            failure = Some(match failure {
                Some(first) if !first.is_disconnect() || error.is_disconnect() => first,
                _ => error,
            });
        }

        if let Some(error) = failure {
            warn!(%error, "ring aborted");
            return Err(error);
        }

        let mut ordered = Vec::with_capacity(self.processes);
        for (rank, slab) in slabs.into_iter().enumerate() {
            ordered.push(slab.ok_or_else(|| SimError::RankFailed {
                rank,
                reason: "finished without a slab".to_string(),
            })?);
        }
        let final_grid = GlobalGrid::concat_slabs(dimension, &ordered);
        info!(live = final_grid.live_count(), "ring finished");

        Ok(RunSummary {
            final_grid,
            generations: self.iterations,
            frames_observed,
        })
    }
}
