//! Property-based tests for the update rule and the ring decomposition.
//!
//! The single-process `step_global` is the reference every distributed run
//! must reproduce bit for bit.

use conway_ring::rules::{live_neighbors, next_state, step_global};
use conway_ring::{Aggregation, GlobalGrid, Simulation, Trajectory};
use proptest::prelude::*;

/// A square grid together with a process count that divides it.
fn grid_and_processes() -> impl Strategy<Value = (GlobalGrid, usize)> {
    (1usize..=4, 1usize..=4).prop_flat_map(|(rows_per_rank, processes)| {
        let dimension = (rows_per_rank * processes).max(3);
        let dimension = dimension + (processes - dimension % processes) % processes;
        proptest::collection::vec(any::<bool>(), dimension * dimension).prop_map(move |cells| {
            let rows = cells.chunks(dimension).map(<[bool]>::to_vec).collect();
            (GlobalGrid::from_rows(rows).unwrap(), processes)
        })
    })
}

fn run_ring(
    seed: &GlobalGrid,
    processes: usize,
    iterations: u64,
    aggregation: Aggregation,
) -> (Vec<GlobalGrid>, GlobalGrid) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut trajectory = Trajectory::new();
    let summary = runtime
        .block_on(
            Simulation::new(processes, iterations)
                .with_aggregation(aggregation)
                .run(seed, &mut trajectory),
        )
        .unwrap();
    (trajectory.grids().cloned().collect(), summary.final_grid)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// B3/S23 expressed directly in terms of the neighbour count.
    #[test]
    fn prop_rule_matches_neighbour_count(
        upper in proptest::collection::vec(any::<bool>(), 5),
        this in proptest::collection::vec(any::<bool>(), 5),
        lower in proptest::collection::vec(any::<bool>(), 5),
        k in 0usize..5,
    ) {
        let count = live_neighbors(&upper, &this, &lower, k);
        let expected = if this[k] { count == 2 || count == 3 } else { count == 3 };
        prop_assert_eq!(next_state(&upper, &this, &lower, k, this[k]), expected);
    }

    /// Every generation of a distributed run equals the reference step.
    #[test]
    fn prop_ring_matches_reference(
        (seed, processes) in grid_and_processes(),
        iterations in 1u64..6,
    ) {
        let (frames, last) = run_ring(&seed, processes, iterations, Aggregation::EveryGeneration);

        let mut expected = seed.clone();
        prop_assert_eq!(&frames[0], &expected);
        for frame in &frames[1..] {
            expected = step_global(&expected);
            prop_assert_eq!(frame, &expected);
        }
        prop_assert_eq!(last, expected);
    }

    /// Turning aggregation off leaves the final state untouched.
    #[test]
    fn prop_aggregation_is_observational(
        (seed, processes) in grid_and_processes(),
        iterations in 1u64..6,
    ) {
        let (_, with) = run_ring(&seed, processes, iterations, Aggregation::EveryGeneration);
        let (frames, without) = run_ring(&seed, processes, iterations, Aggregation::Off);
        prop_assert!(frames.is_empty());
        prop_assert_eq!(with, without);
    }
}
