//! Distributed Conway's Game of Life on a ring of cooperating ranks.
//!
//! A D x D toroidal grid is cut into equal row slabs, one per rank. Each
//! generation every rank swaps boundary rows with its two ring neighbours
//! ([`halo`]), applies B3/S23 to its slab ([`rules`]) and commits the result
//! ([`simulation`]). The coordinator can optionally reassemble the global
//! grid for an observer ([`aggregate`]).
//!
//! Ranks are tokio tasks connected by an in-process message fabric
//! ([`transport`]); they share no memory.
//!
//! ```no_run
//! use conway_ring::{patterns, Simulation, Trajectory};
//!
//! # async fn demo() -> conway_ring::Result<()> {
//! let glider = patterns::find("glider").unwrap();
//! let seed = patterns::apply_pattern(16, glider, (0, 0));
//! let mut trajectory = Trajectory::new();
//! let summary = Simulation::new(4, 4).run(&seed, &mut trajectory).await?;
//! assert_eq!(summary.final_grid, seed.translated(1, 1));
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod codec;
pub mod config;
pub mod error;
pub mod grid;
pub mod halo;
pub mod partition;
pub mod patterns;
pub mod render;
pub mod rules;
pub mod simulation;
pub mod transport;

pub use aggregate::{Aggregation, Discard, GridObserver, Trajectory};
pub use config::SimConfig;
pub use error::{ConfigError, ProtocolError, Result, SeedError, SimError, Violation};
pub use grid::{Cell, GlobalGrid, LocalBlock};
pub use partition::{COORDINATOR, Partition, Rank};
pub use render::{TextReporter, format_grid};
pub use simulation::{Phase, RankWorker, RunSummary, Simulation};
pub use transport::{Communicator, Endpoint, Envelope, Fabric, Tag};
