// error.rs - Failure taxonomy for the ring simulator

use thiserror::Error;

use crate::partition::Rank;
use crate::simulation::Phase;
use crate::transport::Tag;

/// Result alias used across the crate.
pub type Result<T, E = SimError> = std::result::Result<T, E>;

/// Top-level error returned by the engine and its collaborators.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid parameters, detected before any rank is spawned.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A received message broke the exchange contract.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The seed matrix could not be read.
    #[error("seed error: {0}")]
    Seed(#[from] SeedError),

    /// A neighbour or the coordinator went away mid-run.
    #[error("rank {rank} lost its link to rank {peer} during generation {generation}")]
    PeerDisconnected {
        rank: Rank,
        peer: Rank,
        generation: u64,
    },

    /// A rank finished without handing back its slab.
    #[error("rank {rank} failed: {reason}")]
    RankFailed { rank: Rank, reason: String },

    #[error("rank {rank} panicked")]
    RankPanicked { rank: Rank },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),
}

impl SimError {
    /// Disconnects are usually a symptom of another rank failing first.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, SimError::PeerDisconnected { .. })
    }
}

/// Parameter errors. All of them are fatal and abort the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid dimension must be greater than zero")]
    ZeroDimension,

    #[error("process count must be greater than zero")]
    ZeroProcesses,

    #[error("iteration count must be greater than zero")]
    ZeroIterations,

    #[error("dimension {dimension} is not divisible by process count {processes}")]
    IndivisibleDimension { dimension: usize, processes: usize },

    #[error("rank {rank} is outside a ring of {processes} processes")]
    RankOutOfRange { rank: Rank, processes: usize },

    #[error("seed is {found}x{found} but the configured dimension is {expected}")]
    SeedDimension { expected: usize, found: usize },

    #[error("unknown pattern `{0}`")]
    UnknownPattern(String),
}

/// A message that does not match what the receiving rank expected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("rank {rank} receiving from rank {peer} in generation {generation}: {violation}")]
pub struct ProtocolError {
    pub rank: Rank,
    pub peer: Rank,
    pub generation: u64,
    pub violation: Violation,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("expected {expected} cells, received {found}")]
    Length { expected: usize, found: usize },

    #[error("byte {value:#04x} at index {index} is not a cell value")]
    Encoding { index: usize, value: u8 },

    #[error("expected generation {expected}, received generation {found}")]
    Generation { expected: u64, found: u64 },

    #[error("expected a message from rank {expected}, envelope names rank {found}")]
    Source { expected: Rank, found: Rank },

    #[error("expected a {expected:?} message, received {found:?}")]
    Tag { expected: Tag, found: Tag },

    #[error("illegal phase transition {from:?} -> {to:?}")]
    Phase { from: Phase, to: Phase },
}

/// Problems reading a seed matrix.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("seed contains no rows")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("seed has {rows} rows of {cols} cells but must be square")]
    NotSquare { rows: usize, cols: usize },

    #[error("line {line}, column {column}: `{token}` is not 0 or 1")]
    InvalidCell {
        line: usize,
        column: usize,
        token: String,
    },
}
