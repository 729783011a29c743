// codec.rs - Wire encoding of rows and slabs
//
// One byte per cell, 0 or 1. Anything else on the wire is a protocol error.

use crate::error::Violation;
use crate::grid::Cell;
use crate::partition::Rank;
use crate::transport::{Envelope, Tag};

pub fn encode(cells: &[Cell]) -> Vec<u8> {
    cells.iter().map(|&alive| u8::from(alive)).collect()
}

pub fn decode(bytes: &[u8], expected: usize) -> Result<Vec<Cell>, Violation> {
    if bytes.len() != expected {
        return Err(Violation::Length {
            expected,
            found: bytes.len(),
        });
    }
    bytes
        .iter()
        .enumerate()
        .map(|(index, &value)| match value {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(Violation::Encoding { index, value }),
        })
        .collect()
}

/// What a receiver expects to find in the next envelope.
#[derive(Debug, Clone, Copy)]
pub struct Expected {
    pub source: Rank,
    pub tag: Tag,
    pub generation: u64,
    pub cells: usize,
}

/// Checks the envelope header against `expected` and decodes its payload.
pub fn open(envelope: &Envelope, expected: Expected) -> Result<Vec<Cell>, Violation> {
    if envelope.source != expected.source {
        return Err(Violation::Source {
            expected: expected.source,
            found: envelope.source,
        });
    }
    if envelope.tag != expected.tag {
        return Err(Violation::Tag {
            expected: expected.tag,
            found: envelope.tag,
        });
    }
    if envelope.generation != expected.generation {
        return Err(Violation::Generation {
            expected: expected.generation,
            found: envelope.generation,
        });
    }
    decode(&envelope.payload, expected.cells)
}
