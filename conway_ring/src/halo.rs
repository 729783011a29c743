// halo.rs - Boundary row exchange between ring neighbours
//
// Per generation each rank sends its first owned row to `prev` (HaloUp) and
// its last owned row to `next` (HaloDown), then fills its lower halo from
// `next`'s HaloUp and its upper halo from `prev`'s HaloDown.
//
// Even ranks send both rows and then receive; odd ranks receive and then
// send. Every odd rank's neighbours are even, and even ranks never wait
// before sending, so no cycle of waiting ranks can form. Sends are buffered,
// which also covers odd rings and a rank whose neighbours are itself (P = 1)
// or the same single peer on both sides (P = 2): those messages are told
// apart by tag, not by neighbour identity.

use tracing::trace;

use crate::codec::{self, Expected};
use crate::error::{ProtocolError, Result, SimError};
use crate::grid::{Cell, LocalBlock};
use crate::partition::{Partition, Rank};
use crate::transport::{Communicator, Envelope, LinkClosed, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOrder {
    SendFirst,
    ReceiveFirst,
}

impl ExchangeOrder {
    pub fn for_rank(rank: Rank) -> Self {
        if rank % 2 == 0 {
            ExchangeOrder::SendFirst
        } else {
            ExchangeOrder::ReceiveFirst
        }
    }
}

/// Refreshes both halo rows of `block` for `generation`.
pub async fn exchange<C: Communicator>(
    comm: &mut C,
    partition: &Partition,
    block: &mut LocalBlock,
    generation: u64,
) -> Result<()> {
    match ExchangeOrder::for_rank(partition.rank()) {
        ExchangeOrder::SendFirst => {
            send_boundaries(comm, partition, block, generation)?;
            receive_halos(comm, partition, block, generation).await
        }
        ExchangeOrder::ReceiveFirst => {
            receive_halos(comm, partition, block, generation).await?;
            send_boundaries(comm, partition, block, generation)
        }
    }
}

fn send_boundaries<C: Communicator>(
    comm: &C,
    partition: &Partition,
    block: &LocalBlock,
    generation: u64,
) -> Result<()> {
    let rank = partition.rank();
    let first = codec::encode(block.first_owned_row());
    send(comm, partition.prev(), Envelope::new(rank, Tag::HaloUp, generation, first))?;
    let last = codec::encode(block.last_owned_row());
    send(comm, partition.next(), Envelope::new(rank, Tag::HaloDown, generation, last))?;
    trace!(
        rank,
        generation,
        prev = partition.prev(),
        next = partition.next(),
        "boundary rows sent"
    );
    Ok(())
}

async fn receive_halos<C: Communicator>(
    comm: &mut C,
    partition: &Partition,
    block: &mut LocalBlock,
    generation: u64,
) -> Result<()> {
    let dimension = partition.dimension();
    let lower = receive(comm, Expected {
        source: partition.next(),
        tag: Tag::HaloUp,
        generation,
        cells: dimension,
    })
    .await?;
    block.install_lower_halo(&lower);

    let upper = receive(comm, Expected {
        source: partition.prev(),
        tag: Tag::HaloDown,
        generation,
        cells: dimension,
    })
    .await?;
    block.install_upper_halo(&upper);
    trace!(rank = partition.rank(), generation, "halo rows installed");
    Ok(())
}

pub(crate) fn send<C: Communicator>(comm: &C, dest: Rank, envelope: Envelope) -> Result<()> {
    let generation = envelope.generation;
    comm.send(dest, envelope)
        .map_err(|closed| disconnected(comm.rank(), closed, generation))
}

/// Waits for the message described by `expected` and decodes it.
pub(crate) async fn receive<C: Communicator>(
    comm: &mut C,
    expected: Expected,
) -> Result<Vec<Cell>> {
    let rank = comm.rank();
    let envelope = comm
        .recv(expected.source, expected.tag)
        .await
        .map_err(|closed| disconnected(rank, closed, expected.generation))?;
    codec::open(&envelope, expected).map_err(|violation| {
        SimError::Protocol(ProtocolError {
            rank,
            peer: expected.source,
            generation: expected.generation,
            violation,
        })
    })
}

fn disconnected(rank: Rank, closed: LinkClosed, generation: u64) -> SimError {
    SimError::PeerDisconnected {
        rank,
        peer: closed.peer,
        generation,
    }
}
