// transport.rs - In-process message passing between ranks
//
// Every link is one tokio mpsc channel per (source, destination, tag), so
// delivery per triple is reliable and FIFO. Only the links the ring uses
// exist: halo rows to both neighbours, slabs to the coordinator and releases
// back from it. Sends are buffered and never wait on the receiver; receives
// wait until a message arrives or the sending rank has gone away.

use std::collections::HashMap;
use std::future::Future;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::partition::{COORDINATOR, Rank};

/// Message classes, the equivalent of MPI tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A first owned row on its way to `prev`, where it becomes the lower halo.
    HaloUp,
    /// A last owned row on its way to `next`, where it becomes the upper halo.
    HaloDown,
    /// A rank's owned slab on its way to the coordinator.
    Gather,
    /// Coordinator's notice that a gather has completed.
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub source: Rank,
    pub tag: Tag,
    pub generation: u64,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(source: Rank, tag: Tag, generation: u64, payload: Vec<u8>) -> Self {
        Self {
            source,
            tag,
            generation,
            payload,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no open link to rank {peer}")]
pub struct LinkClosed {
    pub peer: Rank,
}

/// Point-to-point primitives the engine relies on.
pub trait Communicator: Send {
    fn rank(&self) -> Rank;

    fn size(&self) -> usize;

    /// Queues `envelope` for `dest` without waiting for it to be received.
    fn send(&self, dest: Rank, envelope: Envelope) -> Result<(), LinkClosed>;

    /// Waits for the next `tag` message from `source`.
    fn recv(
        &mut self,
        source: Rank,
        tag: Tag,
    ) -> impl Future<Output = Result<Envelope, LinkClosed>> + Send;
}

/// One rank's view of the fabric.
#[derive(Debug)]
pub struct Endpoint {
    rank: Rank,
    size: usize,
    outboxes: HashMap<(Rank, Tag), mpsc::UnboundedSender<Envelope>>,
    inboxes: HashMap<(Rank, Tag), mpsc::UnboundedReceiver<Envelope>>,
}

impl Communicator for Endpoint {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: Rank, envelope: Envelope) -> Result<(), LinkClosed> {
        let outbox = self
            .outboxes
            .get(&(dest, envelope.tag))
            .ok_or(LinkClosed { peer: dest })?;
        outbox.send(envelope).map_err(|_| LinkClosed { peer: dest })
    }

    fn recv(
        &mut self,
        source: Rank,
        tag: Tag,
    ) -> impl Future<Output = Result<Envelope, LinkClosed>> + Send {
        async move {
            let inbox = self
                .inboxes
                .get_mut(&(source, tag))
                .ok_or(LinkClosed { peer: source })?;
            inbox.recv().await.ok_or(LinkClosed { peer: source })
        }
    }
}

/// Builds the channel links of a ring process group.
pub struct Fabric;

impl Fabric {
    /// One endpoint per rank, in rank order.
    pub fn new(size: usize) -> Vec<Endpoint> {
        let mut endpoints: Vec<Endpoint> = (0..size)
            .map(|rank| Endpoint {
                rank,
                size,
                outboxes: HashMap::new(),
                inboxes: HashMap::new(),
            })
            .collect();

        for rank in 0..size {
            let prev = (rank + size - 1) % size;
            let next = (rank + 1) % size;
            link(&mut endpoints, rank, prev, Tag::HaloUp);
            link(&mut endpoints, rank, next, Tag::HaloDown);
            link(&mut endpoints, rank, COORDINATOR, Tag::Gather);
            if rank != COORDINATOR {
                link(&mut endpoints, COORDINATOR, rank, Tag::Release);
            }
        }
        endpoints
    }
}

fn link(endpoints: &mut [Endpoint], source: Rank, dest: Rank, tag: Tag) {
    let (tx, rx) = mpsc::unbounded_channel();
    endpoints[source].outboxes.insert((dest, tag), tx);
    endpoints[dest].inboxes.insert((source, tag), rx);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(source: Rank, tag: Tag, generation: u64) -> Envelope {
        Envelope::new(source, tag, generation, vec![1, 0, 1])
    }

    #[tokio::test]
    async fn delivery_is_fifo_per_source_and_tag() {
        let mut endpoints = Fabric::new(2);
        let mut b = endpoints.pop().unwrap();
        let a = endpoints.pop().unwrap();

        a.send(1, envelope(0, Tag::HaloDown, 1)).unwrap();
        a.send(1, envelope(0, Tag::HaloDown, 2)).unwrap();
        a.send(1, envelope(0, Tag::HaloUp, 7)).unwrap();

        assert_eq!(b.recv(0, Tag::HaloUp).await.unwrap().generation, 7);
        assert_eq!(b.recv(0, Tag::HaloDown).await.unwrap().generation, 1);
        assert_eq!(b.recv(0, Tag::HaloDown).await.unwrap().generation, 2);
    }

    #[tokio::test]
    async fn a_rank_can_message_itself() {
        let mut solo = Fabric::new(1).pop().unwrap();
        solo.send(0, envelope(0, Tag::HaloUp, 1)).unwrap();
        let received = solo.recv(0, Tag::HaloUp).await.unwrap();
        assert_eq!(received.payload, vec![1, 0, 1]);
    }

    #[tokio::test]
    async fn dropped_peer_closes_the_link() {
        let mut endpoints = Fabric::new(2);
        let b = endpoints.pop().unwrap();
        let mut a = endpoints.pop().unwrap();
        drop(b);

        assert_eq!(a.recv(1, Tag::Gather).await, Err(LinkClosed { peer: 1 }));
        assert_eq!(
            a.send(1, envelope(0, Tag::Release, 0)),
            Err(LinkClosed { peer: 1 })
        );
    }

    #[test]
    fn unknown_rank_is_rejected() {
        let a = Fabric::new(1).pop().unwrap();
        assert_eq!(a.send(3, envelope(0, Tag::HaloUp, 0)), Err(LinkClosed { peer: 3 }));
    }

    #[test]
    fn only_ring_and_coordinator_links_exist() {
        let endpoints = Fabric::new(4);
        let (zero, two) = (&endpoints[0], &endpoints[2]);

        assert!(zero.send(3, envelope(0, Tag::HaloUp, 1)).is_ok());
        assert!(zero.send(1, envelope(0, Tag::HaloDown, 1)).is_ok());
        assert!(zero.send(0, envelope(0, Tag::Gather, 0)).is_ok());
        assert!(zero.send(2, envelope(0, Tag::Release, 0)).is_ok());
        assert!(two.send(0, envelope(2, Tag::Gather, 0)).is_ok());

        assert_eq!(zero.send(2, envelope(0, Tag::HaloUp, 1)), Err(LinkClosed { peer: 2 }));
        assert_eq!(zero.send(1, envelope(0, Tag::HaloUp, 1)), Err(LinkClosed { peer: 1 }));
        assert_eq!(two.send(1, envelope(2, Tag::Gather, 0)), Err(LinkClosed { peer: 1 }));
        assert_eq!(two.send(0, envelope(2, Tag::Release, 0)), Err(LinkClosed { peer: 0 }));
    }
}
