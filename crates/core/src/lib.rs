//! Rings Chord: ring membership and routing engine of a Chord vnode.
//! --------------
//! - [Keyspace](crate::dht::id) provides circular betweenness and power-of-two offsets over fixed length ring ids.
//! - [LocalVnode](crate::dht::LocalVnode) keeps the successor list, finger table and predecessor of one vnode.
//! - [Stabilizer](crate::dht::Stabilizer) runs the periodic self-healing pass and the keepalive task.
//! - [Transport](crate::transport::Transport) is the seam to remote vnodes, [MemoryTransport](crate::transport::MemoryTransport) wires vnodes in-process.
//! - [Ring](crate::ring::Ring) owns the local vnodes, their background tasks and the delegate queue.
//!
//! # Stabilization
//!
//! Every vnode runs a pass on a jittered timer. One pass, in order:
//!
//! 1. Ask the first successor for its predecessor and adopt it when it sits between
//!    the vnode and the successor. Dead successors are dropped, and when the whole list
//!    is dead the finger table is scanned for a replacement.
//! 2. Notify the successor and merge its successor list into the local one.
//! 3. Refresh one run of the finger table.
//! 4. Probe the predecessor and forget it when unreachable.
//!
//! A vnode that cannot find any live successor reports [Error::RingIsolated](crate::error::Error::RingIsolated)
//! to the ring instead of routing with an empty list.
//!
//! # Locking
//!
//! The mutable state of a vnode lives behind one mutex. Remote calls are never issued
//! while holding it: a caller reads what it needs, releases the lock, talks to the peer
//! and re-acquires the lock to apply the result only if the state it read is still current.

pub mod config;
pub mod consts;
pub mod delegate;
pub mod dht;
pub mod error;
pub mod ring;
#[cfg(test)]
mod tests;
pub mod transport;

pub use async_trait::async_trait;
