#![warn(missing_docs)]
//! Implementation of the vnode engine
//! which is based on CHORD, ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! With high probability, the number of nodes that must be contacted to find a successor in an N-node network is O(log N).

/// Finger table of a vnode
pub mod finger;
pub mod id;
mod local;
mod lookup;
mod maintenance;
mod membership;
pub mod snapshot;
mod stabilization;
pub mod successor;
pub mod vnode;

pub use finger::FingerTable;
pub use id::between;
pub use id::between_right_incl;
pub use id::distance;
pub use id::power_offset;
pub use id::RingId;
pub use local::LocalVnode;
pub use local::NewSuccessorCallback;
pub use local::VnodeState;
pub use lookup::ClosestPreceding;
pub use snapshot::VnodeSnapshot;
pub use stabilization::Stabilizer;
pub use successor::SuccessorList;
pub use vnode::Vnode;
