//! Error of rings_chord

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in rings-chord.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Peer {0} is unreachable")]
    PeerUnreachable(String),

    #[error("Exhausted all preceding nodes, no route found for key {0}")]
    NoRouteFound(String),

    #[error("Cannot get predecessor for {0}")]
    NoPredecessor(String),

    #[error("Vnode {0} has no successor")]
    NoSuccessor(String),

    #[error("Vnode {0} is isolated, all known successors and fingers are dead")]
    RingIsolated(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid hexadecimal ring id")]
    BadHex(#[from] hex::FromHexError),

    #[error("Failed to get vnode state from a sync lock")]
    VnodeSyncLockError,

    #[error("JSON serialization error")]
    Serialize(#[source] serde_json::Error),

    #[error("JSON deserialization error")]
    Deserialize(#[source] serde_json::Error),

    #[error("{}", join_errors(.0))]
    Merged(Vec<Error>),
}

impl Error {
    /// Returns `true` if the error must stop the vnode from taking part in the ring.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::RingIsolated(_))
    }

    /// Merge two optional errors, keeping both when both are present.
    pub fn merge(left: Option<Error>, right: Option<Error>) -> Option<Error> {
        match (left, right) {
            (None, None) => None,
            (Some(e), None) | (None, Some(e)) => Some(e),
            (Some(Error::Merged(mut l)), Some(r)) => {
                l.push(r);
                Some(Error::Merged(l))
            }
            (Some(l), Some(r)) => Some(Error::Merged(vec![l, r])),
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
