#![warn(missing_docs)]
//! Identity of a vnode: its position on the ring and where to reach it.
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::id::RingId;
use crate::error::Error;
use crate::error::Result;

/// A participant of the ring. Immutable once created and compared by value.
/// Two vnodes are the same ring member when their [RingId]s match, see [Vnode::same].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vnode {
    /// Position on the ring.
    pub id: RingId,
    /// Address `host:port` of the process hosting the vnode.
    pub host: String,
    /// Port of the node protocol.
    pub node_port: u16,
    /// Port of http and websocket services.
    pub http_ws_port: u16,
}

impl Vnode {
    /// Create a vnode identity.
    pub fn new(id: RingId, host: &str, node_port: u16, http_ws_port: u16) -> Self {
        Self {
            id,
            host: host.to_string(),
            node_port,
            http_ws_port,
        }
    }

    /// Identity match by ring id.
    pub fn same(&self, other: &Vnode) -> bool {
        self.id == other.id
    }

    /// Address of the node protocol, host of `self.host` with `node_port`.
    pub fn node_addr(&self) -> Result<String> {
        Ok(join_host_port(split_host(&self.host)?, self.node_port))
    }

    /// Address of http and websocket services, host of `self.host` with `http_ws_port`.
    pub fn http_ws_addr(&self) -> Result<String> {
        Ok(join_host_port(split_host(&self.host)?, self.http_ws_port))
    }
}

fn split_host(addr: &str) -> Result<&str> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| Error::Configuration(format!("missing port in address {}", addr)))?;
    if port.parse::<u16>().is_err() {
        return Err(Error::Configuration(format!(
            "invalid port in address {}",
            addr
        )));
    }
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.contains(':') && !addr.starts_with('[') {
        return Err(Error::Configuration(format!(
            "ipv6 address {} must be bracketed",
            addr
        )));
    }
    Ok(host)
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

impl fmt::Display for Vnode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for Vnode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Vnode({}@{})", self.id, self.host)
    }
}
