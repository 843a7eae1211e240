#![warn(missing_docs)]
//! Configuration of a ring and its vnodes.
//! The config is read-only once a [Ring](crate::ring::Ring) is built from it.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use sha1::Sha1;
use sha2::Digest;
use sha2::Sha256;

use crate::consts::DEFAULT_HOSTNAME;
use crate::consts::DEFAULT_HTTP_WS_PORT;
use crate::consts::DEFAULT_KEEPALIVE_INTERVAL_MS;
use crate::consts::DEFAULT_NODE_PORT;
use crate::consts::DEFAULT_NUM_SUCCESSORS;
use crate::consts::DEFAULT_NUM_VNODES;
use crate::consts::DEFAULT_STABILIZE_INTERVAL_MS;
use crate::consts::DEFAULT_STABILIZE_JITTER_MS;
use crate::error::Error;
use crate::error::Result;

/// Hash function used to place vnodes and keys on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashFunction {
    /// SHA-1, 160 bits output.
    #[default]
    Sha1,
    /// SHA-256, 256 bits output.
    Sha256,
}

impl HashFunction {
    /// Size of the digest in bits.
    pub fn output_bits(&self) -> usize {
        match self {
            HashFunction::Sha1 => 160,
            HashFunction::Sha256 => 256,
        }
    }

    /// Hash `data` into a full length digest.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashFunction::Sha1 => Sha1::digest(data).to_vec(),
            HashFunction::Sha256 => Sha256::digest(data).to_vec(),
        }
    }
}

/// Config of a ring. All vnodes of a ring share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Address `host:port` of this process, used for self identification.
    pub hostname: String,
    /// Port of the node protocol.
    pub node_port: u16,
    /// Port of http and websocket services.
    pub http_ws_port: u16,
    /// Number of local vnodes hosted by the ring.
    pub num_vnodes: usize,
    /// Capacity of the successor list of every vnode.
    pub num_successors: usize,
    /// Hash function of the ring.
    pub hash_func: HashFunction,
    /// Bit width of ring ids. Digests are truncated to `hash_bits / 8` bytes.
    pub hash_bits: usize,
    /// Base delay between two stabilization passes, in ms.
    pub stabilize_interval_ms: u64,
    /// Upper bound of the random delay added to `stabilize_interval_ms`, in ms.
    pub stabilize_jitter_ms: u64,
    /// Interval of keepalive pings, in ms.
    pub keepalive_interval_ms: u64,
    /// Height used to derive the id of the first vnode.
    pub join_blk_height: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        let hash_func = HashFunction::default();
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            node_port: DEFAULT_NODE_PORT,
            http_ws_port: DEFAULT_HTTP_WS_PORT,
            num_vnodes: DEFAULT_NUM_VNODES,
            num_successors: DEFAULT_NUM_SUCCESSORS,
            hash_bits: hash_func.output_bits(),
            hash_func,
            stabilize_interval_ms: DEFAULT_STABILIZE_INTERVAL_MS,
            stabilize_jitter_ms: DEFAULT_STABILIZE_JITTER_MS,
            keepalive_interval_ms: DEFAULT_KEEPALIVE_INTERVAL_MS,
            join_blk_height: 0,
        }
    }
}

impl RingConfig {
    /// Build a config for `hostname` with default values.
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            ..Default::default()
        }
    }

    /// Check values which would make the ring inconsistent.
    pub fn validate(&self) -> Result<()> {
        if self.hash_bits == 0 || self.hash_bits % 8 != 0 {
            return Err(Error::Configuration(format!(
                "hash_bits must be a non-zero multiple of 8, got {}",
                self.hash_bits
            )));
        }
        if self.hash_bits > self.hash_func.output_bits() {
            return Err(Error::Configuration(format!(
                "hash_bits {} exceeds output of {:?} ({} bits)",
                self.hash_bits,
                self.hash_func,
                self.hash_func.output_bits()
            )));
        }
        if self.num_successors == 0 {
            return Err(Error::Configuration(
                "num_successors must be at least 1".to_string(),
            ));
        }
        if self.num_vnodes == 0 {
            return Err(Error::Configuration(
                "num_vnodes must be at least 1".to_string(),
            ));
        }
        if self.stabilize_interval_ms == 0 && self.stabilize_jitter_ms == 0 {
            return Err(Error::Configuration(
                "stabilize interval and jitter cannot both be zero".to_string(),
            ));
        }
        if self.keepalive_interval_ms == 0 {
            return Err(Error::Configuration(
                "keepalive_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Byte length of every ring id.
    pub fn id_len(&self) -> usize {
        self.hash_bits / 8
    }

    /// Hash `data` and truncate it to a ring id.
    pub fn hash_key(&self, data: &[u8]) -> Vec<u8> {
        let mut digest = self.hash_func.digest(data);
        digest.truncate(self.id_len());
        digest
    }

    /// Delay before next stabilization, randomized to desynchronize peers.
    pub fn stabilize_delay(&self) -> Duration {
        let jitter = if self.stabilize_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.stabilize_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.stabilize_interval_ms + jitter)
    }

    /// Interval of the keepalive task.
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}
