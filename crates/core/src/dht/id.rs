//! Ring ids and arithmetic over the circular keyspace.
//!
//! A [RingId] is a fixed length big-endian byte string, the keyspace is R(P) where
//! P = 2^hash_bits. All ids in one ring share the same length, mixing lengths is a
//! configuration error and is rejected when a vnode is built.
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::Deserialize;
use serde::Serialize;

use crate::config::HashFunction;
use crate::error::Error;
use crate::error::Result;

/// Position on the ring, ordered by unsigned lexicographic byte comparison.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RingId(Vec<u8>);

impl RingId {
    /// Wrap raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse from hex, an optional `0x` prefix is accepted.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Ok(Self(hex::decode(s)?))
    }

    /// Hash `host || height` (big-endian u32) and keep the first `bits / 8` bytes.
    pub fn generate(hash: HashFunction, host: &str, height: u32, bits: usize) -> Self {
        let mut data = host.as_bytes().to_vec();
        data.extend_from_slice(&height.to_be_bytes());
        let mut digest = hash.digest(&data);
        digest.truncate(bits / 8);
        let id = Self(digest);
        tracing::info!("genId({}@{}) = {}", host, height, id);
        id
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Width of the id in bits.
    pub fn bits(&self) -> usize {
        self.0.len() * 8
    }

    /// Lexicographic comparison, only used to break ties.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }

    fn from_biguint(value: BigUint, len: usize) -> Self {
        let raw = value.to_bytes_be();
        let mut bytes = vec![0u8; len.saturating_sub(raw.len())];
        bytes.extend_from_slice(&raw[raw.len().saturating_sub(len)..]);
        Self(bytes)
    }
}

impl From<Vec<u8>> for RingId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&RingId> for BigUint {
    fn from(id: &RingId) -> BigUint {
        BigUint::from_bytes_be(id.as_bytes())
    }
}

impl From<RingId> for String {
    fn from(id: RingId) -> String {
        id.to_string()
    }
}

impl TryFrom<String> for RingId {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl FromStr for RingId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for RingId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RingId({})", hex::encode(&self.0))
    }
}

/// Test x <- (a, b), walking clockwise from a. An empty range when a == b.
pub fn between(a: &RingId, b: &RingId, x: &RingId) -> bool {
    if a.compare(b) == Ordering::Greater {
        // wrap around zero
        return a.compare(x) == Ordering::Less || b.compare(x) == Ordering::Greater;
    }
    a.compare(x) == Ordering::Less && b.compare(x) == Ordering::Greater
}

/// Test x <- (a, b], walking clockwise from a.
pub fn between_right_incl(a: &RingId, b: &RingId, x: &RingId) -> bool {
    if a.compare(b) == Ordering::Greater {
        return a.compare(x) == Ordering::Less || b.compare(x) != Ordering::Less;
    }
    a.compare(x) == Ordering::Less && b.compare(x) != Ordering::Less
}

/// (id + 2^exp) mod 2^bits, with the same byte length as a `bits` wide id.
pub fn power_offset(id: &RingId, exp: usize, bits: usize) -> RingId {
    let ceil = BigUint::from(1u8) << bits;
    let sum = BigUint::from(id) + (BigUint::from(1u8) << exp);
    RingId::from_biguint(sum % ceil, bits / 8)
}

/// Clockwise distance from a to b, (b - a) mod 2^bits.
pub fn distance(a: &RingId, b: &RingId, bits: usize) -> BigUint {
    let ceil = BigUint::from(1u8) << bits;
    ((BigUint::from(b) + &ceil) - BigUint::from(a)) % ceil
}
