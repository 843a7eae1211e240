//! Constant variables.
///
/// default length of successor list
pub const DEFAULT_NUM_SUCCESSORS: usize = 8;
pub const DEFAULT_NUM_VNODES: usize = 1;
/// base delay between two stabilization passes, in ms
pub const DEFAULT_STABILIZE_INTERVAL_MS: u64 = 15 * 1000;
/// upper bound of the random delay added to the base delay, in ms
pub const DEFAULT_STABILIZE_JITTER_MS: u64 = 30 * 1000;
/// 10s
pub const DEFAULT_KEEPALIVE_INTERVAL_MS: u64 = 10 * 1000;
pub const DEFAULT_HOSTNAME: &str = "127.0.0.1:30001";
pub const DEFAULT_NODE_PORT: u16 = 30001;
pub const DEFAULT_HTTP_WS_PORT: u16 = 30002;
/// capacity of ring event channel
pub const RING_EVENT_CAPACITY: usize = 64;
