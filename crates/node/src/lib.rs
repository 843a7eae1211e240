//! Daemon around a [rings_chord::ring::Ring].
//! --------------
//! - [config] loads and saves the YAML config of the daemon.
//! - [logging] installs the `tracing` subscriber and the panic hook.
//! - [util] expands `~` in config paths.
pub mod config;
pub mod error;
pub mod logging;
pub mod util;

pub use rings_chord;
