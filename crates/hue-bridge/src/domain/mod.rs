//! Domain layer for hue-bridge.
//!
//! Plain configuration values with documented defaults.  Nothing here opens
//! a socket or reads a file; the infrastructure layer receives these values
//! explicitly, which is what lets tests shorten the discovery deadline.

pub mod config;

pub use config::{ClientConfig, DiscoveryConfig};
