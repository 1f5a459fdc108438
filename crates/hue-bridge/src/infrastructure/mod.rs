//! Infrastructure layer for hue-bridge.
//!
//! Contains the OS-facing adapters: UDP sockets for discovery, the HTTP
//! client for the bridge REST API, and file-system storage for the config.
//!
//! **Dependency rule**: this layer may depend on `domain` and `hue_core`,
//! but MUST NOT be imported by the domain layer.

pub mod network;
pub mod storage;
