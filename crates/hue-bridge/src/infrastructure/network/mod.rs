//! Network infrastructure.
//!
//! # Sub-modules
//!
//! - **`discovery`** – Multicasts an SSDP search and collects the addresses
//!   of every bridge that answers within the discovery window.
//!
//! - **`client`** – Executes a single HTTP request against a bridge:
//!   endpoint construction, JSON body, timeout, status check, cancellation.
//!
//! - **`bridge`** – A handle on one discovered bridge, with the credential
//!   handshake built on top of `client`.

pub mod bridge;
pub mod client;
pub mod discovery;

pub use bridge::{Bridge, BridgeError};
pub use client::{ApiResponse, Client, ClientError, ErrorKind};
pub use discovery::{discover, NetworkError};
