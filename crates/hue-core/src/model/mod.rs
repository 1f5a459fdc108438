//! Payload model for the bridge REST API.
//!
//! - **`config`** – Credential handshake records (`POST /api`) and the
//!   bridge's application-level error record.
//! - **`request`** – The generic request descriptor used for arbitrary API
//!   calls.

pub mod config;
pub mod request;

pub use config::*;
pub use request::RequestInput;
