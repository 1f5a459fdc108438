//! # hue-core
//!
//! Shared library for Hue-Over-IP containing the bridge payload model and the
//! SSDP discovery protocol.
//!
//! It has zero dependencies on OS APIs, HTTP clients, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! A Hue bridge is a small box on the local network that controls the lights.
//! Talking to it takes two steps:
//!
//! 1. **Find it.**  The bridge answers SSDP searches: a short text datagram
//!    multicast to `239.255.255.250:1900`.  Every bridge that hears the
//!    search replies with a datagram that mentions `IpBridge`.
//! 2. **Talk to it.**  The bridge exposes a JSON REST API under
//!    `http://<bridge>/api/`.  Before most calls are allowed, the application
//!    must obtain a *username* (an access token) from the bridge.
//!
//! This crate (`hue-core`) defines:
//!
//! - **`protocol`** – What the SSDP search looks like on the wire and how a
//!   bridge reply is recognised.
//!
//! - **`model`** – The JSON records exchanged with the bridge REST API
//!   (credential request/response, API error, generic request descriptor).
//!
//! The sockets and the HTTP client live in the `hue-bridge` crate.

pub mod model;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `hue_core::CreateUser` instead of `hue_core::model::config::CreateUser`.
pub use model::config::{ApiErrorDetail, ApiErrorResponse, CreateUser, CreateUserResult, CreateUserSuccess};
pub use model::request::RequestInput;
pub use protocol::ssdp::{is_bridge_response, SearchRequest};
