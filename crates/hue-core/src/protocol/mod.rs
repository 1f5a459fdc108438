//! Protocol module containing the SSDP discovery message and reply matching.

pub mod ssdp;

pub use ssdp::{is_bridge_response, SearchRequest};
