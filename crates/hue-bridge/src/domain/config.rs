//! Discovery and client configuration types.
//!
//! [`DiscoveryConfig`] and [`ClientConfig`] are the single source of truth for
//! all timing and sizing knobs.  They can be built from the config file
//! (see `infrastructure::storage::config`), from CLI overrides, or from the
//! defaults below.
//!
//! # Design rationale
//!
//! Keeping configuration as plain structs (no globals, no environment reads
//! inside the domain) means a test can run discovery with a 200 ms deadline
//! instead of the production 30 seconds.

use std::net::SocketAddrV4;
use std::time::Duration;

use hue_core::model::config::DEFAULT_DEVICE_TYPE;
use hue_core::protocol::ssdp::{multicast_group, DEFAULT_SEARCH_TARGET};

/// Default length of the discovery window.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default receive buffer size; one Ethernet MTU.
pub const DEFAULT_BUFFER_SIZE: usize = 1500;

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for one SSDP discovery run.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use hue_bridge::domain::DiscoveryConfig;
///
/// let cfg = DiscoveryConfig::default().with_timeout(Duration::from_secs(10));
/// assert_eq!(cfg.timeout, Duration::from_secs(10));
/// assert_eq!(cfg.buffer_size, 1500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Multicast group the search is sent to and replies are received on.
    pub multicast_addr: SocketAddrV4,

    /// How long to collect replies.  Expiry ends discovery successfully.
    pub timeout: Duration,

    /// Size of the receive buffer.  Longer datagrams are truncated, which is
    /// harmless as long as the identifier is in the first `buffer_size` bytes.
    pub buffer_size: usize,

    /// Value of the `ST` header in the search.
    pub search_target: String,
}

impl DiscoveryConfig {
    /// Returns a copy with a different discovery window.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for DiscoveryConfig {
    /// | Field          | Default                  |
    /// |----------------|--------------------------|
    /// | multicast_addr | `239.255.255.250:1900`   |
    /// | timeout        | 30 seconds               |
    /// | buffer_size    | 1500 bytes               |
    /// | search_target  | `ssdp:all`               |
    fn default() -> Self {
        Self {
            multicast_addr: multicast_group(),
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            search_target: DEFAULT_SEARCH_TARGET.to_string(),
        }
    }
}

/// Settings for the HTTP request client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout applied to every request, independent of the discovery window.
    pub request_timeout: Duration,

    /// Device type sent during the credential handshake when the caller does
    /// not supply one.
    pub device_type: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_discovery_timeout_is_30s() {
        // Arrange / Act
        let cfg = DiscoveryConfig::default();
        // Assert
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_default_multicast_addr_is_ssdp_group() {
        let cfg = DiscoveryConfig::default();
        assert_eq!(cfg.multicast_addr.to_string(), "239.255.255.250:1900");
    }

    #[test]
    fn test_default_buffer_size_is_1500() {
        assert_eq!(DiscoveryConfig::default().buffer_size, 1500);
    }

    #[test]
    fn test_with_timeout_keeps_other_fields() {
        let cfg = DiscoveryConfig::default().with_timeout(Duration::from_millis(250));
        assert_eq!(cfg.timeout, Duration::from_millis(250));
        assert_eq!(cfg.search_target, "ssdp:all");
    }

    #[test]
    fn test_default_request_timeout_is_5s() {
        assert_eq!(ClientConfig::default().request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_device_type_is_not_empty() {
        assert!(!ClientConfig::default().device_type.is_empty());
    }
}
