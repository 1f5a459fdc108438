//! SSDP search message and bridge reply matching.
//!
//! Wire format of the search (each line ends with CRLF, followed by one empty
//! CRLF line):
//! ```text
//! M-SEARCH * HTTP/1.1
//! HOST:239.255.255.250:1900
//! MAN:"ssdp:discover"
//! ST:ssdp:all
//! MX:1
//! ```
//!
//! Replies are free-form HTTPU text.  A bridge reply is recognised by the
//! case-sensitive substring [`BRIDGE_IDENTIFIER`] anywhere in the datagram;
//! no further parsing is attempted.

use std::fmt::Write;
use std::net::{Ipv4Addr, SocketAddrV4};

// ── Protocol constants ────────────────────────────────────────────────────────

/// The SSDP IPv4 multicast group.
pub const SSDP_MULTICAST_IP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// The well-known SSDP port.
pub const SSDP_PORT: u16 = 1900;

/// Substring that identifies a reply as coming from a Hue bridge.
///
/// The vendor recommends `IpBridge` over `hue-bridgeid`.
pub const BRIDGE_IDENTIFIER: &str = "IpBridge";

/// Default search target: every device answers, bridges included.
pub const DEFAULT_SEARCH_TARGET: &str = "ssdp:all";

/// Default `MX` header: responders spread their replies over this many seconds.
pub const DEFAULT_MAX_WAIT_SECS: u8 = 1;

/// Returns the SSDP multicast group address and port.
pub fn multicast_group() -> SocketAddrV4 {
    SocketAddrV4::new(SSDP_MULTICAST_IP, SSDP_PORT)
}

// ── Search request ────────────────────────────────────────────────────────────

/// An SSDP `M-SEARCH` request.
///
/// # Examples
///
/// ```rust
/// use hue_core::protocol::ssdp::SearchRequest;
///
/// let probe = SearchRequest::default().encode();
/// assert!(probe.starts_with("M-SEARCH * HTTP/1.1\r\n"));
/// assert!(probe.contains("MAN:\"ssdp:discover\"\r\n"));
/// assert!(probe.ends_with("\r\n\r\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Value of the `HOST` header; the multicast group the search is sent to.
    pub host: SocketAddrV4,
    /// Value of the `ST` (search target) header.
    pub search_target: String,
    /// Value of the `MX` header.
    pub max_wait_secs: u8,
}

impl SearchRequest {
    /// Creates a search for `search_target` addressed to `host`.
    pub fn new(host: SocketAddrV4, search_target: impl Into<String>) -> Self {
        Self {
            host,
            search_target: search_target.into(),
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
        }
    }

    /// Renders the request as the text sent on the wire.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(96);
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "M-SEARCH * HTTP/1.1\r\n\
             HOST:{}\r\n\
             MAN:\"ssdp:discover\"\r\n\
             ST:{}\r\n\
             MX:{}\r\n\
             \r\n",
            self.host, self.search_target, self.max_wait_secs
        );
        out
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::new(multicast_group(), DEFAULT_SEARCH_TARGET)
    }
}

// ── Reply matching ────────────────────────────────────────────────────────────

/// Returns `true` if `datagram` contains [`BRIDGE_IDENTIFIER`].
///
/// The check works on raw bytes, so truncated or non-UTF-8 datagrams are
/// simply "not a bridge" rather than an error.
pub fn is_bridge_response(datagram: &[u8]) -> bool {
    contains_subslice(datagram, BRIDGE_IDENTIFIER.as_bytes())
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const BRIDGE_REPLY: &[u8] = b"HTTP/1.1 200 OK\r\n\
        HOST: 239.255.255.250:1900\r\n\
        EXT:\r\n\
        CACHE-CONTROL: max-age=100\r\n\
        LOCATION: http://192.168.1.20:80/description.xml\r\n\
        SERVER: Linux/3.14.0 UPnP/1.0 IpBridge/1.48.0\r\n\
        hue-bridgeid: 001788FFFE2A3B4C\r\n\
        ST: upnp:rootdevice\r\n\
        USN: uuid:2f402f80-da50-11e1-9b23-001788255acc::upnp:rootdevice\r\n\r\n";

    #[test]
    fn test_multicast_group_is_ssdp_well_known_address() {
        assert_eq!(multicast_group().to_string(), "239.255.255.250:1900");
    }

    #[test]
    fn test_default_search_request_encodes_all_headers_in_order() {
        // Arrange
        let req = SearchRequest::default();

        // Act
        let text = req.encode();

        // Assert
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(
            lines,
            vec![
                "M-SEARCH * HTTP/1.1",
                "HOST:239.255.255.250:1900",
                "MAN:\"ssdp:discover\"",
                "ST:ssdp:all",
                "MX:1",
                "",
                "",
            ]
        );
    }

    #[test]
    fn test_custom_search_target_and_mx_are_rendered() {
        let mut req = SearchRequest::new(multicast_group(), "upnp:rootdevice");
        req.max_wait_secs = 3;

        let text = req.encode();

        assert!(text.contains("ST:upnp:rootdevice\r\n"));
        assert!(text.contains("MX:3\r\n"));
    }

    #[test]
    fn test_bridge_reply_is_recognised() {
        assert!(is_bridge_response(BRIDGE_REPLY));
    }

    #[test]
    fn test_identifier_match_is_case_sensitive() {
        assert!(!is_bridge_response(b"SERVER: Linux UPnP/1.0 ipbridge/1.48.0\r\n"));
        assert!(!is_bridge_response(b"SERVER: Linux UPnP/1.0 IPBRIDGE/1.48.0\r\n"));
    }

    #[test]
    fn test_other_devices_are_not_bridges() {
        let chromecast = b"HTTP/1.1 200 OK\r\nST: urn:dial-multiscreen-org:service:dial:1\r\n\r\n";
        assert!(!is_bridge_response(chromecast));
    }

    #[test]
    fn test_truncated_datagram_is_not_a_bridge() {
        // The identifier is cut off half-way.
        assert!(!is_bridge_response(b"SERVER: Linux UPnP/1.0 IpBri"));
    }

    #[test]
    fn test_empty_and_non_utf8_datagrams_are_not_bridges() {
        assert!(!is_bridge_response(b""));
        assert!(!is_bridge_response(&[0xFF, 0xFE, 0x00, 0x80]));
    }

    #[test]
    fn test_identifier_surrounded_by_binary_noise_is_still_found() {
        let mut datagram = vec![0xFF, 0x00, 0x13];
        datagram.extend_from_slice(b"IpBridge");
        datagram.extend_from_slice(&[0xC3, 0x28]);
        assert!(is_bridge_response(&datagram));
    }
}
