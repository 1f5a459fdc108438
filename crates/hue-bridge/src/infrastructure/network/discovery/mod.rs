//! SSDP multicast bridge discovery.
//!
//! [`discover`] sends one `M-SEARCH` to the SSDP multicast group and then
//! listens until the discovery window closes.  Every datagram that mentions
//! `IpBridge` contributes its sender's IP address to the result, once.
//!
//! # How SSDP discovery works (for beginners)
//!
//! SSDP (Simple Service Discovery Protocol) finds devices without knowing
//! their addresses in advance:
//!
//! 1. We send a short text datagram (the *search*) to the multicast group
//!    `239.255.255.250:1900`.  Every SSDP-capable device on the LAN receives
//!    it.
//!
//! 2. Each device answers with a unicast datagram sent back to the source
//!    port of the search.  Bridges also multicast periodic `NOTIFY`
//!    announcements to the group on their own.
//!
//! 3. UDP never tells us "that's everybody".  We therefore simply listen for
//!    a fixed amount of time and report whatever arrived.
//!
//! Two sockets are involved: a unicast *sender* (which is also where the
//! search replies land) and a *listener* bound to port 1900 and joined to the
//! multicast group (which catches the announcements).  The receive loop
//! polls both.
//!
//! # Read timeout
//!
//! Each `recv_from` blocks for at most [`POLL_SLICE`] (or whatever is left of
//! the window, if less).  A read timeout is the *normal* way the loop notices
//! that the window is over, so it is classified separately from real errors:
//! see [`RecvErrorClass`].

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};

use hue_core::protocol::ssdp::{is_bridge_response, SearchRequest};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::domain::DiscoveryConfig;

pub mod mock;

/// Upper bound for a single blocking read, so both sockets get polled.
pub const POLL_SLICE: Duration = Duration::from_millis(50);

/// Error type for discovery.
///
/// Every variant is fatal to the current run; nothing is retried internally.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A UDP socket could not be created or bound.
    #[error("failed to bind discovery socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// Joining the multicast group failed (no multicast route, etc.).
    #[error("failed to join multicast group {group}: {source}")]
    JoinMulticast {
        group: Ipv4Addr,
        #[source]
        source: io::Error,
    },
    /// The search datagram could not be sent.
    #[error("failed to send SSDP search to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// A non-recoverable receive error.  `found` holds the bridges seen
    /// before the error, possibly none.
    #[error("discovery receive failed after {} bridge(s) found: {source}", .found.len())]
    Receive {
        found: Vec<String>,
        #[source]
        source: io::Error,
    },
}

impl NetworkError {
    /// Returns the bridges found before the failure, if any were recorded.
    pub fn partial_result(&self) -> &[String] {
        match self {
            Self::Receive { found, .. } => found,
            _ => &[],
        }
    }
}

/// Classification of a receive error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvErrorClass {
    /// The read timed out.  Not an error: the loop re-checks the deadline.
    Timeout,
    /// A recoverable condition; the loop keeps going.
    Transient,
    /// Anything else; discovery aborts.
    Fatal,
}

impl RecvErrorClass {
    /// Classifies `e` by its [`io::ErrorKind`].
    ///
    /// `WouldBlock` counts as a timeout because that is how Unix reports an
    /// expired `SO_RCVTIMEO`.  `ConnectionReset` / `ConnectionRefused` are
    /// ICMP port-unreachable echoes that some platforms surface on the next
    /// read of a UDP socket.
    pub fn of(e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused => Self::Transient,
            _ => Self::Fatal,
        }
    }
}

/// Anything datagrams can be read from with a timeout.
///
/// The production implementation is [`std::net::UdpSocket`]; tests use
/// [`mock::MockDatagramSource`].
pub trait DatagramSource {
    /// Sets the timeout for the next `recv_from`.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
    /// Receives one datagram into `buf`, returning its length and sender.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

impl DatagramSource for UdpSocket {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        UdpSocket::set_read_timeout(self, timeout)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }
}

/// Runs one discovery window and returns the IPv4 addresses of every bridge
/// that answered, in arrival order, without duplicates.
///
/// Blocks the calling thread for `config.timeout` (plus at most one
/// [`POLL_SLICE`]).  Async callers should use `tokio::task::spawn_blocking`.
/// Both sockets are closed before this function returns, on every path.
///
/// # Errors
///
/// Returns [`NetworkError`] if a socket cannot be set up, the search cannot
/// be sent, or a non-recoverable receive error occurs.  Finding no bridges
/// is **not** an error.
pub fn discover(config: &DiscoveryConfig) -> Result<Vec<String>, NetworkError> {
    let group = config.multicast_addr;

    let sender = open_sender()?;
    let listener = open_listener(group)?;

    let probe = SearchRequest {
        host: group,
        search_target: config.search_target.clone(),
        ..SearchRequest::default()
    }
    .encode();
    sender
        .send_to(probe.as_bytes(), group)
        .map_err(|source| NetworkError::Send {
            addr: group.into(),
            source,
        })?;

    info!(
        "SSDP search sent to {group}; listening for {:?}",
        config.timeout
    );

    let found = collect_responses(&[&sender, &listener], config.timeout, config.buffer_size)?;

    info!("discovery finished: {} bridge(s) found", found.len());
    Ok(found)
}

/// Reads datagrams from `sources` until `timeout` has elapsed and returns the
/// deduplicated sender IPs of every bridge reply.
///
/// The sources are polled round-robin, each read limited to [`POLL_SLICE`].
/// With no sources there is nothing to wait for and the result is empty.
///
/// # Errors
///
/// Returns [`NetworkError::Receive`], carrying the partial result, on the
/// first [`RecvErrorClass::Fatal`] error.
pub fn collect_responses(
    sources: &[&dyn DatagramSource],
    timeout: Duration,
    buffer_size: usize,
) -> Result<Vec<String>, NetworkError> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let deadline = Instant::now() + timeout;
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut found: Vec<String> = Vec::new();

    'window: loop {
        for source in sources {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break 'window;
            }

            if let Err(e) = source.set_read_timeout(Some(remaining.min(POLL_SLICE))) {
                return Err(NetworkError::Receive { found, source: e });
            }

            let (len, src) = match source.recv_from(&mut buf) {
                Ok(pair) => pair,
                Err(e) => match RecvErrorClass::of(&e) {
                    RecvErrorClass::Timeout => continue,
                    RecvErrorClass::Transient => {
                        debug!("transient discovery recv error: {e}");
                        continue;
                    }
                    RecvErrorClass::Fatal => {
                        return Err(NetworkError::Receive { found, source: e });
                    }
                },
            };

            record_reply(&mut found, &buf[..len], src);
        }
    }

    Ok(found)
}

/// Adds `src` to `found` if `datagram` is a bridge reply not seen before.
fn record_reply(found: &mut Vec<String>, datagram: &[u8], src: SocketAddr) {
    if !is_bridge_response(datagram) {
        trace!("ignoring non-bridge SSDP datagram from {src} ({} bytes)", datagram.len());
        return;
    }

    let ip = src.ip().to_string();
    if found.contains(&ip) {
        trace!("duplicate bridge reply from {ip}");
    } else {
        info!("found bridge at {ip}");
        found.push(ip);
    }
}

/// Opens the unicast sender socket on an ephemeral port.
///
/// Left unconnected: a connected UDP socket only accepts datagrams from its
/// peer, and replies come from the bridges.
fn open_sender() -> Result<UdpSocket, NetworkError> {
    let local = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    UdpSocket::bind(local).map_err(|source| NetworkError::Bind {
        addr: local,
        source,
    })
}

/// Opens the listener socket on the group port and joins the group.
///
/// `SO_REUSEADDR` is set before binding so that other SSDP software on the
/// host does not lock us out of port 1900.
fn open_listener(group: SocketAddrV4) -> Result<UdpSocket, NetworkError> {
    let local = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port());
    let bind_err = |source| NetworkError::Bind {
        addr: local.into(),
        source,
    };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    socket.bind(&SockAddr::from(local)).map_err(bind_err)?;

    let socket: UdpSocket = socket.into();
    socket
        .join_multicast_v4(group.ip(), &Ipv4Addr::UNSPECIFIED)
        .map_err(|source| NetworkError::JoinMulticast {
            group: *group.ip(),
            source,
        })?;
    Ok(socket)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::mock::MockDatagramSource;
    use super::*;

    const BRIDGE_REPLY: &[u8] = b"HTTP/1.1 200 OK\r\nSERVER: Linux UPnP/1.0 IpBridge/1.48.0\r\n\r\n";
    const OTHER_REPLY: &[u8] = b"HTTP/1.1 200 OK\r\nSERVER: Linux UPnP/1.0 Sonos/70.3\r\n\r\n";

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_classify_timed_out_and_would_block_as_timeout() {
        // Arrange
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        let would_block = io::Error::new(io::ErrorKind::WouldBlock, "would block");

        // Act / Assert
        assert_eq!(RecvErrorClass::of(&timed_out), RecvErrorClass::Timeout);
        assert_eq!(RecvErrorClass::of(&would_block), RecvErrorClass::Timeout);
    }

    #[test]
    fn test_classify_interrupted_and_reset_as_transient() {
        let interrupted = io::Error::new(io::ErrorKind::Interrupted, "eintr");
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "icmp");
        assert_eq!(RecvErrorClass::of(&interrupted), RecvErrorClass::Transient);
        assert_eq!(RecvErrorClass::of(&reset), RecvErrorClass::Transient);
    }

    #[test]
    fn test_classify_other_errors_as_fatal() {
        let e = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(RecvErrorClass::of(&e), RecvErrorClass::Fatal);
    }

    #[test]
    fn test_collect_deduplicates_and_keeps_arrival_order() {
        // Arrange
        let source = MockDatagramSource::new();
        source.push_datagram(BRIDGE_REPLY, addr("192.168.1.20:1900"));
        source.push_datagram(BRIDGE_REPLY, addr("192.168.1.7:1900"));
        source.push_datagram(BRIDGE_REPLY, addr("192.168.1.20:49152"));

        // Act
        let found = collect_responses(&[&source], Duration::from_millis(200), 1500).unwrap();

        // Assert
        assert_eq!(found, vec!["192.168.1.20", "192.168.1.7"]);
    }

    #[test]
    fn test_collect_ignores_non_bridge_replies() {
        let source = MockDatagramSource::new();
        source.push_datagram(OTHER_REPLY, addr("192.168.1.30:1900"));
        source.push_datagram(b"IpBri", addr("192.168.1.31:1900"));
        source.push_datagram(BRIDGE_REPLY, addr("192.168.1.20:1900"));

        let found = collect_responses(&[&source], Duration::from_millis(200), 1500).unwrap();

        assert_eq!(found, vec!["192.168.1.20"]);
    }

    #[test]
    fn test_collect_with_no_responders_returns_empty_without_error() {
        let source = MockDatagramSource::new();

        let found = collect_responses(&[&source], Duration::from_millis(150), 1500).unwrap();

        assert!(found.is_empty());
    }

    #[test]
    fn test_collect_continues_after_transient_error() {
        let source = MockDatagramSource::new();
        source.push_error(io::ErrorKind::Interrupted);
        source.push_error(io::ErrorKind::ConnectionReset);
        source.push_datagram(BRIDGE_REPLY, addr("10.0.0.2:1900"));

        let found = collect_responses(&[&source], Duration::from_millis(200), 1500).unwrap();

        assert_eq!(found, vec!["10.0.0.2"]);
    }

    #[test]
    fn test_collect_fatal_error_carries_partial_result() {
        // Arrange
        let source = MockDatagramSource::new();
        source.push_datagram(BRIDGE_REPLY, addr("10.0.0.2:1900"));
        source.push_error(io::ErrorKind::PermissionDenied);
        source.push_datagram(BRIDGE_REPLY, addr("10.0.0.3:1900"));

        // Act
        let err = collect_responses(&[&source], Duration::from_secs(5), 1500).unwrap_err();

        // Assert
        assert!(matches!(err, NetworkError::Receive { .. }));
        assert_eq!(err.partial_result().to_vec(), vec!["10.0.0.2".to_string()]);
    }

    #[test]
    fn test_collect_fatal_error_before_any_data_has_empty_partial_result() {
        let source = MockDatagramSource::new();
        source.push_error(io::ErrorKind::NotConnected);

        let err = collect_responses(&[&source], Duration::from_secs(5), 1500).unwrap_err();

        assert!(err.partial_result().is_empty());
    }

    #[test]
    fn test_collect_without_sources_returns_immediately() {
        // Arrange
        let started = Instant::now();

        // Act
        let found = collect_responses(&[], Duration::from_millis(100), 1500).unwrap();

        // Assert
        assert!(found.is_empty());
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_collect_respects_deadline() {
        // Arrange
        let source = MockDatagramSource::new();
        let window = Duration::from_millis(300);
        let start = Instant::now();

        // Act
        collect_responses(&[&source], window, 1500).unwrap();

        // Assert: the window is honoured, with a little scheduling slack.
        let elapsed = start.elapsed();
        assert!(elapsed >= window, "returned early: {elapsed:?}");
        assert!(elapsed < window + Duration::from_millis(250), "overran: {elapsed:?}");
    }

    #[test]
    fn test_collect_merges_replies_from_several_sources() {
        let unicast = MockDatagramSource::new();
        let multicast = MockDatagramSource::new();
        unicast.push_datagram(BRIDGE_REPLY, addr("10.0.0.2:1900"));
        multicast.push_datagram(BRIDGE_REPLY, addr("10.0.0.2:1900"));
        multicast.push_datagram(BRIDGE_REPLY, addr("10.0.0.9:1900"));

        let found =
            collect_responses(&[&unicast, &multicast], Duration::from_millis(300), 1500).unwrap();

        assert_eq!(found, vec!["10.0.0.2", "10.0.0.9"]);
    }

    #[test]
    fn test_collect_truncates_to_buffer_size() {
        // The identifier sits beyond the 16-byte buffer, so it is never seen.
        let source = MockDatagramSource::new();
        source.push_datagram(BRIDGE_REPLY, addr("10.0.0.2:1900"));

        let found = collect_responses(&[&source], Duration::from_millis(150), 16).unwrap();

        assert!(found.is_empty());
    }

    #[test]
    fn test_partial_result_is_empty_for_setup_errors() {
        let err = NetworkError::Send {
            addr: addr("239.255.255.250:1900"),
            source: io::Error::new(io::ErrorKind::Other, "no route"),
        };
        assert!(err.partial_result().is_empty());
    }
}
