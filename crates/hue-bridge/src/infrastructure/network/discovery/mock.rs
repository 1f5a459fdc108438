//! Mock datagram source for unit testing.
//!
//! Allows tests to script the datagrams (and errors) the discovery receive
//! loop sees, without real sockets or a multicast-capable network.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::DatagramSource;

enum ScriptedEvent {
    Datagram(Vec<u8>, SocketAddr),
    Error(io::ErrorKind),
}

/// A mock implementation of [`DatagramSource`].
///
/// Scripted events are returned in order.  Once the script is exhausted,
/// every read sleeps for the configured read timeout and then fails with
/// `WouldBlock`, exactly like an idle socket.
pub struct MockDatagramSource {
    script: Mutex<VecDeque<ScriptedEvent>>,
    read_timeout: Mutex<Option<Duration>>,
}

impl MockDatagramSource {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            read_timeout: Mutex::new(None),
        }
    }

    /// Queues a datagram from `from`.
    pub fn push_datagram(&self, payload: &[u8], from: SocketAddr) {
        self.lock_script()
            .push_back(ScriptedEvent::Datagram(payload.to_vec(), from));
    }

    /// Queues a receive error of the given kind.
    pub fn push_error(&self, kind: io::ErrorKind) {
        self.lock_script().push_back(ScriptedEvent::Error(kind));
    }

    /// Returns the number of scripted events not yet consumed.
    pub fn pending(&self) -> usize {
        self.lock_script().len()
    }

    fn lock_script(&self) -> MutexGuard<'_, VecDeque<ScriptedEvent>> {
        // Poisoning is ignored; the queue is never left half-updated.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockDatagramSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DatagramSource for MockDatagramSource {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        *self.read_timeout.lock().unwrap_or_else(|e| e.into_inner()) = timeout;
        Ok(())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let next = self.lock_script().pop_front();
        match next {
            Some(ScriptedEvent::Datagram(payload, from)) => {
                // Truncate like a real socket does when the buffer is short.
                let len = payload.len().min(buf.len());
                buf[..len].copy_from_slice(&payload[..len]);
                Ok((len, from))
            }
            Some(ScriptedEvent::Error(kind)) => Err(io::Error::new(kind, "scripted error")),
            None => {
                let timeout = *self.read_timeout.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(timeout) = timeout {
                    std::thread::sleep(timeout);
                }
                Err(io::Error::new(io::ErrorKind::WouldBlock, "no datagram"))
            }
        }
    }
}
