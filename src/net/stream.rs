//! Blocking byte-exact transfer over one established connection.
//!
//! # Wire format of the framed helpers
//! ```text
//! [u32 little-endian N][N bytes payload]
//! ```
//! Strings are written with a trailing NUL, so `N = text length + 1`.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use crate::net::connection::ConnectionId;
use crate::net::wire::{WireValue, MAX_WIRE_SIZE};
use crate::net::NetError;

/// A byte transport a [`Stream`] can drive.
pub trait Transport: Read + Write {
    /// Bound how long a single blocking read may stall before it reports
    /// would-block. Transports without timeouts ignore this.
    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }
}

/// One connected socket.
///
/// Operations need `&mut self`; a stream has exactly one owner at a time.
/// Dropping the stream closes the socket.
#[derive(Debug)]
pub struct Stream<T: Transport = TcpStream> {
    transport: T,
    id: ConnectionId,
    read_deadline: Option<Duration>,
}

impl Stream<TcpStream> {
    /// Get the remote address of the connection.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.transport.peer_addr()
    }

    /// Get the local address of the connection.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }
}

impl<T: Transport> Stream<T> {
    /// Wrap an already connected transport.
    pub fn from_transport(transport: T) -> Self {
        Self {
            transport,
            id: ConnectionId::new(),
            read_deadline: None,
        }
    }

    /// This stream's ID, as it appears in log events.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Bound the total time a single [`read`](Self::read) may wait for data.
    ///
    /// Every blocking call inside `read` is limited to what remains of the
    /// deadline. `None` (the default) waits indefinitely on a stalled peer.
    pub fn set_read_deadline(&mut self, deadline: Option<Duration>) -> Result<(), NetError> {
        self.transport
            .set_read_timeout(deadline)
            .map_err(NetError::Read)?;
        self.read_deadline = deadline;
        Ok(())
    }

    /// Current read deadline.
    pub fn read_deadline(&self) -> Option<Duration> {
        self.read_deadline
    }

    /// Fill `buf` completely.
    ///
    /// Partial reads are accumulated. Would-block and interrupted reads are
    /// retried; end of stream or any other error fails the read.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), NetError> {
        let expected = buf.len();
        let started = Instant::now();
        let mut received = 0;

        while received < expected {
            if let Some(deadline) = self.read_deadline {
                let remaining = deadline.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    tracing::warn!(
                        connection_id = %self.id,
                        received,
                        expected,
                        "Read deadline elapsed"
                    );
                    return Err(NetError::Timeout { received, expected });
                }
                // Each blocking call may only use what is left of the deadline.
                self.transport
                    .set_read_timeout(Some(remaining))
                    .map_err(NetError::Read)?;
            }

            match self.transport.read(&mut buf[received..]) {
                Ok(0) => {
                    tracing::debug!(
                        connection_id = %self.id,
                        received,
                        expected,
                        "Peer closed connection during read"
                    );
                    return Err(NetError::Closed { received, expected });
                }
                Ok(n) => received += n,
                Err(e) if is_transient(&e) => std::thread::yield_now(),
                Err(e) => {
                    tracing::debug!(connection_id = %self.id, error = %e, "Read failed");
                    return Err(NetError::Read(e));
                }
            }
        }

        tracing::trace!(connection_id = %self.id, bytes = expected, "Read complete");
        Ok(())
    }

    /// Send `buf` with a single transport call.
    ///
    /// Fails if the transport accepts fewer bytes than `buf.len()`.
    pub fn write(&mut self, buf: &[u8]) -> Result<(), NetError> {
        let expected = buf.len();
        let written = self.transport.write(buf).map_err(|e| {
            tracing::debug!(connection_id = %self.id, error = %e, "Write failed");
            NetError::Write(e)
        })?;

        if written != expected {
            tracing::debug!(connection_id = %self.id, written, expected, "Short write");
            return Err(NetError::ShortWrite { written, expected });
        }

        tracing::trace!(connection_id = %self.id, bytes = expected, "Write complete");
        Ok(())
    }

    /// Read one fixed-width little-endian value.
    pub fn read_value<V: WireValue>(&mut self) -> Result<V, NetError> {
        let mut raw = [0u8; MAX_WIRE_SIZE];
        self.read(&mut raw[..V::SIZE])?;
        Ok(V::decode(&raw[..V::SIZE]))
    }

    /// Write one fixed-width little-endian value.
    pub fn write_value<V: WireValue>(&mut self, value: &V) -> Result<(), NetError> {
        let mut raw = [0u8; MAX_WIRE_SIZE];
        value.encode(&mut raw[..V::SIZE]);
        self.write(&raw[..V::SIZE])
    }

    /// Read a length-prefixed payload into `buf` and return its length.
    ///
    /// # Panics
    /// If the declared length is not strictly less than `buf.len()`.
    pub fn read_string(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        let len = self.read_value::<u32>()? as usize;
        assert!(
            len < buf.len(),
            "declared string length {} exceeds buffer capacity {}",
            len,
            buf.len()
        );
        self.read(&mut buf[..len])?;
        Ok(len)
    }

    /// Read a string written by [`write_string`](Self::write_string).
    ///
    /// `max_size` bounds the payload, terminator included, as in
    /// [`read_string`](Self::read_string), and panics the same way. Use
    /// [`read_str_bounded`](Self::read_str_bounded) for peer-controlled input.
    pub fn read_str(&mut self, max_size: usize) -> Result<String, NetError> {
        let mut buf = vec![0u8; max_size];
        let len = self.read_string(&mut buf)?;

        decode_string(&buf[..len])
    }

    /// Read a string written by [`write_string`](Self::write_string) from an
    /// untrusted peer.
    ///
    /// A declared length of `max_size` or more fails with
    /// [`NetError::Oversized`] instead of panicking. The oversized payload is
    /// drained first so the stream stays framed.
    pub fn read_str_bounded(&mut self, max_size: usize) -> Result<String, NetError> {
        let len = self.read_value::<u32>()? as usize;
        if len >= max_size {
            tracing::warn!(connection_id = %self.id, len, max_size, "Oversized string rejected");
            self.discard(len)?;
            return Err(NetError::Oversized { len, max: max_size });
        }

        let mut buf = vec![0u8; len];
        self.read(&mut buf)?;
        decode_string(&buf)
    }

    /// Read and drop exactly `len` bytes.
    pub fn discard(&mut self, mut len: usize) -> Result<(), NetError> {
        let mut scratch = [0u8; 4096];
        while len > 0 {
            let chunk = len.min(scratch.len());
            self.read(&mut scratch[..chunk])?;
            len -= chunk;
        }
        Ok(())
    }

    /// Write `text` as a length-prefixed, NUL-terminated payload.
    pub fn write_string(&mut self, text: &str) -> Result<(), NetError> {
        let len = u32::try_from(text.len() + 1)
            .map_err(|_| NetError::InvalidString(format!("{} bytes is too long", text.len())))?;

        let mut payload = Vec::with_capacity(text.len() + 1);
        payload.extend_from_slice(text.as_bytes());
        payload.push(0);

        self.write_value(&len)?;
        self.write(&payload)
    }
}

impl<T: Transport> Drop for Stream<T> {
    fn drop(&mut self) {
        tracing::trace!(connection_id = %self.id, "Stream closed");
    }
}

/// Strip the NUL terminator and validate UTF-8.
fn decode_string(payload: &[u8]) -> Result<String, NetError> {
    let text = match payload.split_last() {
        Some((&0, text)) => text,
        _ => return Err(NetError::InvalidString("missing NUL terminator".into())),
    };

    String::from_utf8(text.to_vec()).map_err(|e| NetError::InvalidString(e.to_string()))
}

fn is_transient(e: &io::Error) -> bool {
    // A socket read timeout surfaces as WouldBlock on Unix, TimedOut on Windows.
    matches!(
        e.kind(),
        ErrorKind::WouldBlock | ErrorKind::Interrupted | ErrorKind::TimedOut
    )
}
