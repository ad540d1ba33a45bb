//! Connection Peer
//!
//! Server-side half of one client connection.

use std::io::{ErrorKind, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam::channel::Sender;
use parking_lot::Mutex;

use crate::error::{LodeError, Result};
use crate::protocol::{read_frame, Line, LineDecoder};

/// Identifier of a live connection
pub type PeerId = u64;

/// Lines read from a peer, on their way to the dispatcher
#[derive(Debug)]
pub struct Message {
    /// Where the responses go; does not keep the peer alive
    pub sender: Weak<Peer>,

    /// Every line one read completed, in order
    pub lines: Vec<Line>,
}

/// Registration events consumed by the dispatcher
#[derive(Debug)]
pub enum PeerEvent {
    Joined(Arc<Peer>),
    Left(PeerId),
}

/// One client connection
///
/// Reading happens on the peer's own thread in [`Peer::read_loop`]; writing
/// happens from the dispatcher through [`Peer::send`].
#[derive(Debug)]
pub struct Peer {
    id: PeerId,

    /// Peer address for logging
    addr: String,

    /// Write half (a clone of the accepted stream)
    writer: Mutex<TcpStream>,
}

impl Peer {
    /// Wrap an accepted stream
    ///
    /// Disables Nagle's algorithm and applies the write timeout to the write half.
    pub fn new(id: PeerId, stream: &TcpStream, write_timeout: Option<Duration>) -> Result<Self> {
        let addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;
        let writer = stream.try_clone()?;
        writer.set_write_timeout(write_timeout)?;

        Ok(Self {
            id,
            addr,
            writer: Mutex::new(writer),
        })
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Write a response back to this peer's socket
    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Shut the socket down in both directions
    ///
    /// Unblocks the peer's read loop.
    pub fn close(&self) {
        if let Err(e) = self.writer.lock().shutdown(Shutdown::Both) {
            if e.kind() != ErrorKind::NotConnected {
                tracing::debug!("Error closing {}: {}", self.addr, e);
            }
        }
    }

    /// Read lines until the client leaves, the socket fails, or shutdown
    ///
    /// `stream` must have a read timeout set; each timeout is a chance to
    /// notice `shutdown`, and hands an unterminated line held since the last
    /// read to the dispatcher. Lines of `buffer_size` bytes or more are
    /// rejected. Returns `Ok(())` for every ordinary way a connection ends.
    pub fn read_loop(
        self: &Arc<Self>,
        mut stream: TcpStream,
        inbound: &Sender<Message>,
        shutdown: &AtomicBool,
        buffer_size: usize,
    ) -> Result<()> {
        tracing::debug!("Connection established from {}", self.addr);
        let mut buf = vec![0u8; buffer_size];
        let mut decoder = LineDecoder::new(buffer_size);

        loop {
            if shutdown.load(Ordering::Acquire) {
                tracing::debug!("Stopping reader for {}: server shutting down", self.addr);
                return Ok(());
            }

            let lines = match read_frame(&mut stream, &mut buf) {
                Ok(Some(chunk)) => {
                    tracing::trace!("Received {} bytes from {}", chunk.len(), self.addr);
                    decoder.decode(&chunk)
                }
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.addr);
                    if let Some(line) = decoder.flush() {
                        self.forward(inbound, vec![line]);
                    }
                    return Ok(());
                }
                Err(LodeError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    decoder.flush().into_iter().collect()
                }
                Err(LodeError::Io(ref e))
                    if matches!(
                        e.kind(),
                        ErrorKind::ConnectionReset
                            | ErrorKind::ConnectionAborted
                            | ErrorKind::NotConnected
                    ) =>
                {
                    tracing::debug!("Connection to {} ended: {}", self.addr, e);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            if !lines.is_empty() && !self.forward(inbound, lines) {
                tracing::debug!("Dispatcher gone, stopping reader for {}", self.addr);
                return Ok(());
            }
        }
    }

    /// Queue lines for the dispatcher; `false` once it is gone
    fn forward(self: &Arc<Self>, inbound: &Sender<Message>, lines: Vec<Line>) -> bool {
        let message = Message {
            sender: Arc::downgrade(self),
            lines,
        };
        inbound.send(message).is_ok()
    }
}
