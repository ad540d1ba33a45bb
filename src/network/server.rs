//! TCP Server
//!
//! Accepts connections, gives each one a reader thread, and runs the
//! dispatcher.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{LodeError, Result};
use crate::storage::StorageCore;

use super::{Dispatcher, Message, Peer, PeerEvent};

/// Longest the accept loop sleeps when no connection is pending
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Sent to a connection refused because of `max_connections`
const TOO_MANY_CONNECTIONS: &[u8] = b"too many connections\n";

/// TCP server for LodeKV
///
/// `run` blocks the calling thread; `shutdown` may be called from any other
/// thread (share the server through an `Arc`).
pub struct Server {
    config: Config,
    core: Arc<StorageCore>,
    listener: TcpListener,

    /// Observed by the accept loop and every peer reader
    shutdown_flag: Arc<AtomicBool>,

    /// Dropped on shutdown, which disconnects `shutdown_rx`
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,

    next_peer_id: AtomicU64,
    live_peers: Arc<AtomicUsize>,
}

impl Server {
    /// Create a server and bind its listener
    pub fn new(config: Config, core: Arc<StorageCore>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);

        Ok(Self {
            config,
            core,
            listener,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            next_peer_id: AtomicU64::new(1),
            live_peers: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        let (inbound_tx, inbound_rx) = channel::bounded(self.config.inbound_queue_capacity);
        let (events_tx, events_rx) = channel::unbounded();

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.core),
            inbound_rx,
            events_rx,
            self.shutdown_rx.clone(),
        );
        let dispatcher = thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || dispatcher.run())?;

        tracing::info!("Listening on {}", self.local_addr()?);

        let backoff = self.config.poll_interval().min(ACCEPT_BACKOFF);
        while !self.is_shutting_down() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.spawn_peer(stream, &inbound_tx, &events_tx) {
                        tracing::warn!("Failed to set up connection from {}: {}", addr, e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(backoff),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    thread::sleep(backoff);
                }
            }
        }

        drop(inbound_tx);
        drop(events_tx);
        self.shutdown();

        dispatcher
            .join()
            .map_err(|_| LodeError::Network("dispatcher thread panicked".to_string()))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Signal the server to shut down
    ///
    /// The accept loop and peer readers notice the flag within one poll
    /// interval; the dispatcher wakes immediately and closes every peer.
    pub fn shutdown(&self) {
        if !self.shutdown_flag.swap(true, Ordering::AcqRel) {
            tracing::info!("Shutdown requested");
        }
        self.shutdown_tx.lock().take();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_flag.load(Ordering::Acquire)
    }

    /// Number of connections with a running reader
    pub fn live_connections(&self) -> usize {
        self.live_peers.load(Ordering::Acquire)
    }

    pub fn core(&self) -> &Arc<StorageCore> {
        &self.core
    }

    fn spawn_peer(
        &self,
        stream: TcpStream,
        inbound: &Sender<Message>,
        events: &Sender<PeerEvent>,
    ) -> Result<()> {
        // Accepted sockets may inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;

        if self.live_connections() >= self.config.max_connections {
            tracing::warn!(
                "Refusing connection: {} connections already open",
                self.config.max_connections
            );
            let mut stream = stream;
            stream.write_all(TOO_MANY_CONNECTIONS)?;
            return Ok(());
        }

        stream.set_read_timeout(Some(self.config.poll_interval()))?;

        let id = self.next_peer_id.fetch_add(1, Ordering::Relaxed);
        let peer = Arc::new(Peer::new(id, &stream, self.config.write_timeout())?);
        events.send(PeerEvent::Joined(Arc::clone(&peer)))?;
        self.live_peers.fetch_add(1, Ordering::AcqRel);

        let inbound = inbound.clone();
        let peer_events = events.clone();
        let shutdown = Arc::clone(&self.shutdown_flag);
        let live_peers = Arc::clone(&self.live_peers);
        let buffer_size = self.config.read_buffer_size;

        let spawned = thread::Builder::new()
            .name(format!("peer-{}", id))
            .spawn(move || {
                if let Err(e) = peer.read_loop(stream, &inbound, &shutdown, buffer_size) {
                    tracing::warn!("Error reading from {}: {}", peer.addr(), e);
                }
                peer.close();
                let _ = peer_events.send(PeerEvent::Left(peer.id()));
                live_peers.fetch_sub(1, Ordering::AcqRel);
            });

        if let Err(e) = spawned {
            self.live_peers.fetch_sub(1, Ordering::AcqRel);
            let _ = events.send(PeerEvent::Left(id));
            return Err(e.into());
        }
        Ok(())
    }
}
