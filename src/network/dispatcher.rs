//! Dispatch Loop
//!
//! The single place where commands run.
//!
//! Frames from every peer arrive on one channel and are handled one at a
//! time, so commands execute in the order they were read off the network.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam::channel::{select, Receiver};

use crate::error::LodeError;
use crate::protocol::{encode_response, execute_line, Line, Response, RESPONSE_TERMINATOR};
use crate::storage::{DbId, StorageCore, DEFAULT_DATABASE};

use super::{Message, Peer, PeerEvent, PeerId};

/// Serializes command execution for all connections
pub struct Dispatcher {
    core: Arc<StorageCore>,

    /// Database commands run against
    database: DbId,

    /// Registered, live peers
    peers: HashMap<PeerId, Arc<Peer>>,

    inbound: Receiver<Message>,
    events: Receiver<PeerEvent>,

    /// Any message or a disconnect means stop
    shutdown: Receiver<()>,
}

impl Dispatcher {
    pub fn new(
        core: Arc<StorageCore>,
        inbound: Receiver<Message>,
        events: Receiver<PeerEvent>,
        shutdown: Receiver<()>,
    ) -> Self {
        Self {
            core,
            database: DEFAULT_DATABASE,
            peers: HashMap::new(),
            inbound,
            events,
            shutdown,
        }
    }

    /// Run until shutdown is signalled or every sender is gone
    ///
    /// Closes all registered peers on the way out.
    pub fn run(mut self) {
        tracing::debug!("Dispatcher started");

        // select! holds its receivers borrowed across the arms
        let inbound = self.inbound.clone();
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();

        loop {
            select! {
                recv(inbound) -> message => match message {
                    Ok(message) => self.handle_message(message),
                    Err(_) => break,
                },
                recv(events) -> event => match event {
                    Ok(event) => self.handle_event(event),
                    Err(_) => break,
                },
                recv(shutdown) -> _ => break,
            }
        }

        tracing::info!("Dispatcher stopping, closing {} peers", self.peers.len());
        for peer in self.peers.values() {
            peer.close();
        }
    }

    fn handle_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::Joined(peer) => {
                tracing::debug!("Peer {} ({}) registered", peer.id(), peer.addr());
                self.peers.insert(peer.id(), peer);
            }
            PeerEvent::Left(id) => {
                if self.peers.remove(&id).is_some() {
                    tracing::debug!("Peer {} deregistered", id);
                }
            }
        }
    }

    fn handle_message(&mut self, message: Message) {
        let Some(peer) = message.sender.upgrade() else {
            tracing::debug!("Dropping lines from a closed peer");
            return;
        };

        for line in message.lines {
            let response = match line {
                Line::Command(text) => self.process(&text),
                Line::TooLong { limit } => Response::from(LodeError::CommandTooLong { limit }),
            };
            let bytes = match encode_response(&response) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("Failed to encode response for {}: {}", peer.addr(), e);
                    let mut bytes = e.to_string().into_bytes();
                    bytes.push(RESPONSE_TERMINATOR);
                    bytes
                }
            };

            if let Err(e) = peer.send(&bytes) {
                tracing::warn!("Error writing to {}: {}", peer.addr(), e);
                peer.close();
                self.peers.remove(&peer.id());
                return;
            }
        }
    }

    /// Parse and execute one line against the dispatcher's database
    pub fn process(&self, line: &str) -> Response {
        match self.core.database(self.database) {
            Ok(db) => execute_line(&db, line),
            Err(e) => Response::from(e),
        }
    }

    /// Number of registered peers
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}
