//! Network Module
//!
//! TCP server, connection peers and the dispatch loop.
//!
//! ## Architecture
//! ```text
//!  accept loop ──spawn──▶ peer-N thread (read loop)
//!                              │ Message { Weak<Peer>, lines }
//!                              ▼
//!                     bounded inbound channel
//!                              │
//!                              ▼
//!            dispatcher thread (parse → execute → send)
//! ```
//! - One reader thread per connection
//! - One dispatcher thread executes every command, in arrival order
//! - Responses are written by the dispatcher through `Peer::send`

mod server;
mod peer;
mod dispatcher;

pub use server::Server;
pub use peer::{Message, Peer, PeerEvent, PeerId};
pub use dispatcher::Dispatcher;
