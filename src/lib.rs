//! # LodeKV
//!
//! A small networked key-value store with:
//! - Line-oriented text protocol over TCP
//! - One dispatch thread executing every command in arrival order
//! - Numbered databases, each with a map and a secondary list
//! - Per-database append-only journal with replay recovery
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │              (one reader thread per peer)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ lines
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Dispatch Loop                             │
//! │          (parse → execute → respond, one at a time)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │  StorageCore  │
//!               └───────┬───────┘
//!                       │ id → Database
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ Map + List  │ ───────▶ │   Journal    │
//!   │  (RwLock)   │  append  │ (per db, CRC)│
//!   └─────────────┘          └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod journal;
pub mod storage;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LodeError, Result};
pub use config::Config;
pub use storage::{Database, StorageCore};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LodeKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
