//! # Riorita
//!
//! A blocking client for the Riorita key-value store:
//! - Length-prefixed little-endian binary protocol over one TCP connection
//! - Strict validation of every response field
//! - Quiet reconnection with a bounded linear-backoff retry loop
//! - Connection rotation after a fixed number of operations
//! - Key namespacing through a configurable prefix
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │        ping / has / get / put / delete + key prefix          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ request frame (protocol)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Executor                               │
//! │        timing · rotation · retry with linear backoff         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Connection                              │
//! │      one socket · BufReader/BufWriter · operation count      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use riorita::Client;
//!
//! let mut client = Client::new("127.0.0.1", 8024);
//! client.set_key_prefix("ns:");
//! client.put("a", &[1, 2, 3])?;
//! assert_eq!(client.get("a")?, Some(vec![1, 2, 3]));
//! # Ok::<(), riorita::RioritaError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorClass, Result, RioritaError};
pub use config::Config;
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Riorita
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
