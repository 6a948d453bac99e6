//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Open store → Build routes → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal or fatal storage error → Stop accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store, then listener
//! - A storage failure stops the server instead of serving stale state

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
