//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query, body)
//!     → router.rs (ordered scan over route table)
//!     → matcher.rs (segment match + param extraction)
//!     → handler(state, RouteRequest) or empty 404
//!
//! Route Compilation (at startup):
//!     (method, "/tasks/:id", handler)
//!     → PathPattern::compile
//!     → appended to Router in registration order
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex: literal segments compare as plain strings
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod router;

pub use matcher::{Params, PathPattern, PatternError};
pub use router::{Handler, Response, RouteRequest, Router};
