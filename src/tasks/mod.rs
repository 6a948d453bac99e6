//! Task API.
//!
//! # Routes
//! ```text
//! GET    /tasks?search=S       → 200 [task, ...]
//! POST   /tasks                → 201 | 400 {message}
//! PUT    /tasks/:id            → 204 | 400 {message}
//! DELETE /tasks/:id            → 204 | 400 {message}
//! PATCH  /tasks/:id/complete   → 204 | 400 {message}
//! ```

pub mod error;
pub mod handlers;
pub mod model;

pub use error::ApiError;
pub use handlers::{routes, TaskRouter};
pub use model::Task;
