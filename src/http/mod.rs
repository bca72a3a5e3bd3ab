//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → security::rate_limit (search routes only)
//!     → request.rs (decode, validate, request ID)
//!     → handlers.rs (query the store)
//!     → error.rs (map failures to status codes)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::{SearchRequest, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
