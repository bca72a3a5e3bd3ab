//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming search request:
//!     → rate_limit.rs (check per-IP window)
//!     → handler validation (length, blank, NUL)
//!     → crate::sanitize (escape literal delimiter)
//!     → store
//!
//! Every response:
//!     → headers.rs (nosniff, frame and script policy)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input, including forwarding headers

pub mod headers;
pub mod rate_limit;
