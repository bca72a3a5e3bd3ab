//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! --https
//!     → tls.rs (provision self-signed pair if asked, load PEM files)
//!     → RustlsConfig handed to the HTTP server
//! ```
//!
//! # Design Decisions
//! - TLS is optional; plain HTTP is the default
//! - Provisioning never overwrites existing files

pub mod tls;

pub use tls::{prepare_tls, TlsError};
