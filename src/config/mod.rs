//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → command line overrides (main.rs)
//!     → ServiceConfig (validated, immutable)
//!     → startup.rs (reads observability, dataset, tls)
//!     → HttpServer::new (takes ownership; limits and rate_limit
//!       are cloned into AppState and the limiter)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::DatasetConfig;
pub use schema::LimitsConfig;
pub use schema::RateLimitConfig;
pub use schema::ServiceConfig;
pub use schema::TlsConfig;
pub use validation::validate_config;
