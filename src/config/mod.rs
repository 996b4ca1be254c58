//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → handed to the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults so a file may be omitted entirely
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AnalyticsConfig, DeliveryGuarantee, EdgeConfig, EdgeHeadersConfig, LimitsConfig,
    ListenerConfig, ObservabilityConfig, SinkConfig, TimeoutConfig, UpstreamsConfig,
};
