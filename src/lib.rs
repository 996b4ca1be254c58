//! PDF edge router library.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod upstream;

// Telemetry
pub mod analytics;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
