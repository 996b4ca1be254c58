//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, edge handler)
//!     → request.rs (buffer body once, client IP, edge metadata)
//!     → [routing layer picks upstream and forwards]
//!     → [analytics capture spawned off the response path]
//!     → response.rs (edge-originated errors only)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{EdgeMetadata, IncomingRequest};
pub use response::EdgeError;
pub use server::{AppState, HttpServer};
