//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest (method, path, query, headers, body)
//!     → router.rs (ordered rule lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Dispatch: UpstreamTarget + headers + optional body
//!
//! Rule table (built once at startup):
//!     1. POST /pdf/load   → Load-Service  /pdf/load, body forwarded
//!     2. POST /pdf/query  → Query-Service /pdf/query, body forwarded
//!     3. anything else    → Query-Service, same path + query and method,
//!                           body dropped for GET/HEAD
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Passed explicitly into the handler state; no global registration
//! - Deterministic: same input always matches same rule
//! - First match wins

pub mod matcher;
pub mod router;

pub use router::{Dispatch, RouteError, Routed, Router};
