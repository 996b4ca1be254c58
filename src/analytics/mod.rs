//! Analytics capture subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest body
//!     → body.rs (JSON or text, decided by Content-Type)
//! IncomingRequest + CapturedBody + ResponseSummary
//!     → event.rs (AnalyticsEvent: indexes + blobs)
//!     → emitter.rs (bounded queue, never awaited by the request)
//!     → sink.rs (log or HTTP collector, best-effort)
//! ```
//!
//! # Design Decisions
//! - Telemetry failures stay inside the worker task
//! - At-most-once: no persistence, no retries
//! - Shutdown drain is configurable (best-effort vs drain)

pub mod body;
pub mod emitter;
pub mod event;
pub mod sink;

pub use body::CapturedBody;
pub use emitter::{AnalyticsEmitter, AnalyticsQueue, AnalyticsWorker, EmitOutcome, WorkerSettings, WorkerStats};
pub use event::{AnalyticsEvent, ResponseSummary};
pub use sink::{build_sink, AnalyticsSink, HttpSink, LogSink, SinkError};
