//! Fire-and-forget analytics emission.
//!
//! ```text
//! request task ── emit() ──try_send──▶ bounded queue ──▶ AnalyticsWorker ──▶ sink
//!                 (never awaits)                          (own task)
//! ```
//!
//! The request task never waits on the queue or the sink. A full queue drops
//! the event; a failed write is logged and counted. On shutdown the worker
//! either stops immediately or drains what is queued, per `DeliveryGuarantee`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use crate::analytics::event::AnalyticsEvent;
use crate::analytics::sink::{AnalyticsSink, SinkError};
use crate::config::{AnalyticsConfig, DeliveryGuarantee};
use crate::observability::metrics;

/// Result of handing an event to the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    Queued,
    /// Queue full or worker gone; the event is lost.
    Dropped,
    Disabled,
}

/// Cheap, cloneable handle used by request handlers.
#[derive(Debug, Clone)]
pub struct AnalyticsEmitter {
    tx: Option<mpsc::Sender<AnalyticsEvent>>,
}

impl AnalyticsEmitter {
    /// Create an emitter and the queue its worker reads from.
    pub fn channel(capacity: usize) -> (Self, AnalyticsQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, AnalyticsQueue { rx })
    }

    /// An emitter that captures nothing.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue an event without waiting.
    pub fn emit(&self, event: AnalyticsEvent) -> EmitOutcome {
        let Some(tx) = &self.tx else {
            return EmitOutcome::Disabled;
        };

        match tx.try_send(event) {
            Ok(()) => {
                metrics::record_analytics("queued");
                EmitOutcome::Queued
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Analytics queue full, dropping event");
                metrics::record_analytics("dropped");
                EmitOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Analytics worker stopped, dropping event");
                metrics::record_analytics("dropped");
                EmitOutcome::Dropped
            }
        }
    }
}

/// Receiving half of the emitter queue.
#[derive(Debug)]
pub struct AnalyticsQueue {
    rx: mpsc::Receiver<AnalyticsEvent>,
}

impl AnalyticsQueue {
    /// Take the next queued event, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<AnalyticsEvent> {
        self.rx.try_recv().ok()
    }

    /// Attach a sink, producing the worker that drains this queue.
    pub fn into_worker(self, sink: Arc<dyn AnalyticsSink>, settings: WorkerSettings) -> AnalyticsWorker {
        AnalyticsWorker {
            rx: self.rx,
            sink,
            settings,
        }
    }
}

/// Worker timing and shutdown behavior.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub delivery: DeliveryGuarantee,
    pub write_timeout: Duration,
    pub drain_timeout: Duration,
}

impl From<&AnalyticsConfig> for WorkerSettings {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            delivery: config.delivery,
            write_timeout: Duration::from_secs(config.write_timeout_secs),
            drain_timeout: Duration::from_secs(config.drain_timeout_secs),
        }
    }
}

/// Counters reported when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub written: u64,
    pub failed: u64,
    /// Events still queued when the worker stopped.
    pub abandoned: u64,
}

/// Background task writing queued events to the sink.
pub struct AnalyticsWorker {
    rx: mpsc::Receiver<AnalyticsEvent>,
    sink: Arc<dyn AnalyticsSink>,
    settings: WorkerSettings,
}

impl AnalyticsWorker {
    /// Run until shutdown is signalled or every emitter is dropped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        tracing::info!(delivery = ?self.settings.delivery, "Analytics worker started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                next = self.rx.recv() => match next {
                    Some(event) => write_event(self.sink.as_ref(), self.settings.write_timeout, &event, &mut stats).await,
                    None => {
                        tracing::info!(?stats, "Analytics worker stopped: all emitters dropped");
                        return stats;
                    }
                },
            }
        }

        // No new events once shutdown starts.
        self.rx.close();

        match self.settings.delivery {
            DeliveryGuarantee::BestEffort => {}
            DeliveryGuarantee::DrainOnShutdown => {
                let rx = &mut self.rx;
                let sink = self.sink.as_ref();
                let write_timeout = self.settings.write_timeout;
                let drain = async {
                    while let Some(event) = rx.recv().await {
                        write_event(sink, write_timeout, &event, &mut stats).await;
                    }
                };
                if tokio::time::timeout(self.settings.drain_timeout, drain).await.is_err() {
                    tracing::warn!(
                        timeout = ?self.settings.drain_timeout,
                        "Analytics drain timed out"
                    );
                }
            }
        }

        while self.rx.try_recv().is_ok() {
            stats.abandoned += 1;
        }
        if stats.abandoned > 0 {
            tracing::warn!(abandoned = stats.abandoned, "Analytics events abandoned at shutdown");
        }

        tracing::info!(?stats, "Analytics worker stopped");
        stats
    }
}

async fn write_event(
    sink: &dyn AnalyticsSink,
    write_timeout: Duration,
    event: &AnalyticsEvent,
    stats: &mut WorkerStats,
) {
    let result = match tokio::time::timeout(write_timeout, sink.write_data_point(event)).await {
        Ok(result) => result,
        Err(_) => Err(SinkError::Timeout(write_timeout)),
    };

    match result {
        Ok(()) => {
            stats.written += 1;
            metrics::record_analytics("written");
        }
        Err(e) => {
            stats.failed += 1;
            metrics::record_analytics("failed");
            tracing::warn!(error = %e, "Analytics sink write failed");
        }
    }
}
