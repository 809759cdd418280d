//! Audit pipeline: the queued [`basegate_core::OperationLog`] implementation.
//!
//! Business handlers call `record` and return immediately; a single drain
//! task batches records and delivers them through an [`AuditSink`] to the
//! shared logging subsystem. Delivery problems never travel back to the
//! business path — they are logged and counted here.

pub mod queue;
pub mod sink;

pub use queue::{AuditCounters, AuditPipeline, QueuedOperationLog};
pub use sink::{AuditSink, HttpSink, TracingSink};

use std::time::Duration;

/// Tuning knobs for the audit pipeline.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Bounded queue capacity between `record` callers and the drain task.
    /// When full, records are dropped and counted (never blocking callers).
    pub queue_capacity: usize,
    /// Maximum number of records delivered to the sink in one batch.
    pub batch_size: usize,
    /// How often a partially filled batch is flushed anyway.
    pub flush_interval: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            batch_size: 64,
            flush_interval: Duration::from_secs(1),
        }
    }
}
