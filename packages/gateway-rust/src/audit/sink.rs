//! Delivery sinks for audit record batches.
//!
//! A sink is the transport edge of the audit pipeline: it hands a batch of
//! records to the shared logging subsystem, which owns persistence,
//! indexing, retention, and any retry/dead-letter policy beyond this
//! process.

use std::time::Duration;

use async_trait::async_trait;
use basegate_core::OperationLogRecord;
use tracing::info;

/// Transport boundary between the audit pipeline and the logging subsystem.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Delivers one batch of records.
    ///
    /// # Errors
    ///
    /// Returns an error when the batch could not be handed off; the pipeline
    /// counts the failure and moves on. Implementations should bound their
    /// own I/O time so a dead subsystem cannot stall the drain task.
    async fn deliver(&self, batch: Vec<OperationLogRecord>) -> anyhow::Result<()>;
}

/// Emits each record as a structured `tracing` event.
///
/// The development and single-process default: records land in the process
/// log stream under the `audit` target instead of a remote subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl AuditSink for TracingSink {
    async fn deliver(&self, batch: Vec<OperationLogRecord>) -> anyhow::Result<()> {
        for record in batch {
            info!(
                target: "audit",
                actor = %record.actor,
                action = %record.action,
                resource = %record.target,
                service = %record.service,
                outcome = ?record.outcome,
                millis = record.timestamp.millis,
                counter = record.timestamp.counter,
                "operation",
            );
        }
        Ok(())
    }
}

/// Posts record batches as JSON to the logging subsystem's ingest endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    /// Creates a sink for the given ingest endpoint with a per-batch timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AuditSink for HttpSink {
    async fn deliver(&self, batch: Vec<OperationLogRecord>) -> anyhow::Result<()> {
        self.client
            .post(&self.endpoint)
            .json(&batch)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
