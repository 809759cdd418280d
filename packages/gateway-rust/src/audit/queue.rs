//! Bounded-queue operation log with a background drain task.
//!
//! `record` is a synchronous `try_send` onto a bounded mpsc channel, so
//! callers never wait behind a slow sink. A single drain task consumes the
//! channel, batches records, and delivers them through an [`AuditSink`].
//! Overflow policy is drop-and-count: availability of the business path
//! outranks completeness of the audit trail, and every drop is visible in
//! [`AuditCounters`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use basegate_core::{OperationLog, OperationLogRecord};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::sink::AuditSink;
use super::AuditConfig;

// ---------------------------------------------------------------------------
// AuditCounters
// ---------------------------------------------------------------------------

/// Shared counters exposing the pipeline's health to probes.
#[derive(Debug, Default)]
pub struct AuditCounters {
    dropped: AtomicU64,
    delivered: AtomicU64,
    delivery_failures: AtomicU64,
}

impl AuditCounters {
    /// Records dropped because the queue was full or the pipeline stopped.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Records successfully handed to the sink.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Records lost because the sink reported a delivery failure.
    #[must_use]
    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// QueuedOperationLog
// ---------------------------------------------------------------------------

/// The [`OperationLog`] handed to business handlers.
///
/// Cheap to clone and safe under arbitrary caller concurrency; the only
/// shared state is the channel itself.
#[derive(Debug, Clone)]
pub struct QueuedOperationLog {
    tx: mpsc::Sender<OperationLogRecord>,
    counters: Arc<AuditCounters>,
}

impl OperationLog for QueuedOperationLog {
    /// Enqueues the record and returns immediately.
    ///
    /// One enqueue attempt per call. If the queue is full or the pipeline
    /// has stopped, the record is dropped and counted — the caller never
    /// observes an error.
    fn record(&self, entry: OperationLogRecord) {
        if let Err(err) = self.tx.try_send(entry) {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(reason = %err, "audit record dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// AuditPipeline
// ---------------------------------------------------------------------------

/// Owns the drain task and the producer side of the audit queue.
///
/// Lifecycle mirrors the rest of the gateway's background work: `spawn`
/// starts the drain task, `stop` signals it, drains what is still queued,
/// performs a final delivery, and waits for the task to finish.
pub struct AuditPipeline {
    log: QueuedOperationLog,
    counters: Arc<AuditCounters>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl AuditPipeline {
    /// Starts the pipeline with the given sink and configuration.
    #[must_use]
    pub fn spawn(sink: Arc<dyn AuditSink>, config: AuditConfig) -> Self {
        let (tx, rx) = mpsc::channel::<OperationLogRecord>(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let counters = Arc::new(AuditCounters::default());

        let handle = tokio::spawn(drain_loop(
            rx,
            sink,
            config,
            Arc::clone(&counters),
            shutdown_rx,
        ));

        Self {
            log: QueuedOperationLog {
                tx,
                counters: Arc::clone(&counters),
            },
            counters,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Returns the shareable operation log for business handlers.
    #[must_use]
    pub fn log(&self) -> Arc<QueuedOperationLog> {
        Arc::new(self.log.clone())
    }

    /// Returns the shared pipeline counters.
    #[must_use]
    pub fn counters(&self) -> Arc<AuditCounters> {
        Arc::clone(&self.counters)
    }

    /// Stops the drain task after flushing everything already enqueued.
    ///
    /// Records handed to `record` after this point are dropped and counted.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Consumes the queue, batching records and delivering them to the sink.
///
/// Batches flush when full or on the flush interval. On shutdown the
/// channel is closed, remaining records are drained, and one final
/// delivery runs before the task exits.
async fn drain_loop(
    mut rx: mpsc::Receiver<OperationLogRecord>,
    sink: Arc<dyn AuditSink>,
    config: AuditConfig,
    counters: Arc<AuditCounters>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut batch: Vec<OperationLogRecord> = Vec::with_capacity(config.batch_size);
    let mut ticker = tokio::time::interval(config.flush_interval);
    // Skip the immediate first tick so an empty pipeline does not flush at startup.
    ticker.tick().await;

    loop {
        tokio::select! {
            entry = rx.recv() => {
                match entry {
                    Some(entry) => {
                        batch.push(entry);
                        if batch.len() >= config.batch_size {
                            flush(sink.as_ref(), &mut batch, &counters).await;
                        }
                    }
                    None => break, // All producers dropped.
                }
            }
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    flush(sink.as_ref(), &mut batch, &counters).await;
                }
            }
            _ = &mut shutdown_rx => break,
        }
    }

    // Drain whatever was enqueued before shutdown, then flush once more.
    rx.close();
    while let Some(entry) = rx.recv().await {
        batch.push(entry);
        if batch.len() >= config.batch_size {
            flush(sink.as_ref(), &mut batch, &counters).await;
        }
    }
    if !batch.is_empty() {
        flush(sink.as_ref(), &mut batch, &counters).await;
    }
}

/// Delivers the current batch, absorbing sink failures into counters.
async fn flush(
    sink: &dyn AuditSink,
    batch: &mut Vec<OperationLogRecord>,
    counters: &AuditCounters,
) {
    let count = batch.len() as u64;
    match sink.deliver(std::mem::take(batch)).await {
        Ok(()) => {
            counters.delivered.fetch_add(count, Ordering::Relaxed);
        }
        Err(err) => {
            counters.delivery_failures.fetch_add(count, Ordering::Relaxed);
            warn!(count, error = %err, "audit batch delivery failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use basegate_core::{Outcome, Timestamp};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn record(n: u64) -> OperationLogRecord {
        OperationLogRecord {
            actor: format!("user-{n}"),
            action: "test.op".to_string(),
            target: format!("resource/{n}"),
            outcome: Outcome::Success,
            timestamp: Timestamp {
                millis: n,
                counter: 0,
                service_id: "gw".to_string(),
            },
            service: "gw".to_string(),
        }
    }

    /// Collects delivered records, optionally after an injected delay.
    struct CollectingSink {
        latency: Duration,
        records: Mutex<Vec<OperationLogRecord>>,
    }

    impl CollectingSink {
        fn new(latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                latency,
                records: Mutex::new(Vec::new()),
            })
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AuditSink for CollectingSink {
        async fn deliver(&self, batch: Vec<OperationLogRecord>) -> anyhow::Result<()> {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.records.lock().unwrap().extend(batch);
            Ok(())
        }
    }

    /// A sink that always fails delivery.
    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn deliver(&self, _batch: Vec<OperationLogRecord>) -> anyhow::Result<()> {
            anyhow::bail!("sink unavailable")
        }
    }

    #[tokio::test]
    async fn records_reach_the_sink_in_order() {
        let sink = CollectingSink::new(Duration::ZERO);
        let mut pipeline = AuditPipeline::spawn(sink.clone(), AuditConfig::default());
        let log = pipeline.log();

        for n in 0..5 {
            log.record(record(n));
        }
        pipeline.stop().await;

        let delivered = sink.records.lock().unwrap();
        assert_eq!(delivered.len(), 5);
        assert_eq!(delivered[0].actor, "user-0");
        assert_eq!(delivered[4].actor, "user-4");
        assert_eq!(pipeline.counters().delivered(), 5);
        assert_eq!(pipeline.counters().dropped(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn full_queue_drops_without_blocking_the_caller() {
        let sink = CollectingSink::new(Duration::from_millis(200));
        let config = AuditConfig {
            queue_capacity: 4,
            batch_size: 4,
            flush_interval: Duration::from_millis(10),
        };
        let mut pipeline = AuditPipeline::spawn(sink.clone(), config);
        let log = pipeline.log();

        let started = Instant::now();
        for n in 0..200 {
            log.record(record(n));
        }
        // 200 enqueue attempts against a sink stalled for 200ms must not
        // serialize behind it.
        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(pipeline.counters().dropped() > 0);

        pipeline.stop().await;
        let counters = pipeline.counters();
        assert_eq!(counters.delivered() + counters.dropped(), 200);
        assert_eq!(sink.len() as u64, counters.delivered());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_callers_never_block_or_panic() {
        let sink = CollectingSink::new(Duration::from_millis(10));
        let config = AuditConfig {
            queue_capacity: 2048,
            batch_size: 64,
            flush_interval: Duration::from_millis(20),
        };
        let mut pipeline = AuditPipeline::spawn(sink.clone(), config);

        let started = Instant::now();
        let mut handles = Vec::new();
        for n in 0..1_000 {
            let log = pipeline.log();
            handles.push(tokio::spawn(async move {
                log.record(record(n));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(started.elapsed() < Duration::from_secs(2));

        pipeline.stop().await;
        let counters = pipeline.counters();
        assert_eq!(counters.delivered() + counters.dropped(), 1_000);
        assert_eq!(sink.len() as u64, counters.delivered());
    }

    #[tokio::test]
    async fn sink_failures_never_surface_to_callers() {
        let mut pipeline = AuditPipeline::spawn(Arc::new(FailingSink), AuditConfig::default());
        let log = pipeline.log();

        for n in 0..3 {
            log.record(record(n));
        }
        pipeline.stop().await;

        let counters = pipeline.counters();
        assert_eq!(counters.delivery_failures(), 3);
        assert_eq!(counters.delivered(), 0);
    }

    #[tokio::test]
    async fn record_after_stop_is_dropped_and_counted() {
        let sink = CollectingSink::new(Duration::ZERO);
        let mut pipeline = AuditPipeline::spawn(sink.clone(), AuditConfig::default());
        let log = pipeline.log();
        pipeline.stop().await;

        log.record(record(1));
        assert_eq!(pipeline.counters().dropped(), 1);
        assert_eq!(sink.len(), 0);
    }

    #[tokio::test]
    async fn stop_flushes_a_partial_batch() {
        let sink = CollectingSink::new(Duration::ZERO);
        let config = AuditConfig {
            queue_capacity: 64,
            batch_size: 64,
            // Long interval: only the shutdown flush can deliver these.
            flush_interval: Duration::from_secs(3600),
        };
        let mut pipeline = AuditPipeline::spawn(sink.clone(), config);
        let log = pipeline.log();

        log.record(record(1));
        log.record(record(2));
        pipeline.stop().await;

        assert_eq!(sink.len(), 2);
    }
}
