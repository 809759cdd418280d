//! Operation log contract: the audit emission surface every service uses.
//!
//! Each significant business operation produces exactly one
//! [`OperationLogRecord`], handed to an [`OperationLog`] implementation.
//! The contract is deliberately narrow: it says nothing about transport or
//! storage, only that emission is best-effort and never blocks or fails
//! the business path. Delivery and retention belong to the shared logging
//! subsystem behind the implementation.

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;

/// Outcome of an audited operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The operation completed successfully.
    Success,
    /// The operation failed; `detail` is a short, non-sensitive reason.
    Failure { detail: String },
}

/// One completed (or failed) business operation, recorded as a fact.
///
/// Immutable once constructed: a record is a point-in-time statement about
/// an attempted action, and is never retracted — not even when the request
/// that produced it is later cancelled. All fields are set by the caller;
/// the contract fills in no defaults, since it cannot know business
/// semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLogRecord {
    /// Identity of the actor who performed the operation.
    pub actor: String,
    /// Name of the operation or action performed.
    pub action: String,
    /// Identifier of the resource the operation targeted.
    pub target: String,
    /// Whether the operation succeeded, with failure detail when not.
    pub outcome: Outcome,
    /// Completion time, monotonic per emitting service.
    pub timestamp: Timestamp,
    /// Identifier of the service that performed the operation.
    pub service: String,
}

/// The uniform emission point for audit records.
///
/// `record` is best-effort and non-blocking from the caller's perspective:
/// implementations may enqueue for asynchronous delivery but must return
/// within a bounded, small time and must never surface delivery failures
/// to the caller — an audit subsystem outage must not fail the business
/// operation. Implementations do not deduplicate; callers invoke `record`
/// exactly once per logical operation.
///
/// Implementations must be safe to call concurrently from many
/// simultaneous business operations.
pub trait OperationLog: Send + Sync {
    /// Hands one record to the logging subsystem.
    fn record(&self, entry: OperationLogRecord);
}

/// Discards every record.
///
/// For tests and for services running with auditing disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOperationLog;

impl OperationLog for NullOperationLog {
    fn record(&self, _entry: OperationLogRecord) {}
}
