//! HTTP handler definitions for the gateway.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod identity;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use identity::whoami_handler;

use std::sync::Arc;
use std::time::Instant;

use basegate_core::{AuditClock, HeaderConvention, OperationLog};

use super::{NetworkConfig, ShutdownController};
use crate::audit::AuditCounters;
use crate::auth::CredentialVerifier;

/// Shared application state passed to all axum handlers via `State`.
///
/// Every capability is injected explicitly here — the header convention,
/// the verifier, and the operation log are constructed once at startup and
/// shared via `Arc`, never looked up ambiently.
#[derive(Clone)]
pub struct AppState {
    /// The platform credential convention (header name + scheme prefix).
    pub convention: Arc<HeaderConvention>,
    /// Verifies extracted credentials against the identity provider.
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Audit emission point for business handlers.
    pub oplog: Arc<dyn OperationLog>,
    /// Monotonic timestamp source for audit records.
    pub clock: Arc<AuditClock>,
    /// Audit pipeline counters, surfaced by the health endpoint.
    pub counters: Arc<AuditCounters>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Network configuration (bind address, whitelist, timeouts).
    pub config: Arc<NetworkConfig>,
    /// Gateway process start time, used for uptime calculation.
    pub start_time: Instant,
}
