//! Command-line and environment configuration for the gateway binary.
//!
//! Every knob is available both as a flag and as a `GATEWAY_*` environment
//! variable, converted here into the typed configuration structs the rest
//! of the crate consumes.

use std::time::Duration;

use clap::Parser;

use crate::audit::AuditConfig;
use crate::network::NetworkConfig;

/// Gateway process configuration.
#[derive(Debug, Parser)]
#[command(name = "basegate-gateway", version, about = "Basegate edge gateway")]
pub struct GatewayArgs {
    /// Bind address.
    #[arg(long, env = "GATEWAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. 0 means OS-assigned.
    #[arg(long, env = "GATEWAY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Service identifier used in audit records and logs.
    #[arg(long, env = "GATEWAY_SERVICE_ID", default_value = "basegate-gateway")]
    pub service_id: String,

    /// Identity-provider verification endpoint. When unset, every
    /// credential is rejected (the safe fallback).
    #[arg(long, env = "GATEWAY_VERIFY_URL")]
    pub verify_url: Option<String>,

    /// Logging-subsystem ingest endpoint for audit batches. When unset,
    /// audit records are written to the process log stream.
    #[arg(long, env = "GATEWAY_AUDIT_URL")]
    pub audit_url: Option<String>,

    /// Paths exempt from authentication; a trailing `*` matches by prefix.
    #[arg(
        long,
        env = "GATEWAY_AUTH_WHITELIST",
        value_delimiter = ',',
        default_values_t = ["/health".to_string(), "/health/*".to_string()]
    )]
    pub auth_whitelist: Vec<String>,

    /// Allowed CORS origins.
    #[arg(
        long,
        env = "GATEWAY_CORS_ORIGINS",
        value_delimiter = ',',
        default_values_t = ["*".to_string()]
    )]
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "GATEWAY_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Audit queue capacity (records dropped and counted beyond this).
    #[arg(long, env = "GATEWAY_AUDIT_QUEUE_CAPACITY", default_value_t = 1024)]
    pub audit_queue_capacity: usize,

    /// Maximum audit records delivered per batch.
    #[arg(long, env = "GATEWAY_AUDIT_BATCH_SIZE", default_value_t = 64)]
    pub audit_batch_size: usize,

    /// Flush interval for partial audit batches, in milliseconds.
    #[arg(long, env = "GATEWAY_AUDIT_FLUSH_INTERVAL_MS", default_value_t = 1_000)]
    pub audit_flush_interval_ms: u64,

    /// Timeout for outbound calls (verifier, audit delivery), in seconds.
    #[arg(long, env = "GATEWAY_UPSTREAM_TIMEOUT_SECS", default_value_t = 5)]
    pub upstream_timeout_secs: u64,

    /// Emit logs as JSON instead of human-readable lines.
    #[arg(long, env = "GATEWAY_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl GatewayArgs {
    /// Builds the network configuration from the parsed arguments.
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            service_id: self.service_id.clone(),
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            auth_whitelist: self.auth_whitelist.clone(),
        }
    }

    /// Builds the audit pipeline configuration from the parsed arguments.
    #[must_use]
    pub fn audit_config(&self) -> AuditConfig {
        AuditConfig {
            queue_capacity: self.audit_queue_capacity,
            batch_size: self.audit_batch_size,
            flush_interval: Duration::from_millis(self.audit_flush_interval_ms),
        }
    }

    /// Timeout applied to the verifier and audit-sink HTTP clients.
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
