//! Network configuration types for the gateway.

use std::time::Duration;

/// Top-level network configuration for the gateway.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the gateway.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Identifier of this service in audit records and logs.
    pub service_id: String,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
    /// Paths exempt from authentication. An entry ending in `*` matches by
    /// prefix; anything else matches the path exactly.
    pub auth_whitelist: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            service_id: "basegate-gateway".to_string(),
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            auth_whitelist: vec!["/health".to_string(), "/health/*".to_string()],
        }
    }
}
