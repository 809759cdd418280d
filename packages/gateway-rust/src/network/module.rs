//! Network module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` creates resources,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! connections. This separation lets the binary wire the audit pipeline
//! and verifier between construction and listening, and lets tests bind
//! ephemeral ports.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use basegate_core::{AuditClock, HeaderConvention, OperationLog};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::auth::auth_filter;
use super::config::NetworkConfig;
use super::handlers::{
    health_handler, liveness_handler, readiness_handler, whoami_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::audit::AuditCounters;
use crate::auth::CredentialVerifier;

/// How long `serve` waits for in-flight requests after the listener stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The capabilities injected into the gateway at startup.
///
/// Constructed once in the binary and shared by reference everywhere —
/// no component discovers these ambiently.
#[derive(Clone)]
pub struct GatewayServices {
    /// The platform credential convention.
    pub convention: Arc<HeaderConvention>,
    /// Credential verifier (identity-provider client).
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Operation log implementation (usually the queued audit pipeline).
    pub oplog: Arc<dyn OperationLog>,
    /// Monotonic timestamp source for audit records.
    pub clock: Arc<AuditClock>,
    /// Audit pipeline counters for the health endpoint.
    pub counters: Arc<AuditCounters>,
}

/// Manages the gateway HTTP server lifecycle.
///
/// 1. `new()` -- allocates shared state (shutdown controller)
/// 2. `start()` -- binds the TCP listener to the configured address
/// 3. `serve()` -- accepts connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    services: GatewayServices,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, services: GatewayServices) -> Self {
        Self {
            config,
            services,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    ///
    /// The binary uses this to check health state or trigger shutdown from
    /// outside the serve loop.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- detailed health JSON (whitelisted)
    /// - `GET /health/live` -- Kubernetes liveness probe (whitelisted)
    /// - `GET /health/ready` -- Kubernetes readiness probe (whitelisted)
    /// - `GET /whoami` -- verified identity echo (authenticated)
    ///
    /// The authentication filter wraps every route; the transport stack
    /// (request id, tracing, compression, CORS, timeout) wraps the filter.
    #[must_use]
    pub fn build_router(&self) -> Router {
        let state = AppState {
            convention: Arc::clone(&self.services.convention),
            verifier: Arc::clone(&self.services.verifier),
            oplog: Arc::clone(&self.services.oplog),
            clock: Arc::clone(&self.services.clock),
            counters: Arc::clone(&self.services.counters),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
        };

        let layers = build_http_layers(&self.config);

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route("/whoami", get(whoami_handler))
            .layer(from_fn_with_state(state.clone(), auth_filter))
            .layer(layers)
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until the shutdown future resolves.
    ///
    /// After the shutdown signal:
    /// 1. Health state transitions to Draining (readiness goes 503)
    /// 2. The listener stops accepting connections
    /// 3. Waits up to 30 seconds for in-flight requests to complete
    /// 4. Health state transitions to Stopped
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .expect("start() must be called before serve()");
        let router = self.build_router();

        self.shutdown.set_ready();
        info!("gateway ready");

        let trigger = Arc::clone(&self.shutdown);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("shutdown signal received, draining");
                trigger.trigger_shutdown();
            })
            .await?;

        if !self.shutdown.wait_for_drain(DRAIN_TIMEOUT).await {
            warn!(
                in_flight = self.shutdown.in_flight_count(),
                "drain timeout expired with requests still in flight"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::header::AUTHORIZATION;
    use axum::http::{Request, StatusCode};
    use basegate_core::{OperationLogRecord, Outcome, Principal};
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crate::auth::StaticVerifier;

    /// Captures emitted records for assertions.
    #[derive(Default)]
    struct RecordingLog(Mutex<Vec<OperationLogRecord>>);

    impl OperationLog for RecordingLog {
        fn record(&self, entry: OperationLogRecord) {
            self.0.lock().unwrap().push(entry);
        }
    }

    fn test_module(oplog: Arc<dyn OperationLog>) -> NetworkModule {
        let verifier = StaticVerifier::default().with_token(
            "abc123",
            Principal {
                id: "user-42".to_string(),
                roles: vec!["reader".to_string()],
            },
        );
        let services = GatewayServices {
            convention: Arc::new(HeaderConvention::bearer()),
            verifier: Arc::new(verifier),
            oplog,
            clock: Arc::new(AuditClock::new("test-gateway")),
            counters: Arc::new(AuditCounters::default()),
        };
        NetworkModule::new(NetworkConfig::default(), services)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoints_work_without_credentials() {
        let module = test_module(Arc::new(RecordingLog::default()));
        let router = module.build_router();

        let health = router.clone().oneshot(get("/health", None)).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        let json = body_json(health).await;
        assert_eq!(json["state"], "starting");

        let live = router
            .clone()
            .oneshot(get("/health/live", None))
            .await
            .unwrap();
        assert_eq!(live.status(), StatusCode::OK);

        // Not ready yet: readiness must say so.
        let ready = router.oneshot(get("/health/ready", None)).await.unwrap();
        assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn whoami_round_trip_verifies_and_audits() {
        let log = Arc::new(RecordingLog::default());
        let module = test_module(log.clone());
        module.shutdown_controller().set_ready();
        let router = module.build_router();

        let response = router
            .oneshot(get("/whoami", Some("Bearer abc123")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["principal"]["id"], "user-42");

        let records = log.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].actor, "user-42");
        assert_eq!(records[0].action, "identity.whoami");
        assert_eq!(records[0].outcome, Outcome::Success);
        assert_eq!(records[0].service, "basegate-gateway");
    }

    #[tokio::test]
    async fn whoami_rejections_leave_no_audit_trail() {
        let log = Arc::new(RecordingLog::default());
        let module = test_module(log.clone());
        module.shutdown_controller().set_ready();
        let router = module.build_router();

        // Missing header.
        let response = router
            .clone()
            .oneshot(get("/whoami", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Wrong scheme.
        let response = router
            .clone()
            .oneshot(get("/whoami", Some("Token abc123")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Empty token.
        let response = router
            .oneshot(get("/whoami", Some("Bearer ")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert!(log.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_binds_an_ephemeral_port() {
        let mut module = test_module(Arc::new(RecordingLog::default()));
        let port = module.start().await.unwrap();
        assert_ne!(port, 0);
    }
}
