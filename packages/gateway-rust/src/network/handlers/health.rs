//! Health, liveness, and readiness endpoint handlers.
//!
//! These handlers expose gateway health information for orchestrators
//! (Kubernetes, load balancers) and operational monitoring. They sit on
//! the authentication whitelist: probes carry no credentials.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::network::HealthState;

/// Returns detailed health information as JSON.
///
/// Always returns 200 -- the `state` field in the response body indicates
/// whether the gateway is actually healthy. The audit counters let
/// monitoring catch a silently degrading audit trail (drops or delivery
/// failures) without failing the probe.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let health = state.shutdown.health_state();
    let in_flight = state.shutdown.in_flight_count();
    let uptime_secs = state.start_time.elapsed().as_secs();

    Json(json!({
        "state": health.as_str(),
        "in_flight": in_flight,
        "uptime_secs": uptime_secs,
        "audit": {
            "delivered": state.counters.delivered(),
            "dropped": state.counters.dropped(),
            "delivery_failures": state.counters.delivery_failures(),
        },
    }))
}

/// Kubernetes liveness probe -- always returns 200 OK.
///
/// The liveness probe only checks whether the process is running and
/// responsive. It intentionally does not check downstream dependencies,
/// because a failed liveness probe triggers a pod restart.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe -- returns 200 when ready, 503 otherwise.
///
/// Returns 503 during startup (before `set_ready()`), during graceful
/// shutdown (Draining), and after stop, removing the pod from the
/// Service's endpoint list so no new traffic is routed to it.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
