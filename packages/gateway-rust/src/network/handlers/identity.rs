//! Identity echo endpoint.
//!
//! `/whoami` is the reference route demonstrating both platform contracts
//! end to end: the request only reaches this handler if the
//! authentication filter extracted and verified a credential, and the
//! handler emits exactly one operation-log record for the lookup.

use axum::extract::State;
use axum::{Extension, Json};
use basegate_core::{OperationLogRecord, Outcome, RequestContext};
use serde_json::json;

use super::AppState;

/// Returns the verified identity attached to the request.
///
/// Emits one audit record per call; the enqueue is non-blocking, so an
/// audit subsystem outage cannot delay this response.
pub async fn whoami_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Json<serde_json::Value> {
    state.oplog.record(OperationLogRecord {
        actor: ctx.principal.id.clone(),
        action: "identity.whoami".to_string(),
        target: "self".to_string(),
        outcome: Outcome::Success,
        timestamp: state.clock.now(),
        service: state.config.service_id.clone(),
    });

    Json(json!({
        "principal": ctx.principal,
        "trace_id": ctx.trace_id,
    }))
}
