//! Edge authentication filter.
//!
//! Runs on every request before any business handler: checks the
//! whitelist, extracts the bearer credential per the platform convention,
//! hands it to the injected verifier, and attaches the resulting
//! `RequestContext` to the request. Any extraction or verification failure
//! becomes an HTTP 401 at the edge — nothing reaches downstream handlers.
//!
//! The raw header value and token are never logged here; only the error
//! kind is.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use basegate_core::RequestContext;
use serde_json::json;
use tracing::debug;

use super::handlers::AppState;
use super::shutdown::HealthState;

/// The axum middleware enforcing the credential extraction contract.
///
/// Also owns the per-request in-flight guard and refuses new work while
/// the gateway is draining (health probes stay reachable through the
/// whitelist).
pub async fn auth_filter(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let _guard = state.shutdown.in_flight_guard();

    if is_whitelisted(&state.config.auth_whitelist, request.uri().path()) {
        return next.run(request).await;
    }

    if state.shutdown.health_state() != HealthState::Ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "unavailable" })),
        )
            .into_response();
    }

    let credential = match state.convention.extract(request.headers()) {
        Ok(credential) => credential,
        Err(err) => {
            debug!(reason = %err, "credential extraction failed");
            return unauthorized(&err.to_string());
        }
    };

    let principal = match state.verifier.verify(&credential).await {
        Ok(principal) => principal,
        Err(err) => {
            debug!(reason = %err, "credential verification failed");
            return unauthorized("credential verification failed");
        }
    };

    let trace_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    request
        .extensions_mut()
        .insert(RequestContext { principal, trace_id });

    next.run(request).await
}

/// Whitelist check: entries ending in `*` match by prefix, everything else
/// matches the path exactly.
fn is_whitelisted(whitelist: &[String], path: &str) -> bool {
    whitelist.iter().any(|entry| {
        entry
            .strip_suffix('*')
            .map_or(entry == path, |prefix| path.starts_with(prefix))
    })
}

fn unauthorized(reason: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized", "reason": reason })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_support::{state_with_verifier, test_state};
    use crate::StaticVerifier;
    use axum::body::{to_bytes, Body};
    use axum::http::header::AUTHORIZATION;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use basegate_core::Principal;
    use tower::ServiceExt;

    #[test]
    fn whitelist_exact_and_prefix_matching() {
        let whitelist = vec!["/health".to_string(), "/health/*".to_string()];
        assert!(is_whitelisted(&whitelist, "/health"));
        assert!(is_whitelisted(&whitelist, "/health/live"));
        assert!(is_whitelisted(&whitelist, "/health/ready"));
        assert!(!is_whitelisted(&whitelist, "/healthz"));
        assert!(!is_whitelisted(&whitelist, "/whoami"));
        assert!(!is_whitelisted(&[], "/health"));
    }

    async fn echo_principal(
        axum::Extension(ctx): axum::Extension<RequestContext>,
    ) -> String {
        ctx.principal.id
    }

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/echo", get(echo_principal))
            .route("/health", get(|| async { "ok" }))
            .layer(from_fn_with_state(state.clone(), auth_filter))
            .with_state(state)
    }

    fn verified_state() -> AppState {
        let verifier = StaticVerifier::default().with_token(
            "abc123",
            Principal {
                id: "user-42".to_string(),
                roles: vec!["admin".to_string()],
            },
        );
        let state = state_with_verifier(verifier);
        state.shutdown.set_ready();
        state
    }

    async fn get_with_auth(router: Router, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/echo");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_credential_reaches_the_handler() {
        let router = test_router(verified_state());
        let (status, body) = get_with_auth(router, Some("Bearer abc123")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user-42");
    }

    #[tokio::test]
    async fn missing_header_is_rejected_at_the_edge() {
        let router = test_router(verified_state());
        let (status, body) = get_with_auth(router, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing"));
    }

    #[tokio::test]
    async fn wrong_scheme_is_rejected_at_the_edge() {
        let router = test_router(verified_state());
        let (status, _) = get_with_auth(router, Some("Token abc123")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_token_is_rejected_at_the_edge() {
        let router = test_router(verified_state());
        let (status, body) = get_with_auth(router, Some("Bearer ")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("empty"));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected_by_the_verifier() {
        let router = test_router(verified_state());
        let (status, _) = get_with_auth(router, Some("Bearer wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejection_body_never_contains_the_token() {
        let router = test_router(verified_state());
        let (_, body) = get_with_auth(router, Some("Token super-secret")).await;
        assert!(!body.contains("super-secret"));
    }

    #[tokio::test]
    async fn whitelisted_path_skips_authentication() {
        let state = verified_state();
        let router = test_router(state);
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn draining_gateway_refuses_new_work() {
        let state = verified_state();
        state.shutdown.trigger_shutdown();
        let router = test_router(state);
        let (status, _) = get_with_auth(router, Some("Bearer abc123")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn gateway_not_ready_refuses_work() {
        let state = test_state(); // still Starting
        let router = test_router(state);
        let (status, _) = get_with_auth(router, Some("Bearer abc123")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
