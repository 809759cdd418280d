//! Per-request identity context propagated behind the gateway.

use serde::{Deserialize, Serialize};

/// Identity claims derived from a verified credential.
///
/// Only derived claims cross internal service boundaries; the raw
/// credential never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier for the authenticated entity.
    pub id: String,
    /// Roles assigned to this principal for authorization checks.
    pub roles: Vec<String>,
}

/// Per-request context carrying identity and tracing information.
///
/// The gateway constructs this after successful verification and attaches
/// it to the forwarded request; downstream handlers read it instead of
/// re-parsing headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// The verified principal on whose behalf the request executes.
    pub principal: Principal,
    /// Distributed trace identifier, mirroring the `x-request-id` header.
    pub trace_id: String,
}
