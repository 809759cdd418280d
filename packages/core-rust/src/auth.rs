//! Bearer-credential convention shared by every service on the platform.
//!
//! The gateway's authentication filter and every downstream service that
//! recognizes forwarded identity use the same immutable [`HeaderConvention`]
//! to locate a credential in request headers. Extraction is pure string
//! inspection with no side effects: cryptographic verification of the token
//! is the next collaborator in the chain, never this module.

use std::fmt;

use http::header::{HeaderName, AUTHORIZATION};
use http::HeaderMap;
use thiserror::Error;

/// Errors from locating a bearer credential in request headers.
///
/// Every variant is a rejection signal: the gateway translates it into an
/// unauthorized response at the edge. A malformed credential does not become
/// well-formed on retry, and one bad request must not affect others, so
/// these are never retried and never fatal to the process.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionError {
    /// The credential header is absent from the request.
    #[error("credential header is missing")]
    MissingCredential,
    /// The header is present but its value does not match the platform scheme.
    #[error("credential header does not match the expected scheme")]
    MalformedCredential,
    /// The scheme prefix matched but no token follows it.
    #[error("credential token is empty")]
    EmptyCredential,
}

/// An opaque bearer token materialized from a request header.
///
/// The token is sensitive: `Debug` redacts it and there is no `Display`
/// impl, so it cannot reach logs by accident. A credential lives for the
/// duration of one request; only the verifier reads the raw value, via
/// [`Credential::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns the raw token, for handing to the credential verifier.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The platform-wide convention for carrying a bearer credential over HTTP.
///
/// An immutable `(header name, scheme prefix)` pair, constructed once at
/// process start and shared (via `Arc`) with every component that must
/// recognize forwarded identity. Changing either constant is a breaking,
/// coordinated platform-wide change.
///
/// Header-name lookup is case-insensitive (HTTP header names always are);
/// the prefix match is an exact, case-sensitive byte comparison.
#[derive(Debug, Clone)]
pub struct HeaderConvention {
    header: HeaderName,
    prefix: String,
}

impl HeaderConvention {
    /// The platform default: `Authorization: Bearer <token>`.
    ///
    /// The prefix includes the single separating space, per RFC 6750.
    #[must_use]
    pub fn bearer() -> Self {
        Self {
            header: AUTHORIZATION,
            prefix: "Bearer ".to_string(),
        }
    }

    /// Builds a convention with a custom header and prefix.
    pub fn new(header: HeaderName, prefix: impl Into<String>) -> Self {
        Self {
            header,
            prefix: prefix.into(),
        }
    }

    /// The header name credentials are carried in.
    #[must_use]
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// The scheme prefix that must precede the token.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Extracts the bearer credential from a set of request headers.
    ///
    /// Pure and idempotent: the same headers always yield the same result,
    /// and nothing is logged here (the header value is sensitive).
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::MissingCredential`] if the header is absent.
    /// - [`ExtractionError::MalformedCredential`] if the value is not
    ///   visible ASCII or does not start with the exact prefix.
    /// - [`ExtractionError::EmptyCredential`] if nothing (or only
    ///   whitespace) follows the prefix.
    pub fn extract(&self, headers: &HeaderMap) -> Result<Credential, ExtractionError> {
        let value = headers
            .get(&self.header)
            .ok_or(ExtractionError::MissingCredential)?;
        let value = value
            .to_str()
            .map_err(|_| ExtractionError::MalformedCredential)?;
        let rest = value
            .strip_prefix(self.prefix.as_str())
            .ok_or(ExtractionError::MalformedCredential)?;
        // Tolerate at most one extra separating space after the prefix.
        let token = rest.strip_prefix(' ').unwrap_or(rest);
        if token.trim().is_empty() {
            return Err(ExtractionError::EmptyCredential);
        }
        Ok(Credential(token.to_string()))
    }
}

impl Default for HeaderConvention {
    fn default() -> Self {
        Self::bearer()
    }
}
