//! Credential verification seam.
//!
//! Extraction yields an opaque token; deciding whether that token is valid
//! belongs to the identity provider, not the gateway. The
//! [`CredentialVerifier`] trait is that seam: it is injected explicitly
//! (constructor parameter, never ambient lookup), and implementations only
//! transport the token — no signing or verification algorithms live in
//! this repository.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use basegate_core::{Credential, Principal};
use serde::Serialize;
use thiserror::Error;

/// Errors from verifying an extracted credential.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The identity provider rejected the credential.
    #[error("credential rejected by identity provider")]
    Rejected,
    /// The identity provider could not be reached or answered abnormally.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Verifies an extracted credential and derives identity claims from it.
///
/// Invoked by the authentication filter after extraction succeeds. Both
/// error variants cause an edge rejection; they differ only in what the
/// gateway logs.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verifies the credential, returning the principal it identifies.
    async fn verify(&self, credential: &Credential) -> Result<Principal, VerifyError>;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

/// Verifies credentials against a remote identity provider over HTTP.
///
/// Posts the token to the provider's verification endpoint and expects the
/// principal claims back as JSON. A 4xx answer means the credential was
/// rejected; transport failures and other statuses surface as
/// [`VerifyError::ProviderUnavailable`].
pub struct RemoteVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteVerifier {
    /// Creates a verifier for the given endpoint with a per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl CredentialVerifier for RemoteVerifier {
    async fn verify(&self, credential: &Credential) -> Result<Principal, VerifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&VerifyRequest {
                token: credential.expose(),
            })
            .send()
            .await
            .map_err(|err| VerifyError::ProviderUnavailable(err.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(VerifyError::Rejected);
        }
        if !status.is_success() {
            return Err(VerifyError::ProviderUnavailable(format!(
                "unexpected status {status}"
            )));
        }
        response
            .json::<Principal>()
            .await
            .map_err(|err| VerifyError::ProviderUnavailable(err.to_string()))
    }
}

/// Verifies credentials against a fixed token table.
///
/// For tests and local development. The default (empty) table rejects
/// every credential, which is the safe fallback when no identity provider
/// is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, Principal>,
}

impl StaticVerifier {
    /// Adds a token-to-principal mapping.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }
}

#[async_trait]
impl CredentialVerifier for StaticVerifier {
    async fn verify(&self, credential: &Credential) -> Result<Principal, VerifyError> {
        self.tokens
            .get(credential.expose())
            .cloned()
            .ok_or(VerifyError::Rejected)
    }
}
