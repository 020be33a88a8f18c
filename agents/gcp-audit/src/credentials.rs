//! GCP Credential Provider
//!
//! Resolves a scoped bearer token from Application Default Credentials (ADC).
//! No hardcoded credentials - authentication is handled by:
//! - Local: `gcloud auth application-default login`
//! - GKE: Workload Identity
//! - Cloud Run / GCE: attached service account

use async_trait::async_trait;
use gcloud_sdk::{GoogleAuthTokenGenerator, TokenSourceType};
use tracing::{debug, info};

use crate::error::AuditError;

/// Remediation shown to the user when no credential can be resolved
pub const REMEDIATION_MESSAGE: &str = "Obtain GCP authorization with the following command:\n\n\
    gcloud auth application-default login\n\n\
    or, without a browser:\n\n\
    gcloud auth application-default login --no-browser\n\n\
    Then run the audit again.";

/// OAuth bearer token; the value never appears in `Debug` output
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token for an `Authorization: Bearer` header
    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken(<redacted, {} bytes>)", self.0.len())
    }
}

/// Source of the bearer credential used for a whole audit run
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Acquire a scoped token; failure means the audit cannot start
    async fn access_token(&self) -> Result<AccessToken, AuditError>;
}

/// ADC-backed provider using the gcloud-sdk token source chain
pub struct AdcCredentialProvider {
    scopes: Vec<String>,
}

impl AdcCredentialProvider {
    pub fn new(scopes: Vec<String>) -> Self {
        Self { scopes }
    }
}

#[async_trait]
impl CredentialProvider for AdcCredentialProvider {
    async fn access_token(&self) -> Result<AccessToken, AuditError> {
        debug!(scopes = ?self.scopes, "Resolving Application Default Credentials");

        let generator = GoogleAuthTokenGenerator::new(TokenSourceType::Default, self.scopes.clone())
            .await
            .map_err(|e| AuditError::AuthRequired(format!("No Application Default Credentials: {e}")))?;

        let token = generator
            .create_token()
            .await
            .map_err(|e| AuditError::AuthRequired(format!("Failed to mint access token: {e}")))?;

        // header_value() is "<type> <token>"
        let header = token.header_value();
        let value = header
            .split_once(' ')
            .map(|(_, value)| value)
            .unwrap_or(header.as_str())
            .trim()
            .to_string();

        if value.is_empty() {
            return Err(AuditError::AuthRequired(
                "ADC returned an empty access token".to_string(),
            ));
        }

        info!("🔐 Application Default Credentials resolved");
        Ok(AccessToken(value))
    }
}

/// Provider for a pre-issued token (e.g. `GOOGLE_OAUTH_ACCESS_TOKEN`)
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, AuditError> {
        if self.token.bearer().trim().is_empty() {
            return Err(AuditError::AuthRequired(
                "Provided access token is empty".to_string(),
            ));
        }
        Ok(self.token.clone())
    }
}
