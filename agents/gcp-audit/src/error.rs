//! Audit error taxonomy
//!
//! Every collaborator returns `Result<T, AuditError>`; callers branch on
//! [`AuditError::kind`] rather than on concrete error types.

use std::error::Error as _;
use std::fmt::Write as _;

use thiserror::Error;

use crate::sections::SectionKind;

/// Coarse classification used to pick the final audit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable credential could be resolved
    AuthRequired,
    /// The credential is valid but lacks a permission
    PermissionDenied,
    /// Anything else: API, transport, encoding or persistence failure
    Failed,
}

/// Errors that can occur during an audit run
#[derive(Debug, Error)]
pub enum AuditError {
    /// Application Default Credentials are missing or unusable
    #[error("GCP authorization required: {0}")]
    AuthRequired(String),

    /// The caller's identity lacks the permission for an API call
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A GCP API answered with a non-success status
    #[error("{api} API returned {status}: {message}")]
    Api {
        api: &'static str,
        status: u16,
        message: String,
    },

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("Failed to decode {api} response: {message}")]
    Decode { api: &'static str, message: String },

    /// Caller supplied an unusable request
    #[error("Invalid audit request: {0}")]
    InvalidRequest(String),

    /// Spreadsheet encoder rejected the report
    #[error("Failed to encode report: {0}")]
    Encode(#[from] rust_xlsxwriter::XlsxError),

    /// Every persistence tier failed
    #[error("Failed to persist report: {0}")]
    Persist(String),

    /// A section aggregator failed; its sheet carries a sentinel row
    #[error("{section} section failed: {source}")]
    Section {
        section: SectionKind,
        #[source]
        source: Box<AuditError>,
    },
}

impl AuditError {
    /// Wrap an error as the failure of one report section
    pub fn in_section(self, section: SectionKind) -> Self {
        AuditError::Section {
            section,
            source: Box::new(self),
        }
    }

    /// Classify the error, looking through section wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuditError::AuthRequired(_) => ErrorKind::AuthRequired,
            AuditError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AuditError::Section { source, .. } => source.kind(),
            _ => ErrorKind::Failed,
        }
    }

    /// Whether the error is a permission denial
    pub fn is_permission_denied(&self) -> bool {
        self.kind() == ErrorKind::PermissionDenied
    }

    /// Diagnostic trace: the error followed by its source chain, one cause per line
    pub fn detail(&self) -> String {
        let mut out = format!("{self:?}");
        let mut source = self.source();
        while let Some(cause) = source {
            // Writing to a String cannot fail
            let _ = write!(out, "\nCaused by: {cause}");
            source = cause.source();
        }
        out
    }

    /// Map an HTTP status and body from a GCP API onto the taxonomy
    pub(crate) fn from_status(api: &'static str, status: u16, body: &str) -> Self {
        let message = google_error_message(body).unwrap_or_else(|| body.trim().to_string());
        match status {
            401 => AuditError::AuthRequired(format!("{api} API rejected the credential: {message}")),
            403 => AuditError::PermissionDenied(format!("{api}: {message}")),
            _ if body.contains("PERMISSION_DENIED") => {
                AuditError::PermissionDenied(format!("{api}: {message}"))
            }
            _ => AuditError::Api {
                api,
                status,
                message,
            },
        }
    }
}

/// Extract `error.message` from a Google JSON error envelope
fn google_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(|s| s.to_string())
}
