//! Audit configuration
//!
//! Defaults can be overridden from the environment (`GCP_AUDIT_*`) and then
//! programmatically via the `with_*` builders; the CLI layers its flags on top.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Prefix of every report file name
pub const DEFAULT_REPORT_LABEL: &str = "GCP_SelfAudit";

/// OAuth scope requested for all audit API calls
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Default HTTP timeout for GCP API calls
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Base URLs of the GCP REST APIs the audit reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub resource_manager: String,
    pub cloud_kms: String,
    pub service_usage: String,
    pub compute: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            resource_manager: "https://cloudresourcemanager.googleapis.com".to_string(),
            cloud_kms: "https://cloudkms.googleapis.com".to_string(),
            service_usage: "https://serviceusage.googleapis.com".to_string(),
            compute: "https://compute.googleapis.com".to_string(),
        }
    }
}

/// Rendering options passed to the spreadsheet encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Render header cells in bold
    pub bold_header: bool,
    /// Keep the header row visible while scrolling
    pub freeze_header_row: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            bold_header: true,
            freeze_header_row: true,
        }
    }
}

/// Configuration for one audit run
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Report file name prefix
    pub report_label: String,
    /// First persistence tier; `None` when no home directory is known
    pub primary_dir: Option<PathBuf>,
    /// Second persistence tier, created on demand
    pub fallback_dir: PathBuf,
    /// Timeout for each GCP API call
    pub http_timeout: Duration,
    /// OAuth scopes for the ADC token
    pub scopes: Vec<String>,
    /// Fetch the three sections concurrently
    pub parallel_sections: bool,
    pub endpoints: ApiEndpoints,
    pub encoder: EncoderOptions,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            report_label: DEFAULT_REPORT_LABEL.to_string(),
            primary_dir: home::home_dir(),
            fallback_dir: env::temp_dir(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
            parallel_sections: false,
            endpoints: ApiEndpoints::default(),
            encoder: EncoderOptions::default(),
        }
    }
}

impl AuditConfig {
    /// Defaults overridden by `GCP_AUDIT_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(label) = env::var("GCP_AUDIT_REPORT_LABEL") {
            if !label.trim().is_empty() {
                config.report_label = label.trim().to_string();
            }
        }

        if let Ok(dir) = env::var("GCP_AUDIT_OUTPUT_DIR") {
            config.primary_dir = Some(PathBuf::from(dir));
        }

        if let Ok(dir) = env::var("GCP_AUDIT_FALLBACK_DIR") {
            config.fallback_dir = PathBuf::from(dir);
        }

        if let Ok(raw) = env::var("GCP_AUDIT_HTTP_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "Ignoring invalid GCP_AUDIT_HTTP_TIMEOUT_SECS"),
            }
        }

        if let Ok(raw) = env::var("GCP_AUDIT_PARALLEL") {
            config.parallel_sections = matches!(raw.as_str(), "1" | "true" | "TRUE" | "yes");
        }

        config
    }

    /// Set the report file name prefix
    pub fn with_report_label(mut self, label: impl Into<String>) -> Self {
        self.report_label = label.into();
        self
    }

    /// Set the primary output directory
    pub fn with_primary_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.primary_dir = Some(dir.into());
        self
    }

    /// Set the fallback output directory
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_parallel_sections(mut self, parallel: bool) -> Self {
        self.parallel_sections = parallel;
        self
    }

    pub fn with_endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_encoder_options(mut self, encoder: EncoderOptions) -> Self {
        self.encoder = encoder;
        self
    }
}
