//! Types for audit requests and results
//!
//! An [`AuditRequest`] is built once per invocation; the matching
//! [`AuditResult`] is filled by the assembler and handed back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AuditError;

/// Half-year audit period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditPeriod {
    /// First half of the year
    H1,
    /// Second half of the year
    H2,
}

impl std::fmt::Display for AuditPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditPeriod::H1 => write!(f, "H1"),
            AuditPeriod::H2 => write!(f, "H2"),
        }
    }
}

impl FromStr for AuditPeriod {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "H1" => Ok(AuditPeriod::H1),
            "H2" => Ok(AuditPeriod::H2),
            other => Err(AuditError::InvalidRequest(format!(
                "period must be H1 or H2, got '{other}'"
            ))),
        }
    }
}

/// One audit invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRequest {
    project_id: String,
    year: String,
    period: AuditPeriod,
}

impl AuditRequest {
    /// Validate and build a request
    pub fn new(project_id: &str, year: &str, period: &str) -> Result<Self, AuditError> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(AuditError::InvalidRequest(
                "project ID must not be empty".to_string(),
            ));
        }

        let year = year.trim();
        if year.is_empty() {
            return Err(AuditError::InvalidRequest("year must not be empty".to_string()));
        }

        Ok(Self {
            project_id: project_id.to_string(),
            year: year.to_string(),
            period: period.parse()?,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn period(&self) -> AuditPeriod {
        self.period
    }
}

/// Final status of an audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    /// All sections completed and the report was persisted
    Success,
    /// A section, the encoder or the persister failed
    Failed,
    /// No usable credential; no section was attempted
    AuthRequired,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStatus::Success => write!(f, "SUCCESS"),
            AuditStatus::Failed => write!(f, "FAILED"),
            AuditStatus::AuthRequired => write!(f, "AUTH_REQUIRED"),
        }
    }
}

/// Outcome of one audit run
///
/// Exactly one of `report_location` and `error_message` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub project_id: String,
    pub year: String,
    pub period: String,
    pub audit_timestamp: DateTime<Utc>,
    pub status: AuditStatus,
    /// Absolute path or `data:` URI of the report, only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_location: Option<String>,
    /// Location of the partial report written despite a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_report_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Diagnostic trace, only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl AuditResult {
    /// Start a result for the given identifying fields, stamped now
    pub fn started(project_id: &str, year: &str, period: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            year: year.to_string(),
            period: period.to_string(),
            audit_timestamp: Utc::now(),
            status: AuditStatus::Failed,
            report_location: None,
            partial_report_location: None,
            error_message: None,
            error_detail: None,
        }
    }

    /// Start a result for a validated request
    pub fn for_request(request: &AuditRequest) -> Self {
        Self::started(
            request.project_id(),
            request.year(),
            &request.period().to_string(),
        )
    }

    /// `FAILED` result for input that never became a valid request
    pub fn rejected(project_id: &str, year: &str, period: &str, error: &AuditError) -> Self {
        let mut result = Self::started(project_id, year, period);
        result.fail(AuditStatus::Failed, error.to_string(), Some(error.detail()));
        result
    }

    pub(crate) fn succeed(&mut self, location: String) {
        self.status = AuditStatus::Success;
        self.report_location = Some(location);
        self.error_message = None;
        self.error_detail = None;
    }

    pub(crate) fn fail(&mut self, status: AuditStatus, message: String, detail: Option<String>) {
        self.status = status;
        self.report_location = None;
        self.error_message = Some(message);
        self.error_detail = detail;
    }

    pub fn is_success(&self) -> bool {
        self.status == AuditStatus::Success
    }

    /// Human-readable summary handed back to the invoking tool
    pub fn summary(&self) -> String {
        let timestamp = self.audit_timestamp.format("%Y-%m-%d %H:%M:%S UTC");

        match self.status {
            AuditStatus::Success => format!(
                "✅ GCP audit succeeded!\n\n\
                 • Project ID: {}\n\
                 • Year / Period: {} / {}\n\
                 • Audit time: {}\n\
                 • Report location: {}\n\n\
                 Open the Excel report above to review the findings.\n",
                self.project_id,
                self.year,
                self.period,
                timestamp,
                self.report_location.as_deref().unwrap_or_default(),
            ),
            AuditStatus::AuthRequired => format!(
                "🔐 GCP audit requires authorization!\n\n\
                 • Project ID: {}\n\
                 • Year / Period: {} / {}\n\
                 • Audit time: {}\n\
                 • Error: {}\n",
                self.project_id,
                self.year,
                self.period,
                timestamp,
                self.error_message.as_deref().unwrap_or_default(),
            ),
            AuditStatus::Failed => {
                let mut out = format!(
                    "❌ GCP audit failed!\n\n\
                     • Project ID: {}\n\
                     • Year / Period: {} / {}\n\
                     • Audit time: {}\n\
                     • Error: {}\n",
                    self.project_id,
                    self.year,
                    self.period,
                    timestamp,
                    self.error_message.as_deref().unwrap_or_default(),
                );
                if let Some(partial) = &self.partial_report_location {
                    out.push_str(&format!("• Partial report: {partial}\n"));
                }
                if let Some(detail) = &self.error_detail {
                    out.push_str(&format!("• Diagnostic trace:\n{detail}\n"));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parsing() {
        assert_eq!("H1".parse::<AuditPeriod>().unwrap(), AuditPeriod::H1);
        assert_eq!(" h2 ".parse::<AuditPeriod>().unwrap(), AuditPeriod::H2);
        assert!("Q3".parse::<AuditPeriod>().is_err());
        assert_eq!(AuditPeriod::H2.to_string(), "H2");
    }

    #[test]
    fn test_request_validation() {
        let req = AuditRequest::new("proj-1", "2025", "H1").unwrap();
        assert_eq!(req.project_id(), "proj-1");
        assert_eq!(req.year(), "2025");
        assert_eq!(req.period(), AuditPeriod::H1);

        assert!(AuditRequest::new("", "2025", "H1").is_err());
        assert!(AuditRequest::new("proj-1", "  ", "H1").is_err());
        assert!(AuditRequest::new("proj-1", "2025", "H3").is_err());
    }

    #[test]
    fn test_location_and_error_are_exclusive() {
        let mut result = AuditResult::started("proj-1", "2025", "H1");

        result.fail(AuditStatus::Failed, "boom".to_string(), Some("trace".to_string()));
        assert!(result.report_location.is_none());
        assert_eq!(result.error_message.as_deref(), Some("boom"));

        result.succeed("/home/auditor/report.xlsx".to_string());
        assert!(result.is_success());
        assert!(result.error_message.is_none());
        assert!(result.error_detail.is_none());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&AuditStatus::AuthRequired).unwrap();
        assert_eq!(json, "\"AUTH_REQUIRED\"");

        let result = AuditResult::started("proj-1", "2025", "H1");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["projectId"], "proj-1");
        assert!(value.get("reportLocation").is_none());
    }

    #[test]
    fn test_summary_contents() {
        let mut result = AuditResult::started("proj-1", "2025", "H1");
        result.succeed("/tmp/GCP_SelfAudit_2025H1_proj-1.xlsx".to_string());

        let text = result.summary();
        assert!(text.contains("proj-1"));
        assert!(text.contains("2025 / H1"));
        assert!(text.contains("/tmp/GCP_SelfAudit_2025H1_proj-1.xlsx"));

        result.fail(
            AuditStatus::Failed,
            "Network Rules section failed".to_string(),
            Some("Caused by: timeout".to_string()),
        );
        let text = result.summary();
        assert!(text.contains("Network Rules section failed"));
        assert!(text.contains("Caused by: timeout"));
    }
}
