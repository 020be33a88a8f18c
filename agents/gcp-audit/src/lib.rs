//! GCP Self-Audit
//!
//! Point-in-time compliance audit of one GCP project. Reads IAM bindings,
//! imported (BYOK) Cloud KMS keys and VPC firewall rules, then writes a
//! three-sheet Excel report.
//!
//! ## Usage
//! ```ignore
//! use gcp_audit::{AuditConfig, Auditor};
//!
//! let auditor = Auditor::from_config(AuditConfig::from_env())?;
//! let summary = auditor.perform_audit("my-project", "2025", "H1").await;
//! println!("{summary}");
//! ```

pub mod audit;
pub mod config;
pub mod credentials;
pub mod encoder;
pub mod error;
pub mod gcp;
pub mod persist;
pub mod report;
pub mod sections;
pub mod types;

pub use audit::{AuditApis, Auditor};
pub use config::{ApiEndpoints, AuditConfig, EncoderOptions};
pub use credentials::{
    AccessToken, AdcCredentialProvider, CredentialProvider, StaticTokenProvider,
    REMEDIATION_MESSAGE,
};
pub use error::{AuditError, ErrorKind};
pub use report::{ReportWorkbook, SheetData};
pub use sections::SectionKind;
pub use types::{AuditPeriod, AuditRequest, AuditResult, AuditStatus};
