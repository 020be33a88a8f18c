//! GCP Self-Audit Assembler
//!
//! Runs one audit against a project:
//! - Acquires a single credential (failure ends the run as `AUTH_REQUIRED`)
//! - Renders the IAM, BYOK and Network Rules sheets, tolerating per-section failure
//! - Encodes and persists the report, including partial reports
//!
//! ## Security Model
//! - Uses ADC (Application Default Credentials) - no hardcoded secrets
//! - Read-only: only list/get calls are issued

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::AuditConfig;
use crate::credentials::{
    AccessToken, AdcCredentialProvider, CredentialProvider, StaticTokenProvider,
    REMEDIATION_MESSAGE,
};
use crate::encoder::XlsxEncoder;
use crate::error::AuditError;
use crate::gcp::{FirewallApi, GcpRestClient, IamApi, KmsApi, ServiceUsageApi};
use crate::persist::ArtifactPersister;
use crate::report::{report_file_name, ReportWorkbook};
use crate::sections::{byok, firewall, iam, SectionOutcome};
use crate::types::{AuditRequest, AuditResult, AuditStatus};

/// The API collaborators one audit reads from
#[derive(Clone)]
pub struct AuditApis {
    pub iam: Arc<dyn IamApi>,
    pub services: Arc<dyn ServiceUsageApi>,
    pub kms: Arc<dyn KmsApi>,
    pub firewall: Arc<dyn FirewallApi>,
}

impl AuditApis {
    /// Every seam backed by the same REST client
    pub fn rest(client: Arc<GcpRestClient>) -> Self {
        Self {
            iam: client.clone(),
            services: client.clone(),
            kms: client.clone(),
            firewall: client,
        }
    }
}

/// Report assembler for GCP self-audits
pub struct Auditor {
    credentials: Arc<dyn CredentialProvider>,
    apis: AuditApis,
    encoder: XlsxEncoder,
    persister: ArtifactPersister,
    config: AuditConfig,
}

impl Auditor {
    /// Assemble an auditor from explicit collaborators
    pub fn new(config: AuditConfig, credentials: Arc<dyn CredentialProvider>, apis: AuditApis) -> Self {
        let encoder = XlsxEncoder::new(config.encoder);
        let persister = ArtifactPersister::new(config.primary_dir.clone(), config.fallback_dir.clone());

        Self {
            credentials,
            apis,
            encoder,
            persister,
            config,
        }
    }

    /// REST-backed auditor using Application Default Credentials
    ///
    /// # Example
    /// ```ignore
    /// let auditor = Auditor::from_config(AuditConfig::from_env())?;
    /// println!("{}", auditor.perform_audit("my-project", "2025", "H1").await);
    /// ```
    pub fn from_config(config: AuditConfig) -> Result<Self, AuditError> {
        let credentials = Arc::new(AdcCredentialProvider::new(config.scopes.clone()));
        Self::with_credentials(config, credentials)
    }

    /// REST-backed auditor using a pre-issued bearer token
    pub fn with_access_token(config: AuditConfig, token: impl Into<String>) -> Result<Self, AuditError> {
        Self::with_credentials(config, Arc::new(StaticTokenProvider::new(token)))
    }

    pub fn with_credentials(
        config: AuditConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, AuditError> {
        let client = Arc::new(GcpRestClient::new(&config)?);
        Ok(Self::new(config, credentials, AuditApis::rest(client)))
    }

    /// Invocation entry point: validate, audit, and render the summary text
    pub async fn perform_audit(&self, project_id: &str, year: &str, period: &str) -> String {
        match AuditRequest::new(project_id, year, period) {
            Ok(request) => self.run_audit(&request).await.summary(),
            Err(e) => {
                warn!(project = %project_id, error = %e, "Rejected audit request");
                AuditResult::rejected(project_id, year, period, &e).summary()
            }
        }
    }

    /// Run one audit; every failure path ends in a populated result
    pub async fn run_audit(&self, request: &AuditRequest) -> AuditResult {
        self.run_audit_with_report(request).await.0
    }

    /// Run one audit and also return the assembled report, if sections ran
    pub async fn run_audit_with_report(
        &self,
        request: &AuditRequest,
    ) -> (AuditResult, Option<ReportWorkbook>) {
        let mut result = AuditResult::for_request(request);
        let project_id = request.project_id();

        info!(
            project = %project_id,
            year = %request.year(),
            period = %request.period(),
            "🚀 Starting GCP self-audit"
        );

        let token = match self.credentials.access_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(project = %project_id, error = %e, "No usable GCP credential");
                result.fail(
                    AuditStatus::AuthRequired,
                    format!("{e}\n\n{REMEDIATION_MESSAGE}"),
                    Some(e.detail()),
                );
                return (result, None);
            }
        };

        let mut workbook = ReportWorkbook::new();
        let mut first_failure: Option<AuditError> = None;

        for outcome in self.run_sections(&token, project_id).await {
            if let Err(e) = outcome.result {
                error!(project = %project_id, section = %outcome.kind, error = %e, "Section failed");
                // Later failures are logged but never replace the first
                first_failure.get_or_insert(e);
            }
            workbook.push(outcome.sheet);
        }

        let file_name = report_file_name(
            &self.config.report_label,
            request.year(),
            &request.period().to_string(),
            project_id,
        );
        let persisted = self.finalize(&workbook, &file_name);

        match (first_failure, persisted) {
            (None, Ok(location)) => {
                info!(project = %project_id, location = %location, "✅ Audit complete");
                result.succeed(location);
            }
            (None, Err(e)) => {
                error!(project = %project_id, error = %e, "Report could not be finalized");
                result.fail(AuditStatus::Failed, e.to_string(), Some(e.detail()));
            }
            (Some(e), persisted) => {
                result.fail(AuditStatus::Failed, e.to_string(), Some(e.detail()));
                match persisted {
                    Ok(location) => {
                        info!(project = %project_id, location = %location, "Partial report written");
                        result.partial_report_location = Some(location);
                    }
                    Err(pe) => {
                        error!(project = %project_id, error = %pe, "Partial report could not be finalized")
                    }
                }
            }
        }

        (result, Some(workbook))
    }

    /// Sections in fixed order; concurrently when configured
    async fn run_sections(&self, token: &AccessToken, project_id: &str) -> Vec<SectionOutcome> {
        let iam = iam::audit_iam(self.apis.iam.as_ref(), token, project_id);
        let keys = byok::audit_keys(
            self.apis.services.as_ref(),
            self.apis.kms.as_ref(),
            token,
            project_id,
        );
        let rules = firewall::audit_firewall(self.apis.firewall.as_ref(), token, project_id);

        if self.config.parallel_sections {
            let (iam, keys, rules) = futures::join!(iam, keys, rules);
            vec![iam, keys, rules]
        } else {
            vec![iam.await, keys.await, rules.await]
        }
    }

    fn finalize(&self, workbook: &ReportWorkbook, file_name: &str) -> Result<String, AuditError> {
        let bytes = self.encoder.encode(workbook)?;
        self.persister.persist(&bytes, file_name)
    }
}
