//! GCP API collaborators
//!
//! Trait seams for the four API surfaces the audit reads, plus the
//! REST implementation backed by a single `reqwest` client.
//!
//! ## API surfaces
//! - Resource Manager: project IAM policy
//! - Service Usage: enabled services (is Cloud KMS on?)
//! - Cloud KMS: locations, key rings, crypto keys, key versions
//! - Compute Engine: firewall rules

mod client;
pub mod models;

pub use client::GcpRestClient;
pub use models::*;

use async_trait::async_trait;

use crate::credentials::AccessToken;
use crate::error::AuditError;

/// Project access-policy reader
#[async_trait]
pub trait IamApi: Send + Sync {
    async fn get_iam_policy(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<IamPolicy, AuditError>;
}

/// Service inventory, used to check whether Cloud KMS is enabled
#[async_trait]
pub trait ServiceUsageApi: Send + Sync {
    async fn list_enabled_services(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<ServiceInfo>, AuditError>;
}

/// Cloud KMS resource hierarchy
#[async_trait]
pub trait KmsApi: Send + Sync {
    async fn list_locations(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<KmsLocation>, AuditError>;

    async fn list_key_rings(
        &self,
        token: &AccessToken,
        project_id: &str,
        location_id: &str,
    ) -> Result<Vec<KeyRing>, AuditError>;

    async fn list_crypto_keys(
        &self,
        token: &AccessToken,
        key_ring: &str,
    ) -> Result<Vec<CryptoKey>, AuditError>;

    async fn get_crypto_key_version(
        &self,
        token: &AccessToken,
        version_name: &str,
    ) -> Result<CryptoKeyVersion, AuditError>;
}

/// VPC firewall rule listing
#[async_trait]
pub trait FirewallApi: Send + Sync {
    async fn list_firewalls(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<FirewallRule>, AuditError>;
}
