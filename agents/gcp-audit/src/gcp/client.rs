//! REST implementation of the GCP API seams

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::models::*;
use super::{FirewallApi, IamApi, KmsApi, ServiceUsageApi};
use crate::config::{ApiEndpoints, AuditConfig};
use crate::credentials::AccessToken;
use crate::error::AuditError;

const RESOURCE_MANAGER: &str = "Resource Manager";
const SERVICE_USAGE: &str = "Service Usage";
const CLOUD_KMS: &str = "Cloud KMS";
const COMPUTE: &str = "Compute";

/// Upper bound on pages followed for one listing
const MAX_PAGES: usize = 1000;

/// One HTTP client shared by every GCP API the audit reads
#[derive(Debug, Clone)]
pub struct GcpRestClient {
    http_client: Client,
    endpoints: ApiEndpoints,
}

impl GcpRestClient {
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        let http_client = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            http_client,
            endpoints: config.endpoints.clone(),
        })
    }

    /// Send a request and decode a successful JSON body
    async fn send_json<T: DeserializeOwned>(
        api: &'static str,
        request: RequestBuilder,
        token: &AccessToken,
    ) -> Result<T, AuditError> {
        let response = request.bearer_auth(token.bearer()).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuditError::from_status(api, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| AuditError::Decode {
            api,
            message: e.to_string(),
        })
    }

    /// Follow `nextPageToken` from the first page until exhausted
    async fn list_all<P>(
        &self,
        api: &'static str,
        url: &str,
        query: &[(&str, &str)],
        token: &AccessToken,
    ) -> Result<Vec<P::Item>, AuditError>
    where
        P: Page + DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        for page_num in 0..MAX_PAGES {
            let mut request = self.http_client.get(url).query(query);
            if let Some(t) = &page_token {
                request = request.query(&[("pageToken", t.as_str())]);
            }

            let page: P = Self::send_json(api, request, token).await?;
            let (mut batch, next) = page.into_parts();
            debug!(api, url, page = page_num, items = batch.len(), "Fetched page");
            items.append(&mut batch);

            match next {
                Some(t) if !t.is_empty() => page_token = Some(t),
                _ => return Ok(items),
            }
        }

        Err(AuditError::Api {
            api,
            status: 0,
            message: format!("Pagination did not terminate after {MAX_PAGES} pages: {url}"),
        })
    }
}

#[async_trait]
impl IamApi for GcpRestClient {
    async fn get_iam_policy(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<IamPolicy, AuditError> {
        let url = format!(
            "{}/v3/projects/{}:getIamPolicy",
            self.endpoints.resource_manager, project_id
        );
        let request = self
            .http_client
            .post(&url)
            .json(&json!({ "options": { "requestedPolicyVersion": 3 } }));

        Self::send_json(RESOURCE_MANAGER, request, token).await
    }
}

#[async_trait]
impl ServiceUsageApi for GcpRestClient {
    async fn list_enabled_services(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<ServiceInfo>, AuditError> {
        let url = format!(
            "{}/v1/projects/{}/services",
            self.endpoints.service_usage, project_id
        );
        self.list_all::<ServicesPage>(SERVICE_USAGE, &url, &[("filter", "state:ENABLED")], token)
            .await
    }
}

#[async_trait]
impl KmsApi for GcpRestClient {
    async fn list_locations(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<KmsLocation>, AuditError> {
        let url = format!(
            "{}/v1/projects/{}/locations",
            self.endpoints.cloud_kms, project_id
        );
        self.list_all::<LocationsPage>(CLOUD_KMS, &url, &[], token)
            .await
    }

    async fn list_key_rings(
        &self,
        token: &AccessToken,
        project_id: &str,
        location_id: &str,
    ) -> Result<Vec<KeyRing>, AuditError> {
        let url = format!(
            "{}/v1/projects/{}/locations/{}/keyRings",
            self.endpoints.cloud_kms, project_id, location_id
        );
        self.list_all::<KeyRingsPage>(CLOUD_KMS, &url, &[], token)
            .await
    }

    async fn list_crypto_keys(
        &self,
        token: &AccessToken,
        key_ring: &str,
    ) -> Result<Vec<CryptoKey>, AuditError> {
        let url = format!("{}/v1/{}/cryptoKeys", self.endpoints.cloud_kms, key_ring);
        self.list_all::<CryptoKeysPage>(CLOUD_KMS, &url, &[], token)
            .await
    }

    async fn get_crypto_key_version(
        &self,
        token: &AccessToken,
        version_name: &str,
    ) -> Result<CryptoKeyVersion, AuditError> {
        let url = format!("{}/v1/{}", self.endpoints.cloud_kms, version_name);
        Self::send_json(CLOUD_KMS, self.http_client.get(&url), token).await
    }
}

#[async_trait]
impl FirewallApi for GcpRestClient {
    async fn list_firewalls(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<FirewallRule>, AuditError> {
        let url = format!(
            "{}/compute/v1/projects/{}/global/firewalls",
            self.endpoints.compute, project_id
        );
        self.list_all::<FirewallsPage>(COMPUTE, &url, &[], token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AdcCredentialProvider, CredentialProvider};

    #[test]
    fn test_client_creation() {
        let client = GcpRestClient::new(&AuditConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let endpoints = ApiEndpoints {
            compute: "http://127.0.0.1:9".to_string(),
            ..ApiEndpoints::default()
        };
        let config = AuditConfig::default()
            .with_endpoints(endpoints)
            .with_http_timeout(std::time::Duration::from_secs(2));
        let client = GcpRestClient::new(&config).unwrap();

        let err = client
            .list_firewalls(&AccessToken::new("t"), "proj-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Http(_)));
    }

    #[tokio::test]
    #[ignore] // Requires GCP credentials
    async fn test_list_firewalls_live() {
        let project = std::env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "lornu-dev".to_string());
        let config = AuditConfig::default();
        let token = AdcCredentialProvider::new(config.scopes.clone())
            .access_token()
            .await
            .unwrap();
        let client = GcpRestClient::new(&config).unwrap();

        let rules = client.list_firewalls(&token, &project).await.unwrap();
        println!("{} firewall rules", rules.len());
    }
}
