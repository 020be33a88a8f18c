//! BYOK section: imported customer key material in Cloud KMS
//!
//! ## Flow
//! 1. Ask Service Usage whether the Cloud KMS API is enabled. A failed
//!    lookup reads as "not enabled".
//! 2. Walk locations, key rings and keys.
//! 3. Keep `importOnly` keys and resolve each primary version's state.

use tracing::{debug, info, warn};

use super::{SectionKind, SectionOutcome};
use crate::credentials::AccessToken;
use crate::error::AuditError;
use crate::gcp::{CryptoKey, KmsApi, ServiceUsageApi};
use crate::report::{SheetData, BYOK_SHEET};

/// Service name matched against the enabled-service inventory
pub const KMS_SERVICE_NAME: &str = "cloudkms.googleapis.com";

/// Label carrying the key owner
pub const MANAGER_LABEL: &str = "manager";

/// Manager shown when the label is missing
pub const UNKNOWN_MANAGER: &str = "Unknown";

/// Lifecycle shown for a key without a primary version
pub const NO_PRIMARY_VERSION: &str = "NO_PRIMARY_VERSION";

/// Sentinel lead text when KMS enumeration is denied
pub const KMS_PERMISSION_DENIED: &str = "Insufficient permission to access Cloud KMS";

/// One imported key as rendered in the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub name: String,
    pub purpose: String,
    pub lifecycle_state: String,
    pub manager: String,
}

impl KeyRecord {
    fn into_row(self) -> Vec<String> {
        vec![self.name, self.purpose, self.lifecycle_state, self.manager]
    }
}

/// Build the BYOK sheet for `project_id`
pub async fn audit_keys(
    services: &dyn ServiceUsageApi,
    kms: &dyn KmsApi,
    token: &AccessToken,
    project_id: &str,
) -> SectionOutcome {
    if !kms_enabled(services, token, project_id).await {
        info!(project = %project_id, "Cloud KMS not enabled, no BYOK keys to report");
        return SectionOutcome::ok(SectionKind::Byok, SheetData::no_data(BYOK_SHEET));
    }

    match collect_imported_keys(kms, token, project_id).await {
        Ok(keys) if keys.is_empty() => {
            info!(project = %project_id, "No imported keys found");
            SectionOutcome::ok(SectionKind::Byok, SheetData::no_data(BYOK_SHEET))
        }
        Ok(keys) => {
            info!(project = %project_id, keys = keys.len(), "🔑 Imported keys collected");
            let mut sheet = SheetData::new(BYOK_SHEET);
            for key in keys {
                sheet.push_row(key.into_row());
            }
            SectionOutcome::ok(SectionKind::Byok, sheet)
        }
        Err(e) if e.is_permission_denied() => {
            warn!(project = %project_id, error = %e, "Permission denied while enumerating Cloud KMS");
            SectionOutcome::failed(
                SectionKind::Byok,
                SheetData::sentinel(BYOK_SHEET, KMS_PERMISSION_DENIED),
                e,
            )
        }
        Err(e) => {
            warn!(project = %project_id, error = %e, "Cloud KMS enumeration failed");
            SectionOutcome::failed(SectionKind::Byok, SheetData::no_data(BYOK_SHEET), e)
        }
    }
}

/// Any failure is treated as "not enabled"
async fn kms_enabled(services: &dyn ServiceUsageApi, token: &AccessToken, project_id: &str) -> bool {
    match services.list_enabled_services(token, project_id).await {
        Ok(list) => list
            .iter()
            .any(|s| s.is_enabled() && s.name.contains(KMS_SERVICE_NAME)),
        Err(e) => {
            warn!(project = %project_id, error = %e, "Service Usage lookup failed, assuming Cloud KMS is disabled");
            false
        }
    }
}

/// Walk every location, key ring and key; keep imported keys only
async fn collect_imported_keys(
    kms: &dyn KmsApi,
    token: &AccessToken,
    project_id: &str,
) -> Result<Vec<KeyRecord>, AuditError> {
    let mut records = Vec::new();

    for location in kms.list_locations(token, project_id).await? {
        let key_rings = kms
            .list_key_rings(token, project_id, &location.location_id)
            .await?;

        for ring in key_rings {
            let keys = kms.list_crypto_keys(token, &ring.name).await?;
            debug!(key_ring = %ring.name, keys = keys.len(), "Listed crypto keys");

            for key in keys.into_iter().filter(|k| k.import_only) {
                records.push(resolve_key(kms, token, key).await?);
            }
        }
    }

    Ok(records)
}

async fn resolve_key(
    kms: &dyn KmsApi,
    token: &AccessToken,
    key: CryptoKey,
) -> Result<KeyRecord, AuditError> {
    let lifecycle_state = match &key.primary {
        Some(primary) if !primary.name.is_empty() => {
            kms.get_crypto_key_version(token, &primary.name).await?.state
        }
        _ => NO_PRIMARY_VERSION.to_string(),
    };

    let manager = key
        .labels
        .get(MANAGER_LABEL)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_MANAGER.to_string());

    Ok(KeyRecord {
        name: key.name,
        purpose: key.purpose,
        lifecycle_state,
        manager,
    })
}
