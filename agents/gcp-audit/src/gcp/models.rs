//! GCP REST wire types
//!
//! Only the fields the audit reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================
// Resource Manager
// ============================================================

/// Project IAM policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicy {
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// A role granted to a set of principals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl Binding {
    pub fn new(role: &str, members: &[&str]) -> Self {
        Self {
            role: role.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

// ============================================================
// Service Usage
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// e.g. `projects/123/services/cloudkms.googleapis.com`
    pub name: String,
    /// Absent in some responses; the listing is already filtered to `ENABLED`
    #[serde(default)]
    pub state: Option<String>,
}

impl ServiceInfo {
    pub fn is_enabled(&self) -> bool {
        self.state.as_deref().map_or(true, |state| state == "ENABLED")
    }
}

// ============================================================
// Cloud KMS
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KmsLocation {
    pub location_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRing {
    /// `projects/*/locations/*/keyRings/*`
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKey {
    /// `projects/*/locations/*/keyRings/*/cryptoKeys/*`
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub primary: Option<CryptoKeyVersion>,
    /// Set when key material can only be imported (BYOK)
    #[serde(default)]
    pub import_only: bool,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptoKeyVersion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
}

// ============================================================
// Compute Engine
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `INGRESS` or `EGRESS`
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub source_ranges: Vec<String>,
    #[serde(default)]
    pub destination_ranges: Vec<String>,
}

// ============================================================
// List envelopes
// ============================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServicesPage {
    #[serde(default)]
    pub services: Vec<ServiceInfo>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LocationsPage {
    #[serde(default)]
    pub locations: Vec<KmsLocation>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KeyRingsPage {
    #[serde(default)]
    pub key_rings: Vec<KeyRing>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CryptoKeysPage {
    #[serde(default)]
    pub crypto_keys: Vec<CryptoKey>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FirewallsPage {
    #[serde(default)]
    pub items: Vec<FirewallRule>,
    pub next_page_token: Option<String>,
}

/// A decoded page: its items plus the token for the next one
pub(crate) trait Page {
    type Item;
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

macro_rules! impl_page {
    ($page:ty, $field:ident, $item:ty) => {
        impl Page for $page {
            type Item = $item;
            fn into_parts(self) -> (Vec<$item>, Option<String>) {
                (self.$field, self.next_page_token)
            }
        }
    };
}

impl_page!(ServicesPage, services, ServiceInfo);
impl_page!(LocationsPage, locations, KmsLocation);
impl_page!(KeyRingsPage, key_rings, KeyRing);
impl_page!(CryptoKeysPage, crypto_keys, CryptoKey);
impl_page!(FirewallsPage, items, FirewallRule);
