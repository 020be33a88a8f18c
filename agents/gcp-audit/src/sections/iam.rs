//! IAM section: group policy bindings by principal

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use super::{SectionKind, SectionOutcome};
use crate::credentials::AccessToken;
use crate::gcp::{IamApi, IamPolicy};
use crate::report::{SheetData, IAM_SHEET};

/// Sentinel lead text when the policy cannot be read
pub const IAM_UNAVAILABLE: &str = "Unable to retrieve IAM policy";

/// Principal kinds rendered in the report
const RENDERED_KINDS: [&str; 2] = ["user", "group"];

/// Principal (`<kind>:<identity>`) to the roles granted to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalRoleSet {
    roles: BTreeMap<String, BTreeSet<String>>,
}

impl PrincipalRoleSet {
    /// Fold every binding of `policy`, across all principal kinds
    pub fn fold(policy: &IamPolicy) -> Self {
        let mut set = Self::default();
        for binding in &policy.bindings {
            for member in &binding.members {
                set.grant(member, &binding.role);
            }
        }
        set
    }

    pub fn grant(&mut self, principal: &str, role: &str) {
        self.roles
            .entry(principal.to_string())
            .or_default()
            .insert(role.to_string());
    }

    /// Roles held by `principal`
    pub fn roles_of(&self, principal: &str) -> Option<&BTreeSet<String>> {
        self.roles.get(principal)
    }

    /// Number of aggregated principals, before filtering
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Rows for `user` and `group` principals: `(principal, roles joined by newline)`
    pub fn render(&self) -> Vec<Vec<String>> {
        self.roles
            .iter()
            .filter(|(principal, _)| is_rendered_kind(principal))
            .map(|(principal, roles)| {
                let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
                vec![principal.clone(), roles.join("\n")]
            })
            .collect()
    }
}

fn is_rendered_kind(principal: &str) -> bool {
    principal
        .split_once(':')
        .map(|(kind, _)| RENDERED_KINDS.contains(&kind))
        .unwrap_or(false)
}

/// Build the IAM sheet for `project_id`
pub async fn audit_iam(api: &dyn IamApi, token: &AccessToken, project_id: &str) -> SectionOutcome {
    let policy = match api.get_iam_policy(token, project_id).await {
        Ok(policy) => policy,
        Err(e) => {
            warn!(project = %project_id, error = %e, "Failed to read IAM policy");
            return SectionOutcome::failed(
                SectionKind::Iam,
                SheetData::sentinel(IAM_SHEET, IAM_UNAVAILABLE),
                e,
            );
        }
    };

    let principals = PrincipalRoleSet::fold(&policy);
    let mut sheet = SheetData::new(IAM_SHEET);
    for row in principals.render() {
        sheet.push_row(row);
    }

    // Keep the sheet self-describing even when no human principal holds a role
    if sheet.rows.is_empty() {
        sheet = SheetData::no_data(IAM_SHEET);
    }

    info!(
        project = %project_id,
        policy_version = policy.version,
        bindings = policy.bindings.len(),
        principals = principals.len(),
        rows = sheet.rows.len(),
        "🔐 IAM policy aggregated"
    );

    SectionOutcome::ok(SectionKind::Iam, sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use crate::gcp::Binding;
    use async_trait::async_trait;

    fn policy() -> IamPolicy {
        IamPolicy {
            version: 3,
            bindings: vec![
                Binding::new("roles/viewer", &["user:a@example.com", "group:ops@example.com"]),
                Binding::new(
                    "roles/editor",
                    &["user:a@example.com", "serviceAccount:ci@p.iam.gserviceaccount.com"],
                ),
                Binding::new("roles/browser", &["domain:example.com", "allUsers"]),
            ],
        }
    }

    #[test]
    fn test_principal_accumulates_roles_across_bindings() {
        let set = PrincipalRoleSet::fold(&policy());

        let roles = set.roles_of("user:a@example.com").unwrap();
        assert_eq!(roles.len(), 2);
        assert!(roles.contains("roles/viewer"));
        assert!(roles.contains("roles/editor"));
    }

    #[test]
    fn test_render_keeps_only_users_and_groups() {
        let set = PrincipalRoleSet::fold(&policy());

        // Everything is aggregated
        assert_eq!(set.len(), 5);

        let rows = set.render();
        assert_eq!(
            rows,
            vec![
                vec!["group:ops@example.com".to_string(), "roles/viewer".to_string()],
                vec![
                    "user:a@example.com".to_string(),
                    "roles/editor\nroles/viewer".to_string()
                ],
            ]
        );
    }

    #[test]
    fn test_fold_is_idempotent() {
        let mut set = PrincipalRoleSet::fold(&policy());
        let first = set.clone();

        for binding in &policy().bindings {
            for member in &binding.members {
                set.grant(member, &binding.role);
            }
        }
        assert_eq!(set, first);
    }

    #[test]
    fn test_kind_prefix_must_match_exactly() {
        assert!(is_rendered_kind("user:a@example.com"));
        assert!(is_rendered_kind("group:g@example.com"));
        assert!(!is_rendered_kind("allUsers"));
        assert!(!is_rendered_kind("deleted:user:old@example.com"));
        assert!(!is_rendered_kind("userx:a@example.com"));
    }

    struct DeniedIam;

    #[async_trait]
    impl IamApi for DeniedIam {
        async fn get_iam_policy(
            &self,
            _token: &AccessToken,
            _project_id: &str,
        ) -> Result<IamPolicy, AuditError> {
            Err(AuditError::PermissionDenied(
                "resourcemanager.projects.getIamPolicy".to_string(),
            ))
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_renders_sentinel_and_propagates() {
        let outcome = audit_iam(&DeniedIam, &AccessToken::new("t"), "proj-1").await;

        assert!(!outcome.is_ok());
        assert!(outcome.sheet.is_sentinel());
        assert_eq!(outcome.sheet.rows[0][0], IAM_UNAVAILABLE);
    }
}
