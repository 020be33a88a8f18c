//! Network Rules section: direct projection of VPC firewall rules

use tracing::{info, warn};

use super::{SectionKind, SectionOutcome};
use crate::credentials::AccessToken;
use crate::gcp::{FirewallApi, FirewallRule};
use crate::report::{SheetData, FIREWALL_SHEET};

/// `(direction, sources, destinations, name, description)`
pub fn firewall_row(rule: &FirewallRule) -> Vec<String> {
    vec![
        rule.direction.clone(),
        rule.source_ranges.join(", "),
        rule.destination_ranges.join(", "),
        rule.name.clone(),
        rule.description.clone(),
    ]
}

/// Build the Network Rules sheet for `project_id`
pub async fn audit_firewall(
    api: &dyn FirewallApi,
    token: &AccessToken,
    project_id: &str,
) -> SectionOutcome {
    match api.list_firewalls(token, project_id).await {
        Ok(rules) if rules.is_empty() => {
            info!(project = %project_id, "No firewall rules found");
            SectionOutcome::ok(SectionKind::Firewall, SheetData::no_data(FIREWALL_SHEET))
        }
        Ok(rules) => {
            info!(project = %project_id, rules = rules.len(), "🛡️ Firewall rules collected");
            let mut sheet = SheetData::new(FIREWALL_SHEET);
            for rule in &rules {
                sheet.push_row(firewall_row(rule));
            }
            SectionOutcome::ok(SectionKind::Firewall, sheet)
        }
        Err(e) => {
            warn!(project = %project_id, error = %e, "Failed to list firewall rules");
            SectionOutcome::failed(SectionKind::Firewall, SheetData::no_data(FIREWALL_SHEET), e)
        }
    }
}
