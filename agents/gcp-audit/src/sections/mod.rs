//! Section aggregators
//!
//! Each aggregator folds raw API objects into one sheet. A failing
//! aggregator still returns its sheet (with a sentinel row) alongside the
//! error, so the report stays structurally complete.

pub mod byok;
pub mod firewall;
pub mod iam;

use std::fmt;

use crate::error::AuditError;
use crate::report::SheetData;

/// The three report sections, in the order they run and appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Iam,
    Byok,
    Firewall,
}

impl SectionKind {
    /// Fixed execution and sheet order
    pub const ALL: [SectionKind; 3] = [SectionKind::Iam, SectionKind::Byok, SectionKind::Firewall];
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Iam => write!(f, "IAM"),
            SectionKind::Byok => write!(f, "BYOK"),
            SectionKind::Firewall => write!(f, "Network Rules"),
        }
    }
}

/// Rendered sheet plus the failure to re-signal, if any
#[derive(Debug)]
pub struct SectionOutcome {
    pub kind: SectionKind,
    pub sheet: SheetData,
    pub result: Result<(), AuditError>,
}

impl SectionOutcome {
    pub fn ok(kind: SectionKind, sheet: SheetData) -> Self {
        Self {
            kind,
            sheet,
            result: Ok(()),
        }
    }

    /// Failed section: the error is tagged with the section it came from
    pub fn failed(kind: SectionKind, sheet: SheetData, error: AuditError) -> Self {
        Self {
            kind,
            sheet,
            result: Err(error.in_section(kind)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{SheetData, FIREWALL_SHEET};

    #[test]
    fn test_display_names_match_sheet_names() {
        let names: Vec<String> = SectionKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["IAM", "BYOK", "Network Rules"]);
    }

    #[test]
    fn test_failed_outcome_wraps_error() {
        let outcome = SectionOutcome::failed(
            SectionKind::Firewall,
            SheetData::no_data(FIREWALL_SHEET),
            AuditError::Persist("x".to_string()),
        );

        assert!(!outcome.is_ok());
        let err = outcome.result.unwrap_err();
        assert!(matches!(
            err,
            AuditError::Section {
                section: SectionKind::Firewall,
                ..
            }
        ));
    }
}
