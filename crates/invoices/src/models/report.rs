//! Sync report returned by the backend after an extraction run

use serde::{Deserialize, Serialize};

/// One-shot report from a sync run.
///
/// Not persisted anywhere; each new sync overwrites the previous report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Number of emails the backend inspected under the label
    pub emails_processed: u32,
    /// Number of invoice records extracted from them
    pub invoices_extracted: u32,
    /// Per-email extraction failures, already human-readable
    #[serde(default)]
    pub errors: Vec<String>,
}

impl SyncReport {
    /// Short summary line for notifications
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Processed {} emails, extracted {} invoices",
            self.emails_processed, self.invoices_extracted
        );
        if !self.errors.is_empty() {
            line.push_str(&format!(" ({} errors)", self.errors.len()));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_without_errors() {
        let report = SyncReport {
            emails_processed: 12,
            invoices_extracted: 4,
            errors: vec![],
        };
        assert_eq!(report.summary(), "Processed 12 emails, extracted 4 invoices");
    }

    #[test]
    fn test_summary_with_errors() {
        let report = SyncReport {
            emails_processed: 3,
            invoices_extracted: 1,
            errors: vec!["bad pdf".to_string(), "no attachment".to_string()],
        };
        assert_eq!(
            report.summary(),
            "Processed 3 emails, extracted 1 invoices (2 errors)"
        );
    }
}
