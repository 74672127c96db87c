//! Compliance checks and audit logging
//!
//! The compliance check is a static lookup per regulatory regime; it never
//! rejects an action. Audit writes are best effort: a failing sink is logged
//! and otherwise ignored.

use crate::error::AppError;
use crate::store::models::AuditLogEntry;
use crate::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Regulatory regime applied to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ComplianceLevel {
    /// US health data
    #[serde(rename = "HIPAA")]
    Hipaa,
    /// EU personal data
    #[serde(rename = "GDPR")]
    Gdpr,
    /// Service organisation controls
    #[serde(rename = "SOC2")]
    Soc2,
    /// US education records
    #[serde(rename = "FERPA")]
    Ferpa,
    /// US broker-dealers
    #[serde(rename = "FINRA")]
    Finra,
    /// Card payments
    #[serde(rename = "PCI-DSS")]
    PciDss,
    /// Baseline
    #[default]
    #[serde(rename = "standard", alias = "STANDARD")]
    Standard,
}

impl ComplianceLevel {
    /// Every level
    pub const ALL: [ComplianceLevel; 7] = [
        ComplianceLevel::Hipaa,
        ComplianceLevel::Gdpr,
        ComplianceLevel::Soc2,
        ComplianceLevel::Ferpa,
        ComplianceLevel::Finra,
        ComplianceLevel::PciDss,
        ComplianceLevel::Standard,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceLevel::Hipaa => "HIPAA",
            ComplianceLevel::Gdpr => "GDPR",
            ComplianceLevel::Soc2 => "SOC2",
            ComplianceLevel::Ferpa => "FERPA",
            ComplianceLevel::Finra => "FINRA",
            ComplianceLevel::PciDss => "PCI-DSS",
            ComplianceLevel::Standard => "standard",
        }
    }

    /// Required controls and restrictions for this level
    pub fn checklist(&self) -> ComplianceChecklist {
        let (required, restrictions): (&[&str], &[&str]) = match self {
            ComplianceLevel::Hipaa => (
                &[
                    "data_encryption",
                    "audit_logging",
                    "access_controls",
                    "phi_protection",
                ],
                &["no_public_sharing", "minimum_necessary"],
            ),
            ComplianceLevel::Gdpr => (
                &["consent_tracking", "data_portability", "right_to_erasure"],
                &["purpose_limitation", "data_minimization"],
            ),
            ComplianceLevel::Soc2 => (
                &["security_monitoring", "access_logging", "change_management"],
                &["least_privilege"],
            ),
            ComplianceLevel::Ferpa => (
                &["education_record_protection", "parent_consent"],
                &["no_unauthorized_disclosure"],
            ),
            ComplianceLevel::Finra => (
                &["financial_record_retention", "communication_archival"],
                &["no_misleading_communication"],
            ),
            ComplianceLevel::PciDss => (
                &[
                    "card_data_encryption",
                    "network_security",
                    "vulnerability_management",
                ],
                &["no_card_storage"],
            ),
            ComplianceLevel::Standard => (&["audit_logging", "access_controls"], &[]),
        };
        ComplianceChecklist {
            level: *self,
            required: required.iter().map(|s| s.to_string()).collect(),
            restrictions: restrictions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComplianceLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown compliance level: {}", s))
    }
}

/// Static checklist for one level
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComplianceChecklist {
    /// Level described
    pub level: ComplianceLevel,
    /// Controls that must be in place
    pub required: Vec<String>,
    /// Restrictions applied to actions
    pub restrictions: Vec<String>,
}

/// An action subject to compliance and audit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceAction {
    /// Kind of action ("message", "task_completion", ...)
    #[serde(rename = "type")]
    pub action_type: String,
    /// Free-text details
    pub details: String,
}

impl ComplianceAction {
    /// Build an action
    pub fn new(action_type: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            details: details.into(),
        }
    }
}

/// Outcome of a compliance check
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComplianceReport {
    /// Always true
    pub compliant: bool,
    /// Controls considered satisfied
    pub checks_passed: Vec<String>,
    /// Restrictions in force
    pub restrictions_applied: Vec<String>,
    /// Reference id for the audit trail
    pub audit_log_id: String,
}

/// Look up the checklist for `level` and report the action compliant
pub fn ensure_compliance(
    action: &ComplianceAction,
    user_id: Option<&str>,
    level: ComplianceLevel,
) -> ComplianceReport {
    let checklist = level.checklist();
    let report = ComplianceReport {
        compliant: true,
        checks_passed: checklist.required,
        restrictions_applied: checklist.restrictions,
        audit_log_id: format!("audit_{}", Utc::now().timestamp_millis()),
    };
    tracing::debug!(
        user_id = user_id.unwrap_or("anonymous"),
        action_type = %action.action_type,
        level = %level,
        audit_log_id = %report.audit_log_id,
        "Compliance check passed"
    );
    report
}

/// Destination for audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one record
    async fn record(&self, entry: AuditLogEntry) -> Result<(), AppError>;
}

/// Audit sink backed by the store
#[derive(Debug, Clone)]
pub struct StoreAuditSink {
    store: Arc<Store>,
}

impl StoreAuditSink {
    /// Wrap `store`
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditSink for StoreAuditSink {
    async fn record(&self, entry: AuditLogEntry) -> Result<(), AppError> {
        self.store.append_audit(&entry).await
    }
}

/// Record an audit entry, logging and swallowing any failure
pub async fn audit_action(
    sink: &dyn AuditSink,
    user_id: &str,
    action: &ComplianceAction,
    result: Value,
) {
    let entry = AuditLogEntry::new(user_id, &action.action_type, &action.details, result);
    if let Err(e) = sink.record(entry).await {
        tracing::warn!(user_id = %user_id, action_type = %action.action_type, "Audit logging failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_hipaa_checklist() {
        let report = ensure_compliance(
            &ComplianceAction::new("message", "hello"),
            Some("u1"),
            ComplianceLevel::Hipaa,
        );
        assert!(report.compliant);
        assert_eq!(report.checks_passed.len(), 4);
        assert!(report.checks_passed.contains(&"phi_protection".to_string()));
        assert_eq!(
            report.restrictions_applied,
            vec!["no_public_sharing", "minimum_necessary"]
        );
        assert!(report.audit_log_id.starts_with("audit_"));
    }

    #[test]
    fn test_level_names() {
        assert_eq!("pci-dss".parse::<ComplianceLevel>(), Ok(ComplianceLevel::PciDss));
        assert_eq!(
            serde_json::to_value(ComplianceLevel::Standard).unwrap(),
            json!("standard")
        );
        assert!("ISO9001".parse::<ComplianceLevel>().is_err());
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _entry: AuditLogEntry) -> Result<(), AppError> {
            Err(AppError::Database("disk full".to_string()))
        }
    }

    #[derive(Default)]
    struct MemorySink(Mutex<Vec<AuditLogEntry>>);

    #[async_trait]
    impl AuditSink for MemorySink {
        async fn record(&self, entry: AuditLogEntry) -> Result<(), AppError> {
            self.0.lock().unwrap().push(entry);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_audit_failure_is_swallowed() {
        let action = ComplianceAction::new("task_completion", "hi");
        audit_action(&FailingSink, "u1", &action, json!({"success": true})).await;
    }

    #[tokio::test]
    async fn test_audit_entry_is_masked() {
        let sink = MemorySink::default();
        let action = ComplianceAction::new("task_completion", "hi");
        audit_action(&sink, "u1", &action, json!({"success": true})).await;

        let entries = sink.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip_address, "masked_for_privacy");
        assert_eq!(entries[0].action_type, "task_completion");
    }
}
