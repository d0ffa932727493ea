// Domain data model - wire shapes match the report backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk level of a finding. Serialized lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Info,
}

/// OWASP Top 10 2021 category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwaspCategory {
    BrokenAccessControl,
    CryptographicFailures,
    Injection,
    InsecureDesign,
    SecurityMisconfiguration,
    VulnerableComponents,
    AuthenticationFailures,
    SoftwareIntegrityFailures,
    LoggingMonitoringFailures,
    Ssrf,
}

/// Mutable in-memory form state for a finding, fresh or hydrated for edit.
///
/// Optional fields hold the raw form value; `normalized()` maps empty
/// strings to absent before anything is sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingDraft {
    pub report_id: u64,
    pub title: String,
    pub description: String,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owasp_category: Option<OwaspCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_to_reproduce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwe_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refs: Option<String>,
}

impl FindingDraft {
    /// Fresh draft for a report, risk level defaulting to medium.
    pub fn for_report(report_id: u64) -> Self {
        Self {
            report_id,
            title: String::new(),
            description: String::new(),
            risk_level: RiskLevel::Medium,
            owasp_category: None,
            affected_area: None,
            impact: None,
            solution: None,
            steps_to_reproduce: None,
            request: None,
            response: None,
            cvss_score: None,
            cwe_id: None,
            refs: None,
        }
    }

    /// Hydrate a draft from a persisted finding for edit mode.
    pub fn from_finding(finding: &PersistedFinding) -> Self {
        Self {
            report_id: finding.report_id,
            title: finding.title.clone(),
            description: finding.description.clone(),
            risk_level: finding.risk_level,
            owasp_category: finding.owasp_category,
            affected_area: finding.affected_area.clone(),
            impact: finding.impact.clone(),
            solution: finding.solution.clone(),
            steps_to_reproduce: finding.steps_to_reproduce.clone(),
            request: finding.request.clone(),
            response: finding.response.clone(),
            cvss_score: finding.cvss_score.clone(),
            cwe_id: finding.cwe_id.clone(),
            refs: finding.refs.clone(),
        }
    }

    /// Copy of the draft with empty-string optionals mapped to absent, so
    /// the serialized payload omits them instead of sending "".
    pub fn normalized(&self) -> Self {
        fn clean(field: &Option<String>) -> Option<String> {
            field.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
        }
        Self {
            report_id: self.report_id,
            title: self.title.clone(),
            description: self.description.clone(),
            risk_level: self.risk_level,
            owasp_category: self.owasp_category,
            affected_area: clean(&self.affected_area),
            impact: clean(&self.impact),
            solution: clean(&self.solution),
            steps_to_reproduce: clean(&self.steps_to_reproduce),
            request: clean(&self.request),
            response: clean(&self.response),
            cvss_score: clean(&self.cvss_score),
            cwe_id: clean(&self.cwe_id),
            refs: clean(&self.refs),
        }
    }
}

/// Evidence image held locally until its upload settles. Owned exclusively
/// by the workflow instance that queued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl PendingImage {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }
}

/// Server-persisted evidence image attached to a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedImage {
    pub id: u64,
    pub original_filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// A finding as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedFinding {
    pub id: u64,
    pub report_id: u64,
    pub title: String,
    pub description: String,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owasp_category: Option<OwaspCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_to_reproduce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refs: Option<String>,
    /// Presentation order within the report. Absent is treated as 0.
    /// Values need not be contiguous; only their relative order matters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub poc_images: Vec<PersistedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PersistedFinding {
    /// Sort key for presentation order.
    pub fn order_key(&self) -> i32 {
        self.display_order.unwrap_or(0)
    }
}

/// A report with its ordered collection of findings. The reorder protocol's
/// unit of consistency is all findings of one report, never a subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tester_name: Option<String>,
    #[serde(default)]
    pub findings: Vec<PersistedFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Reusable finding blueprint created by promoting a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseTemplate {
    pub id: u64,
    pub title: String,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with_optionals() -> FindingDraft {
        let mut draft = FindingDraft::for_report(7);
        draft.title = "SQL injection in login".to_string();
        draft.description = "The login form concatenates user input".to_string();
        draft.affected_area = Some(String::new());
        draft.impact = Some("full database read".to_string());
        draft.cwe_id = Some(String::new());
        draft
    }

    #[test]
    fn normalized_maps_empty_optionals_to_absent() {
        let normalized = draft_with_optionals().normalized();
        assert_eq!(normalized.affected_area, None);
        assert_eq!(normalized.cwe_id, None);
        assert_eq!(normalized.impact.as_deref(), Some("full database read"));
    }

    #[test]
    fn normalized_payload_omits_absent_fields() {
        let payload =
            serde_json::to_value(draft_with_optionals().normalized()).unwrap();
        let object = payload.as_object().unwrap();
        assert!(!object.contains_key("affected_area"));
        assert!(!object.contains_key("cwe_id"));
        assert_eq!(object["impact"], "full database read");
        assert_eq!(object["risk_level"], "medium");
    }

    #[test]
    fn fresh_draft_defaults_to_medium_risk() {
        let draft = FindingDraft::for_report(3);
        assert_eq!(draft.risk_level, RiskLevel::Medium);
        assert_eq!(draft.report_id, 3);
        assert!(draft.title.is_empty());
    }

    #[test]
    fn owasp_category_uses_snake_case_on_the_wire() {
        let json = serde_json::to_value(OwaspCategory::BrokenAccessControl).unwrap();
        assert_eq!(json, "broken_access_control");
        let back: OwaspCategory = serde_json::from_value(json).unwrap();
        assert_eq!(back, OwaspCategory::BrokenAccessControl);
    }

    #[test]
    fn draft_hydrates_from_persisted_finding() {
        let finding = PersistedFinding {
            id: 11,
            report_id: 7,
            title: "XSS".to_string(),
            description: "Reflected".to_string(),
            risk_level: RiskLevel::High,
            owasp_category: Some(OwaspCategory::Injection),
            affected_area: Some("/search".to_string()),
            impact: None,
            solution: None,
            steps_to_reproduce: None,
            request: None,
            response: None,
            cvss_score: None,
            cwe_id: Some("CWE-79".to_string()),
            refs: None,
            display_order: Some(2),
            poc_images: vec![],
            created_at: None,
        };
        let draft = FindingDraft::from_finding(&finding);
        assert_eq!(draft.report_id, 7);
        assert_eq!(draft.title, "XSS");
        assert_eq!(draft.risk_level, RiskLevel::High);
        assert_eq!(draft.cwe_id.as_deref(), Some("CWE-79"));
    }
}
