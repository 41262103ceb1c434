//! Optimization report written next to the tailored artifacts

use crate::processing::audit::PlaceholderHit;
use crate::processing::session::{TailoredOutcome, TailoringSession};
use crate::processing::suggestion::{Priority, Suggestion, SuggestionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Normalized tailoring label, e.g. `google-swe`.
    pub company: String,
    pub timestamp: DateTime<Utc>,
    pub source_resume: String,
    pub tailored_json: Option<String>,
    pub tailored_document: Option<String>,
    pub jd_target_role: String,
    pub jd_industry: String,
    pub match_score_before: u32,
    pub match_score_after: Option<u32>,
    pub improvement: Option<i64>,
    pub suggestions_total: usize,
    pub suggestions_applied: usize,
    pub suggestions_detail: Vec<AppliedSuggestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alignment_warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholder_hits: Vec<PlaceholderHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedSuggestion {
    pub id: u32,
    pub category: String,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub description: String,
    pub value: String,
    pub priority: Priority,
    #[serde(default)]
    pub modified: bool,
}

impl From<&Suggestion> for AppliedSuggestion {
    fn from(s: &Suggestion) -> Self {
        Self {
            id: s.id,
            category: s.category.clone(),
            suggestion_type: s.suggestion_type,
            description: s.description.clone(),
            value: s.value.clone(),
            priority: s.priority,
            modified: s.modified,
        }
    }
}

impl OptimizationReport {
    pub fn new(session: &TailoringSession, outcome: &TailoredOutcome, source_resume: &Path) -> Self {
        let (role, industry) = session
            .requirements()
            .map(|r| (r.role_title.clone(), r.industry.clone()))
            .unwrap_or_default();

        Self {
            company: session.label().to_string(),
            timestamp: Utc::now(),
            source_resume: source_resume.display().to_string(),
            tailored_json: None,
            tailored_document: None,
            jd_target_role: role,
            jd_industry: industry,
            match_score_before: session.prior_score(),
            match_score_after: None,
            improvement: None,
            suggestions_total: session.ledger().len(),
            suggestions_applied: outcome.applied.len(),
            suggestions_detail: outcome.applied.iter().map(AppliedSuggestion::from).collect(),
            alignment_warnings: outcome.alignment.warnings.clone(),
            placeholder_hits: outcome.audit_hits.clone(),
        }
    }

    pub fn with_rescore(mut self, score_after: u32) -> Self {
        self.match_score_after = Some(score_after);
        self.improvement = Some(i64::from(score_after) - i64::from(self.match_score_before));
        self
    }

    pub fn with_artifacts(mut self, json_path: Option<&Path>, document_path: Option<&Path>) -> Self {
        self.tailored_json = json_path.map(|p| p.display().to_string());
        self.tailored_document = document_path.map(|p| p.display().to_string());
        self
    }

    pub fn to_pretty_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::record::Record;
    use serde_json::json;

    #[test]
    fn test_report_from_outcome() {
        let record = Record::from_value(json!({"profile": "Analyst"})).unwrap();
        let mut session = TailoringSession::new(record, "Acme Health");
        session
            .ledger_mut()
            .ingest(&json!([
                {"id": 1, "type": "add_skill", "value": "SQL", "priority": "high"},
                {"id": 2, "type": "add_text", "value": "Agile"}
            ]))
            .unwrap();
        session.ledger_mut().select(&[2]);
        session.ledger_mut().modify(2, "Agile delivery");
        let outcome = session.finalize(false).unwrap();

        let report = OptimizationReport::new(&session, &outcome, Path::new("resume_master.json"))
            .with_rescore(71)
            .with_artifacts(Some(Path::new("out/r.json")), None);

        assert_eq!(report.company, "acme-health");
        assert_eq!(report.suggestions_total, 2);
        assert_eq!(report.suggestions_applied, 1);
        assert_eq!(report.suggestions_detail[0].value, "Agile delivery");
        assert!(report.suggestions_detail[0].modified);
        assert_eq!(report.improvement, Some(71));
        assert_eq!(report.tailored_json.as_deref(), Some("out/r.json"));

        let value: serde_json::Value = serde_json::from_str(&report.to_pretty_json().unwrap()).unwrap();
        assert_eq!(value["suggestions_detail"][0]["type"], "add_text");
        assert!(value.get("alignment_warnings").is_none());
    }
}
