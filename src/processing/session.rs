//! One tailoring run: original record, anonymized copy, oracle results and
//! the suggestion ledger, from analysis to the merged final record.

use crate::error::{Result, TailorError};
use crate::llm::analyzer::{JobAnalyzer, JobRequirements, MatchAnalysis};
use crate::llm::{Oracle, OracleTask};
use crate::processing::applier::EditApplier;
use crate::processing::audit::{PlaceholderAudit, PlaceholderHit};
use crate::processing::ledger::SuggestionLedger;
use crate::processing::merger::{AlignmentReport, ResumeMerger};
use crate::processing::record::Record;
use crate::processing::sanitizer::PiiSanitizer;
use crate::processing::suggestion::Suggestion;
use log::{info, warn};
use serde_json::json;

/// Result of [`TailoringSession::finalize`].
#[derive(Debug, Clone)]
pub struct TailoredOutcome {
    pub record: Record,
    pub alignment: AlignmentReport,
    pub audit_hits: Vec<PlaceholderHit>,
    pub applied: Vec<Suggestion>,
}

pub struct TailoringSession {
    label: String,
    original: Record,
    anonymized: Record,
    requirements: Option<JobRequirements>,
    analysis: Option<MatchAnalysis>,
    ledger: SuggestionLedger,
    edited: Option<Record>,
}

impl TailoringSession {
    pub fn new(original: Record, label: &str) -> Self {
        let anonymized = PiiSanitizer::sanitize(&original);
        Self {
            label: normalize_label(label),
            original,
            anonymized,
            requirements: None,
            analysis: None,
            ledger: SuggestionLedger::new(),
            edited: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn original(&self) -> &Record {
        &self.original
    }

    /// The only record content ever sent to the oracle.
    pub fn anonymized(&self) -> &Record {
        &self.anonymized
    }

    pub fn requirements(&self) -> Option<&JobRequirements> {
        self.requirements.as_ref()
    }

    pub fn analysis(&self) -> Option<&MatchAnalysis> {
        self.analysis.as_ref()
    }

    pub fn edited(&self) -> Option<&Record> {
        self.edited.as_ref()
    }

    pub fn ledger(&self) -> &SuggestionLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut SuggestionLedger {
        &mut self.ledger
    }

    pub fn prior_score(&self) -> u32 {
        self.analysis.as_ref().map_or(0, |a| a.overall_match_score)
    }

    /// Extract requirements from the job description and score the
    /// anonymized record against them.
    pub async fn analyze(&mut self, oracle: &dyn Oracle, job_description: &str) -> Result<&MatchAnalysis> {
        let analyzer = JobAnalyzer::new(oracle);
        let requirements = analyzer.extract_requirements(job_description).await?;
        let analysis = analyzer.score_match(&self.anonymized, &requirements).await?;

        info!(
            "Initial match score for '{}': {}/100",
            self.label, analysis.overall_match_score
        );
        self.requirements = Some(requirements);
        Ok(self.analysis.insert(analysis))
    }

    /// Ask the oracle for a suggestion batch; replaces any previous batch.
    pub async fn generate_suggestions(&mut self, oracle: &dyn Oracle) -> Result<usize> {
        let (requirements, analysis) = match (&self.requirements, &self.analysis) {
            (Some(r), Some(a)) => (r, a),
            _ => {
                return Err(TailorError::Session(
                    "analysis must run before suggestions are generated".to_string(),
                ))
            }
        };

        let payload = json!({
            "resume": self.anonymized.to_value()?,
            "requirements": requirements.to_value()?,
            "match_analysis": analysis.to_value()?,
        });
        let response = oracle.generate(OracleTask::SuggestEdits, &payload).await?;
        let count = self.ledger.ingest(&response)?;

        info!("Generated {} suggestions", count);
        Ok(count)
    }

    /// Apply the currently selected suggestions to the anonymized record.
    pub async fn apply(&mut self, oracle: &dyn Oracle) -> Result<&Record> {
        let selected = self.ledger.selected_cloned();
        let edited = EditApplier::new(oracle).apply(&self.anonymized, &selected).await?;
        Ok(self.edited.insert(edited))
    }

    /// Merge the edited copy back onto the original, attach provenance and
    /// verify that no placeholder leaked into identity-bearing fields.
    ///
    /// With `strict_audit`, any sentinel found anywhere in the final record
    /// is also fatal.
    pub fn finalize(&self, strict_audit: bool) -> Result<TailoredOutcome> {
        let edited = self.edited.as_ref().unwrap_or(&self.anonymized);
        let (merged, alignment) = ResumeMerger::merge_with_report(&self.original, edited);

        ResumeMerger::verify_no_leaks(&self.original, &merged)?;

        let applied = self.ledger.selected_cloned();
        let record = ResumeMerger::add_metadata(&merged, &self.label, self.prior_score(), applied.len());

        let audit_hits = PlaceholderAudit::new()?.scan(&record)?;
        for hit in &audit_hits {
            warn!("Placeholder {} found at {} ({}x)", hit.placeholder, hit.path, hit.count);
        }
        if strict_audit {
            if let Some(hit) = audit_hits.first() {
                return Err(TailorError::IdentityLeak {
                    field: hit.path.clone(),
                });
            }
        }

        Ok(TailoredOutcome {
            record,
            alignment,
            audit_hits,
            applied,
        })
    }

    /// Score a finalized record again. It is re-anonymized and stripped of
    /// provenance first.
    pub async fn rescore(&self, oracle: &dyn Oracle, tailored: &Record) -> Result<MatchAnalysis> {
        let requirements = self
            .requirements
            .as_ref()
            .ok_or_else(|| TailorError::Session("analysis must run before rescoring".to_string()))?;

        let mut anonymized = PiiSanitizer::sanitize(tailored);
        anonymized.metadata = None;

        let analysis = JobAnalyzer::new(oracle).score_match(&anonymized, requirements).await?;
        info!(
            "Score after tailoring: {}/100 (was {})",
            analysis.overall_match_score,
            self.prior_score()
        );
        Ok(analysis)
    }
}

/// Lowercase a company/role label and join words with '-'.
pub fn normalize_label(label: &str) -> String {
    let normalized = label.trim().to_lowercase().replace([' ', '_'], "-");
    if normalized.is_empty() {
        "general".to_string()
    } else {
        normalized
    }
}
