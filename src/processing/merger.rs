//! Merge an edited, anonymized record back onto the original
//!
//! Restoration is positional: `experience[i]` and `education[i]` of the
//! edited record are assumed to be the same entries as in the original.
//! Entries past the shorter list are left untouched and reported.

use crate::error::{Result, TailorError};
use crate::processing::record::{Provenance, Record};
use crate::processing::sanitizer::{LOCATION_PLACEHOLDER, REDACTED};
use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

/// Provenance `source` marker for records derived from the master resume.
pub const PROVENANCE_SOURCE: &str = "resume_master.json";

/// Titles of overlapping entries below this similarity are flagged as drift.
pub const TITLE_DRIFT_THRESHOLD: f64 = 0.5;

/// Data-quality findings from a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub experience_original: usize,
    pub experience_edited: usize,
    pub education_original: usize,
    pub education_edited: usize,
    /// Indices of edited experience entries that had no original counterpart.
    pub unmatched_experience: Vec<usize>,
    pub unmatched_education: Vec<usize>,
    pub warnings: Vec<String>,
}

impl AlignmentReport {
    pub fn is_isomorphic(&self) -> bool {
        self.experience_original == self.experience_edited
            && self.education_original == self.education_edited
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub struct ResumeMerger;

impl ResumeMerger {
    /// Restore identity-bearing fields from `original` into a copy of `edited`.
    pub fn merge(original: &Record, edited: &Record) -> Record {
        Self::merge_with_report(original, edited).0
    }

    pub fn merge_with_report(original: &Record, edited: &Record) -> (Record, AlignmentReport) {
        let mut merged = edited.clone();

        merged.identity = original.identity.clone();
        merged.identity_key = original.identity_key;

        let exp_overlap = original.experience.len().min(merged.experience.len());
        for (orig, updated) in original.experience.iter().zip(merged.experience.iter_mut()) {
            updated.company = orig.company.clone();
            if orig.location.is_some() {
                updated.location = orig.location.clone();
            }
        }

        let edu_overlap = original.education.len().min(merged.education.len());
        for (orig, updated) in original.education.iter().zip(merged.education.iter_mut()) {
            updated.institution = orig.institution.clone();
        }

        drop_bookkeeping(original, &mut merged);

        let mut report = AlignmentReport {
            experience_original: original.experience.len(),
            experience_edited: merged.experience.len(),
            education_original: original.education.len(),
            education_edited: merged.education.len(),
            unmatched_experience: (exp_overlap..merged.experience.len()).collect(),
            unmatched_education: (edu_overlap..merged.education.len()).collect(),
            warnings: Vec::new(),
        };

        if report.experience_original != report.experience_edited {
            report.warnings.push(format!(
                "Experience count changed from {} to {}; entries past index {} were not restored",
                report.experience_original,
                report.experience_edited,
                exp_overlap
            ));
        }
        if report.education_original != report.education_edited {
            report.warnings.push(format!(
                "Education count changed from {} to {}; entries past index {} were not restored",
                report.education_original,
                report.education_edited,
                edu_overlap
            ));
        }

        for (i, (orig, updated)) in original.experience.iter().zip(&edited.experience).enumerate() {
            if orig.title.is_empty() && updated.title.is_empty() {
                continue;
            }
            let similarity = normalized_levenshtein(&orig.title.to_lowercase(), &updated.title.to_lowercase());
            if similarity < TITLE_DRIFT_THRESHOLD {
                report.warnings.push(format!(
                    "experience[{}] title changed from '{}' to '{}'; entries may be misaligned",
                    i, orig.title, updated.title
                ));
            }
        }

        for warning in &report.warnings {
            warn!("{}", warning);
        }
        debug!(
            "Merged record: {} experience, {} education entries restored",
            exp_overlap, edu_overlap
        );

        (merged, report)
    }

    /// Attach a provenance block without touching any other field.
    pub fn add_metadata(record: &Record, label: &str, prior_score: u32, edit_count: usize) -> Record {
        let mut tagged = record.clone();
        tagged.metadata = Some(Provenance {
            source: PROVENANCE_SOURCE.to_string(),
            tailored_for: label.to_string(),
            created_at: Utc::now(),
            match_score_before: prior_score,
            changes_applied: edit_count,
        });
        tagged
    }

    /// Check that no placeholder survived in an identity-bearing field of
    /// `merged` within the range that corresponds to `original`.
    pub fn verify_no_leaks(original: &Record, merged: &Record) -> Result<()> {
        let leak = |field: String| -> Result<()> { Err(TailorError::IdentityLeak { field }) };
        let is_placeholder = |value: &str| value == REDACTED || value == LOCATION_PLACEHOLDER;

        if let Some(identity) = &merged.identity {
            let contact = &identity.contact;
            let fields = [
                ("identity.name", identity.name.as_str()),
                ("identity.contact.email", contact.email.as_str()),
                ("identity.contact.phone", contact.phone.as_str()),
                ("identity.contact.location", contact.location.as_str()),
                ("identity.contact.linkedin", contact.linkedin.as_str()),
            ];
            for (path, value) in fields {
                if is_placeholder(value) {
                    return leak(path.to_string());
                }
            }
            for (key, value) in &identity.contact.extra {
                if value.as_str().map_or(false, is_placeholder) {
                    return leak(format!("identity.contact.{}", key));
                }
            }
        }

        let exp_overlap = original.experience.len().min(merged.experience.len());
        for (i, exp) in merged.experience.iter().take(exp_overlap).enumerate() {
            if is_placeholder(&exp.company) {
                return leak(format!("experience[{}].company", i));
            }
            if exp.location.as_deref().map_or(false, is_placeholder) {
                return leak(format!("experience[{}].location", i));
            }
        }

        let edu_overlap = original.education.len().min(merged.education.len());
        for (i, edu) in merged.education.iter().take(edu_overlap).enumerate() {
            if is_placeholder(&edu.institution) {
                return leak(format!("education[{}].institution", i));
            }
        }

        Ok(())
    }
}

/// Remove `_`-prefixed top-level fields that the original did not carry.
fn drop_bookkeeping(original: &Record, merged: &mut Record) {
    if original.metadata.is_none() {
        merged.metadata = None;
    }
    merged
        .extra
        .retain(|key, _| !key.starts_with('_') || original.extra.contains_key(key));
}
