//! PII sanitizer
//!
//! Produces the anonymized copy of a record that is safe to hand to the
//! oracle. Identity-bearing fields are replaced by sentinels or by
//! position-derived pseudonyms, so restoration only needs the original
//! record and the entry index.

use crate::error::Result;
use crate::processing::record::{Contact, Identity, Record};
use serde_json::Value;

/// Sentinel for name and contact fields.
pub const REDACTED: &str = "[REDACTED]";

/// Sentinel for employer locations.
pub const LOCATION_PLACEHOLDER: &str = "[LOCATION]";

pub const COMPANY_PREFIX: &str = "Company_";
pub const INSTITUTION_PREFIX: &str = "University_";

/// Every sentinel string the sanitizer can emit verbatim.
pub const SENTINELS: [&str; 2] = [REDACTED, LOCATION_PLACEHOLDER];

pub struct PiiSanitizer;

impl PiiSanitizer {
    /// Return an anonymized deep copy of `record`.
    pub fn sanitize(record: &Record) -> Record {
        let mut sanitized = record.clone();

        if sanitized.identity.is_some() {
            sanitized.identity = Some(redacted_identity(record.identity.as_ref()));
        }

        for (i, exp) in sanitized.experience.iter_mut().enumerate() {
            exp.company = company_pseudonym(i);
            if exp.location.is_some() {
                exp.location = Some(LOCATION_PLACEHOLDER.to_string());
            }
        }

        for (i, edu) in sanitized.education.iter_mut().enumerate() {
            edu.institution = institution_pseudonym(i);
        }

        sanitized
    }

    /// The anonymized record as indented JSON, i.e. exactly what the oracle sees.
    pub fn sanitized_json_string(record: &Record) -> Result<String> {
        Self::sanitize(record).to_pretty_json()
    }
}

fn redacted_identity(original: Option<&Identity>) -> Identity {
    // Unknown contact keys are redacted too; unknown identity keys are dropped.
    let extra = original
        .map(|identity| {
            identity
                .contact
                .extra
                .keys()
                .map(|key| (key.clone(), Value::String(REDACTED.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Identity {
        name: REDACTED.to_string(),
        contact: Contact {
            email: REDACTED.to_string(),
            phone: REDACTED.to_string(),
            location: REDACTED.to_string(),
            linkedin: REDACTED.to_string(),
            extra,
        },
        extra: Default::default(),
    }
}

/// Spreadsheet-style label for a zero-based index: A..Z, AA, AB, ...
pub fn index_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

pub fn company_pseudonym(index: usize) -> String {
    format!("{}{}", COMPANY_PREFIX, index_label(index))
}

pub fn institution_pseudonym(index: usize) -> String {
    format!("{}{}", INSTITUTION_PREFIX, index_label(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::record::Record;
    use serde_json::json;

    fn sample() -> Record {
        Record::from_value(json!({
            "identity": {
                "name": "Jane Roe",
                "contact": {
                    "email": "jane@example.com",
                    "phone": "+1 555 0100",
                    "location": "Austin, TX",
                    "linkedin": "",
                    "github": "janeroe"
                },
                "headline": "Business Analyst"
            },
            "profile": "T-shaped professional",
            "skills": {"tools": ["SQL", "Jira"]},
            "experience": [
                {"title": "Senior BA", "company": "Acme Corp", "location": "Austin", "duration": "2020-2024", "achievements": ["Did X"]},
                {"title": "BA", "company": "Beta LLC", "duration": "2017-2020", "achievements": []}
            ],
            "education": [{"institution": "State University", "degree": "BSc", "year": 2016}],
            "certifications": [{"name": "CBAP", "date": "2021"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_index_label() {
        assert_eq!(index_label(0), "A");
        assert_eq!(index_label(25), "Z");
        assert_eq!(index_label(26), "AA");
        assert_eq!(index_label(27), "AB");
        assert_eq!(index_label(701), "ZZ");
        assert_eq!(index_label(702), "AAA");
    }

    #[test]
    fn test_identity_is_redacted() {
        let sanitized = PiiSanitizer::sanitize(&sample());
        let identity = sanitized.identity.unwrap();

        assert_eq!(identity.name, REDACTED);
        assert_eq!(identity.contact.email, REDACTED);
        assert_eq!(identity.contact.phone, REDACTED);
        assert_eq!(identity.contact.location, REDACTED);
        assert_eq!(identity.contact.linkedin, REDACTED);
        assert_eq!(identity.contact.extra["github"], REDACTED);
        assert!(identity.extra.is_empty());
    }

    #[test]
    fn test_companies_and_institutions_pseudonymized() {
        let sanitized = PiiSanitizer::sanitize(&sample());

        assert_eq!(sanitized.experience[0].company, "Company_A");
        assert_eq!(sanitized.experience[1].company, "Company_B");
        assert_eq!(sanitized.experience[0].location.as_deref(), Some(LOCATION_PLACEHOLDER));
        assert!(sanitized.experience[1].location.is_none());
        assert_eq!(sanitized.education[0].institution, "University_A");
    }

    #[test]
    fn test_non_identity_content_untouched() {
        let original = sample();
        let sanitized = PiiSanitizer::sanitize(&original);

        assert_eq!(sanitized.profile, original.profile);
        assert_eq!(sanitized.skills, original.skills);
        assert_eq!(sanitized.certifications, original.certifications);
        assert_eq!(sanitized.experience[0].title, original.experience[0].title);
        assert_eq!(sanitized.experience[0].duration, original.experience[0].duration);
        assert_eq!(sanitized.experience[0].achievements, original.experience[0].achievements);
        assert_eq!(sanitized.education[0].year, original.education[0].year);
    }

    #[test]
    fn test_input_not_mutated() {
        let original = sample();
        let before = original.clone();
        let _ = PiiSanitizer::sanitize(&original);
        assert_eq!(original, before);
    }

    #[test]
    fn test_missing_sections_are_skipped() {
        let record = Record::from_value(json!({"profile": "Only a profile"})).unwrap();
        let sanitized = PiiSanitizer::sanitize(&record);

        assert!(sanitized.identity.is_none());
        assert!(sanitized.experience.is_empty());
        assert_eq!(sanitized.profile, "Only a profile");
    }

    #[test]
    fn test_sanitize_is_idempotent_on_identity_fields() {
        let once = PiiSanitizer::sanitize(&sample());
        let twice = PiiSanitizer::sanitize(&once);

        assert_eq!(once.identity, twice.identity);
        for (a, b) in once.experience.iter().zip(&twice.experience) {
            assert_eq!(a.company, b.company);
            assert_eq!(a.location, b.location);
        }
        for (a, b) in once.education.iter().zip(&twice.education) {
            assert_eq!(a.institution, b.institution);
        }
    }

    #[test]
    fn test_sanitized_json_has_no_pii() {
        let json = PiiSanitizer::sanitized_json_string(&sample()).unwrap();

        assert!(!json.contains("Jane Roe"));
        assert!(!json.contains("jane@example.com"));
        assert!(!json.contains("Acme Corp"));
        assert!(!json.contains("State University"));
        assert!(json.contains("Company_A"));
    }
}
