//! Résumé import from unstructured text
//!
//! Identifying details are found with local patterns and replaced by
//! [`REDACTED`] before the text reaches the oracle. The oracle only sees the
//! redacted text; the identity block of the imported record is filled from
//! the locally extracted values.

use crate::error::{Result, TailorError};
use crate::llm::{Oracle, OracleTask};
use crate::processing::record::{Contact, Identity, IdentityKey, Record};
use crate::processing::sanitizer::REDACTED;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::{json, Value};

/// Extracted text shorter than this is treated as an empty document.
pub const MIN_RESUME_CHARS: usize = 100;

const NAME_SCAN_LINES: usize = 10;
const MAX_LOCATION_CHARS: usize = 50;

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const PHONE_PATTERNS: [&str; 2] = [
    r"\+\d{1,3}[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
    r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
];
const LINKEDIN_PATTERNS: [&str; 2] = [
    r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/in/([\w-]+)",
    r"(?i)linkedin[:\s]+([\w-]+)",
];
// Header-only: the generic "Word, Word" shape also matches skill lists.
const HEADER_LOCATION_PATTERNS: [&str; 3] = [
    r"\b[A-Z][a-z]+/[A-Z]{2,}(?:[ \t]*,[ \t]*[A-Z][a-z]+)?\b",
    r"\b[A-Z][a-z]+(?: [A-Z][a-z]+)*,[ \t]*[A-Z]{2}\b",
    r"\b[A-Z][a-z]+(?: [A-Z][a-z]+)*,[ \t]*[A-Z][a-z]+(?: [A-Z][a-z]+)*\b",
];
const LABELED_LOCATION_PATTERN: &str = r"Location[: \t]+([A-Z][A-Za-z/ \t,]+)";

/// Identifying values found in résumé text. Empty strings mean "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalPii {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Profile id, without the `linkedin.com/in/` prefix.
    pub linkedin: String,
    pub location: String,
}

impl LocalPii {
    pub fn extract(text: &str) -> Result<Self> {
        let header: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(NAME_SCAN_LINES)
            .collect();

        let pii = Self {
            name: header
                .iter()
                .find(|line| looks_like_name(line))
                .map(|line| line.to_string())
                .unwrap_or_default(),
            email: first_match(&[EMAIL_PATTERN], text)?,
            phone: first_match(&PHONE_PATTERNS, text)?,
            linkedin: first_capture(&LINKEDIN_PATTERNS, text)?,
            location: extract_location(text, &header.join("\n"))?,
        };

        debug!(
            "Local PII scan: name={} email={} phone={} linkedin={} location={}",
            !pii.name.is_empty(),
            !pii.email.is_empty(),
            !pii.phone.is_empty(),
            !pii.linkedin.is_empty(),
            !pii.location.is_empty()
        );
        Ok(pii)
    }

    /// Replace every found value in `text` with [`REDACTED`].
    pub fn redact(&self, text: &str) -> String {
        let mut values: Vec<&str> = [
            self.name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.linkedin.as_str(),
            self.location.as_str(),
        ]
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect();
        // An email can contain the LinkedIn id; replace longer values first.
        values.sort_by_key(|v| std::cmp::Reverse(v.len()));

        values
            .into_iter()
            .fold(text.to_string(), |acc, value| acc.replace(value, REDACTED))
    }

    /// Identity block of the imported record.
    pub fn into_identity(self, title: Option<String>) -> Identity {
        let mut identity = Identity {
            name: if self.name.is_empty() {
                "Unknown".to_string()
            } else {
                self.name
            },
            contact: Contact {
                email: self.email,
                phone: self.phone,
                location: self.location,
                linkedin: if self.linkedin.is_empty() {
                    String::new()
                } else {
                    format!("linkedin.com/in/{}", self.linkedin)
                },
                ..Contact::default()
            },
            ..Identity::default()
        };
        identity.extra.insert(
            "title".to_string(),
            Value::String(title.unwrap_or_else(|| "Professional".to_string())),
        );
        identity
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| TailorError::Configuration(format!("Invalid PII pattern '{}': {}", pattern, e)))
}

fn first_match(patterns: &[&str], text: &str) -> Result<String> {
    for pattern in patterns {
        if let Some(m) = compile(pattern)?.find(text) {
            return Ok(m.as_str().trim().to_string());
        }
    }
    Ok(String::new())
}

fn first_capture(patterns: &[&str], text: &str) -> Result<String> {
    for pattern in patterns {
        if let Some(group) = compile(pattern)?.captures(text).and_then(|c| c.get(1)) {
            return Ok(group.as_str().trim().to_string());
        }
    }
    Ok(String::new())
}

fn extract_location(text: &str, header: &str) -> Result<String> {
    let mut location = first_capture(&[LABELED_LOCATION_PATTERN], text)?;
    if location.is_empty() {
        location = first_match(&HEADER_LOCATION_PATTERNS, header)?;
    }
    Ok(location
        .chars()
        .take(MAX_LOCATION_CHARS)
        .collect::<String>()
        .trim()
        .to_string())
}

/// Two to five words, all but at most one capitalized, with no digits,
/// `@` or links.
fn looks_like_name(line: &str) -> bool {
    if line.contains('@') || line.contains("http") || line.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=5).contains(&words.len()) {
        return false;
    }
    let capitalized = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count();
    capitalized + 1 >= words.len()
}

pub struct ResumeImporter<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> ResumeImporter<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Build a record from extracted résumé text.
    pub async fn import_text(&self, text: &str) -> Result<Record> {
        let text = text.trim();
        if text.chars().count() < MIN_RESUME_CHARS {
            return Err(TailorError::InvalidInput(format!(
                "Résumé text is too short to import ({} characters); the document may be empty or scanned",
                text.chars().count()
            )));
        }

        let pii = LocalPii::extract(text)?;
        let redacted = pii.redact(text);
        info!("Parsing redacted résumé text ({} characters)", redacted.chars().count());

        let response = self
            .oracle
            .generate(OracleTask::ParseResume, &json!({ "resume_text": redacted }))
            .await?;

        let task = OracleTask::ParseResume.label();
        let mut fields = match response {
            Value::Object(map) => map,
            _ => return Err(TailorError::contract(task, "expected a résumé object")),
        };

        let title = match fields.remove("title") {
            Some(Value::String(title)) if !title.trim().is_empty() => Some(title.trim().to_string()),
            _ => None,
        };
        for key in ["identity", "personal_info"] {
            if fields.remove(key).is_some() {
                warn!("Discarding `{}` returned by the oracle", key);
            }
        }

        let mut record =
            Record::from_value(Value::Object(fields)).map_err(|e| TailorError::contract(task, e.to_string()))?;
        record.identity = Some(pii.into_identity(title));
        record.identity_key = IdentityKey::PersonalInfo;

        info!(
            "Imported record: {} experience entries, {} skills",
            record.experience.len(),
            record.skills.skill_count()
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockOracle;

    const RESUME_TEXT: &str = "Jordan Avery\n\
        Portland, OR\n\
        jordan.avery@example.com | +1 555 014 2233 | linkedin.com/in/jordan-avery\n\
        \n\
        Profile\n\
        Business analyst with six years of experience turning operational data into decisions.\n\
        \n\
        Skills\n\
        Analysis: Requirements gathering, Process mapping\n\
        Tools: Excel, Jira, Power BI\n\
        \n\
        Experience\n\
        Senior Business Analyst, Northwind Health, 2020 - Present\n\
        Led claims workflow redesign for 40 clinics.";

    fn parsed_reply() -> Value {
        json!({
            "title": "Senior Business Analyst",
            "profile": "Business analyst with six years of experience turning operational data into decisions.",
            "skills": {"analysis": ["Requirements gathering", "Process mapping"], "tools": ["Excel", "Jira", "Power BI"]},
            "experience": [{
                "title": "Senior Business Analyst",
                "company": "Northwind Health",
                "duration": "2020 - Present",
                "location": "",
                "achievements": [{"category": "", "description": "Led claims workflow redesign for 40 clinics."}]
            }],
            "education": [],
            "certifications": []
        })
    }

    #[test]
    fn test_extracts_local_pii() {
        let pii = LocalPii::extract(RESUME_TEXT).unwrap();

        assert_eq!(pii.name, "Jordan Avery");
        assert_eq!(pii.email, "jordan.avery@example.com");
        assert_eq!(pii.phone, "+1 555 014 2233");
        assert_eq!(pii.linkedin, "jordan-avery");
        assert_eq!(pii.location, "Portland, OR");
    }

    #[test]
    fn test_location_ignores_skill_lists() {
        let mut text = "Jordan Avery\njordan@example.com\n".to_string();
        for i in 0..NAME_SCAN_LINES {
            text.push_str(&format!("detail line {}\n", i));
        }
        text.push_str("Skills\nExcel, Jira\n");
        let pii = LocalPii::extract(&text).unwrap();

        assert_eq!(pii.location, "");
    }

    #[test]
    fn test_labeled_location_is_truncated() {
        let text = format!("Location: Portland {}\nMore text", "x".repeat(80));
        let pii = LocalPii::extract(&text).unwrap();

        assert_eq!(pii.location.chars().count(), MAX_LOCATION_CHARS);
        assert!(pii.location.starts_with("Portland"));
    }

    #[test]
    fn test_name_heuristic() {
        assert!(looks_like_name("Jordan Avery"));
        assert!(looks_like_name("Mary van Buren"));
        assert!(!looks_like_name("Jordan"));
        assert!(!looks_like_name("jordan.avery@example.com"));
        assert!(!looks_like_name("Class of 2018"));
        assert!(!looks_like_name("business analyst with experience"));
    }

    #[test]
    fn test_redact_removes_every_value() {
        let pii = LocalPii::extract(RESUME_TEXT).unwrap();
        let redacted = pii.redact(RESUME_TEXT);

        for value in ["Jordan Avery", "jordan.avery@example.com", "+1 555 014 2233", "jordan-avery", "Portland, OR"] {
            assert!(!redacted.contains(value), "{} survived redaction", value);
        }
        assert!(redacted.contains("Northwind Health"));
        assert!(redacted.contains(REDACTED));
    }

    #[tokio::test]
    async fn test_import_sends_only_redacted_text() {
        let oracle = MockOracle::new().with_response(OracleTask::ParseResume, parsed_reply());
        let record = ResumeImporter::new(&oracle).import_text(RESUME_TEXT).await.unwrap();

        let payloads = oracle.calls_for(OracleTask::ParseResume);
        assert_eq!(payloads.len(), 1);
        let sent = payloads[0].to_string();
        for value in ["Jordan Avery", "jordan.avery@example.com", "555 014 2233", "jordan-avery"] {
            assert!(!sent.contains(value), "{} reached the oracle", value);
        }

        let identity = record.identity.as_ref().unwrap();
        assert_eq!(identity.name, "Jordan Avery");
        assert_eq!(identity.contact.email, "jordan.avery@example.com");
        assert_eq!(identity.contact.linkedin, "linkedin.com/in/jordan-avery");
        assert_eq!(identity.extra["title"], "Senior Business Analyst");
        assert_eq!(record.identity_key, IdentityKey::PersonalInfo);
        assert_eq!(record.experience[0].company, "Northwind Health");
        assert_eq!(record.skills.skill_count(), 5);

        let written = record.to_value().unwrap();
        assert!(written.get("personal_info").is_some());
        assert!(written.get("title").is_none());
    }

    #[tokio::test]
    async fn test_oracle_identity_is_replaced() {
        let mut reply = parsed_reply();
        reply["personal_info"] = json!({"name": "[REDACTED]"});
        reply.as_object_mut().unwrap().remove("title");
        let oracle = MockOracle::new().with_response(OracleTask::ParseResume, reply);

        let record = ResumeImporter::new(&oracle).import_text(RESUME_TEXT).await.unwrap();
        let identity = record.identity.unwrap();

        assert_eq!(identity.name, "Jordan Avery");
        assert_eq!(identity.extra["title"], "Professional");
        assert!(record.extra.is_empty());
    }

    #[tokio::test]
    async fn test_short_text_is_rejected_without_oracle_call() {
        let oracle = MockOracle::new();
        let err = ResumeImporter::new(&oracle).import_text("Jordan Avery\n").await.unwrap_err();

        assert!(matches!(err, TailorError::InvalidInput(_)));
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_object_reply_is_a_contract_error() {
        let oracle = MockOracle::new().with_response(OracleTask::ParseResume, json!(["not", "a", "record"]));
        let err = ResumeImporter::new(&oracle).import_text(RESUME_TEXT).await.unwrap_err();

        assert!(matches!(err, TailorError::OracleContract { ref task, .. } if task == "resume_parsing"));
    }
}
