//! Job-description extraction and match scoring through an oracle

use crate::error::{Result, TailorError};
use crate::llm::{Oracle, OracleTask};
use crate::processing::record::{lenient_string, Record};
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// Structured requirements extracted from a job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    #[serde(default, deserialize_with = "lenient_string")]
    pub role_title: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub preferred_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub required_experience_years: Option<f32>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub required_qualifications: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub key_responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub industry: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub job_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsMatch {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub matched: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub missing: Vec<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceMatch {
    #[serde(default, deserialize_with = "lenient_years")]
    pub has_years: Option<f32>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub required_years: Option<f32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub meets_requirement: bool,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordCoverage {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub matched_keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub missing_keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: u32,
}

/// Fit of an anonymized record against job requirements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    #[serde(default, deserialize_with = "lenient_score")]
    pub overall_match_score: u32,
    #[serde(default, deserialize_with = "lenient_object")]
    pub skills_match: SkillsMatch,
    #[serde(default, deserialize_with = "lenient_object")]
    pub experience_match: ExperienceMatch,
    #[serde(default, deserialize_with = "lenient_object")]
    pub keyword_coverage: KeywordCoverage,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub gaps: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub improvement_suggestions: Vec<String>,
}

impl JobRequirements {
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(TailorError::contract(
                OracleTask::ExtractRequirements.label(),
                "expected a JSON object",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| TailorError::contract(OracleTask::ExtractRequirements.label(), e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl MatchAnalysis {
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(TailorError::contract(
                OracleTask::ScoreMatch.label(),
                "expected a JSON object",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| TailorError::contract(OracleTask::ScoreMatch.label(), e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Runs requirement extraction and match scoring on any [`Oracle`].
pub struct JobAnalyzer<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> JobAnalyzer<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    pub async fn extract_requirements(&self, job_description: &str) -> Result<JobRequirements> {
        if job_description.trim().is_empty() {
            return Err(TailorError::InvalidInput("Job description is empty".to_string()));
        }

        let payload = json!({ "job_description": job_description });
        let response = self
            .oracle
            .generate(OracleTask::ExtractRequirements, &payload)
            .await?;
        let requirements = JobRequirements::from_value(response)?;

        info!(
            "Extracted requirements for '{}': {} required skills, {} keywords",
            requirements.role_title,
            requirements.required_skills.len(),
            requirements.keywords.len()
        );
        Ok(requirements)
    }

    /// Score an anonymized record. The caller must never pass the original.
    pub async fn score_match(&self, anonymized: &Record, requirements: &JobRequirements) -> Result<MatchAnalysis> {
        let payload = json!({
            "resume": anonymized.to_value()?,
            "requirements": requirements.to_value()?,
        });
        let response = self.oracle.generate(OracleTask::ScoreMatch, &payload).await?;
        let analysis = MatchAnalysis::from_value(response)?;

        debug!(
            "Match score {} ({} skills missing, {} keywords missing)",
            analysis.overall_match_score,
            analysis.skills_match.missing.len(),
            analysis.keyword_coverage.missing_keywords.len()
        );
        Ok(analysis)
    }
}

/// A list of strings, a single string, or null. Non-string items are
/// stringified; objects use their `name` or `skill` field when present.
fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    let item_text = |item: Value| -> Option<String> {
        match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::String(_) | Value::Null => None,
            Value::Object(map) => map
                .get("name")
                .or_else(|| map.get("skill"))
                .and_then(Value::as_str)
                .map(str::to_string),
            other => Some(other.to_string()),
        }
    };

    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(item_text).collect(),
        Value::Null => Vec::new(),
        single => item_text(single).into_iter().collect(),
    })
}

/// A 0-100 score given as a number or a string such as "72", "72%" or "72/100".
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(&s),
        _ => None,
    };
    Ok(raw.map(|score| score.round().clamp(0.0, 100.0) as u32).unwrap_or(0))
}

fn lenient_years<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<f32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map(|years| years as f32),
        Value::String(s) => leading_number(&s).map(|years| years as f32),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "y"),
        Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
        _ => false,
    })
}

/// Nested sections fall back to their defaults when the oracle sends
/// something other than an object.
fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(T::default()),
    }
}

fn leading_number(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}
