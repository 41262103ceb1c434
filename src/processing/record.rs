//! Structured resume record
//!
//! The record mirrors the JSON master resume. Every struct keeps the keys it
//! does not know about in an `extra` map so a record survives a
//! load/sanitize/merge/save cycle without losing fields. Oracle output is
//! untrusted, so string and list fields accept `null` and read it as empty.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::warn;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RecordFields")]
pub struct Record {
    pub identity: Option<Identity>,

    /// Top-level key the identity block was read from; it is written back
    /// under the same key.
    pub identity_key: IdentityKey,

    pub profile: String,
    pub skills: Skills,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub metadata: Option<Provenance>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityKey {
    #[default]
    Identity,
    PersonalInfo,
}

impl IdentityKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKey::Identity => "identity",
            IdentityKey::PersonalInfo => "personal_info",
        }
    }
}

/// Input shape of a record.
#[derive(Deserialize)]
struct RecordFields {
    #[serde(default)]
    identity: Option<Identity>,

    #[serde(default)]
    personal_info: Option<Identity>,

    #[serde(default, deserialize_with = "lenient_string")]
    profile: String,

    #[serde(default, deserialize_with = "null_as_default")]
    skills: Skills,

    #[serde(default, deserialize_with = "null_as_default")]
    experience: Vec<Experience>,

    #[serde(default, deserialize_with = "null_as_default")]
    education: Vec<Education>,

    #[serde(default, deserialize_with = "null_as_default")]
    certifications: Vec<Certification>,

    #[serde(rename = "_metadata", default)]
    metadata: Option<Provenance>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RecordFields> for Record {
    fn from(fields: RecordFields) -> Self {
        let (identity, identity_key) = match (fields.identity, fields.personal_info) {
            (Some(identity), other) => {
                if other.is_some() {
                    warn!("Record has both identity and personal_info; personal_info is ignored");
                }
                (Some(identity), IdentityKey::Identity)
            }
            (None, Some(identity)) => (Some(identity), IdentityKey::PersonalInfo),
            (None, None) => (None, IdentityKey::Identity),
        };

        Self {
            identity,
            identity_key,
            profile: fields.profile,
            skills: fields.skills,
            experience: fields.experience,
            education: fields.education,
            certifications: fields.certifications,
            metadata: fields.metadata,
            extra: fields.extra,
        }
    }
}

/// Output shape of a record. Empty sections are left out.
#[derive(Serialize)]
struct RecordView<'a> {
    #[serde(rename = "identity", skip_serializing_if = "Option::is_none")]
    identity: Option<&'a Identity>,

    #[serde(rename = "personal_info", skip_serializing_if = "Option::is_none")]
    personal_info: Option<&'a Identity>,

    #[serde(skip_serializing_if = "is_empty_str")]
    profile: &'a str,

    #[serde(skip_serializing_if = "is_empty_skills")]
    skills: &'a Skills,

    #[serde(skip_serializing_if = "is_empty_slice")]
    experience: &'a [Experience],

    #[serde(skip_serializing_if = "is_empty_slice")]
    education: &'a [Education],

    #[serde(skip_serializing_if = "is_empty_slice")]
    certifications: &'a [Certification],

    #[serde(rename = "_metadata", skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Provenance>,

    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let identity = self.identity.as_ref();
        let (identity, personal_info) = match self.identity_key {
            IdentityKey::Identity => (identity, None),
            IdentityKey::PersonalInfo => (None, identity),
        };

        RecordView {
            identity,
            personal_info,
            profile: &self.profile,
            skills: &self.skills,
            experience: &self.experience,
            education: &self.education,
            certifications: &self.certifications,
            metadata: self.metadata.as_ref(),
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

fn is_empty_str(text: &&str) -> bool {
    text.is_empty()
}

fn is_empty_skills(skills: &&Skills) -> bool {
    skills.is_empty()
}

fn is_empty_slice<T>(items: &&[T]) -> bool {
    items.is_empty()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub contact: Contact,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub linkedin: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub location: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<Achievement>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An achievement line is either categorized or a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Achievement {
    Categorized(CategorizedAchievement),
    Plain(String),
    /// Anything else the oracle produced; kept verbatim.
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedAchievement {
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,

    pub description: String,

    /// Metrics, tags and other keys next to the description.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Achievement {
    pub fn categorized(category: &str, description: &str) -> Self {
        Achievement::Categorized(CategorizedAchievement {
            category: category.to_string(),
            description: description.to_string(),
            extra: Map::new(),
        })
    }

    pub fn description(&self) -> &str {
        match self {
            Achievement::Categorized(a) => &a.description,
            Achievement::Plain(text) => text,
            Achievement::Other(value) => value
                .get("description")
                .or_else(|| value.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Achievement::Categorized(a) if !a.category.is_empty() => Some(&a.category),
            _ => None,
        }
    }
}

/// A year or date in the form the source used, `2019` or `"2019"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Number(Number),
    Text(String),
}

impl DateValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, DateValue::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DateValue::Number(n) => write!(f, "{}", n),
            DateValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for DateValue {
    fn from(text: &str) -> Self {
        DateValue::Text(text.to_string())
    }
}

impl From<u32> for DateValue {
    fn from(year: u32) -> Self {
        DateValue::Number(year.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default, deserialize_with = "lenient_string")]
    pub institution: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub degree: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "date_value"
    )]
    pub start_year: Option<DateValue>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "date_value"
    )]
    pub end_year: Option<DateValue>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "date_value"
    )]
    pub year: Option<DateValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Education {
    /// Human readable period, e.g. "2015 - 2019" or "2019".
    pub fn period(&self) -> Option<String> {
        match (&self.start_year, &self.end_year, &self.year) {
            (Some(start), Some(end), _) => Some(format!("{} - {}", start, end)),
            (Some(start), None, _) => Some(start.to_string()),
            (None, Some(end), _) => Some(end.to_string()),
            (None, None, year) => year.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "date_value"
    )]
    pub date: Option<DateValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Provenance block attached to a tailored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tailored_for: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub match_score_before: u32,
    #[serde(default)]
    pub changes_applied: usize,
}

/// Skill categories in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skills(pub Vec<SkillCategory>);

#[derive(Debug, Clone, PartialEq)]
pub struct SkillCategory {
    pub name: String,
    pub skills: Vec<String>,
}

impl Skills {
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.skills.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillCategory> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Total number of skills across all categories.
    pub fn skill_count(&self) -> usize {
        self.0.iter().map(|c| c.skills.len()).sum()
    }
}

impl Serialize for Skills {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for category in &self.0 {
            map.serialize_entry(&category.name, &category.skills)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkillList {
    Many(Vec<String>),
    One(String),
    Empty(()),
}

impl<'de> Deserialize<'de> for Skills {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SkillsVisitor;

        impl<'de> Visitor<'de> for SkillsVisitor {
            type Value = Skills;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of skill category to skill list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Skills, A::Error> {
                let mut categories = Vec::new();
                while let Some((name, list)) = access.next_entry::<String, SkillList>()? {
                    let skills = match list {
                        SkillList::Many(skills) => skills,
                        SkillList::One(skill) => vec![skill],
                        SkillList::Empty(()) => Vec::new(),
                    };
                    categories.push(SkillCategory { name, skills });
                }
                Ok(Skills(categories))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Skills, E> {
                Ok(Skills::default())
            }
        }

        deserializer.deserialize_any(SkillsVisitor)
    }
}

/// Strings, numbers and booleans as text; `null` as empty.
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Years and dates show up both as `2019` and `"2019"` in resume JSON; the
/// form is kept so the record is written back the way it was read.
fn date_value<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<DateValue>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Number(n) => Some(DateValue::Number(n)),
        Value::String(s) => Some(DateValue::Text(s)),
        other => Some(DateValue::Text(other.to_string())),
    })
}

/// RFC 3339, or a naive ISO 8601 timestamp such as Python's `isoformat()`
/// writes, read as UTC.
fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&text) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| de::Error::custom(format!("invalid created_at '{}': {}", text, e)))
}

impl Record {
    pub fn from_json_str(content: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Lenient conversion from an untrusted JSON value.
    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> crate::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_pretty_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn name(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.name.as_str())
    }

    pub fn achievement_count(&self) -> usize {
        self.experience.iter().map(|e| e.achievements.len()).sum()
    }
}
