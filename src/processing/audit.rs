//! Placeholder audit over a whole record
//!
//! `ResumeMerger::verify_no_leaks` only looks at identity-bearing fields.
//! The audit walks every string in the record and reports sentinels that
//! the oracle echoed into free text, e.g. "[REDACTED]" inside the profile.

use crate::error::{Result, TailorError};
use crate::processing::record::Record;
use crate::processing::sanitizer::SENTINELS;
use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderHit {
    /// JSON path of the offending string, e.g. `experience[0].achievements[2]`.
    pub path: String,
    pub placeholder: String,
    pub count: usize,
}

pub struct PlaceholderAudit {
    matcher: AhoCorasick,
    patterns: Vec<String>,
}

impl PlaceholderAudit {
    pub fn new() -> Result<Self> {
        Self::with_patterns(SENTINELS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_patterns(patterns: Vec<String>) -> Result<Self> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| TailorError::Configuration(format!("Failed to build placeholder matcher: {}", e)))?;

        Ok(Self { matcher, patterns })
    }

    pub fn scan(&self, record: &Record) -> Result<Vec<PlaceholderHit>> {
        let value = record.to_value()?;
        let mut hits = Vec::new();
        self.walk(&value, String::new(), &mut hits);
        Ok(hits)
    }

    fn walk(&self, value: &Value, path: String, hits: &mut Vec<PlaceholderHit>) {
        match value {
            Value::String(text) => self.scan_text(text, &path, hits),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.walk(item, format!("{}[{}]", path, i), hits);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    let child = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    self.walk(item, child, hits);
                }
            }
            _ => {}
        }
    }

    fn scan_text(&self, text: &str, path: &str, hits: &mut Vec<PlaceholderHit>) {
        let mut counts = vec![0usize; self.patterns.len()];
        for m in self.matcher.find_iter(text) {
            counts[m.pattern().as_usize()] += 1;
        }
        for (index, count) in counts.into_iter().enumerate() {
            if count > 0 {
                hits.push(PlaceholderHit {
                    path: path.to_string(),
                    placeholder: self.patterns[index].clone(),
                    count,
                });
            }
        }
    }
}
