//! Oracle integration module
//!
//! Everything that talks to the text-generation service sits behind the
//! [`Oracle`] trait: a task label plus a JSON payload in, a JSON payload out.
//! Responses are untrusted and are normalized by the callers.

pub mod analyzer;
pub mod client;
pub mod mock;
pub mod prompts;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The oracle tasks: four per tailoring session, plus résumé import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleTask {
    ExtractRequirements,
    ScoreMatch,
    SuggestEdits,
    ApplyEdits,
    ParseResume,
}

impl OracleTask {
    pub fn label(&self) -> &'static str {
        match self {
            OracleTask::ExtractRequirements => "requirements",
            OracleTask::ScoreMatch => "match_scoring",
            OracleTask::SuggestEdits => "suggestions",
            OracleTask::ApplyEdits => "edit_application",
            OracleTask::ParseResume => "resume_parsing",
        }
    }

    pub fn all() -> [OracleTask; 5] {
        [
            OracleTask::ExtractRequirements,
            OracleTask::ScoreMatch,
            OracleTask::SuggestEdits,
            OracleTask::ApplyEdits,
            OracleTask::ParseResume,
        ]
    }
}

impl fmt::Display for OracleTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// External text-generation capability.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Backend identifier, e.g. the model name.
    fn id(&self) -> &str;

    /// Run `task` over `payload` and return the structured result.
    async fn generate(&self, task: OracleTask, payload: &Value) -> Result<Value>;
}
