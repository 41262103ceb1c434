//! Suggestion structures produced by the oracle and curated by the user

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    AddSkill,
    AddSkillToExisting,
    AddAchievement,
    ModifyText,
    AddText,
}

impl SuggestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::AddSkill => "add_skill",
            SuggestionType::AddSkillToExisting => "add_skill_to_existing",
            SuggestionType::AddAchievement => "add_achievement",
            SuggestionType::ModifyText => "modify_text",
            SuggestionType::AddText => "add_text",
        }
    }

    pub fn is_skill(&self) -> bool {
        matches!(self, SuggestionType::AddSkill | SuggestionType::AddSkillToExisting)
    }
}

impl FromStr for SuggestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add_skill" => Ok(SuggestionType::AddSkill),
            "add_skill_to_existing" => Ok(SuggestionType::AddSkillToExisting),
            "add_achievement" => Ok(SuggestionType::AddAchievement),
            "modify_text" => Ok(SuggestionType::ModifyText),
            "add_text" => Ok(SuggestionType::AddText),
            other => Err(format!("unknown suggestion type: {}", other)),
        }
    }
}

impl fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: u32,
    pub category: String,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub description: String,
    pub action: String,
    pub reason: String,
    /// Dotted path of the target, e.g. `skills.tools` or `experience[0].achievements`.
    pub section: String,
    pub value: String,
    pub priority: Priority,
    pub selected: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub modified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievement_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_after: Option<String>,
}

impl Suggestion {
    pub fn new(id: u32, suggestion_type: SuggestionType, section: &str, value: &str) -> Self {
        Self {
            id,
            category: super::ledger::DEFAULT_CATEGORY.to_string(),
            suggestion_type,
            description: super::ledger::DEFAULT_DESCRIPTION.to_string(),
            action: String::new(),
            reason: String::new(),
            section: section.to_string(),
            value: value.to_string(),
            priority: Priority::Medium,
            selected: false,
            modified: false,
            achievement_category: None,
            insert_after: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parsing() {
        assert_eq!("add_skill".parse::<SuggestionType>().unwrap(), SuggestionType::AddSkill);
        assert_eq!(" MODIFY_TEXT ".parse::<SuggestionType>().unwrap(), SuggestionType::ModifyText);
        assert!("rewrite_everything".parse::<SuggestionType>().is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
    }

    #[test]
    fn test_serialized_shape() {
        let mut suggestion = Suggestion::new(3, SuggestionType::AddAchievement, "experience[0].achievements", "Led X");
        suggestion.achievement_category = Some("Delivery".to_string());
        let json = serde_json::to_value(&suggestion).unwrap();

        assert_eq!(json["type"], "add_achievement");
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["achievement_category"], "Delivery");
        assert!(json.get("modified").is_none());
        assert!(json.get("insert_after").is_none());
    }
}
