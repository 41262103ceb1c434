//! Apply selected suggestions to the anonymized record through the oracle

use crate::error::{Result, TailorError};
use crate::llm::{Oracle, OracleTask};
use crate::processing::record::Record;
use crate::processing::suggestion::{Suggestion, SuggestionType};
use log::{debug, info, warn};
use serde_json::{json, Value};

pub struct EditApplier<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> EditApplier<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Produce a new anonymized record with `selected` applied.
    ///
    /// With nothing selected the oracle is not called and the input is
    /// returned unchanged.
    pub async fn apply(&self, anonymized: &Record, selected: &[Suggestion]) -> Result<Record> {
        if selected.is_empty() {
            info!("No suggestions selected; record left unchanged");
            return Ok(anonymized.clone());
        }

        let instructions = format_instructions(selected);
        debug!("Applying {} edits:\n{}", selected.len(), instructions);

        let payload = json!({
            "resume": anonymized.to_value()?,
            "instructions": instructions,
            "suggestions": selected,
        });

        let response = self.oracle.generate(OracleTask::ApplyEdits, &payload).await?;
        let edited = parse_edited_record(response)?;

        info!(
            "Edits applied: {} experience entries, {} achievements",
            edited.experience.len(),
            edited.achievement_count()
        );
        Ok(edited)
    }
}

/// Accepts the record itself or a `{"resume": {...}}` wrapper. Keys next to
/// the wrapped record (change logs, notes) are discarded.
fn parse_edited_record(response: Value) -> Result<Record> {
    let task = OracleTask::ApplyEdits.label();
    let record = match response {
        Value::Object(mut map) => match map.remove("resume") {
            Some(inner @ Value::Object(_)) => {
                if !map.is_empty() {
                    let dropped: Vec<&str> = map.keys().map(String::as_str).collect();
                    warn!("Ignoring keys next to the edited record: {}", dropped.join(", "));
                }
                inner
            }
            Some(inner) => {
                map.insert("resume".to_string(), inner);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => {
            return Err(TailorError::contract(
                task,
                format!("expected a record object, got {}", json_kind(&other)),
            ))
        }
    };

    Record::from_value(record).map_err(|e| TailorError::contract(task, e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render selected suggestions as the instruction list of the apply prompt.
pub fn format_instructions(selected: &[Suggestion]) -> String {
    selected
        .iter()
        .map(|s| match s.suggestion_type {
            SuggestionType::AddSkill | SuggestionType::AddSkillToExisting => format!(
                "• ADD SKILL: '{}'\n  Location: {}\n  Action: {}",
                s.value, s.section, s.action
            ),
            SuggestionType::AddAchievement => format!(
                "• ADD ACHIEVEMENT:\n  Category: {}\n  Text: \"{}\"\n  Location: {}\n  Action: {}",
                s.achievement_category.as_deref().unwrap_or("General"),
                s.value,
                s.section,
                s.action
            ),
            SuggestionType::ModifyText => {
                let mut block = format!(
                    "• MODIFY TEXT:\n  Location: {}\n  Change: {}\n  New text: \"{}\"",
                    s.section, s.description, s.value
                );
                if let Some(anchor) = &s.insert_after {
                    block.push_str(&format!("\n  Insert after: \"{}\"", anchor));
                }
                block.push_str(&format!("\n  Action: {}", s.action));
                block
            }
            SuggestionType::AddText => format!(
                "• ADD TEXT:\n  Location: {}\n  Text: \"{}\"\n  Action: {}",
                s.section, s.value, s.action
            ),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockOracle;

    fn suggestion(id: u32, kind: SuggestionType, section: &str, value: &str) -> Suggestion {
        Suggestion::new(id, kind, section, value)
    }

    #[test]
    fn test_instruction_blocks() {
        let mut achievement = suggestion(2, SuggestionType::AddAchievement, "experience[0].achievements", "Cut costs 20%");
        achievement.achievement_category = Some("Impact".to_string());
        let mut modify = suggestion(3, SuggestionType::ModifyText, "profile", "Healthcare BA");
        modify.insert_after = Some("Analyst".to_string());

        let text = format_instructions(&[
            suggestion(1, SuggestionType::AddSkillToExisting, "skills.tools", "Python"),
            achievement,
            modify,
            suggestion(4, SuggestionType::AddText, "profile", "Agile certified"),
        ]);

        assert!(text.starts_with("• ADD SKILL: 'Python'\n  Location: skills.tools"));
        assert!(text.contains("Category: Impact\n  Text: \"Cut costs 20%\""));
        assert!(text.contains("Insert after: \"Analyst\""));
        assert!(text.contains("• ADD TEXT:\n  Location: profile"));
        assert_eq!(text.matches("\n\n•").count(), 3);
    }

    #[test]
    fn test_achievement_category_defaults_to_general() {
        let text = format_instructions(&[suggestion(1, SuggestionType::AddAchievement, "experience[0]", "x")]);
        assert!(text.contains("Category: General"));
    }

    #[tokio::test]
    async fn test_empty_selection_skips_oracle() {
        let oracle = MockOracle::new();
        let record = Record::from_value(json!({"profile": "Analyst"})).unwrap();

        let result = EditApplier::new(&oracle).apply(&record, &[]).await.unwrap();

        assert_eq!(result, record);
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_wrapped_record_is_unwrapped() {
        let oracle = MockOracle::new().with_response(
            OracleTask::ApplyEdits,
            json!({"resume": {"profile": "Healthcare analyst"}}),
        );
        let record = Record::from_value(json!({"profile": "Analyst"})).unwrap();
        let edits = [suggestion(1, SuggestionType::ModifyText, "profile", "Healthcare analyst")];

        let result = EditApplier::new(&oracle).apply(&record, &edits).await.unwrap();

        assert_eq!(result.profile, "Healthcare analyst");
        let sent = oracle.calls_for(OracleTask::ApplyEdits);
        assert!(sent[0]["instructions"].as_str().unwrap().contains("MODIFY TEXT"));
        assert_eq!(sent[0]["suggestions"][0]["id"], 1);
    }

    #[tokio::test]
    async fn test_wrapped_record_with_change_log_is_unwrapped() {
        let oracle = MockOracle::new().with_response(
            OracleTask::ApplyEdits,
            json!({
                "resume": {
                    "identity": {"name": "[REDACTED]"},
                    "profile": "Healthcare analyst",
                    "experience": [{"title": "BA", "company": "Company_A"}]
                },
                "changes_made": ["profile"]
            }),
        );
        let record = Record::from_value(json!({"profile": "Analyst"})).unwrap();
        let edits = [suggestion(1, SuggestionType::ModifyText, "profile", "Healthcare analyst")];

        let result = EditApplier::new(&oracle).apply(&record, &edits).await.unwrap();

        assert_eq!(result.profile, "Healthcare analyst");
        assert_eq!(result.experience.len(), 1);
        assert_eq!(result.identity.unwrap().name, "[REDACTED]");
        assert!(result.extra.is_empty());
    }

    #[tokio::test]
    async fn test_non_object_response_is_contract_error() {
        let oracle = MockOracle::new().with_response(OracleTask::ApplyEdits, json!(["not", "a", "record"]));
        let record = Record::default();
        let edits = [suggestion(1, SuggestionType::AddSkill, "skills.tools", "Rust")];

        let err = EditApplier::new(&oracle).apply(&record, &edits).await.unwrap_err();
        assert!(matches!(err, TailorError::OracleContract { .. }));
    }
}
