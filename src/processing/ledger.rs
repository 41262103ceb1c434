//! Suggestion ledger: the per-session store of proposed edits

use crate::error::{Result, TailorError};
use crate::processing::suggestion::{Priority, Suggestion, SuggestionType};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;

pub const DEFAULT_CATEGORY: &str = "Other";
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// Holds one analysis batch and the user's selection over it.
///
/// The selected list stores positions into the batch, so a value modified
/// after selection is what `selected()` returns.
#[derive(Debug, Clone, Default)]
pub struct SuggestionLedger {
    all: Vec<Suggestion>,
    selected: Vec<usize>,
}

impl SuggestionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from an already-normalized batch.
    pub fn from_suggestions(suggestions: Vec<Suggestion>) -> Self {
        Self {
            all: suggestions,
            selected: Vec::new(),
        }
    }

    /// Normalize a raw oracle payload and replace the current batch with it.
    ///
    /// Accepts either `{"suggestions": [...]}` or a bare array.
    pub fn ingest(&mut self, raw: &Value) -> Result<usize> {
        let items = match raw {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("suggestions") {
                Some(Value::Array(items)) => items,
                Some(Value::Null) | None => {
                    warn!("Suggestion payload has no suggestions array");
                    self.all.clear();
                    self.selected.clear();
                    return Ok(0);
                }
                Some(_) => {
                    return Err(TailorError::contract(
                        "suggestions",
                        "`suggestions` is not an array",
                    ))
                }
            },
            _ => {
                return Err(TailorError::contract(
                    "suggestions",
                    "payload is neither an object nor an array",
                ))
            }
        };

        self.all = normalize_batch(items);
        self.selected.clear();
        debug!("Ingested {} suggestions", self.all.len());
        Ok(self.all.len())
    }

    /// Mark every suggestion whose id is in `ids` as selected.
    ///
    /// Newly selected suggestions are appended in generation order; already
    /// selected ones are not appended again.
    pub fn select(&mut self, ids: &[u32]) -> usize {
        let wanted: HashSet<u32> = ids.iter().copied().collect();
        let mut added = 0;

        for (index, suggestion) in self.all.iter_mut().enumerate() {
            if !wanted.contains(&suggestion.id) {
                continue;
            }
            suggestion.selected = true;
            if !self.selected.contains(&index) {
                self.selected.push(index);
                added += 1;
            }
        }

        let known: HashSet<u32> = self.all.iter().map(|s| s.id).collect();
        for id in wanted.difference(&known) {
            warn!("Ignoring unknown suggestion id {}", id);
        }

        added
    }

    pub fn select_all(&mut self) -> usize {
        let ids: Vec<u32> = self.all.iter().map(|s| s.id).collect();
        self.select(&ids)
    }

    pub fn select_priority(&mut self, priority: Priority) -> usize {
        let ids: Vec<u32> = self
            .all
            .iter()
            .filter(|s| s.priority == priority)
            .map(|s| s.id)
            .collect();
        self.select(&ids)
    }

    pub fn apply_selection(&mut self, selection: &Selection) -> usize {
        match selection {
            Selection::All => self.select_all(),
            Selection::Priority(priority) => self.select_priority(*priority),
            Selection::Ids(ids) => self.select(ids),
        }
    }

    /// Clear the selection flag; modifications are kept.
    pub fn deselect(&mut self, ids: &[u32]) -> usize {
        let unwanted: HashSet<u32> = ids.iter().copied().collect();
        let all = &mut self.all;
        let before = self.selected.len();

        self.selected.retain(|&index| {
            let keep = !unwanted.contains(&all[index].id);
            if !keep {
                all[index].selected = false;
            }
            keep
        });

        before - self.selected.len()
    }

    /// Replace the value of the suggestion with `id`. Returns false if no
    /// such suggestion exists.
    pub fn modify(&mut self, id: u32, new_value: &str) -> bool {
        let mut found = false;
        for suggestion in self.all.iter_mut().filter(|s| s.id == id) {
            suggestion.value = new_value.to_string();
            suggestion.modified = true;
            found = true;
        }
        if !found {
            warn!("Cannot modify suggestion {}: not found", id);
        }
        found
    }

    pub fn selected(&self) -> Vec<&Suggestion> {
        self.selected.iter().map(|&index| &self.all[index]).collect()
    }

    /// Owned copy of the selected list, for reports.
    pub fn selected_cloned(&self) -> Vec<Suggestion> {
        self.selected().into_iter().cloned().collect()
    }

    pub fn all(&self) -> &[Suggestion] {
        &self.all
    }

    pub fn get(&self, id: u32) -> Option<&Suggestion> {
        self.all.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }
}

/// A user's selection request, as typed at the prompt or on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    All,
    Priority(Priority),
    Ids(Vec<u32>),
}

impl FromStr for Selection {
    type Err = TailorError;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim().to_lowercase();
        if input == "all" {
            return Ok(Selection::All);
        }
        if let Ok(priority) = input.parse::<Priority>() {
            return Ok(Selection::Priority(priority));
        }

        let ids = input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>().map_err(|_| {
                    TailorError::InvalidInput(format!("Invalid suggestion id: '{}'", part))
                })
            })
            .collect::<Result<Vec<u32>>>()?;

        if ids.is_empty() {
            return Err(TailorError::InvalidInput("Empty selection".to_string()));
        }
        Ok(Selection::Ids(ids))
    }
}

fn normalize_batch(items: &[Value]) -> Vec<Suggestion> {
    items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| match item {
            Value::Object(_) => Some(normalize_one(position, item)),
            other => {
                warn!("Skipping non-object suggestion at position {}: {}", position + 1, other);
                None
            }
        })
        .collect()
}

fn normalize_one(position: usize, raw: &Value) -> Suggestion {
    let text = |key: &str, default: &str| -> String {
        match raw.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    };
    let optional_text = |key: &str| -> Option<String> {
        match raw.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    };

    let fallback_id = (position + 1) as u32;
    let id = match raw.get("id") {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(fallback_id),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(fallback_id),
        _ => fallback_id,
    };

    let suggestion_type = raw
        .get("type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(SuggestionType::AddText);

    let priority = raw
        .get("priority")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(Priority::Medium);

    Suggestion {
        id,
        category: text("category", DEFAULT_CATEGORY),
        suggestion_type,
        description: text("description", DEFAULT_DESCRIPTION),
        action: text("action", ""),
        reason: text("reason", ""),
        section: text("section", ""),
        value: text("value", ""),
        priority,
        selected: false,
        modified: false,
        achievement_category: optional_text("achievement_category"),
        insert_after: optional_text("insert_after"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch_of(ids: &[u32]) -> SuggestionLedger {
        let items: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "type": "add_skill", "value": format!("skill-{}", id)}))
            .collect();
        let mut ledger = SuggestionLedger::new();
        ledger.ingest(&json!({ "suggestions": items })).unwrap();
        ledger
    }

    fn selected_ids(ledger: &SuggestionLedger) -> Vec<u32> {
        ledger.selected().iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_select_keeps_generation_order() {
        let mut ledger = batch_of(&[1, 2, 3, 4, 5]);
        ledger.select(&[5, 1, 3]);
        assert_eq!(selected_ids(&ledger), vec![1, 3, 5]);
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut ledger = batch_of(&[1, 2, 3]);
        assert_eq!(ledger.select(&[1, 2]), 2);
        assert_eq!(ledger.select(&[2, 3]), 1);
        assert_eq!(ledger.select(&[1, 2, 3]), 0);
        assert_eq!(selected_ids(&ledger), vec![1, 2, 3]);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut ledger = batch_of(&[1, 2]);
        assert_eq!(ledger.select(&[7, 2]), 1);
        assert_eq!(selected_ids(&ledger), vec![2]);
    }

    #[test]
    fn test_modify_after_select_is_visible() {
        let mut ledger = batch_of(&[1, 2]);
        ledger.select(&[2]);
        assert!(ledger.modify(2, "Rust"));

        let selected = ledger.selected();
        assert_eq!(selected[0].value, "Rust");
        assert!(selected[0].modified);
    }

    #[test]
    fn test_modify_unknown_id_is_noop() {
        let mut ledger = batch_of(&[1]);
        assert!(!ledger.modify(9, "x"));
        assert_eq!(ledger.get(1).unwrap().value, "skill-1");
        assert!(!ledger.get(1).unwrap().modified);
    }

    #[test]
    fn test_deselect_keeps_modification() {
        let mut ledger = batch_of(&[1, 2, 3]);
        ledger.select_all();
        ledger.modify(2, "changed");
        assert_eq!(ledger.deselect(&[2]), 1);

        assert_eq!(selected_ids(&ledger), vec![1, 3]);
        let two = ledger.get(2).unwrap();
        assert!(!two.selected);
        assert!(two.modified);
    }

    #[test]
    fn test_normalization_defaults() {
        let mut ledger = SuggestionLedger::new();
        let count = ledger
            .ingest(&json!({"suggestions": [
                {"value": "Python"},
                {"id": "7", "type": "reshape", "priority": "urgent", "category": "Skills"},
                "not an object",
                {"id": 9, "type": "add_achievement", "achievement_category": "AI", "insert_after": "X", "priority": "high"}
            ]}))
            .unwrap();
        assert_eq!(count, 3);

        let first = &ledger.all()[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.category, "Other");
        assert_eq!(first.suggestion_type, SuggestionType::AddText);
        assert_eq!(first.description, "No description");
        assert_eq!(first.priority, Priority::Medium);
        assert!(!first.selected);

        let second = &ledger.all()[1];
        assert_eq!(second.id, 7);
        assert_eq!(second.category, "Skills");
        assert_eq!(second.suggestion_type, SuggestionType::AddText);
        assert_eq!(second.priority, Priority::Medium);

        let third = &ledger.all()[2];
        assert_eq!(third.id, 9);
        assert_eq!(third.priority, Priority::High);
        assert_eq!(third.achievement_category.as_deref(), Some("AI"));
        assert_eq!(third.insert_after.as_deref(), Some("X"));
    }

    #[test]
    fn test_ingest_bare_array_and_resets_selection() {
        let mut ledger = batch_of(&[1, 2]);
        ledger.select(&[1]);
        ledger.ingest(&json!([{"id": 10}])).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.selected_count(), 0);
    }

    #[test]
    fn test_ingest_rejects_non_collection() {
        let mut ledger = SuggestionLedger::new();
        assert!(ledger.ingest(&json!("nope")).is_err());
        assert!(ledger.ingest(&json!({"suggestions": "nope"})).is_err());
        assert_eq!(ledger.ingest(&json!({})).unwrap(), 0);
    }

    #[test]
    fn test_out_of_range_id_falls_back_to_position() {
        let mut ledger = SuggestionLedger::new();
        ledger
            .ingest(&json!([
                {"id": 1, "value": "a"},
                {"id": 4294967297u64, "value": "b"}
            ]))
            .unwrap();

        assert_eq!(ledger.all()[1].id, 2);
        ledger.select(&[1]);
        let selected: Vec<(u32, &str)> = ledger.selected().iter().map(|s| (s.id, s.value.as_str())).collect();
        assert_eq!(selected, vec![(1, "a")]);
    }

    #[test]
    fn test_select_priority() {
        let mut ledger = SuggestionLedger::new();
        ledger
            .ingest(&json!([
                {"id": 1, "priority": "low"},
                {"id": 2, "priority": "high"},
                {"id": 3, "priority": "high"}
            ]))
            .unwrap();
        ledger.select_priority(Priority::High);
        assert_eq!(selected_ids(&ledger), vec![2, 3]);
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("all".parse::<Selection>().unwrap(), Selection::All);
        assert_eq!("High".parse::<Selection>().unwrap(), Selection::Priority(Priority::High));
        assert_eq!("1, 2,5".parse::<Selection>().unwrap(), Selection::Ids(vec![1, 2, 5]));
        assert!("1,x".parse::<Selection>().is_err());
        assert!(" ".parse::<Selection>().is_err());
    }
}
