//! In-memory store of reviewer judgments, importance scores and notes.
//!
//! Entries are held as a two-level mapping, dialogue index → per-dialogue
//! record. The flat `"{index}_{field}"` form (see [`crate::key`]) exists only
//! at the persistence boundary via [`EvaluationStore::to_flat_map`] and
//! [`EvaluationStore::from_flat_map`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::key::{IMPORTANCE_FIELD, NOTES_FIELD, compose_key, split_key};

/// Importance assumed for dialogues without a recorded score.
pub const DEFAULT_IMPORTANCE: f64 = 0.5;

/// Reviewer verdict on one auto-generated label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Correct,
    Incorrect,
    Unsure,
    #[default]
    Unset,
}

impl Judgment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Unsure => "unsure",
            Self::Unset => "unset",
        }
    }

    /// Parse a stored judgment. An empty string reads as [`Judgment::Unset`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "correct" => Some(Self::Correct),
            "incorrect" => Some(Self::Incorrect),
            "unsure" => Some(Self::Unsure),
            "unset" | "" => Some(Self::Unset),
            _ => None,
        }
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressable field of a dialogue's evaluation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Judgment for the named label type.
    Label(String),
    DialogueImportance,
    Notes,
}

impl Field {
    /// Route a flat field name: `notes` and `dialogue_importance` are reserved,
    /// every other name is a label type.
    pub fn parse(name: &str) -> Self {
        match name {
            NOTES_FIELD => Self::Notes,
            IMPORTANCE_FIELD => Self::DialogueImportance,
            label => Self::Label(label.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Label(label) => label.as_str(),
            Self::DialogueImportance => IMPORTANCE_FIELD,
            Self::Notes => NOTES_FIELD,
        }
    }
}

/// Value read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Judgment(Judgment),
    Importance(f64),
    Notes(String),
}

/// A single typed write: the field and a value of matching kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Judgment { label: String, judgment: Judgment },
    Importance(f64),
    Notes(String),
}

/// Everything recorded for one dialogue. A record exists once any field of
/// the dialogue has been written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueEvaluation {
    pub judgments: BTreeMap<String, Judgment>,
    pub importance: Option<f64>,
    pub notes: Option<String>,
}

impl DialogueEvaluation {
    fn apply(&mut self, entry: Entry) {
        match entry {
            Entry::Judgment { label, judgment } => {
                self.judgments.insert(label, judgment);
            }
            Entry::Importance(score) => self.importance = Some(score),
            Entry::Notes(text) => self.notes = Some(text),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JudgmentCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub unsure: usize,
    pub unset: usize,
}

/// Keyed store of every judgment made in a review session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationStore {
    dialogues: BTreeMap<usize, DialogueEvaluation>,
}

impl EvaluationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value for `(index, field)`, or the field's default.
    pub fn get(&self, index: usize, field: &Field) -> Value {
        match field {
            Field::Label(label) => Value::Judgment(self.judgment(index, label)),
            Field::DialogueImportance => Value::Importance(self.importance(index)),
            Field::Notes => Value::Notes(self.notes(index).to_string()),
        }
    }

    /// Overwrite one field of dialogue `index`. Last write wins.
    pub fn set(&mut self, index: usize, entry: Entry) {
        self.dialogues.entry(index).or_default().apply(entry);
    }

    /// Write a whole review form for dialogue `index` in one pass.
    ///
    /// Every assignment is infallible, so the update is never partially applied.
    pub fn commit_form(
        &mut self,
        index: usize,
        judgments: &BTreeMap<String, Judgment>,
        importance: f64,
        notes: &str,
    ) {
        let record = self.dialogues.entry(index).or_default();
        for (label, judgment) in judgments {
            record.judgments.insert(label.clone(), *judgment);
        }
        record.importance = Some(importance);
        record.notes = Some(notes.to_string());
        debug!(index, judgments = judgments.len(), importance, "committed review form");
    }

    pub fn judgment(&self, index: usize, label: &str) -> Judgment {
        self.dialogues
            .get(&index)
            .and_then(|r| r.judgments.get(label).copied())
            .unwrap_or_default()
    }

    pub fn importance(&self, index: usize) -> f64 {
        self.dialogues
            .get(&index)
            .and_then(|r| r.importance)
            .unwrap_or(DEFAULT_IMPORTANCE)
    }

    pub fn notes(&self, index: usize) -> &str {
        self.dialogues
            .get(&index)
            .and_then(|r| r.notes.as_deref())
            .unwrap_or("")
    }

    /// Raw record for `index`, `None` if nothing was ever written for it.
    pub fn dialogue(&self, index: usize) -> Option<&DialogueEvaluation> {
        self.dialogues.get(&index)
    }

    /// Records in ascending index order.
    pub fn dialogues(&self) -> impl Iterator<Item = (usize, &DialogueEvaluation)> {
        self.dialogues.iter().map(|(i, r)| (*i, r))
    }

    /// Distinct indices with at least one recorded field, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.dialogues.keys().copied()
    }

    /// Number of distinct dialogues with at least one recorded field.
    pub fn evaluated_count(&self) -> usize {
        self.dialogues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogues.is_empty()
    }

    /// How many judgments of each kind are recorded across all dialogues.
    pub fn judgment_counts(&self) -> JudgmentCounts {
        let mut counts = JudgmentCounts::default();
        for judgment in self.dialogues.values().flat_map(|r| r.judgments.values()) {
            match judgment {
                Judgment::Correct => counts.correct += 1,
                Judgment::Incorrect => counts.incorrect += 1,
                Judgment::Unsure => counts.unsure += 1,
                Judgment::Unset => counts.unset += 1,
            }
        }
        counts
    }

    // ── Flat key boundary ──

    /// Flatten to `{"{index}_{field}": value}`.
    ///
    /// Judgments and notes are strings; importance is written as a decimal
    /// string (`"0.8"`), matching what the slider control produces.
    pub fn to_flat_map(&self) -> Map<String, JsonValue> {
        let mut map = Map::new();
        for (index, record) in &self.dialogues {
            for (label, judgment) in &record.judgments {
                map.insert(
                    compose_key(*index, label),
                    JsonValue::String(judgment.as_str().to_string()),
                );
            }
            if let Some(score) = record.importance {
                map.insert(
                    compose_key(*index, IMPORTANCE_FIELD),
                    JsonValue::String(score.to_string()),
                );
            }
            if let Some(notes) = &record.notes {
                map.insert(
                    compose_key(*index, NOTES_FIELD),
                    JsonValue::String(notes.clone()),
                );
            }
        }
        map
    }

    /// Rebuild from a flat map, skipping malformed keys and values of the
    /// wrong shape for their field.
    pub fn from_flat_map(map: &Map<String, JsonValue>) -> Self {
        let mut store = Self::new();
        for (key, value) in map {
            let Some((index, name)) = split_key(key) else {
                warn!(key = %key, "skipping evaluation key without a numeric dialogue index");
                continue;
            };
            match flat_entry(Field::parse(name), value) {
                Some(entry) => store.set(index, entry),
                None => warn!(key = %key, value = %value, "skipping evaluation value of unexpected shape"),
            }
        }
        store
    }
}

fn flat_entry(field: Field, value: &JsonValue) -> Option<Entry> {
    match field {
        Field::Notes => value.as_str().map(|s| Entry::Notes(s.to_string())),
        Field::DialogueImportance => {
            let score = match value {
                JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
                JsonValue::Number(n) => n.as_f64()?,
                _ => return None,
            };
            score.is_finite().then_some(Entry::Importance(score))
        }
        Field::Label(label) => {
            let judgment = Judgment::parse(value.as_str()?)?;
            Some(Entry::Judgment { label, judgment })
        }
    }
}
