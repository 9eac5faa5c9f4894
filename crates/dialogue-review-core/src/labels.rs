//! Cognitive-distortion labels attached to each dialogue by the labelling pipeline.
//!
//! The pipeline writes `description_labels` flat, one score key per label type
//! plus `<label>_importance` and `<label>_reason` companions. A nested form
//! (`{"<label>": {"score", "importance", "reason"}}`) is accepted as well.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// A label type known to the review tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelKind {
    pub name: &'static str,
    pub description: &'static str,
}

/// Known label types, in presentation order.
pub const LABEL_CATALOG: &[LabelKind] = &[
    LabelKind {
        name: "hallucination",
        description: "Hallucination (false perceptions)",
    },
    LabelKind {
        name: "illusion",
        description: "Illusion (misinterpretation of real stimuli)",
    },
    LabelKind {
        name: "delirium",
        description: "Delirium (confusion and disorientation)",
    },
    LabelKind {
        name: "extrapolation",
        description: "Extrapolation (extending beyond available data)",
    },
    LabelKind {
        name: "delusion",
        description: "Delusion (fixed false beliefs)",
    },
    LabelKind {
        name: "confabulation",
        description: "Confabulation (fabricated or distorted memories)",
    },
    LabelKind {
        name: "other",
        description: "Other cognitive distortion",
    },
];

/// Look up a catalog entry by label name.
pub fn label_kind(name: &str) -> Option<&'static LabelKind> {
    LABEL_CATALOG.iter().find(|k| k.name == name)
}

const IMPORTANCE_SUFFIX: &str = "_importance";
const REASON_SUFFIX: &str = "_reason";

/// One auto-generated label on a dialogue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelEntry {
    pub score: f64,
    pub importance: f64,
    /// Justification text from the labeller, if any.
    pub reason: Option<String>,
}

/// All labels on one dialogue, keyed by label type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DescriptionLabels {
    entries: BTreeMap<String, LabelEntry>,
}

/// A catalog label whose score is positive on a given dialogue.
#[derive(Debug, Clone, Copy)]
pub struct ActiveLabel<'a> {
    pub kind: &'static LabelKind,
    pub entry: &'a LabelEntry,
}

impl DescriptionLabels {
    /// Build from a raw `description_labels` JSON object in either shape.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut entries = BTreeMap::new();

        for (key, value) in map {
            match value {
                Value::Object(nested) => {
                    let entry = LabelEntry {
                        score: nested.get("score").and_then(as_number).unwrap_or(0.0),
                        importance: nested.get("importance").and_then(as_number).unwrap_or(0.0),
                        reason: nested.get("reason").and_then(as_reason),
                    };
                    entries.insert(key.clone(), entry);
                }
                _ => {
                    if key.ends_with(IMPORTANCE_SUFFIX) || key.ends_with(REASON_SUFFIX) {
                        continue;
                    }
                    let Some(score) = as_number(value) else {
                        continue;
                    };
                    let importance = map
                        .get(&format!("{key}{IMPORTANCE_SUFFIX}"))
                        .and_then(as_number)
                        .unwrap_or(0.0);
                    let reason = map.get(&format!("{key}{REASON_SUFFIX}")).and_then(as_reason);
                    entries.insert(
                        key.clone(),
                        LabelEntry {
                            score,
                            importance,
                            reason,
                        },
                    );
                }
            }
        }

        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<&LabelEntry> {
        self.entries.get(label)
    }

    /// Score for `label`, 0 when absent.
    pub fn score(&self, label: &str) -> f64 {
        self.entries.get(label).map(|e| e.score).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalog labels with a score above zero, in catalog order.
    ///
    /// These are the labels a reviewer is asked to judge.
    pub fn active(&self) -> Vec<ActiveLabel<'_>> {
        LABEL_CATALOG
            .iter()
            .filter_map(|kind| {
                let entry = self.entries.get(kind.name)?;
                (entry.score > 0.0).then_some(ActiveLabel { kind, entry })
            })
            .collect()
    }
}

impl<'de> Deserialize<'de> for DescriptionLabels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(map.map(|m| Self::from_map(&m)).unwrap_or_default())
    }
}

/// Active-label statistics across a corpus.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelSummary {
    pub total_dialogues: usize,
    pub with_active_labels: usize,
    /// Dialogues carrying each catalog label, in catalog order.
    pub per_label: Vec<(&'static str, usize)>,
}

impl LabelSummary {
    pub fn collect<'a>(labels: impl IntoIterator<Item = &'a DescriptionLabels>) -> Self {
        let mut summary = Self {
            per_label: LABEL_CATALOG.iter().map(|k| (k.name, 0)).collect(),
            ..Self::default()
        };
        for l in labels {
            summary.total_dialogues += 1;
            let active = l.active();
            if !active.is_empty() {
                summary.with_active_labels += 1;
            }
            for a in active {
                if let Some(slot) = summary.per_label.iter_mut().find(|(n, _)| *n == a.kind.name) {
                    slot.1 += 1;
                }
            }
        }
        summary
    }
}

// ── JSON coercion helpers ──

/// Numbers may arrive as JSON numbers or numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn as_reason(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
