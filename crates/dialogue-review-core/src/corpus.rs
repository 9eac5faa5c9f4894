//! Read-only dialogue corpus loaded at startup.
//!
//! Each item pairs a telehealth dialogue (`data_sample`) with the labels the
//! labelling pipeline produced for it (`description_labels`). A dialogue's
//! position in the corpus is its `dialogue_index`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CoreError;
use crate::labels::DescriptionLabels;

/// Speaker string the corpus uses for the patient.
pub const PATIENT_SPEAKER: &str = "病人";
/// Speaker string the corpus uses for the doctor.
pub const DOCTOR_SPEAKER: &str = "医生";
/// Speaker string marking the end of a conversation.
pub const END_MARKER: &str = "end";

/// Dialogue identifier from the source dataset (numeric or textual).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialogueId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DialogueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Patient,
    Doctor,
    /// End-of-conversation marker; not a real turn.
    EndMarker,
    /// Any other speaker string. Rendered alongside the doctor.
    Other,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Doctor | Self::Other => "Doctor",
            Self::EndMarker => "End",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub lines: Option<String>,
}

impl Turn {
    pub fn speaker_kind(&self) -> Speaker {
        match self.speaker.as_str() {
            PATIENT_SPEAKER => Speaker::Patient,
            DOCTOR_SPEAKER => Speaker::Doctor,
            END_MARKER => Speaker::EndMarker,
            _ => Speaker::Other,
        }
    }

    pub fn text(&self) -> &str {
        self.lines.as_deref().unwrap_or("")
    }
}

/// The dialogue itself plus descriptive metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSample {
    #[serde(default)]
    pub dialogue_id: Option<DialogueId>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub doctor_faculty: Option<String>,
    #[serde(default)]
    pub patient_description: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub dialogue: Vec<Turn>,
    #[serde(default)]
    pub diagnosis_and_suggestions: Option<String>,
}

impl DataSample {
    /// Conversation turns with end markers removed.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.dialogue
            .iter()
            .filter(|t| t.speaker_kind() != Speaker::EndMarker)
    }
}

/// One corpus entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DialogueItem {
    #[serde(default)]
    pub data_sample: DataSample,
    #[serde(default)]
    pub description_labels: DescriptionLabels,
}

impl DialogueItem {
    pub fn dialogue_id(&self) -> Option<&DialogueId> {
        self.data_sample.dialogue_id.as_ref()
    }
}

/// The ordered, immutable dialogue list for a review session.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    items: Vec<DialogueItem>,
}

impl Corpus {
    pub fn new(items: Vec<DialogueItem>) -> Self {
        Self { items }
    }

    /// Parse a corpus JSON document (a top-level array of items).
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(CoreError::CorpusParse)?;
        Self::from_values(raw)
    }

    /// Build from already-parsed JSON items, reporting the first malformed one.
    pub fn from_values(raw: Vec<serde_json::Value>) -> Result<Self, CoreError> {
        let items = raw
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value)
                    .map_err(|source| CoreError::MalformedItem { index, source })
            })
            .collect::<Result<Vec<DialogueItem>, _>>()?;
        info!(count = items.len(), "loaded dialogue corpus");
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DialogueItem> {
        self.items.get(index)
    }

    /// `dialogue_id` of the item at `index`; `None` when out of range or unset.
    pub fn dialogue_id(&self, index: usize) -> Option<&DialogueId> {
        self.items.get(index).and_then(DialogueItem::dialogue_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DialogueItem> {
        self.items.iter()
    }
}
