//! Export of accumulated judgments as a nested, per-dialogue report.
//!
//! Shape of the emitted document:
//!
//! ```json
//! {
//!   "export_info": {
//!     "timestamp": "2024-01-15T10:30:00.000Z",
//!     "total_dialogues": 120,
//!     "evaluated_dialogues": 2
//!   },
//!   "evaluations": [
//!     {
//!       "dialogue_index": 0,
//!       "dialogue_id": 1042,
//!       "evaluations": { "hallucination": "correct" },
//!       "dialogue_importance_score": 0.8,
//!       "notes": "foo"
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::info;

use crate::corpus::{Corpus, DialogueId};
use crate::error::CoreError;
use crate::store::{EvaluationStore, Judgment};

const FILE_PREFIX: &str = "dialogue_evaluations_";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub export_info: ExportInfo,
    pub evaluations: Vec<DialogueReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportInfo {
    /// ISO 8601, UTC, millisecond precision.
    pub timestamp: String,
    pub total_dialogues: usize,
    pub evaluated_dialogues: usize,
}

/// Everything recorded for one dialogue, grouped for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialogueReport {
    pub dialogue_index: usize,
    pub dialogue_id: Option<DialogueId>,
    pub evaluations: BTreeMap<String, Judgment>,
    pub dialogue_importance_score: Option<f64>,
    pub notes: String,
}

impl ExportReport {
    /// Group the store by dialogue, ascending by index.
    ///
    /// `dialogue_id` is looked up in `corpus` and is `None` for indices past
    /// its end.
    pub fn build(store: &EvaluationStore, corpus: &Corpus, now: DateTime<Utc>) -> Self {
        let evaluations: Vec<DialogueReport> = store
            .dialogues()
            .map(|(index, record)| DialogueReport {
                dialogue_index: index,
                dialogue_id: corpus.dialogue_id(index).cloned(),
                evaluations: record.judgments.clone(),
                dialogue_importance_score: record.importance,
                notes: record.notes.clone().unwrap_or_default(),
            })
            .collect();

        let report = Self {
            export_info: ExportInfo {
                timestamp: iso_timestamp(&now),
                total_dialogues: corpus.len(),
                evaluated_dialogues: store.evaluated_count(),
            },
            evaluations,
        };
        info!(
            total = report.export_info.total_dialogues,
            evaluated = report.export_info.evaluated_dialogues,
            "built evaluation export"
        );
        report
    }

    /// Build directly from a flat `{"{index}_{field}": value}` map.
    ///
    /// Keys without a numeric index, and values of the wrong shape, are
    /// skipped so one corrupt entry never blocks the rest of the export.
    pub fn from_flat(map: &Map<String, JsonValue>, corpus: &Corpus, now: DateTime<Utc>) -> Self {
        Self::build(&EvaluationStore::from_flat_map(map), corpus, now)
    }

    /// Artifact file name derived from `export_info.timestamp`.
    pub fn file_name(&self) -> String {
        file_name_for(&self.export_info.timestamp)
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(CoreError::Export)
    }
}

/// `2024-01-15T10:30:00.123Z`
pub fn iso_timestamp(now: &DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `dialogue_evaluations_2024-01-15T10-30-00.json` for `2024-01-15T10:30:00.123Z`.
///
/// Colons and periods become hyphens and the trailing `-mmmZ` is dropped.
pub fn file_name_for(timestamp: &str) -> String {
    let stamp = timestamp.replace([':', '.'], "-");
    let stamp = match stamp.len().checked_sub(5) {
        Some(end) if stamp.is_char_boundary(end) => &stamp[..end],
        _ => stamp.as_str(),
    };
    format!("{FILE_PREFIX}{stamp}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    fn corpus(n: usize) -> Corpus {
        let items: Vec<JsonValue> = (0..n)
            .map(|i| json!({ "data_sample": { "dialogue_id": 100 + i } }))
            .collect();
        Corpus::from_values(items).unwrap()
    }

    fn grouping_fixture() -> Map<String, JsonValue> {
        json!({
            "0_hallucination": "correct",
            "0_dialogue_importance": "0.8",
            "0_notes": "foo",
            "2_delusion": "unsure"
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn groups_by_dialogue_and_routes_fields() {
        let report = ExportReport::from_flat(&grouping_fixture(), &corpus(5), now());
        assert_eq!(report.evaluations.len(), 2);

        let first = &report.evaluations[0];
        assert_eq!(first.dialogue_index, 0);
        assert_eq!(first.dialogue_id, Some(DialogueId::Number(100)));
        assert_eq!(
            first.evaluations,
            BTreeMap::from([("hallucination".to_string(), Judgment::Correct)])
        );
        assert_eq!(first.dialogue_importance_score, Some(0.8));
        assert_eq!(first.notes, "foo");

        let second = &report.evaluations[1];
        assert_eq!(second.dialogue_index, 2);
        assert_eq!(second.dialogue_importance_score, None);
        assert_eq!(second.notes, "");
    }

    #[test]
    fn envelope_counts() {
        let report = ExportReport::from_flat(&grouping_fixture(), &corpus(5), now());
        assert_eq!(report.export_info.total_dialogues, 5);
        assert_eq!(report.export_info.evaluated_dialogues, 2);
        assert_eq!(report.export_info.timestamp, "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn explicit_unset_still_counts_as_evaluated() {
        let map = json!({ "1_illusion": "unset", "3_other": "" });
        let report = ExportReport::from_flat(map.as_object().unwrap(), &corpus(5), now());
        assert_eq!(report.export_info.evaluated_dialogues, 2);
        assert_eq!(report.evaluations[0].evaluations["illusion"], Judgment::Unset);
    }

    #[test]
    fn malformed_key_skipped() {
        let mut map = grouping_fixture();
        map.insert("abc_notes".into(), json!("orphan"));
        let report = ExportReport::from_flat(&map, &corpus(5), now());
        assert_eq!(report.export_info.evaluated_dialogues, 2);
        let json = report.to_json_pretty().unwrap();
        assert!(!json.contains("orphan"));
    }

    #[test]
    fn out_of_range_index_has_null_id() {
        let map = json!({ "9_notes": "beyond corpus" });
        let report = ExportReport::from_flat(map.as_object().unwrap(), &corpus(3), now());
        assert_eq!(report.evaluations[0].dialogue_id, None);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["evaluations"][0]["dialogue_id"], JsonValue::Null);
    }

    #[test]
    fn sorted_numerically_not_lexically() {
        let map = json!({ "10_notes": "a", "2_notes": "b", "1_notes": "c" });
        let report = ExportReport::from_flat(map.as_object().unwrap(), &corpus(12), now());
        let order: Vec<usize> = report.evaluations.iter().map(|r| r.dialogue_index).collect();
        assert_eq!(order, vec![1, 2, 10]);
    }

    #[test]
    fn serialised_shape() {
        let report = ExportReport::from_flat(&grouping_fixture(), &corpus(3), now());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "export_info": {
                    "timestamp": "2024-01-15T10:30:00.000Z",
                    "total_dialogues": 3,
                    "evaluated_dialogues": 2
                },
                "evaluations": [
                    {
                        "dialogue_index": 0,
                        "dialogue_id": 100,
                        "evaluations": { "hallucination": "correct" },
                        "dialogue_importance_score": 0.8,
                        "notes": "foo"
                    },
                    {
                        "dialogue_index": 2,
                        "dialogue_id": 102,
                        "evaluations": { "delusion": "unsure" },
                        "dialogue_importance_score": null,
                        "notes": ""
                    }
                ]
            })
        );
    }

    #[test]
    fn file_name_from_timestamp() {
        let report = ExportReport::build(&EvaluationStore::new(), &corpus(0), now());
        assert_eq!(report.file_name(), "dialogue_evaluations_2024-01-15T10-30-00.json");
        assert_eq!(
            file_name_for("2025-11-03T23:59:58.907Z"),
            "dialogue_evaluations_2025-11-03T23-59-58.json"
        );
    }

    #[test]
    fn empty_store_exports_empty_list() {
        let report = ExportReport::build(&EvaluationStore::new(), &corpus(4), now());
        assert!(report.evaluations.is_empty());
        assert_eq!(report.export_info.evaluated_dialogues, 0);
        assert_eq!(report.export_info.total_dialogues, 4);
    }
}
