//! A review session: the corpus, the evaluation store, the reviewer's position
//! and the form being edited, owned together.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::corpus::{Corpus, DialogueItem};
use crate::export::ExportReport;
use crate::form::FormState;
use crate::labels::ActiveLabel;
use crate::navigator::Navigator;
use crate::store::EvaluationStore;

pub struct ReviewSession {
    corpus: Corpus,
    store: EvaluationStore,
    navigator: Navigator,
    form: Option<FormState>,
}

impl ReviewSession {
    /// Open a session positioned on the first dialogue.
    pub fn new(corpus: Corpus, store: EvaluationStore) -> Self {
        let navigator = Navigator::new(corpus.len());
        let form = navigator.current().map(|i| FormState::load(&store, i));
        info!(
            dialogues = corpus.len(),
            evaluated = store.evaluated_count(),
            "review session opened"
        );
        Self {
            corpus,
            store,
            navigator,
            form,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn store(&self) -> &EvaluationStore {
        &self.store
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn current_index(&self) -> Option<usize> {
        self.navigator.current()
    }

    pub fn current_dialogue(&self) -> Option<&DialogueItem> {
        self.current_index().and_then(|i| self.corpus.get(i))
    }

    /// Labels the reviewer is asked to judge on the current dialogue.
    pub fn active_labels(&self) -> Vec<ActiveLabel<'_>> {
        self.current_dialogue()
            .map(|d| d.description_labels.active())
            .unwrap_or_default()
    }

    pub fn form(&self) -> Option<&FormState> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut FormState> {
        self.form.as_mut()
    }

    /// Whether the form holds edits that navigating away would discard.
    pub fn has_unsaved_edits(&self) -> bool {
        self.form.as_ref().is_some_and(FormState::is_dirty)
    }

    /// Move forward. Unsaved form edits are discarded.
    pub fn next(&mut self) -> bool {
        let moved = self.navigator.next();
        if moved {
            self.reload_form();
        }
        moved
    }

    /// Move back. Unsaved form edits are discarded.
    pub fn previous(&mut self) -> bool {
        let moved = self.navigator.previous();
        if moved {
            self.reload_form();
        }
        moved
    }

    fn reload_form(&mut self) {
        if self.has_unsaved_edits() {
            debug!(index = ?self.form.as_ref().map(FormState::index), "discarding unsaved edits");
        }
        self.form = self.navigator.current().map(|i| FormState::load(&self.store, i));
    }

    /// Commit the current form and build the export report.
    ///
    /// Returns `None` when the corpus is empty and there is nothing to save.
    /// Persisting the store and writing the report are left to the caller.
    pub fn save(&mut self, now: DateTime<Utc>) -> Option<ExportReport> {
        let form = self.form.as_mut()?;
        form.commit(&mut self.store);
        info!(index = form.index(), "saved evaluation");
        Some(ExportReport::build(&self.store, &self.corpus, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Judgment;
    use chrono::TimeZone;
    use serde_json::json;

    fn corpus() -> Corpus {
        Corpus::from_values(vec![
            json!({
                "data_sample": { "dialogue_id": "a" },
                "description_labels": { "hallucination": 1, "delusion": 0, "other": 2 }
            }),
            json!({ "data_sample": { "dialogue_id": "b" } }),
            json!({ "data_sample": { "dialogue_id": "c" } }),
        ])
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn opens_on_first_dialogue() {
        let session = ReviewSession::new(corpus(), EvaluationStore::new());
        assert_eq!(session.current_index(), Some(0));
        let labels: Vec<&str> = session.active_labels().iter().map(|l| l.kind.name).collect();
        assert_eq!(labels, vec!["hallucination", "other"]);
    }

    #[test]
    fn navigation_discards_unsaved_edits() {
        let mut session = ReviewSession::new(corpus(), EvaluationStore::new());
        session.form_mut().unwrap().select("hallucination", Judgment::Correct);
        assert!(session.has_unsaved_edits());

        assert!(session.next());
        assert!(session.previous());
        assert_eq!(session.form().unwrap().judgment("hallucination"), Judgment::Unset);
        assert!(session.store().is_empty());
    }

    #[test]
    fn save_commits_and_survives_navigation() {
        let mut session = ReviewSession::new(corpus(), EvaluationStore::new());
        {
            let form = session.form_mut().unwrap();
            form.select("hallucination", Judgment::Incorrect);
            form.set_importance(0.9);
            form.set_notes("image never shared");
        }
        let report = session.save(now()).unwrap();
        assert_eq!(report.export_info.evaluated_dialogues, 1);
        assert_eq!(report.evaluations[0].notes, "image never shared");

        session.next();
        session.previous();
        let form = session.form().unwrap();
        assert_eq!(form.judgment("hallucination"), Judgment::Incorrect);
        assert_eq!(form.importance(), 0.9);
        assert!(!session.has_unsaved_edits());
    }

    #[test]
    fn saving_untouched_form_records_defaults() {
        let mut session = ReviewSession::new(corpus(), EvaluationStore::new());
        session.next();
        let report = session.save(now()).unwrap();
        assert_eq!(report.evaluations[0].dialogue_index, 1);
        assert_eq!(report.evaluations[0].dialogue_importance_score, Some(0.5));
        assert!(report.evaluations[0].evaluations.is_empty());
    }

    #[test]
    fn empty_corpus_has_nothing_to_save() {
        let mut session = ReviewSession::new(Corpus::default(), EvaluationStore::new());
        assert!(session.current_dialogue().is_none());
        assert!(session.active_labels().is_empty());
        assert!(!session.next());
        assert!(session.save(now()).is_none());
    }
}
