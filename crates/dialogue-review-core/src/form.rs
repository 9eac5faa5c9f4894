//! Buffered edits for the dialogue currently under review.
//!
//! A [`FormState`] is loaded from the store when a dialogue is shown, edited
//! freely, and only reaches the store through [`FormState::commit`]. Dropping
//! it discards the edits.

use std::collections::BTreeMap;

use crate::store::{EvaluationStore, Judgment};

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    index: usize,
    judgments: BTreeMap<String, Judgment>,
    importance: f64,
    notes: String,
    dirty: bool,
}

impl FormState {
    /// Pre-fill the form for `index` from what the store already holds.
    pub fn load(store: &EvaluationStore, index: usize) -> Self {
        let judgments = store
            .dialogue(index)
            .map(|r| r.judgments.clone())
            .unwrap_or_default();
        Self {
            index,
            judgments,
            importance: store.importance(index),
            notes: store.notes(index).to_string(),
            dirty: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn judgment(&self, label: &str) -> Judgment {
        self.judgments.get(label).copied().unwrap_or_default()
    }

    pub fn judgments(&self) -> &BTreeMap<String, Judgment> {
        &self.judgments
    }

    pub fn importance(&self) -> f64 {
        self.importance
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Whether the form holds edits not yet committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn select(&mut self, label: &str, judgment: Judgment) {
        self.judgments.insert(label.to_string(), judgment);
        self.dirty = true;
    }

    /// Set the importance slider, clamped to `[0, 1]`. Non-finite input is ignored.
    pub fn set_importance(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        self.importance = value.clamp(0.0, 1.0);
        self.dirty = true;
        true
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
        self.dirty = true;
    }

    /// Write the whole form into `store` for this form's dialogue.
    pub fn commit(&mut self, store: &mut EvaluationStore) {
        store.commit_form(self.index, &self.judgments, self.importance, &self.notes);
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DEFAULT_IMPORTANCE;

    #[test]
    fn fresh_form_uses_defaults() {
        let store = EvaluationStore::new();
        let form = FormState::load(&store, 2);
        assert_eq!(form.index(), 2);
        assert_eq!(form.judgment("hallucination"), Judgment::Unset);
        assert_eq!(form.importance(), DEFAULT_IMPORTANCE);
        assert_eq!(form.notes(), "");
        assert!(!form.is_dirty());
    }

    #[test]
    fn edits_stay_out_of_store_until_commit() {
        let mut store = EvaluationStore::new();
        let mut form = FormState::load(&store, 0);
        form.select("delusion", Judgment::Incorrect);
        form.set_importance(0.75);
        form.set_notes("patient contradicts earlier turn");
        assert!(form.is_dirty());
        assert!(store.is_empty());

        form.commit(&mut store);
        assert!(!form.is_dirty());
        assert_eq!(store.judgment(0, "delusion"), Judgment::Incorrect);
        assert_eq!(store.importance(0), 0.75);
        assert_eq!(store.notes(0), "patient contradicts earlier turn");
    }

    #[test]
    fn reload_prefills_saved_values() {
        let mut store = EvaluationStore::new();
        let mut form = FormState::load(&store, 4);
        form.select("other", Judgment::Unsure);
        form.commit(&mut store);

        let again = FormState::load(&store, 4);
        assert_eq!(again.judgment("other"), Judgment::Unsure);
        assert_eq!(again.importance(), DEFAULT_IMPORTANCE);
    }

    #[test]
    fn importance_is_clamped() {
        let mut form = FormState::load(&EvaluationStore::new(), 0);
        assert!(form.set_importance(1.7));
        assert_eq!(form.importance(), 1.0);
        assert!(form.set_importance(-0.2));
        assert_eq!(form.importance(), 0.0);
        assert!(!form.set_importance(f64::NAN));
        assert_eq!(form.importance(), 0.0);
    }
}
