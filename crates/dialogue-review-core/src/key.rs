//! Flat composite keys for evaluation entries.
//!
//! Persisted snapshots and legacy exports address each entry as
//! `"{index}_{field}"`, e.g. `"0_hallucination"`, `"12_dialogue_importance"`,
//! `"3_notes"`. Field names may themselves contain underscores, so a key is
//! split on the **first** underscore only.

/// Field name holding the reviewer's free-text notes.
pub const NOTES_FIELD: &str = "notes";

/// Field name holding the per-dialogue importance score.
pub const IMPORTANCE_FIELD: &str = "dialogue_importance";

/// Build the flat key for `field` of dialogue `index`.
pub fn compose_key(index: usize, field: &str) -> String {
    format!("{index}_{field}")
}

/// Split a flat key into `(index, field)`.
///
/// Returns `None` when the index part is not a plain decimal number or the
/// field part is empty. `"12_dialogue_importance"` → `(12, "dialogue_importance")`.
pub fn split_key(key: &str) -> Option<(usize, &str)> {
    let (index, field) = key.split_once('_')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) || field.is_empty() {
        return None;
    }
    let index = index.parse().ok()?;
    Some((index, field))
}
