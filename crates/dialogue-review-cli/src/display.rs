//! Vertical card display for a dialogue under review.
//!
//! Renders the dialogue metadata, conversation, labeller output and the
//! reviewer's current form values as grouped, human-readable sections.

use std::io::{self, Write};

use dialogue_review_core::corpus::DialogueItem;
use dialogue_review_core::labels::ActiveLabel;
use dialogue_review_core::{FormState, Judgment, Navigator};

const PROGRESS_WIDTH: usize = 30;
const NO_LABELS: &str = "No active labels (all values are 0)";
const NO_REASON: &str = "No reason provided";

// ── Public API ──

/// Print one dialogue as a card, with the form values pre-filled.
pub fn print_dialogue_card(
    out: &mut impl Write,
    index: usize,
    item: &DialogueItem,
    form: Option<&FormState>,
    nav: Option<&Navigator>,
) -> io::Result<()> {
    let sample = &item.data_sample;
    writeln!(out, "=== Dialogue {} ===", index + 1)?;
    if let Some(nav) = nav {
        writeln!(out, "{}", progress_bar(nav))?;
    }
    writeln!(out)?;

    writeln!(out, "Info")?;
    field(
        out,
        "dialogue_id",
        &item
            .dialogue_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "N/A".into()),
    )?;
    field(out, "file_name", sample.file_name.as_deref().unwrap_or("N/A"))?;
    field(
        out,
        "doctor_faculty",
        sample.doctor_faculty.as_deref().unwrap_or("N/A"),
    )?;
    writeln!(out)?;

    if let Some(desc) = &sample.patient_description
        && !desc.is_empty()
    {
        writeln!(out, "Patient Description")?;
        for (key, value) in desc {
            match value.as_str() {
                Some(s) => field(out, key, s)?,
                None => field(out, key, &value.to_string())?,
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "Dialogue")?;
    for turn in sample.turns() {
        let text = turn.lines.as_deref().unwrap_or("No content");
        writeln!(out, "  {:<8} {}", turn.speaker_kind().label(), text)?;
    }
    writeln!(out)?;

    if let Some(diagnosis) = sample.diagnosis_and_suggestions.as_deref()
        && !diagnosis.is_empty()
    {
        writeln!(out, "Diagnosis and Suggestions")?;
        writeln!(out, "  {diagnosis}")?;
        writeln!(out)?;
    }

    print_labels(out, &item.description_labels.active(), form)?;

    if let Some(form) = form {
        print_form_footer(out, form)?;
    }
    if let Some(nav) = nav {
        print_navigation(out, nav)?;
    }
    Ok(())
}

/// Print the active labels with the reviewer's judgment for each.
pub fn print_labels(
    out: &mut impl Write,
    labels: &[ActiveLabel<'_>],
    form: Option<&FormState>,
) -> io::Result<()> {
    writeln!(out, "Labels")?;
    if labels.is_empty() {
        writeln!(out, "  {NO_LABELS}")?;
        writeln!(out)?;
        return Ok(());
    }
    for (i, label) in labels.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<50} Score: {} (Importance: {})",
            i + 1,
            label.kind.description,
            label.entry.score,
            label.entry.importance
        )?;
        writeln!(
            out,
            "     Reason: {}",
            label.entry.reason.as_deref().unwrap_or(NO_REASON)
        )?;
        if let Some(form) = form {
            writeln!(
                out,
                "     Judgment: {}",
                judgment_options(form.judgment(label.kind.name))
            )?;
        }
    }
    writeln!(out)?;
    Ok(())
}

// ── Sections ──

fn print_form_footer(out: &mut impl Write, form: &FormState) -> io::Result<()> {
    writeln!(out, "Review")?;
    field(out, "importance", &format!("{:.2}", form.importance()))?;
    let notes = form.notes();
    field(out, "notes", if notes.is_empty() { "(none)" } else { notes })?;
    if form.is_dirty() {
        writeln!(out, "  (unsaved edits)")?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_navigation(out: &mut impl Write, nav: &Navigator) -> io::Result<()> {
    let prev = if nav.can_previous() { "[p] previous" } else { "[-] previous" };
    let next = if nav.can_next() { "[n] next" } else { "[-] next" };
    writeln!(out, "{prev}   {next}   [s] save   [?] help")
}

// ── Helpers ──

fn field(out: &mut impl Write, name: &str, value: &str) -> io::Result<()> {
    writeln!(out, "  {:<26} {}", name, value)
}

/// `( ) correct  (x) incorrect  ( ) unsure`
fn judgment_options(selected: Judgment) -> String {
    [Judgment::Correct, Judgment::Incorrect, Judgment::Unsure]
        .iter()
        .map(|j| {
            let mark = if *j == selected { 'x' } else { ' ' };
            format!("({mark}) {j}")
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// `[#########---------------------]  30%  (3/10)`
pub fn progress_bar(nav: &Navigator) -> String {
    let percent = nav.progress_percent();
    let filled = ((percent / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    let position = nav.current().map(|i| i + 1).unwrap_or(0);
    format!(
        "[{}{}] {:>3.0}%  ({}/{})",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled.min(PROGRESS_WIDTH)),
        percent,
        position,
        nav.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogue_review_core::{Corpus, EvaluationStore};
    use serde_json::json;

    fn corpus() -> Corpus {
        Corpus::from_values(vec![json!({
            "data_sample": {
                "dialogue_id": 7,
                "patient_description": { "疾病": "失眠", "年龄": 34 },
                "dialogue": [
                    { "speaker": "病人", "lines": "晚上睡不着" },
                    { "speaker": "医生" },
                    { "speaker": "end" }
                ],
                "diagnosis_and_suggestions": "规律作息"
            },
            "description_labels": {
                "delusion": 1,
                "delusion_importance": 0.9,
                "hallucination": 0
            }
        })])
        .unwrap()
    }

    fn render(form: Option<&FormState>, nav: Option<&Navigator>) -> String {
        let corpus = corpus();
        let mut buf = Vec::new();
        print_dialogue_card(&mut buf, 0, corpus.get(0).unwrap(), form, nav).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn card_sections() {
        let text = render(None, None);
        assert!(text.starts_with("=== Dialogue 1 ==="));
        assert!(text.contains("dialogue_id                7"));
        assert!(text.contains("file_name                  N/A"));
        assert!(text.contains("年龄"));
        assert!(text.contains("Patient  晚上睡不着"));
        assert!(text.contains("Doctor   No content"));
        assert!(!text.contains("End"));
        assert!(text.contains("规律作息"));
        assert!(text.contains("Delusion (fixed false beliefs)"));
        assert!(text.contains(NO_REASON));
        assert!(!text.contains("Hallucination"));
    }

    #[test]
    fn form_values_shown() {
        let mut form = FormState::load(&EvaluationStore::new(), 0);
        form.select("delusion", Judgment::Unsure);
        form.set_notes("double check");
        let nav = Navigator::new(1);
        let text = render(Some(&form), Some(&nav));
        assert!(text.contains("( ) correct  ( ) incorrect  (x) unsure"));
        assert!(text.contains("double check"));
        assert!(text.contains("(unsaved edits)"));
        assert!(text.contains("[-] previous   [-] next"));
    }

    #[test]
    fn no_active_labels_message() {
        let mut buf = Vec::new();
        print_labels(&mut buf, &[], None).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains(NO_LABELS));
    }

    #[test]
    fn progress_bar_fill() {
        let mut nav = Navigator::new(10);
        nav.next();
        nav.next();
        let bar = progress_bar(&nav);
        assert!(bar.starts_with(&format!("[{}{}]", "#".repeat(9), "-".repeat(21))));
        assert!(bar.ends_with(" 30%  (3/10)"));
        assert_eq!(progress_bar(&Navigator::new(0)), format!("[{}]   0%  (0/0)", "-".repeat(30)));
    }
}
