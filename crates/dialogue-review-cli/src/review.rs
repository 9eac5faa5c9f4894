//! Interactive line-mode review loop.
//!
//! One command per line. Navigation mirrors the arrow keys of the browser
//! tool; `save` commits the form, persists the snapshot and writes an export.

use std::io::{BufRead, Write};
use std::path::Path;

use chrono::Utc;
use dialogue_review_core::{Judgment, ReviewSession};
use dialogue_review_store::{SnapshotStore, write_export};
use tracing::{info, warn};

use crate::display;

const HELP: &str = "\
Commands:
  n, next, right        next dialogue
  p, prev, left         previous dialogue
  c <label>             mark label correct
  i <label>             mark label incorrect
  u <label>             mark label unsure
  x <label>             clear judgment
  imp <0..1>            set dialogue importance
  note <text>           replace notes (empty clears)
  s, save               save, persist and export
  show                  redraw the current dialogue
  ?, help               this help
  q, quit               leave (unsaved edits are lost)
<label> is a label name (e.g. hallucination) or its number in the list.";

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewCommand {
    Next,
    Previous,
    Mark { label: String, judgment: Judgment },
    Importance(f64),
    Notes(String),
    Save,
    Show,
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<ReviewCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let mark = |judgment: Judgment| {
        if rest.is_empty() {
            Err(format!("`{word}` needs a label"))
        } else {
            Ok(ReviewCommand::Mark {
                label: rest.to_string(),
                judgment,
            })
        }
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "n" | "next" | "right" => ReviewCommand::Next,
        "p" | "prev" | "previous" | "left" => ReviewCommand::Previous,
        "c" | "correct" => mark(Judgment::Correct)?,
        "i" | "incorrect" => mark(Judgment::Incorrect)?,
        "u" | "unsure" => mark(Judgment::Unsure)?,
        "x" | "clear" => mark(Judgment::Unset)?,
        "imp" | "importance" => {
            let value: f64 = rest
                .parse()
                .map_err(|_| format!("importance must be a number between 0 and 1, got `{rest}`"))?;
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("importance must be between 0 and 1, got {value}"));
            }
            ReviewCommand::Importance(value)
        }
        "note" | "notes" => ReviewCommand::Notes(rest.to_string()),
        "s" | "save" => ReviewCommand::Save,
        "show" => ReviewCommand::Show,
        "?" | "h" | "help" => ReviewCommand::Help,
        "q" | "quit" | "exit" => ReviewCommand::Quit,
        other => return Err(format!("unknown command `{other}` (try `?`)")),
    };
    Ok(Some(cmd))
}

/// Where saves go.
pub struct SaveTargets<'a> {
    pub snapshots: &'a SnapshotStore,
    pub export_dir: &'a Path,
}

/// Drive `session` from `input` until `quit` or end of input.
pub fn run(
    session: &mut ReviewSession,
    targets: &SaveTargets<'_>,
    input: impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if session.corpus().is_empty() {
        writeln!(out, "No dialogues to review.")?;
        return Ok(());
    }
    render(session, out)?;

    for line in input.lines() {
        let line = line?;
        let cmd = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                writeln!(out, "! {msg}")?;
                continue;
            }
        };

        match cmd {
            ReviewCommand::Quit => break,
            ReviewCommand::Help => writeln!(out, "{HELP}")?,
            ReviewCommand::Show => render(session, out)?,
            ReviewCommand::Next | ReviewCommand::Previous => {
                let forward = cmd == ReviewCommand::Next;
                let unsaved = session.has_unsaved_edits();
                let moved = if forward { session.next() } else { session.previous() };
                if !moved {
                    let edge = if forward { "last" } else { "first" };
                    writeln!(out, "! already at the {edge} dialogue")?;
                    continue;
                }
                if unsaved {
                    writeln!(out, "! unsaved edits discarded")?;
                }
                render(session, out)?;
            }
            ReviewCommand::Mark { label, judgment } => {
                let Some(name) = resolve_label(session, &label) else {
                    writeln!(out, "! `{label}` is not an active label on this dialogue")?;
                    continue;
                };
                if let Some(form) = session.form_mut() {
                    form.select(&name, judgment);
                    writeln!(out, "{name}: {judgment}")?;
                }
            }
            ReviewCommand::Importance(value) => {
                if let Some(form) = session.form_mut() {
                    form.set_importance(value);
                    writeln!(out, "importance: {:.2}", form.importance())?;
                }
            }
            ReviewCommand::Notes(text) => {
                if let Some(form) = session.form_mut() {
                    form.set_notes(text);
                    writeln!(out, "notes updated")?;
                }
            }
            ReviewCommand::Save => save(session, targets, out)?,
        }
    }

    if session.has_unsaved_edits() {
        warn!("leaving review with unsaved edits");
    }
    Ok(())
}

fn render(session: &ReviewSession, out: &mut impl Write) -> anyhow::Result<()> {
    if let (Some(index), Some(item)) = (session.current_index(), session.current_dialogue()) {
        writeln!(out)?;
        display::print_dialogue_card(out, index, item, session.form(), Some(session.navigator()))?;
    }
    Ok(())
}

/// Accept a label name or its 1-based position among the active labels.
fn resolve_label(session: &ReviewSession, label: &str) -> Option<String> {
    let active = session.active_labels();
    if let Ok(n) = label.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| active.get(i))
            .map(|a| a.kind.name.to_string());
    }
    let wanted = label.to_ascii_lowercase();
    active
        .iter()
        .find(|a| a.kind.name == wanted)
        .map(|a| a.kind.name.to_string())
}

/// Commit, persist and export. Failures are reported and the session goes on.
fn save(
    session: &mut ReviewSession,
    targets: &SaveTargets<'_>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let Some(report) = session.save(Utc::now()) else {
        return Ok(());
    };

    if let Err(e) = targets.snapshots.save(session.store()) {
        warn!(error = %e, "snapshot save failed");
        writeln!(out, "! could not persist evaluations: {e}")?;
    }

    match write_export(targets.export_dir, &report) {
        Ok(path) => {
            info!(path = %path.display(), "export written");
            writeln!(out, "✓ Evaluation saved! File written: {}", path.display())?;
        }
        Err(e) => {
            warn!(error = %e, "export failed");
            writeln!(out, "! evaluation saved but export failed: {e}")?;
        }
    }
    Ok(())
}
