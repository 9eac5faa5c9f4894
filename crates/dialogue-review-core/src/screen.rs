//! Corpus screening for dialogues that lost an attachment.
//!
//! Source transcripts drop images, voice notes and video. When the doctor
//! talks about media the patient never mentions sending, the patient's side
//! almost certainly referred to an attachment that is no longer there, and the
//! dialogue is unreliable for review.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::info;

use crate::corpus::{Corpus, DialogueId, DialogueItem, Speaker};
use crate::error::CoreError;

/// Doctor phrases that refer to media (picture, photo, looking at the picture,
/// saw it, voice, sounds like, recording, video).
pub const DOCTOR_MEDIA_KEYWORDS: &[&str] =
    &["图片", "照片", "看图", "看到了", "语音", "听起来", "录音", "视频"];

/// Patient phrases that refer to sending media.
pub const PATIENT_MEDIA_KEYWORDS: &[&str] = &["图片", "照片", "语音", "录音", "视频"];

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Whether the doctor mentions media while the patient never does.
pub fn is_suspect(item: &DialogueItem) -> bool {
    let mut doctor_mentions = false;
    let mut patient_mentions = false;
    for turn in &item.data_sample.dialogue {
        match turn.speaker_kind() {
            Speaker::Doctor => {
                doctor_mentions |= mentions_any(turn.text(), DOCTOR_MEDIA_KEYWORDS);
            }
            Speaker::Patient => {
                patient_mentions |= mentions_any(turn.text(), PATIENT_MEDIA_KEYWORDS);
            }
            Speaker::EndMarker | Speaker::Other => {}
        }
    }
    doctor_mentions && !patient_mentions
}

/// Ids of suspect dialogues, in corpus order.
pub fn suspect_ids(corpus: &Corpus) -> Vec<DialogueId> {
    corpus
        .iter()
        .filter(|item| is_suspect(item))
        .filter_map(|item| item.dialogue_id().cloned())
        .collect()
}

/// Result of screening a raw corpus.
#[derive(Debug, Clone)]
pub struct ScreenOutcome {
    /// Raw items kept, untouched, in original order.
    pub kept: Vec<Value>,
    pub suspect_ids: Vec<DialogueId>,
}

/// Screen raw corpus items, dropping every item whose `dialogue_id` belongs
/// to a suspect dialogue.
///
/// Items are kept as raw JSON so fields this tool does not model survive.
pub fn screen_raw(items: Vec<Value>) -> Result<ScreenOutcome, CoreError> {
    let corpus = Corpus::from_values(items.clone())?;
    let suspect_ids = suspect_ids(&corpus);
    let suspects: BTreeSet<&DialogueId> = suspect_ids.iter().collect();

    let kept: Vec<Value> = items
        .into_iter()
        .zip(corpus.iter())
        .filter(|(_, item)| item.dialogue_id().is_none_or(|id| !suspects.contains(id)))
        .map(|(raw, _)| raw)
        .collect();

    info!(
        suspects = suspect_ids.len(),
        kept = kept.len(),
        "screened corpus for missing attachments"
    );
    Ok(ScreenOutcome { kept, suspect_ids })
}
