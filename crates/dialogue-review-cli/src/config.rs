use std::path::PathBuf;

use directories::ProjectDirs;

const APP_NAME: &str = "dialogue-review";

/// Corpus file the labelling pipeline produces.
pub const DEFAULT_DIALOGUES: &str = "labeled_1_120_processed_cn_telehealth_2020.json";

/// Resolved locations for a run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dialogues: PathBuf,
    pub state_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Settings {
    pub fn resolve(dialogues: PathBuf, state_dir: Option<PathBuf>, export_dir: PathBuf) -> Self {
        Self {
            dialogues,
            state_dir: state_dir.unwrap_or_else(default_state_dir),
            export_dir,
        }
    }
}

/// Platform data directory, or `./.dialogue-review` when there is no home.
pub fn default_state_dir() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_NAME}")))
}
