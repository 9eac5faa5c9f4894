//! Export artifacts written to disk.

use std::fs;
use std::path::{Path, PathBuf};

use dialogue_review_core::ExportReport;
use tracing::info;

use crate::StoreError;

/// Write `report` as pretty JSON into `dir`, named after its timestamp.
///
/// Returns the path of the written file. An existing file of the same name
/// (two saves within one second) is overwritten.
pub fn write_export(dir: &Path, report: &ExportReport) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    let path = dir.join(report.file_name());
    let json = report.to_json_pretty()?;
    fs::write(&path, json).map_err(|e| StoreError::io(&path, e))?;
    info!(
        path = %path.display(),
        evaluated = report.export_info.evaluated_dialogues,
        "wrote evaluation export"
    );
    Ok(path)
}
