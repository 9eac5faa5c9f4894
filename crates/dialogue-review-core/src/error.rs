use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("corpus JSON parse error: {0}")]
    CorpusParse(#[source] serde_json::Error),

    #[error("corpus item {index} is malformed: {source}")]
    MalformedItem {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("export serialisation failed: {0}")]
    Export(#[source] serde_json::Error),
}
