use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no usable data directory for the session file")]
    NoDataDir,
}
