use std::path::PathBuf;

use thiserror::Error;

/// Failures reading a record file. Both variants carry the offending path.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DatasetError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            DatasetError::Io { path, .. } | DatasetError::Parse { path, .. } => path,
        }
    }
}

pub type DatasetResult<T> = Result<T, DatasetError>;
