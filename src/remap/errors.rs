use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemapError {
    #[error("I/O error reading mappings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}:{line}: {message}")]
    Csv {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
