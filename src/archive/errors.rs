use std::path::PathBuf;
use thiserror::Error;

/// Error type returned by caller-supplied transforms, stages and hooks.
pub type StageError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("source entry {path} is not valid UTF-8")]
    NonUtf8Source { path: String },

    #[error("transform failed for {path}: {source}")]
    Transform {
        path: String,
        #[source]
        source: StageError,
    },

    #[error("rewrite stage failed: {0}")]
    Stage(#[source] StageError),

    #[error("extra entries hook failed: {0}")]
    ExtraEntries(#[source] StageError),
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.into(),
            source,
        }
    }

    /// Downcast the error raised by a stage, if this is a stage failure.
    pub fn stage_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            ArchiveError::Stage(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}
