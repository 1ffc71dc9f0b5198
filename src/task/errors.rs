use crate::archive::ArchiveError;
use crate::config::ConfigError;
use crate::patch::PatchError;
use crate::remap::RemapError;
use crate::task::patch_sources::PatchRunReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Remap(#[from] RemapError),

    /// Raised only when `fail_on_error` is set. Carries the full report.
    #[error("{failed} of {total} hunks failed to apply")]
    HunksFailed {
        failed: usize,
        total: usize,
        report: Box<PatchRunReport>,
    },
}

impl TaskError {
    /// Recover a task error raised inside an archive stage or transform.
    pub fn from_archive(error: ArchiveError) -> Self {
        match error {
            ArchiveError::Stage(inner) => match inner.downcast::<TaskError>() {
                Ok(task) => *task,
                Err(inner) => TaskError::Archive(ArchiveError::Stage(inner)),
            },
            other => TaskError::Archive(other),
        }
    }
}
