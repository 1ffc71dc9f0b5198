use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: malformed hunk header '{text}'")]
    MalformedHunkHeader { line: usize, text: String },

    #[error("line {line}: hunk found before any '---'/'+++' file header")]
    MissingFileHeader { line: usize },

    #[error("line {line}: hunk body ended before its header counts were satisfied")]
    TruncatedHunk { line: usize },

    #[error("line {line}: unexpected line in hunk body: '{text}'")]
    UnexpectedLine { line: usize, text: String },

    #[error("line {line}: malformed reject block")]
    MalformedReject { line: usize },
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("patches ({path}) is not a valid type: only zips, jars, and directories are allowed")]
    InvalidSource { path: PathBuf },

    #[error("failed to parse patch {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: ParseError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error reading {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to walk patch directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl PatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Closest window found for a hunk that failed to match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearMiss {
    /// 1-based line where the window starts.
    pub line: usize,
    /// Normalized Levenshtein similarity in `[0, 1]`.
    pub similarity: f64,
}

/// Why a hunk could not be applied.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HunkFailure {
    #[error("target file {target} not found")]
    TargetNotFound { target: String },

    #[error("context not found at line {expected_line} (max fuzz {max_fuzz}){}", describe_near_miss(.nearest))]
    ContextMismatch {
        expected_line: usize,
        max_fuzz: usize,
        nearest: Option<NearMiss>,
    },

    #[error("hunk appears to be already applied at line {line}")]
    AlreadyApplied { line: usize },
}

fn describe_near_miss(nearest: &Option<NearMiss>) -> String {
    match nearest {
        Some(near) => format!(
            "; closest match at line {} ({:.0}% similar)",
            near.line,
            near.similarity * 100.0
        ),
        None => String::new(),
    }
}
