pub mod classify;
pub mod errors;
pub mod inject;
pub mod rewriter;

pub use classify::{classify, is_metadata, EntryKind, METADATA_DIR, SOURCE_EXTENSIONS};
pub use errors::{ArchiveError, StageError};
pub use inject::{inject_paths, is_archive_path};
pub use rewriter::{ArchiveRewriter, Classifier, EntryTransform, ExtraEntries, RewriteSummary, Stage};
