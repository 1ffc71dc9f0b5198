pub mod context;
pub mod engine;
pub mod errors;
pub mod matcher;
pub mod parser;
pub mod reject;
pub mod source;

pub use context::{strip_path, ContextProvider, LineBuffer};
pub use engine::{HunkReport, HunkStatus, PatchEngine, PatchOptions, PatchReport, PatchStatus};
pub use errors::{HunkFailure, NearMiss, ParseError, PatchError};
pub use matcher::{Alignment, HunkMatcher, LineComparator};
pub use parser::{parse_hunk_header, parse_patch, Hunk, HunkLine, Patch};
pub use reject::{parse_rejects, reject_path, render_reject, RejectWriter};
pub use source::{load_patch_documents, PatchDocument, PatchOrigin};
