//! Jar Rewriter: source-archive rewriting for decompiled Java code
//!
//! Reads a zip/jar of sources and resources, rewrites it, and writes a new
//! archive. Two rewrites are provided:
//!
//! - **Patching**: contextual unified diffs applied with optional fuzz,
//!   per-hunk reports and `.rej` files for hunks that did not apply.
//! - **Remapping**: generated `func_`/`field_`/`p_` ids renamed from CSV
//!   mapping tables, with documentation comments added above declarations.
//!
//! # Architecture
//!
//! [`ArchiveRewriter`] streams entries through a per-entry transform, or
//! loads the archive into a [`FileSet`] and runs in-memory stages over it.
//! The [`task`] module builds those transforms and stages from a
//! [`RunConfig`].
//!
//! # Example
//!
//! ```no_run
//! use jar_rewriter::config::load_from_path;
//! use jar_rewriter::task::{run, RunOptions};
//!
//! let config = load_from_path("rewrite.toml")?;
//! let outcome = run(&config, RunOptions::default())?;
//! if let Some(report) = &outcome.patch {
//!     println!("{} hunks failed", report.hunks.failed);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod config;
pub mod fileset;
pub mod patch;
pub mod remap;
pub mod task;

// Re-exports
pub use archive::{ArchiveError, ArchiveRewriter, EntryKind, RewriteSummary};
pub use config::{load_from_path, load_from_str, ConfigError, RunConfig};
pub use fileset::FileSet;
pub use patch::{
    ContextProvider, HunkReport, HunkStatus, Patch, PatchEngine, PatchError, PatchOptions,
    PatchReport,
};
pub use remap::{RemapError, SymbolRemapper, SymbolTable};
pub use task::{PatchRunReport, PatchSources, PatchSourcesOptions, RemapSources, TaskError};
