pub mod errors;
pub mod patch_sources;
pub mod pipeline;
pub mod remap_sources;

pub use errors::TaskError;
pub use patch_sources::{
    DocumentReport, HunkCounts, PatchRunReport, PatchSources, PatchSourcesOptions,
};
pub use pipeline::{run, RunOptions, RunOutcome, SourceChange};
pub use remap_sources::{RemapOptions, RemapSources};
