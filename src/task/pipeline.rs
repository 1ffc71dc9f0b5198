//! Wiring a [`RunConfig`] into one archive rewrite.
//!
//! Remapping runs as the per-entry transform; patching (with injection)
//! runs as the single in-memory stage. A config with only a remap section
//! therefore takes the streaming fast-copy path.

use crate::archive::{ArchiveRewriter, RewriteSummary};
use crate::config::RunConfig;
use crate::fileset::FileSet;
use crate::task::errors::TaskError;
use crate::task::patch_sources::{PatchRunReport, PatchSources, PatchSourcesOptions};
use crate::task::remap_sources::{RemapOptions, RemapSources};
use indexmap::IndexMap;
use serde::Serialize;

/// A source rewritten by the patch stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceChange {
    pub path: String,
    /// `None` when the patch stage created the file.
    pub before: Option<String>,
    /// `None` when the patch stage deleted the file.
    pub after: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOutcome {
    pub summary: RewriteSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<PatchRunReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<SourceChange>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Record before/after text of every source the patch stage changed.
    pub capture_changes: bool,
}

/// Run every stage `config` enables over its input archive.
///
/// Patch documents and mapping tables are loaded before the input archive
/// is opened, so a bad patch source fails without touching any archive.
pub fn run(config: &RunConfig, options: RunOptions) -> Result<RunOutcome, TaskError> {
    let remap = config
        .remap
        .as_ref()
        .map(|section| RemapSources::load(&RemapOptions::from(section)))
        .transpose()?;
    let patch = config
        .patch
        .as_ref()
        .map(|section| PatchSources::load(PatchSourcesOptions::from(section)))
        .transpose()?;

    let mut patch_report = None;
    let mut changes = Vec::new();

    let summary = {
        let mut rewriter = ArchiveRewriter::new();
        if let Some(remap) = &remap {
            rewriter = rewriter.with_entry_transform(move |_path, text| Ok(remap.rewrite(&text)));
        }
        if let Some(patch) = &patch {
            let patch_report = &mut patch_report;
            let changes = &mut changes;
            rewriter = rewriter.with_stage(move |files: &mut FileSet| {
                let before = options.capture_changes.then(|| files.sources().clone());
                let report = patch.run(files)?;
                if let Some(before) = before {
                    *changes = collect_changes(&report, &before, files);
                }
                *patch_report = Some(report);
                Ok(())
            });
        }
        rewriter
            .transform(&config.archive.input, &config.archive.output)
            .map_err(TaskError::from_archive)?
    };

    Ok(RunOutcome {
        summary,
        patch: patch_report,
        changes,
    })
}

fn collect_changes(
    report: &PatchRunReport,
    before: &IndexMap<String, String>,
    files: &FileSet,
) -> Vec<SourceChange> {
    report
        .changed_targets()
        .into_iter()
        .filter_map(|path| {
            let old = before.get(path).cloned();
            let new = files.source(path).map(str::to_string);
            (old != new).then(|| SourceChange {
                path: path.to_string(),
                before: old,
                after: new,
            })
        })
        .collect()
}
