//! The patch stage: inject extra files, then apply every patch document to
//! the in-memory sources.

use crate::archive::inject_paths;
use crate::config::{PatchSection, DEFAULT_STRIP};
use crate::fileset::FileSet;
use crate::patch::{
    load_patch_documents, ContextProvider, HunkStatus, LineComparator, PatchDocument, PatchEngine,
    PatchError, PatchOptions, PatchOrigin, PatchReport, PatchStatus, RejectWriter,
};
use crate::task::errors::TaskError;
use log::{error, info, warn};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSourcesOptions {
    pub patches: PathBuf,
    pub strip: usize,
    pub max_fuzz: usize,
    pub make_rejects: bool,
    pub fail_on_error: bool,
    pub access_c14n: bool,
    pub whitespace_c14n: bool,
    pub injects: Vec<PathBuf>,
}

impl PatchSourcesOptions {
    pub fn new(patches: impl Into<PathBuf>) -> Self {
        Self {
            patches: patches.into(),
            strip: DEFAULT_STRIP,
            max_fuzz: 0,
            make_rejects: true,
            fail_on_error: false,
            access_c14n: true,
            whitespace_c14n: false,
            injects: Vec::new(),
        }
    }

    fn engine_options(&self) -> PatchOptions {
        PatchOptions {
            max_fuzz: self.max_fuzz,
            comparator: LineComparator {
                access: self.access_c14n,
                whitespace: self.whitespace_c14n,
            },
        }
    }
}

impl From<&PatchSection> for PatchSourcesOptions {
    fn from(section: &PatchSection) -> Self {
        Self {
            patches: section.patches.clone(),
            strip: section.strip,
            max_fuzz: section.max_fuzz,
            make_rejects: section.make_rejects,
            fail_on_error: section.fail_on_error,
            access_c14n: section.access_c14n,
            whitespace_c14n: section.whitespace_c14n,
            injects: section.injects.clone(),
        }
    }
}

/// Results for one patch document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub origin: PatchOrigin,
    pub patches: Vec<PatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HunkCounts {
    pub success: usize,
    pub fuzzed: usize,
    pub failed: usize,
}

impl HunkCounts {
    pub fn total(&self) -> usize {
        self.success + self.fuzzed + self.failed
    }
}

/// Everything one patch stage run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchRunReport {
    /// Entries merged from inject paths before patching.
    pub injected: usize,
    pub documents: Vec<DocumentReport>,
    /// Set when any hunk applied at a non-zero offset.
    pub fuzzed: bool,
    pub hunks: HunkCounts,
}

impl PatchRunReport {
    pub fn has_failures(&self) -> bool {
        self.hunks.failed > 0
    }

    pub fn patch_reports(&self) -> impl Iterator<Item = &PatchReport> {
        self.documents.iter().flat_map(|d| d.patches.iter())
    }

    /// Targets with at least one applied hunk, in application order.
    pub fn changed_targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for report in self.patch_reports() {
            let applied = report.hunks.iter().any(|h| h.status.is_applied());
            if applied && !targets.contains(&report.target.as_str()) {
                targets.push(&report.target);
            }
        }
        targets
    }

    fn tally(&mut self) {
        let mut counts = HunkCounts::default();
        for hunk in self.patch_reports().flat_map(|p| p.hunks.iter()) {
            match hunk.status {
                HunkStatus::Success => counts.success += 1,
                HunkStatus::Fuzzed(_) => counts.fuzzed += 1,
                HunkStatus::Failed => counts.failed += 1,
            }
        }
        self.fuzzed = counts.fuzzed > 0;
        self.hunks = counts;
    }
}

/// Patch documents loaded and ready to apply.
pub struct PatchSources {
    options: PatchSourcesOptions,
    documents: Vec<PatchDocument>,
    engine: PatchEngine,
}

impl PatchSources {
    /// Load every patch document. A patch source that is neither a
    /// directory nor a zip/jar is rejected here, before any archive is read.
    pub fn load(options: PatchSourcesOptions) -> Result<Self, PatchError> {
        let documents = load_patch_documents(&options.patches)?;
        info!(
            "Loaded {} patch documents from {}",
            documents.len(),
            options.patches.display()
        );
        let engine = PatchEngine::new(options.engine_options());
        Ok(Self {
            options,
            documents,
            engine,
        })
    }

    pub fn documents(&self) -> &[PatchDocument] {
        &self.documents
    }

    pub fn options(&self) -> &PatchSourcesOptions {
        &self.options
    }

    pub fn run(&self, files: &mut FileSet) -> Result<PatchRunReport, TaskError> {
        let mut report = PatchRunReport {
            injected: inject_paths(&self.options.injects, files)?,
            ..PatchRunReport::default()
        };

        for document in &self.documents {
            report.documents.push(self.apply_document(document, files)?);
        }
        report.tally();

        if report.fuzzed {
            warn!("Some hunks applied with fuzz; check the patch report");
        }
        if report.has_failures() && self.options.fail_on_error {
            return Err(TaskError::HunksFailed {
                failed: report.hunks.failed,
                total: report.hunks.total(),
                report: Box::new(report),
            });
        }
        Ok(report)
    }

    fn apply_document(
        &self,
        document: &PatchDocument,
        files: &mut FileSet,
    ) -> Result<DocumentReport, TaskError> {
        let mut context = ContextProvider::new(files, self.options.strip);
        let mut rejects = if self.options.make_rejects {
            document.origin.reject_path().map(RejectWriter::new)
        } else {
            None
        };

        let mut patches = Vec::with_capacity(document.patches.len());
        for patch in &document.patches {
            let result = self.engine.apply(patch, &mut context);
            match result.status {
                PatchStatus::Success => info!("Patched {}", result.target),
                PatchStatus::Fuzzed => warn!(
                    "Patched {} with fuzz {}",
                    result.target,
                    result.max_fuzz()
                ),
                PatchStatus::Failed => {
                    error!("Patching failed: {} ({})", result.target, document.origin)
                }
            }

            for failed in result.failed_hunks() {
                if let Some(failure) = &failed.failure {
                    error!("  Hunk {} failed: {}", failed.id, failure);
                }
                let hunk = patch.hunks.iter().find(|h| h.id == failed.id);
                if let (Some(writer), Some(hunk)) = (rejects.as_mut(), hunk) {
                    writer.write(hunk)?;
                }
            }
            patches.push(result);
        }

        let reject_file = match &rejects {
            Some(writer) if writer.written() > 0 => {
                info!("Rejects saved to {}", writer.path().display());
                Some(writer.path().to_path_buf())
            }
            Some(writer) => {
                writer.clear_stale()?;
                None
            }
            None => None,
        };

        Ok(DocumentReport {
            origin: document.origin.clone(),
            patches,
            reject_file,
        })
    }
}
