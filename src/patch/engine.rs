//! Applying parsed patches to target buffers.
//!
//! Hunks apply in document order. Each hunk's expected position is its
//! header line shifted by the line delta of the hunks already applied to the
//! same file, so later hunks are not thrown off by earlier insertions. A
//! hunk that cannot be aligned within the fuzz window fails without
//! touching the buffer; the remaining hunks still run.

use crate::patch::context::{ContextProvider, LineBuffer};
use crate::patch::errors::HunkFailure;
use crate::patch::matcher::{HunkMatcher, LineComparator};
use crate::patch::parser::{Hunk, HunkLine, Patch};
use log::{debug, trace};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HunkStatus {
    Success,
    /// Applied at a non-zero offset; carries the absolute offset.
    Fuzzed(usize),
    Failed,
}

impl HunkStatus {
    pub fn is_applied(&self) -> bool {
        !matches!(self, HunkStatus::Failed)
    }

    pub fn fuzz(&self) -> usize {
        match self {
            HunkStatus::Fuzzed(fuzz) => *fuzz,
            _ => 0,
        }
    }
}

/// Worst outcome across a patch's hunks. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStatus {
    Success,
    Fuzzed,
    Failed,
}

impl From<HunkStatus> for PatchStatus {
    fn from(status: HunkStatus) -> Self {
        match status {
            HunkStatus::Success => PatchStatus::Success,
            HunkStatus::Fuzzed(_) => PatchStatus::Fuzzed,
            HunkStatus::Failed => PatchStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HunkReport {
    pub id: usize,
    pub status: HunkStatus,
    /// Absolute line offset from the expected position.
    pub fuzz: usize,
    /// 0-based line the hunk was applied at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<HunkFailure>,
}

impl HunkReport {
    fn applied(id: usize, index: usize, fuzz: usize) -> Self {
        Self {
            id,
            status: if fuzz == 0 {
                HunkStatus::Success
            } else {
                HunkStatus::Fuzzed(fuzz)
            },
            fuzz,
            index: Some(index),
            failure: None,
        }
    }

    fn failed(id: usize, failure: HunkFailure) -> Self {
        Self {
            id,
            status: HunkStatus::Failed,
            fuzz: 0,
            index: None,
            failure: Some(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchReport {
    /// Archive path after stripping.
    pub target: String,
    pub status: PatchStatus,
    /// Detail of the first failed hunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<HunkFailure>,
    pub hunks: Vec<HunkReport>,
}

impl PatchReport {
    pub fn new(target: impl Into<String>, hunks: Vec<HunkReport>) -> Self {
        let status = hunks
            .iter()
            .map(|h| PatchStatus::from(h.status))
            .max()
            .unwrap_or(PatchStatus::Success);
        let failure = hunks.iter().find_map(|h| h.failure.clone());
        Self {
            target: target.into(),
            status,
            failure,
            hunks,
        }
    }

    pub fn failed_hunks(&self) -> impl Iterator<Item = &HunkReport> {
        self.hunks.iter().filter(|h| !h.status.is_applied())
    }

    pub fn max_fuzz(&self) -> usize {
        self.hunks.iter().map(|h| h.status.fuzz()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    pub max_fuzz: usize,
    pub comparator: LineComparator,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            max_fuzz: 0,
            comparator: LineComparator::exact(),
        }
    }
}

pub struct PatchEngine {
    matcher: HunkMatcher,
}

impl PatchEngine {
    pub fn new(options: PatchOptions) -> Self {
        Self {
            matcher: HunkMatcher::new(options.max_fuzz, options.comparator),
        }
    }

    /// Apply one file section through a context provider. The target is
    /// written back only if at least one hunk applied.
    pub fn apply(&self, patch: &Patch, context: &mut ContextProvider<'_>) -> PatchReport {
        let target = context.resolve(patch.target());

        let mut buffer = match context.load(&target) {
            Some(buffer) => buffer,
            None if patch.is_creation() => LineBuffer::new(),
            None => {
                debug!("Patch target {target} not found");
                let hunks = patch
                    .hunks
                    .iter()
                    .map(|hunk| {
                        HunkReport::failed(
                            hunk.id,
                            HunkFailure::TargetNotFound {
                                target: target.clone(),
                            },
                        )
                    })
                    .collect();
                return PatchReport::new(target, hunks);
            }
        };

        let hunks = self.apply_to_buffer(patch, &mut buffer);

        if hunks.iter().any(|h| h.status.is_applied()) {
            if patch.is_deletion() && buffer.is_empty() {
                debug!("Removing {target}");
                context.remove(&target);
            } else {
                context.store(&target, &buffer);
            }
        }

        PatchReport::new(target, hunks)
    }

    /// Apply every hunk of `patch` to `buffer` in order.
    pub fn apply_to_buffer(&self, patch: &Patch, buffer: &mut LineBuffer) -> Vec<HunkReport> {
        let mut delta: isize = 0;
        let mut reports = Vec::with_capacity(patch.hunks.len());

        for hunk in &patch.hunks {
            let report = self.apply_hunk(hunk, buffer, delta);
            if report.status.is_applied() {
                delta += hunk.new_block().len() as isize - hunk.old_block().len() as isize;
            }
            trace!("Hunk {} -> {:?}", hunk.id, report.status);
            reports.push(report);
        }
        reports
    }

    fn apply_hunk(&self, hunk: &Hunk, buffer: &mut LineBuffer, delta: isize) -> HunkReport {
        let old = hunk.old_block();
        let new = hunk.new_block();
        let expected = expected_index(hunk, delta);

        match self.matcher.find(buffer.lines(), expected, &old) {
            Some(alignment) => {
                let replacement = merge_hunk(hunk, &buffer.lines()[alignment.index..]);
                buffer.splice(alignment.index, old.len(), replacement);
                HunkReport::applied(hunk.id, alignment.index, alignment.fuzz())
            }
            None => {
                let failure = if old != new && self.matcher.find(buffer.lines(), expected, &new).is_some() {
                    HunkFailure::AlreadyApplied { line: expected + 1 }
                } else {
                    HunkFailure::ContextMismatch {
                        expected_line: expected + 1,
                        max_fuzz: self.matcher.max_fuzz(),
                        nearest: self.matcher.nearest(buffer.lines(), expected, &old),
                    }
                };
                debug!("Hunk {} failed: {failure}", hunk.id);
                HunkReport::failed(hunk.id, failure)
            }
        }
    }
}

/// Lines replacing a matched old block. Context lines keep the target's text,
/// which can differ from the patch's when the comparator canonicalizes.
fn merge_hunk(hunk: &Hunk, target: &[String]) -> Vec<String> {
    let mut merged = Vec::with_capacity(hunk.new_len);
    let mut cursor = target.iter();
    for line in &hunk.lines {
        match line {
            HunkLine::Context(text) => {
                merged.push(cursor.next().cloned().unwrap_or_else(|| text.clone()));
            }
            HunkLine::Removed(_) => {
                cursor.next();
            }
            HunkLine::Added(text) => merged.push(text.clone()),
        }
    }
    merged
}

/// 0-based index the old block should start at. A hunk with no old lines
/// inserts after its header line rather than at it.
fn expected_index(hunk: &Hunk, delta: isize) -> usize {
    let base = if hunk.old_len == 0 {
        hunk.old_start
    } else {
        hunk.old_start.saturating_sub(1)
    };
    (base as isize + delta).max(0) as usize
}
