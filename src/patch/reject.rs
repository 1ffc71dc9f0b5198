//! Reject files for hunks that failed to apply.
//!
//! Each failed hunk is written as a block:
//!
//! ```text
//! ++++ REJECTED PATCH 2
//! @@ -10,3 +10,3 @@
//!  context
//! -removed
//! +added
//! ++++ END PATCH
//! ```

use crate::patch::errors::{ParseError, PatchError};
use crate::patch::parser::{parse_hunk, Hunk};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const REJECT_HEADER: &str = "++++ REJECTED PATCH";
pub const REJECT_FOOTER: &str = "++++ END PATCH";

pub fn render_reject(hunk: &Hunk) -> String {
    let mut block = format!("{REJECT_HEADER} {}\n", hunk.id);
    for line in hunk.to_patch_lines() {
        block.push_str(&line);
        block.push('\n');
    }
    block.push_str(REJECT_FOOTER);
    block.push('\n');
    block
}

/// Read the hunks back out of a reject file.
pub fn parse_rejects(text: &str) -> Result<Vec<Hunk>, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut hunks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(id) = lines[i].strip_prefix(REJECT_HEADER) else {
            i += 1;
            continue;
        };
        let id = id
            .trim()
            .parse()
            .map_err(|_| ParseError::MalformedReject { line: i + 1 })?;
        let end = lines[i + 1..]
            .iter()
            .position(|line| *line == REJECT_FOOTER)
            .map(|offset| i + 1 + offset)
            .ok_or(ParseError::MalformedReject { line: i + 1 })?;

        let (hunk, consumed) = parse_hunk(&lines[i + 1..end], i + 2, id)?;
        if i + 1 + consumed != end {
            return Err(ParseError::MalformedReject { line: i + 1 + consumed });
        }
        hunks.push(hunk);
        i = end + 1;
    }
    Ok(hunks)
}

/// `<patch file>.rej` next to the patch file.
pub fn reject_path(patch_file: &Path) -> PathBuf {
    let mut name = patch_file.as_os_str().to_owned();
    name.push(".rej");
    PathBuf::from(name)
}

/// Appends failed hunks to one patch file's reject file. The file is
/// truncated by the first write of a run, so rejects from a previous run
/// never mix with the current one.
#[derive(Debug)]
pub struct RejectWriter {
    path: PathBuf,
    written: usize,
}

impl RejectWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: 0,
        }
    }

    pub fn for_patch_file(patch_file: &Path) -> Self {
        Self::new(reject_path(patch_file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write(&mut self, hunk: &Hunk) -> Result<(), PatchError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(self.written == 0)
            .append(self.written > 0)
            .open(&self.path)
            .map_err(|e| PatchError::io(&self.path, e))?;
        file.write_all(render_reject(hunk).as_bytes())
            .map_err(|e| PatchError::io(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    /// Delete a reject file left by an earlier run when nothing was
    /// rejected this time.
    pub fn clear_stale(&self) -> Result<bool, PatchError> {
        if self.written > 0 || !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| PatchError::io(&self.path, e))?;
        Ok(true)
    }
}
