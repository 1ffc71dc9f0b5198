//! Loading patch documents from a directory tree or a zip/jar archive.

use crate::archive::is_archive_path;
use crate::patch::errors::PatchError;
use crate::patch::parser::{parse_patch, Patch};
use crate::patch::reject::reject_path;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

pub const PATCH_EXTENSION: &str = ".patch";

/// Where a patch document came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchOrigin {
    File { path: PathBuf },
    ArchiveEntry { archive: PathBuf, entry: String },
}

impl PatchOrigin {
    /// Reject file for this origin. Patches read from an archive have none.
    pub fn reject_path(&self) -> Option<PathBuf> {
        match self {
            PatchOrigin::File { path } => Some(reject_path(path)),
            PatchOrigin::ArchiveEntry { .. } => None,
        }
    }
}

impl fmt::Display for PatchOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOrigin::File { path } => write!(f, "{}", path.display()),
            PatchOrigin::ArchiveEntry { archive, entry } => {
                write!(f, "{}!{}", archive.display(), entry)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDocument {
    pub origin: PatchOrigin,
    pub patches: Vec<Patch>,
}

impl PatchDocument {
    pub fn parse(origin: PatchOrigin, text: &str) -> Result<Self, PatchError> {
        let patches = parse_patch(text).map_err(|source| PatchError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self { origin, patches })
    }

    pub fn hunk_count(&self) -> usize {
        self.patches.iter().map(|p| p.hunks.len()).sum()
    }
}

/// Load every `*.patch` document under `source`, in sorted path order.
///
/// `source` must be a directory or a `.zip`/`.jar` archive; anything else
/// is rejected before any file is read.
pub fn load_patch_documents(source: &Path) -> Result<Vec<PatchDocument>, PatchError> {
    if source.is_dir() {
        load_directory(source)
    } else if is_archive_path(source) {
        load_archive(source)
    } else {
        Err(PatchError::InvalidSource {
            path: source.to_path_buf(),
        })
    }
}

fn load_directory(dir: &Path) -> Result<Vec<PatchDocument>, PatchError> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_patch_name(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let text =
            fs::read_to_string(entry.path()).map_err(|e| PatchError::io(entry.path(), e))?;
        documents.push(PatchDocument::parse(
            PatchOrigin::File {
                path: entry.path().to_path_buf(),
            },
            &text,
        )?);
    }
    Ok(documents)
}

fn load_archive(path: &Path) -> Result<Vec<PatchDocument>, PatchError> {
    let zip_err = |source| PatchError::Zip {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|e| PatchError::io(path, e))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(zip_err)?;

    // Every file entry of a patch archive is a patch document.
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect();
    names.sort();

    let mut documents = Vec::with_capacity(names.len());
    for name in names {
        let mut entry = archive.by_name(&name).map_err(zip_err)?;
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|e| PatchError::io(path, e))?;
        documents.push(PatchDocument::parse(
            PatchOrigin::ArchiveEntry {
                archive: path.to_path_buf(),
                entry: name,
            },
            &text,
        )?);
    }
    Ok(documents)
}

fn is_patch_name(name: &str) -> bool {
    name.ends_with(PATCH_EXTENSION)
}
