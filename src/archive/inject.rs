//! Merge extra files into a [`FileSet`] before patching.
//!
//! Each inject path is either a directory (walked recursively), a zip/jar
//! archive, or a single file. `.java` files become sources, anything else a
//! resource.

use crate::archive::errors::ArchiveError;
use crate::archive::rewriter::read_text;
use crate::fileset::{normalize_path, FileSet};
use log::debug;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Whether a path names a zip-format archive by its extension.
pub fn is_archive_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("zip") | Some("jar")
    )
}

/// Merge every inject path into `files`, in order. Later injects overwrite
/// earlier entries at the same path. Returns the number of entries merged.
pub fn inject_paths(injects: &[PathBuf], files: &mut FileSet) -> Result<usize, ArchiveError> {
    let mut merged = 0;
    for inject in injects {
        let count = if inject.is_dir() {
            inject_directory(inject, files)?
        } else if is_archive_path(inject) {
            inject_archive(inject, files)?
        } else {
            inject_file(inject, files)?
        };
        debug!("Injected {count} entries from {}", inject.display());
        merged += count;
    }
    Ok(merged)
}

fn inject_directory(dir: &Path, files: &mut FileSet) -> Result<usize, ArchiveError> {
    let mut count = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let key = normalize_path(&relative.to_string_lossy());
        let bytes = fs::read(entry.path()).map_err(|e| ArchiveError::io(entry.path(), e))?;
        route(files, key, bytes)?;
        count += 1;
    }
    Ok(count)
}

fn inject_archive(path: &Path, files: &mut FileSet) -> Result<usize, ArchiveError> {
    let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut count = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let key = normalize_path(entry.name());
        if key.ends_with(".java") {
            let text = read_text(&mut entry, &key)?;
            files.insert_source(key, text);
        } else {
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            files.insert_resource(key, bytes);
        }
        count += 1;
    }
    Ok(count)
}

fn inject_file(path: &Path, files: &mut FileSet) -> Result<usize, ArchiveError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = fs::read(path).map_err(|e| ArchiveError::io(path, e))?;
    route(files, name, bytes)?;
    Ok(1)
}

fn route(files: &mut FileSet, key: String, bytes: Vec<u8>) -> Result<(), ArchiveError> {
    if key.ends_with(".java") {
        let text = String::from_utf8(bytes)
            .map_err(|_| ArchiveError::NonUtf8Source { path: key.clone() })?;
        files.insert_source(key, text);
    } else {
        files.insert_resource(key, bytes);
    }
    Ok(())
}
