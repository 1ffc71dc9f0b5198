//! Archive rewriting: read entries, transform, write a new archive.
//!
//! Two paths exist. With no in-memory stages configured the archive is
//! streamed entry by entry ("fast copy"): resources are raw-copied with their
//! original metadata and sources pass through the per-entry transform. With
//! one or more stages the whole archive is loaded into a [`FileSet`], the
//! stages run in order, and the set is written back resources first, then
//! sources.

use crate::archive::classify::{classify, is_metadata, EntryKind};
use crate::archive::errors::{ArchiveError, StageError};
use crate::fileset::FileSet;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use zip::read::{read_zipfile_from_stream, ZipFile};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Per-entry transform applied to each source as it is read: `(path, text) -> text`.
pub type EntryTransform<'a> = Box<dyn FnMut(&str, String) -> Result<String, StageError> + 'a>;

/// In-memory stage run once the whole archive has been read.
pub type Stage<'a> = Box<dyn FnMut(&mut FileSet) -> Result<(), StageError> + 'a>;

/// Hook producing extra `(path, bytes)` entries appended after everything else.
pub type ExtraEntries<'a> = Box<dyn FnMut() -> Result<Vec<(String, Vec<u8>)>, StageError> + 'a>;

pub type Classifier = fn(&str) -> EntryKind;

/// Counts and diagnostics collected while rewriting one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub sources: usize,
    pub resources: usize,
    pub extra_entries: usize,
    pub skipped_metadata: usize,
    pub skipped_directories: usize,
    /// Entries dropped because their path was already written.
    pub duplicates: Vec<String>,
}

pub struct ArchiveRewriter<'a> {
    classify: Classifier,
    entry_transform: Option<EntryTransform<'a>>,
    stages: Vec<Stage<'a>>,
    extra_entries: Option<ExtraEntries<'a>>,
}

impl Default for ArchiveRewriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ArchiveRewriter<'a> {
    pub fn new() -> Self {
        Self {
            classify,
            entry_transform: None,
            stages: Vec::new(),
            extra_entries: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classify = classifier;
        self
    }

    pub fn with_entry_transform(
        mut self,
        transform: impl FnMut(&str, String) -> Result<String, StageError> + 'a,
    ) -> Self {
        self.entry_transform = Some(Box::new(transform));
        self
    }

    /// Append an in-memory stage. Any stage switches the rewriter off the
    /// fast-copy path.
    pub fn with_stage(
        mut self,
        stage: impl FnMut(&mut FileSet) -> Result<(), StageError> + 'a,
    ) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn with_extra_entries(
        mut self,
        hook: impl FnMut() -> Result<Vec<(String, Vec<u8>)>, StageError> + 'a,
    ) -> Self {
        self.extra_entries = Some(Box::new(hook));
        self
    }

    pub fn is_in_memory(&self) -> bool {
        !self.stages.is_empty()
    }

    /// Rewrite `input` into `output`.
    ///
    /// The output is written to a temporary file in the destination directory
    /// and renamed into place once the archive is complete.
    pub fn transform(&mut self, input: &Path, output: &Path) -> Result<RewriteSummary, ArchiveError> {
        let reader = File::open(input).map_err(|e| ArchiveError::io(input, e))?;

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| ArchiveError::io(&parent, e))?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| ArchiveError::io(&parent, e))?;
        let summary = {
            let (summary, mut writer) =
                self.transform_streams(BufReader::new(reader), BufWriter::new(temp.as_file_mut()))?;
            writer.flush().map_err(|e| ArchiveError::io(output, e))?;
            summary
        };
        temp.as_file()
            .sync_all()
            .map_err(|e| ArchiveError::io(output, e))?;
        temp.persist(output)
            .map_err(|e| ArchiveError::io(output, e.error))?;

        info!(
            "Wrote {} ({} sources, {} resources)",
            output.display(),
            summary.sources,
            summary.resources
        );
        Ok(summary)
    }

    /// Rewrite between arbitrary seekable streams; returns the finished writer.
    pub fn transform_streams<R, W>(
        &mut self,
        input: R,
        output: W,
    ) -> Result<(RewriteSummary, W), ArchiveError>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let mut input = input;
        let mut writer = ZipWriter::new(output);

        let summary = if self.is_in_memory() {
            let mut archive = ZipArchive::new(input)?;
            self.rewrite_in_memory(&mut archive, &mut writer)?
        } else if is_streamable(&mut input)? {
            self.stream_entries(&mut input, &mut writer)?
        } else {
            warn!("Archive has entries without sizes in their local headers; duplicate entries cannot be detected");
            let mut archive = ZipArchive::new(input)?;
            self.copy_entries(&mut archive, &mut writer)?
        };

        let output = writer.finish()?;
        Ok((summary, output))
    }

    /// Fast copy over the local entries in file order. Unlike the central
    /// directory, the local entries still hold every duplicate name, so the
    /// first entry for a path is the one kept.
    fn stream_entries<R: Read, W: Write + Seek>(
        &mut self,
        input: &mut R,
        writer: &mut ZipWriter<W>,
    ) -> Result<RewriteSummary, ArchiveError> {
        let mut summary = RewriteSummary::default();
        let mut written = HashSet::new();

        while let Some(file) = read_zipfile_from_stream(&mut *input)? {
            self.copy_entry(file, writer, &mut written, &mut summary)?;
        }

        self.write_extra_entries(writer, &mut written, &mut summary)?;
        Ok(summary)
    }

    /// Fast copy through the central directory, for archives whose local
    /// headers cannot be streamed.
    fn copy_entries<R: Read + Seek, W: Write + Seek>(
        &mut self,
        archive: &mut ZipArchive<R>,
        writer: &mut ZipWriter<W>,
    ) -> Result<RewriteSummary, ArchiveError> {
        let mut summary = RewriteSummary::default();
        let mut written = HashSet::new();

        for index in 0..archive.len() {
            let file = archive.by_index(index)?;
            self.copy_entry(file, writer, &mut written, &mut summary)?;
        }

        self.write_extra_entries(writer, &mut written, &mut summary)?;
        Ok(summary)
    }

    fn copy_entry<R: Read, W: Write + Seek>(
        &mut self,
        mut file: ZipFile<'_, R>,
        writer: &mut ZipWriter<W>,
        written: &mut HashSet<String>,
        summary: &mut RewriteSummary,
    ) -> Result<(), ArchiveError> {
        let name = file.name().to_string();
        if !self.keep_entry(&name, file.is_dir(), summary) {
            return Ok(());
        }
        if !written.insert(name.clone()) {
            warn!("Duplicate zip entry {name} dropped");
            summary.duplicates.push(name);
            return Ok(());
        }

        match (self.classify)(&name) {
            EntryKind::Resource => {
                writer.raw_copy_file(file)?;
                summary.resources += 1;
            }
            EntryKind::Source => {
                let text = read_text(&mut file, &name)?;
                drop(file);
                let text = self.apply_entry_transform(&name, text)?;
                writer.start_file(name.as_str(), SimpleFileOptions::default())?;
                writer.write_all(text.as_bytes())?;
                summary.sources += 1;
            }
        }
        Ok(())
    }

    fn rewrite_in_memory<R: Read + Seek, W: Write + Seek>(
        &mut self,
        archive: &mut ZipArchive<R>,
        writer: &mut ZipWriter<W>,
    ) -> Result<RewriteSummary, ArchiveError> {
        let mut summary = RewriteSummary::default();
        let mut files = FileSet::new();

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let name = file.name().to_string();
            if !self.keep_entry(&name, file.is_dir(), &mut summary) {
                continue;
            }

            match (self.classify)(&name) {
                EntryKind::Resource => {
                    let mut bytes = Vec::new();
                    file.read_to_end(&mut bytes)?;
                    files.insert_resource(name, bytes);
                }
                EntryKind::Source => {
                    let text = read_text(&mut file, &name)?;
                    drop(file);
                    let text = self.apply_entry_transform(&name, text)?;
                    files.insert_source(name, text);
                }
            }
        }

        debug!("Read {} entries into memory", files.len());
        for stage in self.stages.iter_mut() {
            stage(&mut files).map_err(ArchiveError::Stage)?;
        }

        let mut written = HashSet::new();
        let (sources, resources) = files.into_parts();
        for (path, bytes) in resources {
            write_entry(writer, &path, &bytes)?;
            written.insert(path);
            summary.resources += 1;
        }
        for (path, text) in sources {
            write_entry(writer, &path, text.as_bytes())?;
            written.insert(path);
            summary.sources += 1;
        }

        self.write_extra_entries(writer, &mut written, &mut summary)?;
        Ok(summary)
    }

    fn keep_entry(&self, name: &str, is_dir: bool, summary: &mut RewriteSummary) -> bool {
        if is_metadata(name) {
            summary.skipped_metadata += 1;
            return false;
        }
        if is_dir {
            summary.skipped_directories += 1;
            return false;
        }
        true
    }

    fn apply_entry_transform(&mut self, name: &str, text: String) -> Result<String, ArchiveError> {
        match self.entry_transform.as_mut() {
            Some(transform) => transform(name, text).map_err(|source| ArchiveError::Transform {
                path: name.to_string(),
                source,
            }),
            None => Ok(text),
        }
    }

    fn write_extra_entries<W: Write + Seek>(
        &mut self,
        writer: &mut ZipWriter<W>,
        written: &mut HashSet<String>,
        summary: &mut RewriteSummary,
    ) -> Result<(), ArchiveError> {
        let Some(hook) = self.extra_entries.as_mut() else {
            return Ok(());
        };
        for (path, bytes) in hook().map_err(ArchiveError::ExtraEntries)? {
            if !written.insert(path.clone()) {
                debug!("Duplicate zip entry {path} dropped");
                summary.duplicates.push(path);
                continue;
            }
            write_entry(writer, &path, &bytes)?;
            summary.extra_entries += 1;
        }
        Ok(())
    }
}

/// Whether every local header carries its sizes, so the archive can be read
/// front to back. Leaves `input` where it started.
fn is_streamable<R: Read + Seek>(input: &mut R) -> Result<bool, ArchiveError> {
    let start = input.stream_position()?;
    let streamable = loop {
        match read_zipfile_from_stream(&mut *input) {
            // Dropping a streamed entry skips over its data.
            Ok(Some(_)) => continue,
            Ok(None) => break true,
            Err(ZipError::UnsupportedArchive(reason)) => {
                debug!("Archive is not streamable: {reason}");
                break false;
            }
            Err(e) => return Err(e.into()),
        }
    };
    input.seek(SeekFrom::Start(start))?;
    Ok(streamable)
}

fn write_entry<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    path: &str,
    bytes: &[u8],
) -> Result<(), ArchiveError> {
    writer.start_file(path, SimpleFileOptions::default())?;
    writer.write_all(bytes)?;
    Ok(())
}

pub(crate) fn read_text(reader: &mut impl Read, path: &str) -> Result<String, ArchiveError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| ArchiveError::NonUtf8Source {
        path: path.to_string(),
    })
}
