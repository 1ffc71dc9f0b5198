//! In-memory view of an archive's contents.
//!
//! A [`FileSet`] is created at the start of a rewrite, handed by `&mut` to
//! each stage in turn, and consumed when the output archive is written.

use indexmap::IndexMap;

/// Insertion-ordered path → content store, split into text sources and
/// opaque resources.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSet {
    sources: IndexMap<String, String>,
    resources: IndexMap<String, Vec<u8>>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a source. Replacing keeps the original position.
    pub fn insert_source(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(path.into(), text.into());
    }

    /// Insert or replace a resource. Replacing keeps the original position.
    pub fn insert_resource(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.resources.insert(path.into(), bytes.into());
    }

    /// Remove a source, preserving the order of the remaining entries.
    pub fn remove_source(&mut self, path: &str) -> Option<String> {
        self.sources.shift_remove(path)
    }

    pub fn source(&self, path: &str) -> Option<&str> {
        self.sources.get(path).map(String::as_str)
    }

    pub fn resource(&self, path: &str) -> Option<&[u8]> {
        self.resources.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.sources.contains_key(path) || self.resources.contains_key(path)
    }

    pub fn sources(&self) -> &IndexMap<String, String> {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.sources
    }

    pub fn resources(&self) -> &IndexMap<String, Vec<u8>> {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.sources.len() + self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.resources.is_empty()
    }

    /// Split into `(sources, resources)` for serialization.
    pub fn into_parts(self) -> (IndexMap<String, String>, IndexMap<String, Vec<u8>>) {
        (self.sources, self.resources)
    }
}

/// Normalize a path to `/` separators.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
