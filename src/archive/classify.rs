//! Entry classification by path.

use serde::Serialize;

/// Directory name whose entries are never carried into the output archive.
pub const METADATA_DIR: &str = "META-INF";

/// Extensions treated as text sources.
pub const SOURCE_EXTENSIONS: [&str; 4] = ["java", "scala", "groovy", "kt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Source,
    Resource,
}

/// Classify an archive path by the extension of its final segment.
pub fn classify(path: &str) -> EntryKind {
    if path.ends_with('/') {
        return EntryKind::Resource;
    }
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext)) if SOURCE_EXTENSIONS.contains(&ext) => EntryKind::Source,
        _ => EntryKind::Resource,
    }
}

/// Metadata entries are matched anywhere in the path, not just at the root.
pub fn is_metadata(path: &str) -> bool {
    path.contains(METADATA_DIR)
}
