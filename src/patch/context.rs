//! Target line access for the patch engine.
//!
//! [`ContextProvider`] maps a patch's target path to a source in the
//! [`FileSet`] after stripping leading path segments, and hands the engine a
//! [`LineBuffer`] to edit. Buffers remember the file's newline style and
//! whether it ended with a newline so unchanged text round-trips exactly.

use crate::fileset::{normalize_path, FileSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    newline: &'static str,
    trailing_newline: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            newline: "\n",
            trailing_newline: true,
        }
    }
}

impl LineBuffer {
    /// An empty buffer for a file that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut newline = None;
        let mut rest = text;

        while let Some(pos) = rest.find(['\r', '\n']) {
            lines.push(rest[..pos].to_string());
            let ending = if rest[pos..].starts_with("\r\n") {
                "\r\n"
            } else if rest.as_bytes()[pos] == b'\r' {
                "\r"
            } else {
                "\n"
            };
            newline.get_or_insert(ending);
            rest = &rest[pos + ending.len()..];
        }

        let trailing_newline = rest.is_empty() && !lines.is_empty();
        if !rest.is_empty() {
            lines.push(rest.to_string());
        }

        Self {
            lines,
            newline: newline.unwrap_or("\n"),
            trailing_newline,
        }
    }

    pub fn to_text(&self) -> String {
        let mut text = self.lines.join(self.newline);
        if self.trailing_newline && !self.lines.is_empty() {
            text.push_str(self.newline);
        }
        text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn newline(&self) -> &'static str {
        self.newline
    }

    /// Replace every line, keeping the newline style.
    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    /// Replace `remove` lines at `at` with `insert`.
    pub fn splice<I>(&mut self, at: usize, remove: usize, insert: I)
    where
        I: IntoIterator<Item = String>,
    {
        let at = at.min(self.lines.len());
        let end = (at + remove).min(self.lines.len());
        self.lines.splice(at..end, insert);
    }
}

/// Remove up to `depth` leading segments from a patch path. The final
/// segment (the file name) is never removed.
pub fn strip_path(target: &str, depth: usize) -> String {
    let normalized = normalize_path(target);
    let segments: Vec<&str> = normalized.split('/').collect();
    let skip = depth.min(segments.len().saturating_sub(1));
    segments[skip..].join("/")
}

pub struct ContextProvider<'a> {
    files: &'a mut FileSet,
    strip: usize,
}

impl<'a> ContextProvider<'a> {
    pub fn new(files: &'a mut FileSet, strip: usize) -> Self {
        Self { files, strip }
    }

    /// Archive path a patch target resolves to.
    pub fn resolve(&self, target: &str) -> String {
        strip_path(target, self.strip)
    }

    /// Current lines of a resolved path, or `None` when no source exists there.
    pub fn load(&self, path: &str) -> Option<LineBuffer> {
        self.files.source(path).map(LineBuffer::from_text)
    }

    pub fn store(&mut self, path: &str, buffer: &LineBuffer) {
        self.files.insert_source(path, buffer.to_text());
    }

    pub fn remove(&mut self, path: &str) {
        self.files.remove_source(path);
    }

    pub fn files(&self) -> &FileSet {
        self.files
    }
}
