//! Unified diff parsing.
//!
//! A patch document holds one or more file sections, each introduced by a
//! `---`/`+++` header pair and followed by `@@` hunks. Hunk bodies are read
//! by the counts in their header, so removed lines that happen to start with
//! `--` are never mistaken for a new file header. Lines outside file sections
//! (`diff ...`, `Index:`, separators) are ignored.

use crate::patch::errors::ParseError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum HunkLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl HunkLine {
    pub fn text(&self) -> &str {
        match self {
            HunkLine::Context(text) | HunkLine::Removed(text) | HunkLine::Added(text) => text,
        }
    }

    pub fn prefix(&self) -> char {
        match self {
            HunkLine::Context(_) => ' ',
            HunkLine::Removed(_) => '-',
            HunkLine::Added(_) => '+',
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, HunkLine::Context(_))
    }

    /// The line as it appears in a patch body.
    pub fn to_patch_line(&self) -> String {
        format!("{}{}", self.prefix(), self.text())
    }
}

/// One contiguous change block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    /// 1-based position within its file section.
    pub id: usize,
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Expected 1-based start line in the target.
    pub fn header_line(&self) -> usize {
        self.old_start
    }

    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_len, self.new_start, self.new_len
        )
    }

    /// Lines the target must contain: context and removed lines in order.
    pub fn old_block(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| !matches!(l, HunkLine::Added(_)))
            .map(HunkLine::text)
            .collect()
    }

    /// Lines the target contains afterwards: context and added lines in order.
    pub fn new_block(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| !matches!(l, HunkLine::Removed(_)))
            .map(HunkLine::text)
            .collect()
    }

    pub fn context_before(&self) -> Vec<&str> {
        self.lines
            .iter()
            .take_while(|l| !l.is_change())
            .map(HunkLine::text)
            .collect()
    }

    pub fn context_after(&self) -> Vec<&str> {
        let trailing = self.lines.iter().rev().take_while(|l| !l.is_change()).count();
        if trailing == self.lines.len() {
            // No change lines at all: everything is leading context.
            return Vec::new();
        }
        self.lines[self.lines.len() - trailing..]
            .iter()
            .map(HunkLine::text)
            .collect()
    }

    pub fn removed_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Removed(_)))
            .map(HunkLine::text)
            .collect()
    }

    pub fn added_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Added(_)))
            .map(HunkLine::text)
            .collect()
    }

    /// Header followed by the body, one entry per line.
    pub fn to_patch_lines(&self) -> Vec<String> {
        std::iter::once(self.header())
            .chain(self.lines.iter().map(HunkLine::to_patch_line))
            .collect()
    }
}

/// The hunks for one target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patch {
    /// Path from the `---` header; `None` for `/dev/null`.
    pub old_path: Option<String>,
    /// Path from the `+++` header; `None` for `/dev/null`.
    pub new_path: Option<String>,
    pub hunks: Vec<Hunk>,
}

impl Patch {
    /// Raw (unstripped) target path: the old path, or the new path for creations.
    pub fn target(&self) -> &str {
        self.old_path
            .as_deref()
            .or(self.new_path.as_deref())
            .unwrap_or_default()
    }

    pub fn is_creation(&self) -> bool {
        self.old_path.is_none()
    }

    pub fn is_deletion(&self) -> bool {
        self.new_path.is_none()
    }
}

/// Parse a patch document into its file sections.
pub fn parse_patch(text: &str) -> Result<Vec<Patch>, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut patches = Vec::new();
    let mut current: Option<Patch> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let (Some(old), Some(new)) = (
            line.strip_prefix("--- "),
            lines.get(i + 1).and_then(|next| next.strip_prefix("+++ ")),
        ) {
            if let Some(done) = current.take() {
                if !done.hunks.is_empty() {
                    patches.push(done);
                }
            }
            current = Some(Patch {
                old_path: header_path(old),
                new_path: header_path(new),
                hunks: Vec::new(),
            });
            i += 2;
            continue;
        }

        if line.starts_with("@@") {
            let patch = current
                .as_mut()
                .ok_or(ParseError::MissingFileHeader { line: i + 1 })?;
            let (hunk, consumed) = parse_hunk(&lines[i..], i + 1, patch.hunks.len() + 1)?;
            patch.hunks.push(hunk);
            i += consumed;
            continue;
        }

        i += 1;
    }

    if let Some(done) = current {
        if !done.hunks.is_empty() {
            patches.push(done);
        }
    }
    Ok(patches)
}

/// Parse one hunk starting at its `@@` header. Returns the hunk and the
/// number of lines consumed. `line_no` is the 1-based line of the header.
pub(crate) fn parse_hunk(
    lines: &[&str],
    line_no: usize,
    id: usize,
) -> Result<(Hunk, usize), ParseError> {
    let header = lines.first().copied().unwrap_or_default();
    let (old_start, old_len, new_start, new_len) =
        parse_hunk_header(header).ok_or_else(|| ParseError::MalformedHunkHeader {
            line: line_no,
            text: header.to_string(),
        })?;

    let mut body = Vec::new();
    let (mut old_seen, mut new_seen) = (0, 0);
    let mut i = 1;

    while old_seen < old_len || new_seen < new_len {
        let line = *lines
            .get(i)
            .ok_or(ParseError::TruncatedHunk { line: line_no + i })?;
        let parsed = match line.chars().next() {
            // Some editors strip the single space from blank context lines.
            None => HunkLine::Context(String::new()),
            Some(' ') => HunkLine::Context(line[1..].to_string()),
            Some('-') => HunkLine::Removed(line[1..].to_string()),
            Some('+') => HunkLine::Added(line[1..].to_string()),
            Some('\\') => {
                i += 1;
                continue;
            }
            Some(_) => {
                return Err(ParseError::UnexpectedLine {
                    line: line_no + i,
                    text: line.to_string(),
                })
            }
        };
        match parsed {
            HunkLine::Context(_) => {
                old_seen += 1;
                new_seen += 1;
            }
            HunkLine::Removed(_) => old_seen += 1,
            HunkLine::Added(_) => new_seen += 1,
        }
        if old_seen > old_len || new_seen > new_len {
            return Err(ParseError::UnexpectedLine {
                line: line_no + i,
                text: line.to_string(),
            });
        }
        body.push(parsed);
        i += 1;
    }

    while lines.get(i).is_some_and(|l| l.starts_with('\\')) {
        i += 1;
    }

    Ok((
        Hunk {
            id,
            old_start,
            old_len,
            new_start,
            new_len,
            lines: body,
        },
        i,
    ))
}

/// Parse `@@ -a[,b] +c[,d] @@ ...` into `(a, b, c, d)`; omitted counts are 1.
pub fn parse_hunk_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = line.strip_prefix("@@ ")?;
    let end = rest.find(" @@")?;
    let mut ranges = rest[..end].split_whitespace();
    let (old_start, old_len) = parse_range(ranges.next()?.strip_prefix('-')?)?;
    let (new_start, new_len) = parse_range(ranges.next()?.strip_prefix('+')?)?;
    Some((old_start, old_len, new_start, new_len))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Path from a `---`/`+++` header, without any trailing tab and timestamp.
fn header_path(raw: &str) -> Option<String> {
    let path = raw.split('\t').next().unwrap_or(raw).trim_end();
    if path == "/dev/null" {
        None
    } else {
        Some(path.to_string())
    }
}
