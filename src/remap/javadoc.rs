//! Documentation comments for remapped declarations.
//!
//! Declarations are found with line patterns only. A method declaration is
//! an indented line with optional modifiers, optional generic parameters, a
//! return type and a `func_` name followed by `(`. A field declaration is
//! the same shape with a `field_` name followed by `=` or `;`. Lines whose
//! text after the indent starts with `return` are never declarations.

use crate::remap::errors::RemapError;
use regex::{Captures, Regex};

/// Column limit for generated comments.
pub const JAVADOC_WIDTH: usize = 120;

// Word and space classes are ASCII only.
const METHOD_DECLARATION: &str = r"^(?P<indent>(?: {4})+|\t+)(?:(?-u:\w)+(?-u:\s)+)*(?P<generic><(?s:.)*>(?-u:\s)+)?(?P<return>(?-u:\w)+[0-9A-Za-z_$.]*(?:<(?s:.)*>)?[\[\]]*)(?-u:\s)+(?P<name>func_[0-9]+_[a-zA-Z_]+)\(";

const FIELD_DECLARATION: &str = r"^(?P<indent>(?: {4})+|\t+)(?:(?-u:\w)+(?-u:\s)+)*(?:(?-u:\w)+[0-9A-Za-z_$.]*(?:<(?s:.)*>)?[\[\]]*)(?-u:\s)+(?P<name>field_[0-9]+_[a-zA-Z_]+) *(?:=|;)";

#[derive(Debug)]
pub struct JavadocInjector {
    method: Regex,
    field: Regex,
}

impl JavadocInjector {
    pub fn new() -> Result<Self, RemapError> {
        Ok(Self {
            method: Regex::new(METHOD_DECLARATION)?,
            field: Regex::new(FIELD_DECLARATION)?,
        })
    }

    /// If `line` declares a documented method or field, insert its comment
    /// at the end of `lines`, above any trailing annotations. `line` itself
    /// is not yet in `lines`. Returns whether a comment was inserted.
    ///
    /// The method pattern is tried first; a line that matches it is never
    /// checked as a field, even when the method has no doc.
    pub fn maybe_insert_doc<'d, M, F>(
        &self,
        lines: &mut Vec<String>,
        line: &str,
        method_docs: M,
        field_docs: F,
    ) -> bool
    where
        M: Fn(&str) -> Option<&'d str>,
        F: Fn(&str) -> Option<&'d str>,
    {
        if let Some(caps) = declaration(&self.method, line) {
            return insert_doc(lines, &caps, method_docs, true);
        }
        if let Some(caps) = declaration(&self.field, line) {
            return insert_doc(lines, &caps, field_docs, false);
        }
        false
    }
}

fn declaration<'l>(pattern: &Regex, line: &'l str) -> Option<Captures<'l>> {
    let caps = pattern.captures(line)?;
    let indent_end = caps.name("indent")?.end();
    if line[indent_end..].starts_with("return") {
        return None;
    }
    Some(caps)
}

fn insert_doc<'d, D>(lines: &mut Vec<String>, caps: &Captures<'_>, docs: D, is_method: bool) -> bool
where
    D: Fn(&str) -> Option<&'d str>,
{
    let (Some(indent), Some(name)) = (caps.name("indent"), caps.name("name")) else {
        return false;
    };
    match docs(name.as_str()).filter(|doc| !doc.is_empty()) {
        Some(doc) => {
            insert_above_annotations(lines, build_javadoc(indent.as_str(), doc, is_method));
            true
        }
        None => false,
    }
}

/// Insert `doc` at the end of `lines`, but before any run of annotation
/// lines already there.
pub fn insert_above_annotations(lines: &mut Vec<String>, doc: Vec<String>) {
    let annotations = lines
        .iter()
        .rev()
        .take_while(|line| line.trim().starts_with('@'))
        .count();
    let at = lines.len() - annotations;
    lines.splice(at..at, doc);
}

/// Format `doc` as a comment at `indent`. The literal two characters `\n`
/// in `doc` separate paragraphs; each paragraph is wrapped so that comment
/// lines fit in [`JAVADOC_WIDTH`] columns.
///
/// Methods always get the multi-line form. Fields get `/** doc */` when the
/// text fits on one line.
pub fn build_javadoc(indent: &str, doc: &str, is_method: bool) -> Vec<String> {
    let width = JAVADOC_WIDTH as isize - (indent.chars().count() as isize + 3);
    let wrapped: Vec<String> = doc
        .split("\\n")
        .flat_map(|paragraph| wrap_text(Some(paragraph), width))
        .collect();

    if wrapped.len() > 1 || is_method {
        let mut comment = Vec::with_capacity(wrapped.len() + 2);
        comment.push(format!("{indent}/**"));
        for line in &wrapped {
            comment.push(format!("{indent} * {line}").trim_end().to_string());
        }
        comment.push(format!("{indent} */"));
        comment
    } else {
        vec![format!("{indent}/** {doc} */")]
    }
}

/// Greedy word wrap. Lines break after a space, comma or hyphen; a trailing
/// space does not count toward the width. Output lines are trimmed.
///
/// `None` wraps to nothing. A non-positive width, or text that already fits,
/// returns the text unchanged.
pub fn wrap_text(text: Option<&str>, width: isize) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };
    let width = match usize::try_from(width) {
        Ok(width) if width > 0 && text.chars().count() > width => width,
        _ => return vec![text.to_string()],
    };

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut word = String::new();
    let (mut line_len, mut word_len) = (0, 0);

    for c in text.chars() {
        word.push(c);
        word_len += 1;
        if matches!(c, ' ' | ',' | '-') {
            let trailing = usize::from(c == ' ');
            if line_len + word_len - trailing > width && line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            line.push_str(&word);
            line_len += word_len;
            word.clear();
            word_len = 0;
        }
    }

    if word_len > 0 {
        if line_len + word_len > width && line_len > 0 {
            lines.push(std::mem::take(&mut line));
        }
        line.push_str(&word);
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
