//! SRG id → name tables loaded from MCP-style CSV files.
//!
//! Each file has a header row followed by `id,name[,side[,doc]]` records.
//! Fields may be quoted, with `""` as an escaped quote. A blank doc column
//! means the symbol has no documentation.

use crate::remap::errors::RemapError;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Method,
    Field,
    Param,
}

impl SymbolKind {
    /// Kind of a generated token, by its prefix.
    pub fn of(token: &str) -> Option<Self> {
        if token.starts_with("func_") {
            Some(SymbolKind::Method)
        } else if token.starts_with("field_") {
            Some(SymbolKind::Field)
        } else if token.starts_with("p_") {
            Some(SymbolKind::Param)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    methods: HashMap<String, String>,
    fields: HashMap<String, String>,
    params: HashMap<String, String>,
    method_docs: HashMap<String, String>,
    field_docs: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the three mapping files.
    pub fn load(methods: &Path, fields: &Path, params: &Path) -> Result<Self, RemapError> {
        let mut table = Self::new();
        for (kind, path) in [
            (SymbolKind::Method, methods),
            (SymbolKind::Field, fields),
            (SymbolKind::Param, params),
        ] {
            let text = fs::read_to_string(path).map_err(|source| RemapError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            table.read_csv(kind, &path.display().to_string(), &text)?;
        }
        Ok(table)
    }

    /// Add every record of one mapping CSV. `origin` names the input in errors.
    pub fn read_csv(&mut self, kind: SymbolKind, origin: &str, text: &str) -> Result<usize, RemapError> {
        let records = parse_csv(text).map_err(|(line, message)| RemapError::Csv {
            origin: origin.to_string(),
            line,
            message,
        })?;

        let mut count = 0;
        for (line, record) in records.into_iter().skip(1) {
            let [id, name, ..] = record.as_slice() else {
                return Err(RemapError::Csv {
                    origin: origin.to_string(),
                    line,
                    message: format!("expected at least 2 columns, found {}", record.len()),
                });
            };
            self.insert(kind, id, name);
            if let Some(doc) = record.get(3).filter(|doc| !doc.trim().is_empty()) {
                self.insert_doc(kind, id, doc);
            }
            count += 1;
        }
        Ok(count)
    }

    pub fn insert(&mut self, kind: SymbolKind, id: impl Into<String>, name: impl Into<String>) {
        let map = match kind {
            SymbolKind::Method => &mut self.methods,
            SymbolKind::Field => &mut self.fields,
            SymbolKind::Param => &mut self.params,
        };
        map.insert(id.into(), name.into());
    }

    /// Record documentation. Parameters carry none, so those docs are dropped.
    pub fn insert_doc(&mut self, kind: SymbolKind, id: impl Into<String>, doc: impl Into<String>) {
        match kind {
            SymbolKind::Method => self.method_docs.insert(id.into(), doc.into()),
            SymbolKind::Field => self.field_docs.insert(id.into(), doc.into()),
            SymbolKind::Param => None,
        };
    }

    /// Mapped name of a generated token.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        let map = match SymbolKind::of(token)? {
            SymbolKind::Method => &self.methods,
            SymbolKind::Field => &self.fields,
            SymbolKind::Param => &self.params,
        };
        map.get(token).map(String::as_str)
    }

    pub fn method_doc(&self, id: &str) -> Option<&str> {
        self.method_docs.get(id).map(String::as_str)
    }

    pub fn field_doc(&self, id: &str) -> Option<&str> {
        self.field_docs.get(id).map(String::as_str)
    }

    pub fn len(&self, kind: SymbolKind) -> usize {
        match kind {
            SymbolKind::Method => self.methods.len(),
            SymbolKind::Field => self.fields.len(),
            SymbolKind::Param => self.params.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.fields.is_empty() && self.params.is_empty()
    }
}

/// Split CSV text into records, each tagged with the 1-based line it starts
/// on. Errors carry the line and a message.
fn parse_csv(text: &str) -> Result<Vec<(usize, Vec<String>)>, (usize, String)> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push((record_line, std::mem::take(&mut record)));
                }
                record.clear();
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err((record_line, "unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }
    Ok(records)
}
