use crate::remap::errors::RemapError;
use crate::remap::symbols::SymbolTable;
use regex::{Captures, Regex};

/// Generated method, field and parameter ids. Word characters and boundaries
/// are ASCII only.
pub const SRG_TOKEN_PATTERN: &str =
    r"func_[0-9]+_[a-zA-Z_]+|field_[0-9]+_[a-zA-Z_]+|p_(?-u:\w)+_[0-9]+_(?-u:\b)";

/// Rewrites generated ids in source lines to their mapped names.
#[derive(Debug)]
pub struct SymbolRemapper {
    table: SymbolTable,
    token: Regex,
}

impl SymbolRemapper {
    pub fn new(table: SymbolTable) -> Result<Self, RemapError> {
        Ok(Self {
            table,
            token: Regex::new(SRG_TOKEN_PATTERN)?,
        })
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Replace every known token in `line`. Unknown tokens are left as-is.
    pub fn rewrite_line(&self, line: &str) -> String {
        self.token
            .replace_all(line, |caps: &Captures<'_>| {
                let token = &caps[0];
                self.table.resolve(token).unwrap_or(token).to_string()
            })
            .into_owned()
    }
}
