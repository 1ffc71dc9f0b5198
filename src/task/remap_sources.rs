//! The remap stage: a per-entry transform that renames generated ids and
//! adds documentation comments as each source is read.

use crate::config::RemapSection;
use crate::patch::LineBuffer;
use crate::remap::{JavadocInjector, RemapError, SymbolRemapper, SymbolTable, SymbolKind};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapOptions {
    pub methods: PathBuf,
    pub fields: PathBuf,
    pub params: PathBuf,
    pub javadocs: bool,
}

impl From<&RemapSection> for RemapOptions {
    fn from(section: &RemapSection) -> Self {
        Self {
            methods: section.methods.clone(),
            fields: section.fields.clone(),
            params: section.params.clone(),
            javadocs: section.javadocs,
        }
    }
}

#[derive(Debug)]
pub struct RemapSources {
    remapper: SymbolRemapper,
    injector: Option<JavadocInjector>,
}

impl RemapSources {
    pub fn load(options: &RemapOptions) -> Result<Self, RemapError> {
        let table = SymbolTable::load(&options.methods, &options.fields, &options.params)?;
        info!(
            "Loaded {} methods, {} fields, {} params",
            table.len(SymbolKind::Method),
            table.len(SymbolKind::Field),
            table.len(SymbolKind::Param)
        );
        Self::new(table, options.javadocs)
    }

    pub fn new(table: SymbolTable, javadocs: bool) -> Result<Self, RemapError> {
        Ok(Self {
            remapper: SymbolRemapper::new(table)?,
            injector: if javadocs {
                Some(JavadocInjector::new()?)
            } else {
                None
            },
        })
    }

    /// Rewrite one source. Comments are looked up by the original ids, so
    /// each line is checked for a declaration before it is renamed. Line
    /// endings are preserved.
    pub fn rewrite(&self, text: &str) -> String {
        let mut buffer = LineBuffer::from_text(text);
        let table = self.remapper.table();
        let mut out = Vec::with_capacity(buffer.len());

        for line in buffer.lines() {
            if let Some(injector) = &self.injector {
                injector.maybe_insert_doc(
                    &mut out,
                    line,
                    |id| table.method_doc(id),
                    |id| table.field_doc(id),
                );
            }
            out.push(self.remapper.rewrite_line(line));
        }

        buffer.set_lines(out);
        buffer.to_text()
    }
}
