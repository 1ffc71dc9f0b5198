pub mod errors;
pub mod javadoc;
pub mod remapper;
pub mod symbols;

pub use errors::RemapError;
pub use javadoc::{build_javadoc, insert_above_annotations, wrap_text, JavadocInjector, JAVADOC_WIDTH};
pub use remapper::{SymbolRemapper, SRG_TOKEN_PATTERN};
pub use symbols::{SymbolKind, SymbolTable};
