//! Integration tests for archive rewriting
//!
//! Archives are built on the fly with `zip::ZipWriter` in temp directories.

mod end_to_end;
mod patch_properties;
mod remap_archive;
mod support;
