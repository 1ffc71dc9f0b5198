use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_STRIP: usize = 3;

/// One archive rewrite: where to read and write, and which stages to run.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub archive: ArchiveSection,
    #[serde(default)]
    pub remap: Option<RemapSection>,
    #[serde(default)]
    pub patch: Option<PatchSection>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSection {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemapSection {
    pub methods: PathBuf,
    pub fields: PathBuf,
    pub params: PathBuf,
    #[serde(default = "default_true")]
    pub javadocs: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PatchSection {
    /// Directory of `*.patch` files, or a zip/jar of them.
    pub patches: PathBuf,
    #[serde(default = "default_strip")]
    pub strip: usize,
    #[serde(default)]
    pub max_fuzz: usize,
    #[serde(default = "default_true")]
    pub make_rejects: bool,
    #[serde(default)]
    pub fail_on_error: bool,
    #[serde(default = "default_true")]
    pub access_c14n: bool,
    #[serde(default)]
    pub whitespace_c14n: bool,
    #[serde(default)]
    pub injects: Vec<PathBuf>,
}

impl PatchSection {
    /// Settings for `patches` with every other field at its default.
    pub fn new(patches: impl Into<PathBuf>) -> Self {
        Self {
            patches: patches.into(),
            strip: DEFAULT_STRIP,
            max_fuzz: 0,
            make_rejects: true,
            fail_on_error: false,
            access_c14n: true,
            whitespace_c14n: false,
            injects: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_strip() -> usize {
    DEFAULT_STRIP
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.archive.input.as_os_str().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "archive.input",
            });
        }
        if self.archive.output.as_os_str().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "archive.output",
            });
        }
        if !self.archive.input.as_os_str().is_empty() && self.archive.input == self.archive.output {
            issues.push(ValidationIssue::InvalidCombo {
                message: "archive.input and archive.output must differ".to_string(),
            });
        }
        if self.remap.is_none() && self.patch.is_none() {
            issues.push(ValidationIssue::NoStages);
        }

        if let Some(remap) = &self.remap {
            for (field, path) in [
                ("remap.methods", &remap.methods),
                ("remap.fields", &remap.fields),
                ("remap.params", &remap.params),
            ] {
                if path.as_os_str().is_empty() {
                    issues.push(ValidationIssue::MissingField { field });
                }
            }
        }

        if let Some(patch) = &self.patch {
            if patch.patches.as_os_str().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: "patch.patches",
                });
            }
            if patch
                .injects
                .iter()
                .any(|inject| inject.as_os_str().is_empty())
            {
                issues.push(ValidationIssue::InvalidCombo {
                    message: "patch.injects contains an empty path".to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Make every relative path relative to `base` instead of the working
    /// directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() && !path.as_os_str().is_empty() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.archive.input);
        resolve(&mut self.archive.output);
        if let Some(remap) = &mut self.remap {
            resolve(&mut remap.methods);
            resolve(&mut remap.fields);
            resolve(&mut remap.params);
        }
        if let Some(patch) = &mut self.patch {
            resolve(&mut patch.patches);
            patch.injects.iter_mut().for_each(resolve);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NoStages,
    MissingField { field: &'static str },
    InvalidCombo { message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NoStages => {
                write!(f, "run config has neither a [remap] nor a [patch] section")
            }
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { message } => {
                write!(f, "invalid run configuration: {message}")
            }
        }
    }
}
