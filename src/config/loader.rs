use crate::config::schema::{RunConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Failure to turn a run config file into a validated [`RunConfig`].
///
/// `path` is `None` when the config came from a string.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    /// The config file this error came from, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    /// Attach the config file to an error raised while parsing its contents.
    fn located_at(mut self, file: &Path) -> Self {
        if let ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } = &mut self {
            path.get_or_insert_with(|| file.to_path_buf());
        }
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let problem = match self {
            ConfigError::Io { .. } => "cannot read rewrite config",
            ConfigError::Toml { .. } => "rewrite config is not valid TOML",
            ConfigError::Validation { .. } => "rewrite config is invalid",
        };
        match self.path() {
            Some(path) => write!(f, "{}: {problem}", path.display())?,
            None => f.write_str(problem)?,
        }
        match self {
            ConfigError::Io { source, .. } => write!(f, ": {source}"),
            ConfigError::Toml { source, .. } => write!(f, ": {source}"),
            ConfigError::Validation { source, .. } => write!(f, ": {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Parse and validate a run config. Relative paths are left as written.
pub fn load_from_str(input: &str) -> Result<RunConfig, ConfigError> {
    let config: RunConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

/// Load a run config file. Relative paths inside it resolve against the
/// file's directory.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RunConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = load_from_str(&contents).map_err(|error| error.located_at(path))?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}
