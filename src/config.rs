use crate::error::GomakerError;
use crate::options::DEFAULT_OPTIONS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Looked up in the project directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "gomaker.toml";

/// Settings as read from `gomaker.toml` or the command line.
///
/// Every field is optional so that layers can be merged; see [`Config::merge`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: Option<String>,
    pub options: Option<String>,
    pub version: Option<String>,
    pub tags: Option<String>,
    pub ldflags: Option<String>,
    pub set: Vec<String>,
    pub backup: Option<bool>,
    pub no_clobber: Option<bool>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, GomakerError> {
        let content = fs::read_to_string(path).map_err(|source| GomakerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| GomakerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An explicit path must exist; the default file in `dir` is optional.
    pub fn discover(dir: &Path, explicit: Option<&Path>) -> Result<Self, GomakerError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "loading config");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Values set in `over` win. Substitutions from both layers are kept,
    /// `self`'s first.
    pub fn merge(self, over: Config) -> Config {
        let mut set = self.set;
        set.extend(over.set);
        Config {
            output: over.output.or(self.output),
            options: over.options.or(self.options),
            version: over.version.or(self.version),
            tags: over.tags.or(self.tags),
            ldflags: over.ldflags.or(self.ldflags),
            set,
            backup: over.backup.or(self.backup),
            no_clobber: over.no_clobber.or(self.no_clobber),
        }
    }

    pub fn into_settings(self) -> Settings {
        Settings {
            output: self.output.unwrap_or_else(|| "Makefile".to_string()),
            options: self.options.unwrap_or_else(|| DEFAULT_OPTIONS.to_string()),
            version: self.version.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            ldflags: self.ldflags.unwrap_or_default(),
            substitutions: self.set,
            backup: self.backup.unwrap_or(false),
            no_clobber: self.no_clobber.unwrap_or(false),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output: String,
    pub options: String,
    pub version: String,
    pub tags: String,
    pub ldflags: String,
    pub substitutions: Vec<String>,
    pub backup: bool,
    pub no_clobber: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().into_settings()
    }
}

/// Resolves the config file path the way `discover` would, for logging.
pub fn config_path(dir: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(dir.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
    }
}
