//! Configuration errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validation::ValidationError;

/// File operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Reading a config file.
    Read,
    /// Writing a config file.
    Write,
    /// Creating the directory a config file goes in.
    CreateDir,
}

impl core::fmt::Display for FileAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::CreateDir => "create directory",
        })
    }
}

/// Errors from loading, saving, or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file or directory operation failed.
    #[error("cannot {action} '{}': {source}", path.display())]
    File {
        /// What was being attempted.
        action: FileAction,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be encoded.
    #[error("cannot encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    /// Values parsed but are not usable.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

impl ConfigError {
    /// Adapter for `map_err` on a file operation at `path`.
    pub(crate) fn file(action: FileAction, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::File {
            action,
            path,
            source,
        }
    }

    /// True if the error is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::File { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
