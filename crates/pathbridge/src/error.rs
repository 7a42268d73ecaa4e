//! Error types for path resolution.

use thiserror::Error;

use crate::path::PathKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid path '{path}': expected an absolute {expected} path")]
    InvalidPath { path: String, expected: PathKind },

    #[error("failed to list mount points for '{instance}': {source}")]
    MountInventory {
        instance: String,
        #[source]
        source: pathbridge_mount::Error,
    },

    #[error("resolver process failed ({command}): {message}")]
    ResolverProcess { command: String, message: String },
}

impl Error {
    pub(crate) fn invalid_path(path: &str, expected: PathKind) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            expected,
        }
    }

    pub(crate) fn mount_inventory(instance: &str, source: pathbridge_mount::Error) -> Self {
        Error::MountInventory {
            instance: instance.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
