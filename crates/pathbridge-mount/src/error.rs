//! Error types for mount inventory operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("mount inventory for '{instance}' could not run: {source}")]
    Spawn {
        instance: String,
        #[source]
        source: pathbridge_platform::Error,
    },

    #[error("mount inventory for '{instance}' failed: {message}")]
    Failed { instance: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
