use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("empty command line")]
    EmptyCommand,

    #[error("unknown guest execution mode: {0}")]
    UnknownGuestExecution(String),

    #[error("command failed: {cmd}, source: {source}")]
    CommandFailed { cmd: String, source: std::io::Error },
}
