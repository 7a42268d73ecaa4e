//! Host detection and process plumbing for pathbridge.
//!
//! Everything that touches the operating system lives here: which host we are
//! running on, which shell interprets a command line, and how a command line
//! is executed. The resolution engine only sees the [`CommandRunner`] seam.

pub use command::{Command, CommandOutput};
pub use error::{Error, Result};
pub use guest::GuestExecution;
pub use runner::{CommandRunner, ShellRunner};
pub use shell::Shell;

pub mod command;
mod error;
pub mod guest;
pub mod os;
mod runner;
pub mod shell;
