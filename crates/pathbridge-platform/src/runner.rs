//! Command runner abstraction.
//!
//! This module defines the `CommandRunner` trait, the only contract between
//! the resolution engine and the processes it depends on. Tests substitute a
//! recording implementation; production code uses [`ShellRunner`].

use async_trait::async_trait;
use tracing::trace;

use crate::command::{Command, CommandOutput};
use crate::error::{Error, Result};
use crate::shell::Shell;

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command_line` to completion, blocking the calling thread.
    fn run(&self, command_line: &str) -> Result<CommandOutput>;

    /// Run `command_line` to completion without blocking the executor.
    async fn run_async(&self, command_line: &str) -> Result<CommandOutput>;

    /// The shell that parses command lines handed to this runner.
    fn shell(&self) -> Shell {
        Shell::host()
    }
}

/// Runs command lines through the host shell.
#[derive(Debug, Clone, Copy)]
pub struct ShellRunner {
    shell: Shell,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(Shell::host())
    }
}

impl ShellRunner {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }

    fn command(&self, command_line: &str) -> Result<Command> {
        if command_line.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }
        trace!(shell = ?self.shell, command_line, "spawning");
        Ok(Command::new(command_line).run_in_shell(self.shell))
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    fn run(&self, command_line: &str) -> Result<CommandOutput> {
        self.command(command_line)?.capture()
    }

    async fn run_async(&self, command_line: &str) -> Result<CommandOutput> {
        self.command(command_line)?.capture_async().await
    }

    fn shell(&self) -> Shell {
        self.shell
    }
}
