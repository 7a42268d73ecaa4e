use crate::error::{Error, Result};
use crate::shell::Shell;
use std::ffi::OsStr;
use std::process::{Command as StdCommand, Output};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and error text.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[derive(Debug)]
pub struct Command {
    inner: StdCommand,
    program: String,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            inner: StdCommand::new(&program),
            program,
        }
    }

    /// Treat `program` as a whole command line and hand it to `shell`.
    pub fn run_in_shell(mut self, shell: Shell) -> Self {
        let script = self.program.clone();
        self.inner = StdCommand::new(shell.executable());
        self.inner.arg(shell.script_flag());

        #[cfg(target_os = "windows")]
        {
            // cmd.exe re-parses its tail itself; std quoting would corrupt it
            use std::os::windows::process::CommandExt;
            self.inner.raw_arg(&script);
        }
        #[cfg(not(target_os = "windows"))]
        self.inner.arg(&script);

        self
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.inner.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn capture(mut self) -> Result<CommandOutput> {
        self.inner
            .output()
            .map(CommandOutput::from)
            .map_err(|e| Error::CommandFailed {
                cmd: self.program.clone(),
                source: e,
            })
    }

    pub async fn capture_async(self) -> Result<CommandOutput> {
        let program = self.program;
        let mut inner = tokio::process::Command::from(self.inner);
        inner
            .output()
            .await
            .map(CommandOutput::from)
            .map_err(|e| Error::CommandFailed {
                cmd: program,
                source: e,
            })
    }
}
