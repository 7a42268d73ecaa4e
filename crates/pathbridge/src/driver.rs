//! Resolver driver: cache first, external resolver on a miss.
//!
//! A call either ends at the cache (`Built -> CacheHit -> Done`) or invokes
//! the resolver exactly once (`Built -> CacheMiss -> Invoking -> Done |
//! Failed`). The blocking and async entry points share everything but the
//! process wait, so both produce the same paths and the same cache writes.

use pathbridge_platform::{CommandOutput, CommandRunner, GuestExecution, guest};
use tracing::{debug, warn};

use crate::context::ResolutionContext;
use crate::error::{Error, Result};
use crate::path::{PathKind, join_path, strip_trailing_separator};

/// The per-path resolver inside the guest.
pub const RESOLVER_UTIL: &str = "wslpath";

/// Flag asking the resolver for the Windows form of a POSIX path.
pub const REVERSE_FLAG: &str = "-w";

pub struct ResolverDriver<'a> {
    runner: &'a dyn CommandRunner,
    guest: GuestExecution,
}

impl<'a> ResolverDriver<'a> {
    pub fn new(runner: &'a dyn CommandRunner, guest: GuestExecution) -> Self {
        Self { runner, guest }
    }

    /// The command line that resolves `ctx`'s base.
    ///
    /// The base is quoted for every shell that parses the line, so it always
    /// reaches the resolver as a single literal argument.
    pub fn command_line(&self, ctx: &ResolutionContext<'_>) -> String {
        let flag = match ctx.kind() {
            PathKind::Posix => REVERSE_FLAG,
            PathKind::Windows => "",
        };
        let host = self.runner.shell();

        if self.guest.crosses_into_guest() {
            guest::forward(
                ctx.resolver_instance(),
                RESOLVER_UTIL,
                &[flag, ctx.base_path()],
                host,
            )
        } else {
            format!("{} {} {}", RESOLVER_UTIL, flag, host.quote(ctx.base_path()))
        }
    }

    pub fn resolve(&self, ctx: &ResolutionContext<'_>) -> Result<String> {
        if let Some(hit) = self.cached(ctx) {
            return Ok(hit);
        }
        let command_line = self.command_line(ctx);
        debug!(%command_line, "invoking resolver");
        let output = self.runner.run(&command_line);
        self.complete(ctx, command_line, output)
    }

    pub async fn resolve_async(&self, ctx: &ResolutionContext<'_>) -> Result<String> {
        if let Some(hit) = self.cached(ctx) {
            return Ok(hit);
        }
        let command_line = self.command_line(ctx);
        debug!(%command_line, "invoking resolver");
        let output = self.runner.run_async(&command_line).await;
        self.complete(ctx, command_line, output)
    }

    fn cached(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        let hit = ctx.cache().lookup(ctx);
        match &hit {
            Some(path) => debug!(base = ctx.base_path(), %path, "cache hit"),
            None => debug!(base = ctx.base_path(), "cache miss"),
        }
        hit
    }

    fn complete(
        &self,
        ctx: &ResolutionContext<'_>,
        command_line: String,
        output: pathbridge_platform::Result<CommandOutput>,
    ) -> Result<String> {
        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return Err(Error::ResolverProcess {
                    command: command_line,
                    message: e.to_string(),
                });
            }
        };

        let resolved = strip_trailing_separator(output.stdout.trim());
        let stderr = output.stderr.trim();
        if !output.success || resolved.is_empty() {
            let message = match (stderr.is_empty(), output.success) {
                (false, _) => stderr.to_string(),
                (true, false) => format!("exited with code {:?}", output.exit_code),
                (true, true) => "resolver printed nothing".to_string(),
            };
            warn!(%command_line, %message, "resolver failed");
            return Err(Error::ResolverProcess {
                command: command_line,
                message,
            });
        }

        ctx.cache().store(ctx, resolved);
        Ok(join_path(resolved, ctx.rest_of_path(), ctx.kind().opposite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BasePathCache;
    use crate::options::ResolveOptions;
    use async_trait::async_trait;
    use pathbridge_mount::MountPoint;
    use pathbridge_platform::Shell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct ScriptedRunner {
        output: CommandOutput,
        calls: AtomicUsize,
        lines: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(output: CommandOutput) -> Self {
            Self {
                output,
                calls: AtomicUsize::new(0),
                lines: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, command_line: &str) -> pathbridge_platform::Result<CommandOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.lines.lock().unwrap().push(command_line.to_string());
            Ok(self.output.clone())
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        fn run(&self, command_line: &str) -> pathbridge_platform::Result<CommandOutput> {
            self.record(command_line)
        }

        async fn run_async(&self, command_line: &str) -> pathbridge_platform::Result<CommandOutput> {
            self.record(command_line)
        }

        fn shell(&self) -> Shell {
            Shell::Sh
        }
    }

    fn options(instance: &str) -> ResolveOptions {
        ResolveOptions::new()
            .cache(Arc::new(BasePathCache::new()))
            .resolver_instance(instance)
            .mount_points(vec![MountPoint::drive("/mnt/c", "C:\\")])
    }

    #[test]
    fn test_command_line_in_guest_escapes_backslashes() {
        let runner = ScriptedRunner::new(CommandOutput::success("/mnt/c"));
        let opts = options("wsl");
        let ctx = ResolutionContext::windows("C:\\Users", &opts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Always);

        assert_eq!(driver.command_line(&ctx), "wsl wslpath  C:\\\\");
    }

    #[test]
    fn test_command_line_custom_instance() {
        let runner = ScriptedRunner::new(CommandOutput::success("/mnt/c"));
        let opts = options("ubuntu run");
        let ctx = ResolutionContext::windows("C:\\Users", &opts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Always);

        assert_eq!(driver.command_line(&ctx), "ubuntu run wslpath  C:\\\\");
    }

    #[test]
    fn test_command_line_inside_guest_uses_reverse_flag() {
        let runner = ScriptedRunner::new(CommandOutput::success("C:\\"));
        let opts = options("wsl");
        let mounts = opts.get_mount_points().unwrap();
        let ctx = ResolutionContext::posix("/mnt/c/Users", &opts, &mounts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        assert_eq!(driver.command_line(&ctx), "wslpath -w /mnt/c");
    }

    #[test]
    fn test_command_line_quotes_base_with_spaces() {
        let runner = ScriptedRunner::new(CommandOutput::success("C:\\"));
        let opts = options("wsl");
        let mounts = opts.get_mount_points().unwrap();
        let ctx =
            ResolutionContext::posix("/home/bob/My Documents/notes.txt", &opts, &mounts).unwrap();

        let inside = ResolverDriver::new(&runner, GuestExecution::Never);
        assert_eq!(inside.command_line(&ctx), "wslpath -w '/home/bob/My Documents'");

        let from_host = ResolverDriver::new(&runner, GuestExecution::Always);
        assert_eq!(
            from_host.command_line(&ctx),
            "wsl wslpath -w '/home/bob/My Documents'"
        );
    }

    #[test]
    fn test_command_line_keeps_substitution_literal() {
        let runner = ScriptedRunner::new(CommandOutput::success("C:\\"));
        let opts = options("wsl");
        let mounts = opts.get_mount_points().unwrap();
        let ctx = ResolutionContext::posix("/tmp/$(touch /tmp/owned)/x", &opts, &mounts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        assert_eq!(driver.command_line(&ctx), "wslpath -w '/tmp/$(touch /tmp/owned)'");
    }

    #[test]
    fn test_command_line_inside_guest_quotes_drive() {
        let runner = ScriptedRunner::new(CommandOutput::success("/mnt/c"));
        let opts = options("wsl");
        let ctx = ResolutionContext::windows("C:\\Users", &opts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        assert_eq!(driver.command_line(&ctx), "wslpath  'C:\\'");
    }

    #[test]
    fn test_resolve_trims_output_and_joins() {
        let runner = ScriptedRunner::new(CommandOutput::success("/mnt/c   \n"));
        let opts = options("wsl");
        let ctx = ResolutionContext::windows("C:\\Users\\Test", &opts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        assert_eq!(driver.resolve(&ctx).unwrap(), "/mnt/c/Users/Test");
    }

    #[test]
    fn test_resolve_strips_trailing_separator_before_caching() {
        let runner = ScriptedRunner::new(CommandOutput::success("/mnt/c/\n"));
        let opts = options("wsl");
        let ctx = ResolutionContext::windows("C:\\Users", &opts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        assert_eq!(driver.resolve(&ctx).unwrap(), "/mnt/c/Users");
        assert_eq!(opts.get_cache().get("wsl", "/mnt/c").as_deref(), Some("C:\\"));
        assert_eq!(opts.get_cache().get("wsl", "C:\\").as_deref(), Some("/mnt/c"));
    }

    #[test]
    fn test_resolve_serves_second_call_from_cache() {
        let runner = ScriptedRunner::new(CommandOutput::success("/mnt/c"));
        let opts = options("wsl");
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        let first = ResolutionContext::windows("C:\\Users", &opts).unwrap();
        let second = ResolutionContext::windows("C:\\Test", &opts).unwrap();
        assert_eq!(driver.resolve(&first).unwrap(), "/mnt/c/Users");
        assert_eq!(driver.resolve(&second).unwrap(), "/mnt/c/Test");
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolve_surfaces_stderr_verbatim() {
        let runner = ScriptedRunner::new(CommandOutput {
            success: true,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: "wslpath: Z:\\: No such file or directory\n".to_string(),
        });
        let opts = options("wsl");
        let ctx = ResolutionContext::windows("Z:\\foo", &opts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        match driver.resolve(&ctx).unwrap_err() {
            Error::ResolverProcess { message, .. } => {
                assert_eq!(message, "wslpath: Z:\\: No such file or directory");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(opts.get_cache().is_empty());
    }

    #[test]
    fn test_resolve_reports_nonzero_exit() {
        let runner = ScriptedRunner::new(CommandOutput::failure(1, ""));
        let opts = options("wsl");
        let ctx = ResolutionContext::windows("C:\\Users", &opts).unwrap();
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        let err = driver.resolve(&ctx).unwrap_err();
        assert!(err.to_string().contains("exited with code Some(1)"));
        assert!(opts.get_cache().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_async_matches_blocking() {
        let runner = ScriptedRunner::new(CommandOutput::success("C:\\ "));
        let blocking_opts = options("wsl");
        let async_opts = options("wsl");
        let driver = ResolverDriver::new(&runner, GuestExecution::Never);

        let mounts = blocking_opts.get_mount_points().unwrap();
        let blocking_ctx = ResolutionContext::posix("/mnt/c/Users/Test", &blocking_opts, &mounts).unwrap();
        let async_ctx = ResolutionContext::posix("/mnt/c/Users/Test", &async_opts, &mounts).unwrap();

        let blocking = driver.resolve(&blocking_ctx).unwrap();
        let non_blocking = driver.resolve_async(&async_ctx).await.unwrap();
        assert_eq!(blocking, "C:\\Users\\Test");
        assert_eq!(blocking, non_blocking);
        assert_eq!(blocking_opts.get_cache().len(), async_opts.get_cache().len());
    }
}
