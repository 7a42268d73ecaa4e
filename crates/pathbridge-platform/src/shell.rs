//! Shell selection for command lines.

use std::borrow::Cow;

/// Shells able to interpret a full command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Sh,
    Bash,
    Cmd,
    Powershell,
}

impl Shell {
    /// The shell that interprets command lines on the compiled-for host.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Shell::Cmd
        } else {
            Shell::Sh
        }
    }

    /// Get the executable name for a shell.
    pub fn executable(self) -> &'static str {
        match self {
            Shell::Sh => "sh",
            Shell::Bash => "bash",
            Shell::Cmd => "cmd.exe",
            Shell::Powershell => "powershell",
        }
    }

    /// Flag that makes the shell run the next argument as a script.
    pub fn script_flag(self) -> &'static str {
        match self {
            Shell::Sh | Shell::Bash => "-c",
            Shell::Cmd => "/C",
            Shell::Powershell => "-Command",
        }
    }

    /// Render `arg` as one literal word for this shell.
    ///
    /// Words made only of path-safe characters come back untouched. POSIX
    /// shells and PowerShell get a single-quoted word otherwise. `cmd` has no
    /// literal quoting, so its metacharacters are caret-escaped instead.
    pub fn quote(self, arg: &str) -> Cow<'_, str> {
        match self {
            Shell::Sh | Shell::Bash => {
                if !arg.is_empty() && arg.chars().all(is_posix_safe) {
                    Cow::Borrowed(arg)
                } else {
                    Cow::Owned(format!("'{}'", arg.replace('\'', "'\\''")))
                }
            }
            Shell::Powershell => {
                if !arg.is_empty() && arg.chars().all(is_powershell_safe) {
                    Cow::Borrowed(arg)
                } else {
                    Cow::Owned(format!("'{}'", arg.replace('\'', "''")))
                }
            }
            Shell::Cmd => {
                if !arg.contains(CMD_METACHARS) {
                    return Cow::Borrowed(arg);
                }
                let mut escaped = String::with_capacity(arg.len() + 4);
                for c in arg.chars() {
                    if CMD_METACHARS.contains(&c) {
                        escaped.push('^');
                    }
                    escaped.push(c);
                }
                Cow::Owned(escaped)
            }
        }
    }
}

const CMD_METACHARS: &[char] = &['^', '&', '|', '<', '>', '%', '"'];

pub(crate) fn is_posix_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | ',' | '+' | '@' | '%' | '=')
}

fn is_powershell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_executable() {
        assert_eq!(Shell::Sh.executable(), "sh");
        assert_eq!(Shell::Cmd.executable(), "cmd.exe");
    }

    #[test]
    fn test_shell_script_flag() {
        assert_eq!(Shell::Bash.script_flag(), "-c");
        assert_eq!(Shell::Cmd.script_flag(), "/C");
    }

    #[test]
    fn test_quote_leaves_plain_paths_alone() {
        assert_eq!(Shell::Sh.quote("/mnt/c"), "/mnt/c");
        assert_eq!(Shell::Cmd.quote("C:\\"), "C:\\");
        assert_eq!(Shell::Powershell.quote("C:\\Users"), "C:\\Users");
    }

    #[test]
    fn test_quote_posix_single_quotes_unsafe_words() {
        assert_eq!(Shell::Sh.quote("/home/bob/My Documents"), "'/home/bob/My Documents'");
        assert_eq!(Shell::Sh.quote("/tmp/$(touch x)"), "'/tmp/$(touch x)'");
        assert_eq!(Shell::Bash.quote("/it's"), "'/it'\\''s'");
        assert_eq!(Shell::Sh.quote("C:\\"), "'C:\\'");
        assert_eq!(Shell::Sh.quote(""), "''");
    }

    #[test]
    fn test_quote_powershell_doubles_single_quotes() {
        assert_eq!(Shell::Powershell.quote("/a b/it's"), "'/a b/it''s'");
    }

    #[test]
    fn test_quote_cmd_escapes_metachars() {
        assert_eq!(Shell::Cmd.quote("/a&b|c"), "/a^&b^|c");
        assert_eq!(Shell::Cmd.quote("%PATH%"), "^%PATH^%");
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_host_shell_is_sh() {
        assert_eq!(Shell::host(), Shell::Sh);
    }
}
