//! Deciding whether a command must be forwarded into the guest.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::os;
use crate::shell::{Shell, is_posix_safe};

/// Whether command lines are forwarded through the guest invocation command.
///
/// `Auto` forwards only when the process runs on a Windows host. The other two
/// variants pin the decision, which tests use to exercise both code paths on
/// any machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuestExecution {
    #[default]
    Auto,
    Always,
    Never,
}

impl GuestExecution {
    /// Map the tri-state override (`None` = autodetect) onto a mode.
    pub fn from_override(force: Option<bool>) -> Self {
        match force {
            None => GuestExecution::Auto,
            Some(true) => GuestExecution::Always,
            Some(false) => GuestExecution::Never,
        }
    }

    pub fn crosses_into_guest(self) -> bool {
        match self {
            GuestExecution::Auto => os::is_windows_host(),
            GuestExecution::Always => true,
            GuestExecution::Never => false,
        }
    }
}

impl FromStr for GuestExecution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(GuestExecution::Auto),
            "always" | "true" | "1" => Ok(GuestExecution::Always),
            "never" | "false" | "0" => Ok(GuestExecution::Never),
            _ => Err(Error::UnknownGuestExecution(s.to_string())),
        }
    }
}

impl fmt::Display for GuestExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuestExecution::Auto => "auto",
            GuestExecution::Always => "always",
            GuestExecution::Never => "never",
        };
        f.write_str(name)
    }
}

/// Build the host command line running `program args..` inside `instance`.
///
/// The guest shell unescapes the forwarded line once. Plain words survive
/// that pass with every backslash doubled; any other word is single-quoted,
/// which the guest keeps verbatim. Empty arguments render as nothing but keep
/// their separator. A `host` of `cmd` parses the line before the guest does,
/// so words are caret-escaped for it as well.
pub fn forward(instance: &str, program: &str, args: &[&str], host: Shell) -> String {
    let mut line = format!("{} {}", instance, program);
    for arg in args {
        line.push(' ');
        let word = guest_word(arg);
        match host {
            Shell::Cmd => line.push_str(&Shell::Cmd.quote(&word)),
            _ => line.push_str(&word),
        }
    }
    line
}

fn guest_word(arg: &str) -> Cow<'_, str> {
    if arg.is_empty() {
        Cow::Borrowed(arg)
    } else if arg.chars().all(|c| c == '\\' || is_posix_safe(c)) {
        Cow::Owned(arg.replace('\\', "\\\\"))
    } else {
        Shell::Sh.quote(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_override() {
        assert_eq!(GuestExecution::from_override(None), GuestExecution::Auto);
        assert_eq!(GuestExecution::from_override(Some(true)), GuestExecution::Always);
        assert_eq!(GuestExecution::from_override(Some(false)), GuestExecution::Never);
    }

    #[test]
    fn test_pinned_modes_ignore_host() {
        assert!(GuestExecution::Always.crosses_into_guest());
        assert!(!GuestExecution::Never.crosses_into_guest());
    }

    #[test]
    fn test_auto_follows_host() {
        assert_eq!(
            GuestExecution::Auto.crosses_into_guest(),
            os::is_windows_host()
        );
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("Always".parse::<GuestExecution>().unwrap(), GuestExecution::Always);
        assert_eq!("never".parse::<GuestExecution>().unwrap(), GuestExecution::Never);
        assert_eq!("auto".parse::<GuestExecution>().unwrap(), GuestExecution::Auto);
        assert!("sometimes".parse::<GuestExecution>().is_err());
    }

    #[test]
    fn test_display_round_trips_parse() {
        for mode in [GuestExecution::Auto, GuestExecution::Always, GuestExecution::Never] {
            assert_eq!(mode.to_string().parse::<GuestExecution>().unwrap(), mode);
        }
    }

    #[test]
    fn test_forward_doubles_backslashes() {
        assert_eq!(
            forward("wsl", "wslpath", &["", "C:\\"], Shell::Sh),
            "wsl wslpath  C:\\\\"
        );
        assert_eq!(
            forward("wsl", "wslpath", &["", "C:\\"], Shell::Cmd),
            "wsl wslpath  C:\\\\"
        );
    }

    #[test]
    fn test_forward_keeps_multi_word_instance() {
        assert_eq!(
            forward("ubuntu run", "wslpath", &["-w", "/mnt/c"], Shell::Sh),
            "ubuntu run wslpath -w /mnt/c"
        );
    }

    #[test]
    fn test_forward_quotes_words_with_spaces() {
        assert_eq!(
            forward("wsl", "wslpath", &["-w", "/home/bob/My Documents"], Shell::Sh),
            "wsl wslpath -w '/home/bob/My Documents'"
        );
    }

    #[test]
    fn test_forward_keeps_substitutions_literal() {
        assert_eq!(
            forward("wsl", "wslpath", &["-w", "/tmp/$(touch x)"], Shell::Sh),
            "wsl wslpath -w '/tmp/$(touch x)'"
        );
    }

    #[test]
    fn test_forward_escapes_for_cmd_host() {
        assert_eq!(
            forward("wsl", "wslpath", &["-w", "/a&b c"], Shell::Cmd),
            "wsl wslpath -w '/a^&b c'"
        );
    }
}
