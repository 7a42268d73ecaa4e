//! Path grammar: splitting paths into base and remainder, and joining them
//! back under either separator convention. Nothing here performs I/O.

use std::fmt;

use once_cell::sync::Lazy;
use pathbridge_mount::MountPoint;
use regex::Regex;

use crate::error::{Error, Result};

static WINDOWS_DRIVE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_]+:\\)(.*)$").unwrap());

static WINDOWS_PREFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+:").unwrap());

/// The coordinate system a path is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Windows,
    Posix,
}

impl PathKind {
    pub fn opposite(self) -> Self {
        match self {
            PathKind::Windows => PathKind::Posix,
            PathKind::Posix => PathKind::Windows,
        }
    }

    pub fn separator(self) -> char {
        match self {
            PathKind::Windows => '\\',
            PathKind::Posix => '/',
        }
    }

    pub fn is_windows(self) -> bool {
        self == PathKind::Windows
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::Windows => f.write_str("windows"),
            PathKind::Posix => f.write_str("posix"),
        }
    }
}

/// Windows when `path` starts with a drive prefix such as `C:\`, POSIX
/// otherwise.
pub fn classify(path: &str) -> PathKind {
    if WINDOWS_DRIVE_REGEX.is_match(path) {
        PathKind::Windows
    } else {
        PathKind::Posix
    }
}

/// Split `C:\Users\Bob` into `("C:\", "Users\Bob")`.
pub fn split_windows_path(path: &str) -> Result<(&str, &str)> {
    let caps = WINDOWS_DRIVE_REGEX
        .captures(path)
        .ok_or_else(|| Error::invalid_path(path, PathKind::Windows))?;

    match (caps.get(1), caps.get(2)) {
        (Some(drive), Some(rest)) => Ok((drive.as_str(), rest.as_str())),
        _ => Err(Error::invalid_path(path, PathKind::Windows)),
    }
}

/// Reject anything that is not an absolute POSIX path.
pub fn ensure_absolute_posix(path: &str) -> Result<()> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(Error::invalid_path(path, PathKind::Posix))
    }
}

/// Drop trailing separators from a resolved path. Bare roots (`/`, `C:\`)
/// keep theirs.
pub fn strip_trailing_separator(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.len() == path.len() {
        return path;
    }
    if trimmed.is_empty() {
        return &path[..1];
    }
    if WINDOWS_PREFIX_REGEX
        .find(trimmed)
        .is_some_and(|m| m.end() == trimmed.len())
    {
        return &path[..trimmed.len() + 1];
    }
    trimmed
}

/// Split a POSIX path at the translated-drive mount that holds it.
///
/// `mounts` must be ordered longest `src` first. When the most specific mount
/// covering `path` is not a translated drive, or nothing covers it, the path
/// is split into its parent directory and final component instead. That
/// split gives every path some base to resolve, even one that maps to no
/// drive.
pub fn split_posix_path<'a>(path: &'a str, mounts: &'a [MountPoint]) -> (&'a str, &'a str) {
    match mounts.iter().find(|m| m.covers(path)) {
        Some(mount) if mount.is_translated_drive() => {
            (mount.src.as_str(), &path[mount.src.len()..])
        }
        _ => split_parent(path),
    }
}

fn split_parent(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { (".", "") } else { ("/", "") };
    }

    match trimmed.rfind('/') {
        None => (".", trimmed),
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches('/');
            let parent = if parent.is_empty() { "/" } else { parent };
            (parent, &trimmed[idx + 1..])
        }
    }
}

/// Join `base` and `rest` under the separator convention of `kind`.
///
/// Separators in `rest` are rewritten to the target convention first. The
/// result is normalized (repeated separators collapsed, `.` dropped, `..`
/// folded) and trimmed, which makes joining idempotent.
pub fn join_path(base: &str, rest: &str, kind: PathKind) -> String {
    let sep = kind.separator();
    let rest = rest.replace(kind.opposite().separator(), &sep.to_string());

    let joined = match (base.is_empty(), rest.is_empty()) {
        (true, true) => String::new(),
        (false, true) => base.to_string(),
        (true, false) => rest,
        (false, false) => format!("{}{}{}", base, sep, rest),
    };

    let normalized = match kind {
        PathKind::Posix => normalize_posix(&joined),
        PathKind::Windows => normalize_windows(&joined),
    };
    normalized.trim().to_string()
}

fn normalize_posix(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let absolute = path.starts_with('/');
    let segments = fold_segments(path.split('/'), absolute);
    let root = if absolute { "/" } else { "" };
    render(root, &segments, "/", path.ends_with('/'), !absolute)
}

fn normalize_windows(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let path = path.replace('/', "\\");

    if let Some(unc) = path.strip_prefix("\\\\") {
        let mut parts = unc.split('\\').filter(|s| !s.is_empty());
        let root = match (parts.next(), parts.next()) {
            (Some(server), Some(share)) => format!("\\\\{}\\{}\\", server, share),
            (Some(server), None) => format!("\\\\{}\\", server),
            _ => "\\\\".to_string(),
        };
        let segments = fold_segments(parts, true);
        return render(&root, &segments, "\\", path.ends_with('\\'), false);
    }

    let (device, tail) = match WINDOWS_PREFIX_REGEX.find(&path) {
        Some(m) => path.split_at(m.end()),
        None => ("", path.as_str()),
    };
    let absolute = tail.starts_with('\\');
    let segments = fold_segments(tail.split('\\'), absolute);
    let root = if absolute {
        format!("{}\\", device)
    } else {
        device.to_string()
    };
    render(&root, &segments, "\\", path.ends_with('\\'), !absolute && device.is_empty())
}

fn fold_segments<'a>(parts: impl Iterator<Item = &'a str>, absolute: bool) -> Vec<&'a str> {
    let mut segments: Vec<&str> = Vec::new();
    for part in parts {
        match part {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            part => segments.push(part),
        }
    }
    segments
}

fn render(root: &str, segments: &[&str], sep: &str, trailing: bool, dot_if_empty: bool) -> String {
    let mut out = String::from(root);
    out.push_str(&segments.join(sep));
    if segments.is_empty() {
        if out.is_empty() && dot_if_empty {
            out.push('.');
        }
        return out;
    }
    if trailing {
        out.push_str(sep);
    }
    out
}
