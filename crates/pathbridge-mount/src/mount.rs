use std::borrow::Cow;
use std::fmt;

use tracing::trace;

/// Filesystem types that bridge a guest mount to a host drive.
///
/// Older guest kernels expose host drives as `drvfs`, newer ones through a
/// `9p` server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveFsType {
    Drvfs,
    NineP,
}

impl DriveFsType {
    pub const ALL: [DriveFsType; 2] = [DriveFsType::Drvfs, DriveFsType::NineP];

    pub fn as_str(self) -> &'static str {
        match self {
            DriveFsType::Drvfs => "drvfs",
            DriveFsType::NineP => "9p",
        }
    }

    /// Returns the bridging type named by `fs_type`, if it is one.
    pub fn classify(fs_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == fs_type)
    }
}

impl fmt::Display for DriveFsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guest mount. `target` is set only for translated drives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountPoint {
    pub src: String,
    pub target: Option<String>,
}

impl MountPoint {
    pub fn new(src: impl Into<String>, target: Option<String>) -> Self {
        Self {
            src: src.into(),
            target,
        }
    }

    /// A mount bridging `src` in the guest to the host drive `target`.
    pub fn drive(src: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(src, Some(target.into()))
    }

    /// An ordinary guest-internal mount.
    pub fn internal(src: impl Into<String>) -> Self {
        Self::new(src, None)
    }

    pub fn is_translated_drive(&self) -> bool {
        self.target.is_some()
    }

    /// Whether `path` lies at or below this mount.
    ///
    /// Matches whole components only: `/mnt/c` covers `/mnt/c/Users` but not
    /// `/mnt/cdrom`.
    pub fn covers(&self, path: &str) -> bool {
        match path.strip_prefix(self.src.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.src.ends_with('/'),
            None => false,
        }
    }
}

/// Parse `mount` output into mount points, longest `src` first.
///
/// Each line reads `<device> on <mountpoint> type <fstype> (<options>)`.
/// Lines that do not follow that shape are skipped. Sorting is stable, so
/// mounts of equal length keep their inventory order.
pub fn parse_mount_output(output: &str) -> Vec<MountPoint> {
    let mut mounts: Vec<MountPoint> = output
        .lines()
        .filter_map(parse_line)
        .collect();

    mounts.sort_by(|a, b| b.src.len().cmp(&a.src.len()));
    mounts
}

fn parse_line(line: &str) -> Option<MountPoint> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 || fields[1] != "on" || fields[3] != "type" {
        if !line.trim().is_empty() {
            trace!(line, "skipping malformed mount record");
        }
        return None;
    }

    let (device, mount_point, fs_type) = (fields[0], fields[2], fields[4]);
    let target = DriveFsType::classify(fs_type).map(|_| unescape_octal(device).into_owned());
    Some(MountPoint::new(unescape_octal(mount_point), target))
}

/// Decode the `\NNN` octal escapes `mount` writes for whitespace and
/// backslashes inside a field.
fn unescape_octal(field: &str) -> Cow<'_, str> {
    if !field.contains('\\') {
        return Cow::Borrowed(field);
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escape = bytes.get(i + 1..i + 4).filter(|digits| {
            bytes[i] == b'\\'
                && matches!(digits[0], b'0'..=b'3')
                && digits[1..].iter().all(|d| matches!(d, b'0'..=b'7'))
        });
        match escape {
            Some(digits) => {
                out.push(digits.iter().fold(0u8, |acc, d| (acc << 3) | (d - b'0')));
                i += 4;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }

    match String::from_utf8(out) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => Cow::Borrowed(field),
    }
}
