use pathbridge_mount::MountPoint;

use crate::cache::BasePathCache;
use crate::error::Result;
use crate::options::ResolveOptions;
use crate::path::{
    PathKind, classify, ensure_absolute_posix, split_posix_path, split_windows_path,
};

/// A single resolution request: a path taken apart into base and remainder.
///
/// Built fresh per call and never mutated. Building one performs no I/O and
/// leaves the cache untouched.
#[derive(Debug, Clone)]
pub struct ResolutionContext<'a> {
    base_path: String,
    rest_of_path: String,
    kind: PathKind,
    resolver_instance: &'a str,
    cache: &'a BasePathCache,
}

impl<'a> ResolutionContext<'a> {
    /// Classify `path` and split it accordingly.
    pub fn build(path: &str, options: &'a ResolveOptions, mounts: &[MountPoint]) -> Result<Self> {
        match classify(path) {
            PathKind::Windows => Self::windows(path, options),
            PathKind::Posix => Self::posix(path, options, mounts),
        }
    }

    /// Build from a path that must be Windows-style.
    pub fn windows(path: &str, options: &'a ResolveOptions) -> Result<Self> {
        let (base, rest) = split_windows_path(path)?;
        Ok(Self::new(base, rest, PathKind::Windows, options))
    }

    /// Build from a path that must be POSIX-style.
    pub fn posix(path: &str, options: &'a ResolveOptions, mounts: &[MountPoint]) -> Result<Self> {
        ensure_absolute_posix(path)?;
        let (base, rest) = split_posix_path(path, mounts);
        Ok(Self::new(base, rest, PathKind::Posix, options))
    }

    fn new(base: &str, rest: &str, kind: PathKind, options: &'a ResolveOptions) -> Self {
        Self {
            base_path: base.to_string(),
            rest_of_path: rest.to_string(),
            kind,
            resolver_instance: options.get_resolver_instance(),
            cache: options.get_cache(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn rest_of_path(&self) -> &str {
        &self.rest_of_path
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn is_windows_path(&self) -> bool {
        self.kind.is_windows()
    }

    pub fn resolver_instance(&self) -> &'a str {
        self.resolver_instance
    }

    pub fn cache(&self) -> &'a BasePathCache {
        self.cache
    }
}
