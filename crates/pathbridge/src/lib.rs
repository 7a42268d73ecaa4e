//! Translate paths between a Windows host and a WSL guest.
//!
//! A path is split into a *base* the guest's resolver understands (a drive
//! root such as `C:\`, or the mount point / parent directory of a POSIX path)
//! and a *rest* that is carried over lexically. Only the base is resolved by
//! running `wslpath`; the answer is cached per instance in both directions.
//!
//! ```no_run
//! use pathbridge::{ResolveOptions, resolve_to_posix};
//!
//! let options = ResolveOptions::from_env();
//! let posix = resolve_to_posix("C:\\Users\\Bob", &options)?;
//! assert_eq!(posix, "/mnt/c/Users/Bob");
//! # Ok::<(), pathbridge::Error>(())
//! ```

pub use cache::BasePathCache;
pub use context::ResolutionContext;
pub use driver::{RESOLVER_UTIL, ResolverDriver};
pub use error::{Error, Result};
pub use options::{
    DEFAULT_RESOLVER_INSTANCE, GUEST_EXECUTION_ENV, RESOLVER_INSTANCE_ENV, ResolveOptions,
};
pub use path::{PathKind, classify, ensure_absolute_posix};

pub use pathbridge_mount::{DriveFsType, MountPoint, MountTables};
pub use pathbridge_platform::{CommandOutput, CommandRunner, GuestExecution, ShellRunner};

mod cache;
mod context;
mod driver;
mod error;
mod options;
pub mod path;

use tracing::instrument;

/// Windows path to its guest POSIX form.
#[instrument(skip(options), fields(instance = options.get_resolver_instance()))]
pub fn resolve_to_posix(path: &str, options: &ResolveOptions) -> Result<String> {
    let ctx = ResolutionContext::windows(path, options)?;
    driver(options).resolve(&ctx)
}

/// Windows path to its guest POSIX form, awaiting the resolver process.
#[instrument(skip(options), fields(instance = options.get_resolver_instance()))]
pub async fn resolve_to_posix_async(path: &str, options: &ResolveOptions) -> Result<String> {
    let ctx = ResolutionContext::windows(path, options)?;
    driver(options).resolve_async(&ctx).await
}

/// Guest POSIX path to its Windows form.
///
/// The mount inventory is consulted to find the base; it is fetched at most
/// once per instance unless the options carry explicit mount points.
#[instrument(skip(options), fields(instance = options.get_resolver_instance()))]
pub fn resolve_to_windows(path: &str, options: &ResolveOptions) -> Result<String> {
    ensure_absolute_posix(path)?;
    let mounts = options.load_mount_points()?;
    let ctx = ResolutionContext::posix(path, options, &mounts)?;
    driver(options).resolve(&ctx)
}

/// Guest POSIX path to its Windows form, awaiting the inventory and resolver.
#[instrument(skip(options), fields(instance = options.get_resolver_instance()))]
pub async fn resolve_to_windows_async(path: &str, options: &ResolveOptions) -> Result<String> {
    ensure_absolute_posix(path)?;
    let mounts = options.load_mount_points_async().await?;
    let ctx = ResolutionContext::posix(path, options, &mounts)?;
    driver(options).resolve_async(&ctx).await
}

/// Translate `path` into the other convention, whichever it is in.
#[instrument(skip(options), fields(instance = options.get_resolver_instance()))]
pub fn resolve(path: &str, options: &ResolveOptions) -> Result<String> {
    match classify(path) {
        PathKind::Windows => resolve_to_posix(path, options),
        PathKind::Posix => resolve_to_windows(path, options),
    }
}

/// Translate `path` into the other convention without blocking.
#[instrument(skip(options), fields(instance = options.get_resolver_instance()))]
pub async fn resolve_async(path: &str, options: &ResolveOptions) -> Result<String> {
    match classify(path) {
        PathKind::Windows => resolve_to_posix_async(path, options).await,
        PathKind::Posix => resolve_to_windows_async(path, options).await,
    }
}

/// Forget every cached base path and memoized mount table.
pub fn reset_cache() {
    BasePathCache::global().reset();
    MountTables::global().reset();
}

fn driver(options: &ResolveOptions) -> ResolverDriver<'_> {
    ResolverDriver::new(options.get_runner(), options.get_guest_execution())
}
