use std::env;
use std::fmt;
use std::sync::Arc;

use pathbridge_mount::{MountPoint, MountTables};
use pathbridge_platform::{CommandRunner, GuestExecution, ShellRunner};
use tracing::{debug, warn};

use crate::cache::BasePathCache;
use crate::error::{Error, Result};

/// Resolver instance used when none is configured.
pub const DEFAULT_RESOLVER_INSTANCE: &str = "wsl";

pub const RESOLVER_INSTANCE_ENV: &str = "PATHBRIDGE_RESOLVER_INSTANCE";
pub const GUEST_EXECUTION_ENV: &str = "PATHBRIDGE_GUEST_EXECUTION";

/// Per-call configuration for a resolution.
///
/// Everything defaults to process-wide state: the global cache, the global
/// mount tables, the `wsl` launcher and a host shell runner. Tests and
/// embedders replace any of them through the builder methods.
#[derive(Clone)]
pub struct ResolveOptions {
    cache: Arc<BasePathCache>,
    mount_tables: Arc<MountTables>,
    resolver_instance: String,
    mount_points: Option<Arc<[MountPoint]>>,
    guest_execution: GuestExecution,
    runner: Arc<dyn CommandRunner>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            cache: BasePathCache::global(),
            mount_tables: MountTables::global(),
            resolver_instance: DEFAULT_RESOLVER_INSTANCE.to_string(),
            mount_points: None,
            guest_execution: GuestExecution::default(),
            runner: Arc::new(ShellRunner::default()),
        }
    }
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("resolver_instance", &self.resolver_instance)
            .field("mount_points", &self.mount_points)
            .field("guest_execution", &self.guest_execution)
            .field("cached_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the instance and guest policy taken from the
    /// environment when set. Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(instance) = env::var(RESOLVER_INSTANCE_ENV) {
            let instance = instance.trim();
            if instance.is_empty() {
                warn!(var = RESOLVER_INSTANCE_ENV, "ignoring empty resolver instance");
            } else {
                options.resolver_instance = instance.to_string();
            }
        }

        if let Ok(value) = env::var(GUEST_EXECUTION_ENV) {
            match value.parse::<GuestExecution>() {
                Ok(guest) => options.guest_execution = guest,
                Err(e) => warn!(var = GUEST_EXECUTION_ENV, error = %e, "ignoring guest execution override"),
            }
        }

        debug!(?options, "loaded resolve options from environment");
        options
    }

    pub fn cache(mut self, cache: Arc<BasePathCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn mount_tables(mut self, tables: Arc<MountTables>) -> Self {
        self.mount_tables = tables;
        self
    }

    pub fn resolver_instance(mut self, instance: impl Into<String>) -> Self {
        self.resolver_instance = instance.into();
        self
    }

    /// Use `mounts` instead of querying the instance.
    ///
    /// The list is reordered longest source first so prefix matching picks
    /// the most specific mount.
    pub fn mount_points(mut self, mut mounts: Vec<MountPoint>) -> Self {
        mounts.sort_by(|a, b| b.src.len().cmp(&a.src.len()));
        self.mount_points = Some(mounts.into());
        self
    }

    pub fn guest_execution(mut self, guest: GuestExecution) -> Self {
        self.guest_execution = guest;
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn get_cache(&self) -> &BasePathCache {
        &self.cache
    }

    pub fn get_resolver_instance(&self) -> &str {
        &self.resolver_instance
    }

    pub fn get_mount_points(&self) -> Option<Arc<[MountPoint]>> {
        self.mount_points.clone()
    }

    pub fn get_guest_execution(&self) -> GuestExecution {
        self.guest_execution
    }

    pub fn get_runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Explicit mount points, or the instance's memoized inventory.
    pub fn load_mount_points(&self) -> Result<Arc<[MountPoint]>> {
        if let Some(mounts) = self.get_mount_points() {
            return Ok(mounts);
        }
        self.mount_tables
            .get_or_fetch(
                self.get_runner(),
                &self.resolver_instance,
                self.guest_execution,
            )
            .map_err(|e| Error::mount_inventory(&self.resolver_instance, e))
    }

    pub async fn load_mount_points_async(&self) -> Result<Arc<[MountPoint]>> {
        if let Some(mounts) = self.get_mount_points() {
            return Ok(mounts);
        }
        self.mount_tables
            .get_or_fetch_async(
                self.get_runner(),
                &self.resolver_instance,
                self.guest_execution,
            )
            .await
            .map_err(|e| Error::mount_inventory(&self.resolver_instance, e))
    }
}
