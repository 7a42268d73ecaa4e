use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use pathbridge_platform::{CommandOutput, CommandRunner, GuestExecution};
use tracing::debug;

use crate::error::{Error, Result};
use crate::mount::{MountPoint, parse_mount_output};

static GLOBAL_TABLES: Lazy<Arc<MountTables>> = Lazy::new(|| Arc::new(MountTables::new()));

/// Command line that lists the mounts of `instance`.
pub fn inventory_command(instance: &str, guest: GuestExecution) -> String {
    if guest.crosses_into_guest() {
        format!("{} -e mount", instance)
    } else {
        "mount".to_string()
    }
}

/// Run the mount inventory of `instance` and parse it.
pub fn list_mount_points(
    runner: &dyn CommandRunner,
    instance: &str,
    guest: GuestExecution,
) -> Result<Vec<MountPoint>> {
    let command_line = inventory_command(instance, guest);
    debug!(instance, %command_line, "listing mount points");
    let output = runner.run(&command_line).map_err(|source| Error::Spawn {
        instance: instance.to_string(),
        source,
    })?;
    parse_inventory(instance, output)
}

pub async fn list_mount_points_async(
    runner: &dyn CommandRunner,
    instance: &str,
    guest: GuestExecution,
) -> Result<Vec<MountPoint>> {
    let command_line = inventory_command(instance, guest);
    debug!(instance, %command_line, "listing mount points");
    let output = runner
        .run_async(&command_line)
        .await
        .map_err(|source| Error::Spawn {
            instance: instance.to_string(),
            source,
        })?;
    parse_inventory(instance, output)
}

fn parse_inventory(instance: &str, output: CommandOutput) -> Result<Vec<MountPoint>> {
    if !output.success {
        let message = match output.stderr.trim() {
            "" => format!("exit code {:?}", output.exit_code),
            stderr => stderr.to_string(),
        };
        return Err(Error::Failed {
            instance: instance.to_string(),
            message,
        });
    }
    Ok(parse_mount_output(&output.stdout))
}

/// Parsed mount tables, fetched at most once per resolver instance.
///
/// Tables are never invalidated on their own; call [`MountTables::reset`]
/// when the guest's mounts change.
#[derive(Debug, Default)]
pub struct MountTables {
    tables: RwLock<HashMap<String, Arc<[MountPoint]>>>,
}

impl MountTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_TABLES)
    }

    pub fn get(&self, instance: &str) -> Option<Arc<[MountPoint]>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(instance)
            .cloned()
    }

    pub fn insert(&self, instance: &str, mounts: Vec<MountPoint>) -> Arc<[MountPoint]> {
        let mounts: Arc<[MountPoint]> = mounts.into();
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(instance.to_string(), Arc::clone(&mounts));
        mounts
    }

    pub fn get_or_fetch(
        &self,
        runner: &dyn CommandRunner,
        instance: &str,
        guest: GuestExecution,
    ) -> Result<Arc<[MountPoint]>> {
        if let Some(mounts) = self.get(instance) {
            debug!(instance, "mount table memo hit");
            return Ok(mounts);
        }
        let mounts = list_mount_points(runner, instance, guest)?;
        Ok(self.insert(instance, mounts))
    }

    pub async fn get_or_fetch_async(
        &self,
        runner: &dyn CommandRunner,
        instance: &str,
        guest: GuestExecution,
    ) -> Result<Arc<[MountPoint]>> {
        if let Some(mounts) = self.get(instance) {
            debug!(instance, "mount table memo hit");
            return Ok(mounts);
        }
        let mounts = list_mount_points_async(runner, instance, guest).await?;
        Ok(self.insert(instance, mounts))
    }

    pub fn reset(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
