//! Mount inventory of a guest environment.
//!
//! The guest's `mount` output is parsed into [`MountPoint`]s ordered
//! longest-source-first, so the first prefix match is always the most
//! specific one. [`MountTables`] memoizes the parsed list per resolver
//! instance.

pub use error::{Error, Result};
pub use mount::{DriveFsType, MountPoint, parse_mount_output};
pub use table::{MountTables, inventory_command, list_mount_points, list_mount_points_async};

mod error;
mod mount;
mod table;
