use std::path::{Path, PathBuf};

use crate::backend::common::constants::{DATA_DIR_ENV, DEFAULT_DATA_DIR_NAME};
use crate::error::{DashboardError, DashboardResult};

pub(crate) fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
}

/// Picks the data directory: an explicit override, then `DASHBOARD_DATA_DIR`,
/// then `~/.project-dashboard`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> DashboardResult<PathBuf> {
    if let Some(dir) = explicit.filter(|dir| !dir.as_os_str().is_empty()) {
        return Ok(dir.to_path_buf());
    }

    if let Some(dir) = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        return Ok(dir);
    }

    dirs_home()
        .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
        .ok_or_else(|| {
            DashboardError::path(format!(
                "Failed to resolve a data directory: set {DATA_DIR_ENV} or HOME."
            ))
        })
}
