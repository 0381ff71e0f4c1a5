use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::backend::common::constants::WORKSPACE_FILE_EXTENSION;

pub(crate) fn is_workspace_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.eq_ignore_ascii_case(WORKSPACE_FILE_EXTENSION))
        .unwrap_or(false)
}

pub(crate) fn is_git_repository(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.join(".git").exists()
}

/// Resolves `path` against `base` when relative and folds `.`/`..` segments
/// lexically, without touching the filesystem.
pub(crate) fn normalize_absolute_path(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(value) => normalized.push(value),
        }
    }

    normalized
}

pub(crate) fn workspace_folder_key(path: &Path) -> String {
    let rendered = path.display().to_string();
    if cfg!(windows) {
        rendered.to_lowercase()
    } else {
        rendered
    }
}

/// Returns the candidates that are neither already open nor repeated,
/// preserving their order.
pub(crate) fn folders_not_yet_open(candidates: &[PathBuf], open_folders: &[PathBuf]) -> Vec<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_default();
    let mut seen = open_folders
        .iter()
        .map(|folder| workspace_folder_key(&normalize_absolute_path(folder, &cwd)))
        .collect::<HashSet<_>>();

    let mut remaining = Vec::new();
    for candidate in candidates {
        let normalized = normalize_absolute_path(candidate, &cwd);
        if seen.insert(workspace_folder_key(&normalized)) {
            remaining.push(normalized);
        }
    }

    remaining
}
