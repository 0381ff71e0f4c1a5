use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use super::remote_scope::{parse_ssh_remote, remote_type, RemoteType};
use crate::backend::common::dtos::Project;
use crate::error::{DashboardError, DashboardResult};
use crate::workspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectPathKind {
    Folder,
    WorkspaceFile,
    File,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OpenAction {
    #[default]
    Default,
    NewWindow,
    AddToWorkspace,
}

impl OpenAction {
    fn new_window(self) -> bool {
        matches!(self, Self::NewWindow)
    }
}

/// What the host should do to open a project. Produced here, executed by
/// whoever owns windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OpenPlan {
    OpenFolder { uri: String, new_window: bool },
    OpenRemoteWindow { authority: String, new_window: bool },
    AddWorkspaceFolders { uris: Vec<String> },
    NothingToAdd,
    Rejected { reason: String },
}

#[derive(Debug, Deserialize)]
struct WorkspaceManifest {
    #[serde(default)]
    folders: Vec<WorkspaceManifestFolder>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceManifestFolder {
    #[serde(default)]
    path: Option<String>,
}

pub fn classify_local_path(path: &Path) -> DashboardResult<ProjectPathKind> {
    let metadata = fs::metadata(path).map_err(|error| {
        DashboardError::path(format!(
            "Failed to inspect project path {}: {error}",
            path.display()
        ))
    })?;

    if metadata.is_dir() {
        Ok(ProjectPathKind::Folder)
    } else if workspace::is_workspace_manifest(path) {
        Ok(ProjectPathKind::WorkspaceFile)
    } else {
        Ok(ProjectPathKind::File)
    }
}

/// Folder paths listed in a workspace manifest, resolved against the
/// manifest's directory. Entries without a `path` are skipped.
pub fn read_workspace_manifest_folders(manifest_path: &Path) -> DashboardResult<Vec<PathBuf>> {
    let raw = fs::read_to_string(manifest_path).map_err(|error| {
        DashboardError::path(format!(
            "Failed to read workspace file {}: {error}",
            manifest_path.display()
        ))
    })?;
    let manifest = serde_json::from_str::<WorkspaceManifest>(&raw).map_err(|error| {
        DashboardError::validation(format!(
            "Failed to parse workspace file {}: {error}",
            manifest_path.display()
        ))
    })?;

    let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(manifest
        .folders
        .into_iter()
        .filter_map(|folder| folder.path)
        .filter(|path| !path.trim().is_empty())
        .map(|path| workspace::normalize_absolute_path(Path::new(&path), base))
        .collect())
}

pub fn resolve_open_plan(
    project: &Project,
    action: OpenAction,
    open_folders: &[PathBuf],
) -> DashboardResult<OpenPlan> {
    match remote_type(&project.path) {
        RemoteType::Ssh => Ok(resolve_remote_plan(project, action, open_folders)),
        RemoteType::None => resolve_local_plan(project, action, open_folders),
    }
}

fn resolve_remote_plan(project: &Project, action: OpenAction, open_folders: &[PathBuf]) -> OpenPlan {
    let Some(target) = parse_ssh_remote(&project.path) else {
        return OpenPlan::Rejected {
            reason: format!("Unrecognized remote path for project {}.", project.name),
        };
    };

    match (action, target.folder_uri()) {
        (OpenAction::AddToWorkspace, None) => OpenPlan::Rejected {
            reason: format!(
                "Project {} has no remote folder to add to the workspace.",
                project.name
            ),
        },
        (OpenAction::AddToWorkspace, Some(uri)) => {
            let already_open = open_folders
                .iter()
                .any(|folder| folder.to_string_lossy() == uri.as_str());
            if already_open {
                OpenPlan::NothingToAdd
            } else {
                OpenPlan::AddWorkspaceFolders { uris: vec![uri] }
            }
        }
        (_, Some(uri)) => OpenPlan::OpenFolder {
            uri,
            new_window: action.new_window(),
        },
        (_, None) => OpenPlan::OpenRemoteWindow {
            authority: target.remote_authority(),
            new_window: action.new_window(),
        },
    }
}

fn resolve_local_plan(
    project: &Project,
    action: OpenAction,
    open_folders: &[PathBuf],
) -> DashboardResult<OpenPlan> {
    let cwd = std::env::current_dir().unwrap_or_default();
    let path = workspace::normalize_absolute_path(Path::new(&project.path), &cwd);
    let kind = classify_local_path(&path)?;

    if action != OpenAction::AddToWorkspace {
        return Ok(OpenPlan::OpenFolder {
            uri: file_uri(&path)?,
            new_window: action.new_window(),
        });
    }

    let candidates = match kind {
        ProjectPathKind::Folder => vec![path],
        ProjectPathKind::WorkspaceFile => read_workspace_manifest_folders(&path)?,
        ProjectPathKind::File => {
            return Ok(OpenPlan::Rejected {
                reason: format!(
                    "Project {} is a single file and cannot be added to a workspace.",
                    project.name
                ),
            });
        }
    };

    let remaining = workspace::folders_not_yet_open(&candidates, open_folders);
    if remaining.is_empty() {
        return Ok(OpenPlan::NothingToAdd);
    }

    let uris = remaining
        .iter()
        .map(|folder| file_uri(folder))
        .collect::<DashboardResult<Vec<_>>>()?;
    Ok(OpenPlan::AddWorkspaceFolders { uris })
}

fn file_uri(path: &Path) -> DashboardResult<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|_| {
            DashboardError::path(format!(
                "Failed to build a file URI for {}.",
                path.display()
            ))
        })
}
