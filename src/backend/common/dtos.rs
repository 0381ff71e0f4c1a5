use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use super::ids::generate_id;
use crate::workspace;

/// `[colorCode, colorName]`, serialized as a two-element JSON array.
pub type RecentColor = (String, Option<String>);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_git_repo: bool,
}

impl Project {
    /// Creates a project with a fresh id. `isGitRepo` is probed on disk for
    /// local paths and is always false for remote ones.
    pub fn new(name: impl Into<String>, path: impl Into<String>, color: Option<String>) -> Self {
        let name = name.into();
        let path = path.into();
        let is_git_repo = !path.starts_with(super::constants::REMOTE_URI_PREFIX)
            && workspace::is_git_repository(Path::new(&path));

        Self {
            id: generate_id(Some(&name)),
            name,
            path,
            color: normalize_color(color),
            is_git_repo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collapsed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
}

impl Group {
    pub fn new(group_name: Option<String>, projects: Vec<Project>) -> Self {
        Self {
            id: generate_id(group_name.as_deref()),
            group_name,
            collapsed: false,
            projects,
        }
    }

    pub fn is_unnamed(&self) -> bool {
        self.group_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
    }

    pub fn display_name(&self) -> &str {
        self.group_name.as_deref().unwrap_or_default()
    }
}

/// Fields of a [`Project`] that may be changed after creation. There is no
/// id field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(
        default,
        deserialize_with = "explicit_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_git_repo: Option<bool>,
}

impl ProjectPatch {
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(path) = &self.path {
            project.path = path.clone();
        }
        if let Some(color) = &self.color {
            project.color = normalize_color(color.clone());
        }
        if let Some(is_git_repo) = self.is_git_repo {
            project.is_git_repo = is_git_repo;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    #[serde(
        default,
        deserialize_with = "explicit_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

impl GroupPatch {
    pub fn apply(&self, group: &mut Group) {
        if let Some(group_name) = &self.group_name {
            group.group_name = group_name.clone();
        }
        if let Some(collapsed) = self.collapsed {
            group.collapsed = collapsed;
        }
    }
}

/// One entry of a drag-and-drop reorder snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOrder {
    pub group_id: String,
    #[serde(default)]
    pub project_ids: Vec<String>,
}

fn normalize_color(color: Option<String>) -> Option<String> {
    color
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Present-but-null becomes `Some(None)`; a missing key stays `None` via `default`.
fn explicit_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}
