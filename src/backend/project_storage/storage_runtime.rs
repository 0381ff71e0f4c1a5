use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use super::storage_scope::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::backend::app_settings::DashboardSettings;
use crate::backend::common::constants::{
    GLOBAL_STATE_FILE, PROJECTS_KEY, PROJECT_DATA_KEY, RECENT_COLORS_KEY, SETTINGS_FILE,
};
use crate::backend::common::dtos::{Group, Project, RecentColor};
use crate::backend::common::ids::generate_id;
use crate::error::{DashboardError, DashboardResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    /// Host-scoped ephemeral state, groups under `"projects"`.
    GlobalState,
    /// Host-scoped structured configuration, groups under `"projectData"`.
    Settings,
}

impl BackendKind {
    pub fn from_settings(settings: &DashboardSettings) -> Self {
        if settings.store_projects_in_settings {
            Self::Settings
        } else {
            Self::GlobalState
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::GlobalState => Self::Settings,
            Self::Settings => Self::GlobalState,
        }
    }

    pub(crate) fn groups_key(self) -> &'static str {
        match self {
            Self::GlobalState => PROJECTS_KEY,
            Self::Settings => PROJECT_DATA_KEY,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::GlobalState => "global state",
            Self::Settings => "settings",
        }
    }
}

/// The two interchangeable persistence surfaces. Cloning shares the
/// underlying stores.
#[derive(Clone)]
pub struct StorageBackends {
    global_state: Arc<dyn KeyValueStore>,
    settings: Arc<dyn KeyValueStore>,
}

impl StorageBackends {
    pub fn new(global_state: Arc<dyn KeyValueStore>, settings: Arc<dyn KeyValueStore>) -> Self {
        Self {
            global_state,
            settings,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn open_dir(data_dir: &Path) -> Self {
        Self::new(
            Arc::new(JsonFileStore::new(
                data_dir.join(GLOBAL_STATE_FILE),
                "global state",
            )),
            Arc::new(JsonFileStore::new(data_dir.join(SETTINGS_FILE), "settings")),
        )
    }

    pub fn store(&self, kind: BackendKind) -> &dyn KeyValueStore {
        match kind {
            BackendKind::GlobalState => self.global_state.as_ref(),
            BackendKind::Settings => self.settings.as_ref(),
        }
    }

    pub fn active_kind(&self, settings: &DashboardSettings) -> BackendKind {
        BackendKind::from_settings(settings)
    }

    pub fn settings_store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.settings)
    }

    /// Raw stored groups. A stored JSON `null` counts as never written.
    /// Unless `unsafe_read`, an absent value is reported as an empty array.
    pub fn read_groups(&self, kind: BackendKind, unsafe_read: bool) -> DashboardResult<Option<Value>> {
        let stored = self
            .store(kind)
            .get(kind.groups_key())?
            .filter(|value| !value.is_null());

        if stored.is_none() && !unsafe_read {
            return Ok(Some(Value::Array(Vec::new())));
        }

        Ok(stored)
    }

    pub fn write_groups(&self, kind: BackendKind, groups: &[Group]) -> DashboardResult<()> {
        let value = serde_json::to_value(groups).map_err(|error| {
            DashboardError::storage(format!(
                "Failed to serialize groups for {}: {error}",
                kind.label()
            ))
        })?;
        self.store(kind).update(kind.groups_key(), Some(value))
    }

    fn write_raw_groups(&self, kind: BackendKind, value: Value) -> DashboardResult<()> {
        self.store(kind).update(kind.groups_key(), Some(value))
    }

    pub fn read_recent_colors(&self, kind: BackendKind) -> DashboardResult<Vec<RecentColor>> {
        let stored = self.store(kind).get(RECENT_COLORS_KEY)?;
        Ok(sanitize_recent_colors(stored))
    }

    pub fn write_recent_colors(&self, kind: BackendKind, colors: &[RecentColor]) -> DashboardResult<()> {
        let value = serde_json::to_value(colors).map_err(|error| {
            DashboardError::storage(format!(
                "Failed to serialize recent colors for {}: {error}",
                kind.label()
            ))
        })?;
        self.store(kind).update(RECENT_COLORS_KEY, Some(value))
    }

    /// Copies groups into `active` when it has never been written and the
    /// other backend holds data. The source is left untouched.
    pub fn migrate_if_needed(&self, active: BackendKind) -> DashboardResult<bool> {
        let source = active.other();
        let in_active = self.read_groups(active, true)?;
        let in_source = self.read_groups(source, true)?;

        let (None, Some(source_groups)) = (in_active, in_source) else {
            return Ok(false);
        };

        self.write_raw_groups(active, source_groups)?;
        tracing::info!(
            from = source.label(),
            to = active.label(),
            "migrated project groups to the active backend"
        );
        Ok(true)
    }
}

/// Applies the read-side invariants: non-arrays become an empty store,
/// entries that are not objects are dropped, `projects` defaults to empty and
/// missing ids are generated. A field of the wrong type falls back to its
/// default instead of costing the whole entry.
pub(crate) fn sanitize_stored_groups(raw: Option<Value>) -> Vec<Group> {
    let Some(Value::Array(entries)) = raw else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let group = sanitize_group_value(entry);
            if group.is_none() {
                tracing::warn!(index, "dropping stored group entry that is not an object");
            }
            group
        })
        .collect()
}

fn sanitize_group_value(value: &Value) -> Option<Group> {
    let Value::Object(fields) = value else {
        return None;
    };

    let group_name = if fields.contains_key("groupName") {
        string_field(fields, "groupName")
    } else {
        string_field(fields, "name")
    };
    let projects = match fields.get("projects") {
        Some(Value::Array(entries)) => entries.iter().filter_map(sanitize_project_value).collect(),
        _ => Vec::new(),
    };

    let mut group = Group {
        id: id_field(fields),
        group_name,
        collapsed: bool_field(fields, "collapsed"),
        projects,
    };
    repair_ids(std::slice::from_mut(&mut group));
    Some(group)
}

fn sanitize_project_value(value: &Value) -> Option<Project> {
    let Value::Object(fields) = value else {
        return None;
    };

    Some(Project {
        id: id_field(fields),
        name: string_field(fields, "name").unwrap_or_default(),
        path: string_field(fields, "path").unwrap_or_default(),
        color: string_field(fields, "color"),
        is_git_repo: bool_field(fields, "isGitRepo"),
    })
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or_default()
}

// Numeric ids from hand-edited files are kept as their decimal text.
fn id_field(fields: &Map<String, Value>) -> String {
    match fields.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn repair_ids(groups: &mut [Group]) {
    for group in groups {
        if group.id.trim().is_empty() {
            group.id = generate_id(group.group_name.as_deref());
        }
        for project in &mut group.projects {
            if project.id.trim().is_empty() {
                project.id = generate_id(Some(&project.name));
            }
        }
    }
}

fn sanitize_recent_colors(raw: Option<Value>) -> Vec<RecentColor> {
    let Some(Value::Array(entries)) = raw else {
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let Value::Array(parts) = entry else {
                return None;
            };
            let code = parts.first()?.as_str()?.to_string();
            let name = parts
                .get(1)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned);
            Some((code, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backends_with(global_state: Option<Value>, settings: Option<Value>) -> StorageBackends {
        let global = MemoryStore::new();
        if let Some(value) = global_state {
            global.update(PROJECTS_KEY, Some(value)).expect("seed global");
        }
        let config = MemoryStore::new();
        if let Some(value) = settings {
            config.update(PROJECT_DATA_KEY, Some(value)).expect("seed settings");
        }
        StorageBackends::new(Arc::new(global), Arc::new(config))
    }

    #[test]
    fn safe_read_normalizes_missing_to_empty_array() {
        let backends = StorageBackends::in_memory();
        assert_eq!(
            backends.read_groups(BackendKind::GlobalState, false).expect("read"),
            Some(json!([]))
        );
        assert_eq!(
            backends.read_groups(BackendKind::GlobalState, true).expect("read"),
            None
        );
    }

    #[test]
    fn stored_null_counts_as_never_written() {
        let backends = backends_with(Some(Value::Null), None);
        assert_eq!(
            backends.read_groups(BackendKind::GlobalState, true).expect("read"),
            None
        );
    }

    #[test]
    fn migrates_into_unwritten_active_backend_and_keeps_source() {
        let data = json!([{ "id": "g1", "groupName": "Work", "projects": [] }]);
        let backends = backends_with(Some(data.clone()), None);

        let migrated = backends
            .migrate_if_needed(BackendKind::Settings)
            .expect("migrate");

        assert!(migrated);
        assert_eq!(
            backends.read_groups(BackendKind::Settings, true).expect("read"),
            Some(data.clone())
        );
        assert_eq!(
            backends.read_groups(BackendKind::GlobalState, true).expect("read"),
            Some(data)
        );
    }

    #[test]
    fn does_not_migrate_into_intentionally_empty_backend() {
        let data = json!([{ "id": "g1", "groupName": "Work", "projects": [] }]);
        let backends = backends_with(Some(data), Some(json!([])));

        let migrated = backends
            .migrate_if_needed(BackendKind::Settings)
            .expect("migrate");

        assert!(!migrated);
        assert_eq!(
            backends.read_groups(BackendKind::Settings, true).expect("read"),
            Some(json!([]))
        );
    }

    #[test]
    fn migration_follows_the_active_direction_only() {
        let data = json!([{ "id": "g1", "groupName": null, "projects": [] }]);
        let backends = backends_with(None, Some(data.clone()));

        assert!(!backends
            .migrate_if_needed(BackendKind::Settings)
            .expect("migrate"));
        assert!(backends
            .migrate_if_needed(BackendKind::GlobalState)
            .expect("migrate"));
        assert_eq!(
            backends.read_groups(BackendKind::GlobalState, true).expect("read"),
            Some(data)
        );
    }

    #[test]
    fn nothing_to_migrate_when_both_backends_are_unwritten() {
        let backends = StorageBackends::in_memory();
        assert!(!backends
            .migrate_if_needed(BackendKind::GlobalState)
            .expect("migrate"));
    }

    #[test]
    fn non_array_data_sanitizes_to_empty_store() {
        assert!(sanitize_stored_groups(Some(json!({ "id": "g1" }))).is_empty());
        assert!(sanitize_stored_groups(Some(json!("groups"))).is_empty());
        assert!(sanitize_stored_groups(None).is_empty());
    }

    #[test]
    fn sanitize_repairs_ids_and_defaults_projects() {
        let groups = sanitize_stored_groups(Some(json!([
            { "groupName": "No id" },
            { "id": "g2", "groupName": null, "projects": "broken" },
            42,
            { "id": "g3", "projects": [{ "id": "p1", "name": "API", "path": "/api" }, "junk"] }
        ])));

        assert_eq!(groups.len(), 3);
        assert!(!groups[0].id.is_empty());
        assert!(groups[0].id.starts_with("noid"));
        assert!(groups[0].projects.is_empty());
        assert!(groups[1].projects.is_empty());
        assert_eq!(groups[2].projects.len(), 1);
        assert_eq!(groups[2].projects[0].id, "p1");
    }

    #[test]
    fn mistyped_fields_fall_back_without_dropping_entries() {
        let groups = sanitize_stored_groups(Some(json!([
            {
                "id": "g1",
                "groupName": 5,
                "collapsed": "yes",
                "projects": [
                    { "id": "p1", "name": 3, "path": "/p1", "color": 7, "isGitRepo": "no" },
                    { "id": 42, "name": "Numbered", "path": "/p2" }
                ]
            },
            { "id": "g2", "name": "Legacy", "projects": [] }
        ])));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, "g1");
        assert_eq!(groups[0].group_name, None);
        assert!(!groups[0].collapsed);
        assert_eq!(groups[0].projects.len(), 2);
        assert_eq!(groups[0].projects[0].name, "");
        assert_eq!(groups[0].projects[0].path, "/p1");
        assert_eq!(groups[0].projects[0].color, None);
        assert_eq!(groups[0].projects[1].id, "42");
        assert_eq!(groups[1].display_name(), "Legacy");
    }

    #[test]
    fn recent_colors_skip_malformed_entries() {
        let colors = sanitize_recent_colors(Some(json!([
            ["#fff", "White"],
            ["#000", null],
            ["#111"],
            "nope",
            [42, "Answer"]
        ])));
        assert_eq!(
            colors,
            vec![
                ("#fff".to_string(), Some("White".to_string())),
                ("#000".to_string(), None),
                ("#111".to_string(), None),
            ]
        );
    }

    #[test]
    fn selects_backend_from_settings_flag() {
        let mut settings = DashboardSettings::default();
        assert_eq!(BackendKind::from_settings(&settings), BackendKind::GlobalState);
        settings.store_projects_in_settings = true;
        assert_eq!(BackendKind::from_settings(&settings), BackendKind::Settings);
    }
}
