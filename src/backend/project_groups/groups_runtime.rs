use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::manual_edit::{parse_manual_edit_document, render_manual_edit_document};
use crate::backend::app_settings::{DashboardSettings, SettingsSource};
use crate::backend::color_history::ColorService;
use crate::backend::common::dtos::{Group, GroupPatch, Project, ProjectPatch};
use crate::backend::common::ids::generate_id;
use crate::backend::project_storage::{repair_ids, sanitize_stored_groups, BackendKind, StorageBackends};
use crate::error::{DashboardError, DashboardResult};

/// CRUD over the group/project tree. Every call re-reads the active backend,
/// mutates in memory and writes the whole store back.
pub struct ProjectService {
    backends: StorageBackends,
    settings: Arc<dyn SettingsSource>,
    colors: Arc<ColorService>,
    write_lock: Mutex<()>,
}

impl ProjectService {
    pub fn new(
        backends: StorageBackends,
        settings: Arc<dyn SettingsSource>,
        colors: Arc<ColorService>,
    ) -> Self {
        Self {
            backends,
            settings,
            colors,
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn active(&self) -> (BackendKind, DashboardSettings) {
        let settings = self.settings.current();
        (self.backends.active_kind(&settings), settings)
    }

    pub fn active_backend(&self) -> BackendKind {
        self.active().0
    }

    /// The stored value exactly as persisted, `None` if never written.
    pub fn get_raw_groups(&self) -> DashboardResult<Option<Value>> {
        self.backends.read_groups(self.active_backend(), true)
    }

    pub fn get_groups(&self) -> DashboardResult<Vec<Group>> {
        self.read_groups(self.active_backend())
    }

    fn read_groups(&self, kind: BackendKind) -> DashboardResult<Vec<Group>> {
        Ok(sanitize_stored_groups(self.backends.read_groups(kind, false)?))
    }

    pub fn get_group(&self, group_id: &str) -> DashboardResult<Option<Group>> {
        Ok(self
            .get_groups()?
            .into_iter()
            .find(|group| group.id == group_id))
    }

    pub fn get_projects_flat(&self) -> DashboardResult<Vec<Project>> {
        Ok(self
            .get_groups()?
            .into_iter()
            .flat_map(|group| group.projects)
            .collect())
    }

    pub fn get_project(&self, project_id: &str) -> DashboardResult<Option<Project>> {
        Ok(self
            .get_project_and_group(project_id)?
            .map(|(project, _)| project))
    }

    pub fn get_project_and_group(&self, project_id: &str) -> DashboardResult<Option<(Project, Group)>> {
        for group in self.get_groups()? {
            if let Some(project) = group
                .projects
                .iter()
                .find(|project| project.id == project_id)
                .cloned()
            {
                return Ok(Some((project, group)));
            }
        }
        Ok(None)
    }

    pub fn add_group(&self, group_name: Option<&str>, projects: Vec<Project>) -> DashboardResult<Group> {
        let _guard = self.lock_writes();
        let (kind, _) = self.active();
        let mut groups = self.read_groups(kind)?;

        let mut group = Group::new(group_name.map(ToOwned::to_owned), Vec::new());
        for mut project in projects {
            ensure_unique_project_id(&groups, &group.projects, &mut project);
            group.projects.push(project);
        }

        groups.push(group.clone());
        self.write_groups(kind, groups)?;
        Ok(group)
    }

    /// Adds `project` to the group with `group_id`, falling back to the first
    /// group, or to a new unnamed group when the store is empty.
    pub fn add_project(&self, mut project: Project, group_id: Option<&str>) -> DashboardResult<Vec<Group>> {
        let _guard = self.lock_writes();
        let (kind, settings) = self.active();
        let mut groups = self.read_groups(kind)?;

        ensure_unique_project_id(&groups, &[], &mut project);

        let target = group_id
            .and_then(|group_id| groups.iter().position(|group| group.id == group_id))
            .unwrap_or(0);
        if groups.is_empty() {
            groups.push(Group::new(None, Vec::new()));
        }

        let color = project.color.clone();
        let group = &mut groups[target];
        if settings.add_new_projects_to_front {
            group.projects.insert(0, project);
        } else {
            group.projects.push(project);
        }

        self.record_recent_color(color.as_deref());
        self.write_groups(kind, groups)
    }

    /// Merges `patch` into the project. Unknown ids leave the store untouched.
    pub fn update_project(&self, project_id: &str, patch: &ProjectPatch) -> DashboardResult<()> {
        let _guard = self.lock_writes();
        let (kind, _) = self.active();
        let mut groups = self.read_groups(kind)?;

        let Some(project) = groups
            .iter_mut()
            .flat_map(|group| group.projects.iter_mut())
            .find(|project| project.id == project_id)
        else {
            return Ok(());
        };

        patch.apply(project);
        let color = project.color.clone();

        self.record_recent_color(color.as_deref());
        self.write_groups(kind, groups).map(|_| ())
    }

    pub fn update_group(&self, group_id: &str, patch: &GroupPatch) -> DashboardResult<()> {
        let _guard = self.lock_writes();
        let (kind, _) = self.active();
        let mut groups = self.read_groups(kind)?;

        let Some(group) = groups.iter_mut().find(|group| group.id == group_id) else {
            return Ok(());
        };

        patch.apply(group);
        self.write_groups(kind, groups).map(|_| ())
    }

    /// Removes the first project with `project_id`. The owning group stays,
    /// even when it ends up empty.
    pub fn remove_project(&self, project_id: &str) -> DashboardResult<Vec<Group>> {
        let _guard = self.lock_writes();
        let (kind, _) = self.active();
        let mut groups = self.read_groups(kind)?;

        let removed = groups.iter_mut().any(|group| {
            let Some(index) = group
                .projects
                .iter()
                .position(|project| project.id == project_id)
            else {
                return false;
            };
            group.projects.remove(index);
            true
        });

        if !removed {
            return Ok(groups);
        }
        self.write_groups(kind, groups)
    }

    /// With `test_if_empty`, a group that still holds projects is kept.
    pub fn remove_group(&self, group_id: &str, test_if_empty: bool) -> DashboardResult<Vec<Group>> {
        let _guard = self.lock_writes();
        let (kind, _) = self.active();
        let mut groups = self.read_groups(kind)?;

        let before = groups.len();
        groups.retain(|group| {
            group.id != group_id || (test_if_empty && !group.projects.is_empty())
        });

        if groups.len() == before {
            return Ok(groups);
        }
        self.write_groups(kind, groups)
    }

    pub fn save_groups(&self, groups: Vec<Group>) -> DashboardResult<()> {
        let _guard = self.lock_writes();
        let (kind, _) = self.active();
        self.write_groups(kind, groups).map(|_| ())
    }

    /// Single write path: repairs missing and repeated ids, then persists
    /// through `kind`.
    pub(crate) fn write_groups(&self, kind: BackendKind, mut groups: Vec<Group>) -> DashboardResult<Vec<Group>> {
        repair_ids(&mut groups);
        regenerate_repeated_ids(&mut groups);
        self.backends.write_groups(kind, &groups)?;
        Ok(groups)
    }

    pub(crate) fn read_active_groups(&self) -> DashboardResult<(BackendKind, Vec<Group>)> {
        let (kind, _) = self.active();
        Ok((kind, self.read_groups(kind)?))
    }

    pub fn migrate_if_needed(&self) -> DashboardResult<bool> {
        let _guard = self.lock_writes();
        self.backends.migrate_if_needed(self.active_backend())
    }

    /// Writes the current store as an editable JSON document.
    pub fn export_manual_edit_document(&self, path: &Path) -> DashboardResult<()> {
        let document = render_manual_edit_document(&self.get_groups()?)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| {
                DashboardError::storage(format!(
                    "Failed to create directory {}: {error}",
                    parent.display()
                ))
            })?;
        }
        fs::write(path, document).map_err(|error| {
            DashboardError::storage(format!(
                "Failed to write manual edit document {}: {error}",
                path.display()
            ))
        })
    }

    /// Validates an edited document and replaces the store with it. A
    /// rejected document leaves the store unchanged.
    pub fn apply_manual_edit_document(&self, document: &str) -> DashboardResult<Vec<Group>> {
        let groups = parse_manual_edit_document(document)?;
        let _guard = self.lock_writes();
        let (kind, _) = self.active();
        self.write_groups(kind, groups)
    }

    fn record_recent_color(&self, color: Option<&str>) {
        if let Err(error) = self.colors.add_recent_color(color) {
            tracing::warn!(error = %error, "failed to record recent color");
        }
    }
}

// The first holder of an id keeps it; later holders get a fresh one.
fn regenerate_repeated_ids(groups: &mut [Group]) {
    let mut group_ids = HashSet::new();
    let mut project_ids = HashSet::new();
    for group in groups.iter_mut() {
        while !group_ids.insert(group.id.clone()) {
            group.id = generate_id(group.group_name.as_deref());
        }
        for project in &mut group.projects {
            while !project_ids.insert(project.id.clone()) {
                project.id = generate_id(Some(&project.name));
            }
        }
    }
}

fn ensure_unique_project_id(groups: &[Group], pending: &[Project], project: &mut Project) {
    let taken = |id: &str| {
        groups
            .iter()
            .flat_map(|group| group.projects.iter())
            .chain(pending.iter())
            .any(|existing| existing.id == id)
    };

    while project.id.trim().is_empty() || taken(&project.id) {
        project.id = generate_id(Some(&project.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::project_storage::{KeyValueStore, MemoryStore};
    use crate::backend::common::constants::RECENT_COLORS_KEY;
    use serde_json::json;

    fn settings_source(settings: DashboardSettings) -> Arc<dyn SettingsSource> {
        Arc::new(move || settings.clone())
    }

    fn service_on(backends: StorageBackends, settings: DashboardSettings) -> ProjectService {
        let settings = settings_source(settings);
        let colors = Arc::new(ColorService::new(backends.clone(), Arc::clone(&settings)));
        ProjectService::new(backends, settings, colors)
    }

    fn service() -> ProjectService {
        service_on(StorageBackends::in_memory(), DashboardSettings::default())
    }

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            path: format!("/nonexistent/{name}"),
            color: None,
            is_git_repo: false,
        }
    }

    struct ColorlessStore(MemoryStore);

    impl KeyValueStore for ColorlessStore {
        fn get(&self, key: &str) -> DashboardResult<Option<Value>> {
            self.0.get(key)
        }

        fn update(&self, key: &str, value: Option<Value>) -> DashboardResult<()> {
            if key == RECENT_COLORS_KEY {
                return Err(DashboardError::storage("Failed to write recent colors: disk full"));
            }
            self.0.update(key, value)
        }
    }

    #[test]
    fn first_project_creates_an_unnamed_group() {
        let service = service();
        let groups = service.add_project(project("p1", "Api"), None).expect("add");

        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_unnamed());
        assert_eq!(groups[0].projects[0].id, "p1");
    }

    #[test]
    fn unknown_group_id_falls_back_to_first_group() {
        let service = service();
        let first = service.add_group(Some("First"), Vec::new()).expect("first");
        service.add_group(Some("Second"), Vec::new()).expect("second");

        let groups = service
            .add_project(project("p1", "Api"), Some("missing"))
            .expect("add");

        assert_eq!(groups[0].id, first.id);
        assert_eq!(groups[0].projects.len(), 1);
        assert!(groups[1].projects.is_empty());
    }

    #[test]
    fn insertion_position_follows_settings() {
        let service = service_on(
            StorageBackends::in_memory(),
            DashboardSettings {
                add_new_projects_to_front: true,
                ..DashboardSettings::default()
            },
        );
        service.add_project(project("p1", "One"), None).expect("add");
        let groups = service.add_project(project("p2", "Two"), None).expect("add");

        let ids = groups[0]
            .projects
            .iter()
            .map(|project| project.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[test]
    fn colliding_project_id_is_regenerated() {
        let service = service();
        service.add_project(project("dup", "One"), None).expect("add");
        let groups = service.add_project(project("dup", "Two"), None).expect("add");

        let ids = groups[0]
            .projects
            .iter()
            .map(|project| project.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids[0], "dup");
        assert_ne!(ids[1], "dup");
        assert!(ids[1].starts_with("two"));
    }

    #[test]
    fn lookups_return_none_for_unknown_ids() {
        let service = service();
        service.add_project(project("p1", "Api"), None).expect("add");

        assert!(service.get_project("nope").expect("read").is_none());
        assert!(service.get_group("nope").expect("read").is_none());
        let (found, group) = service
            .get_project_and_group("p1")
            .expect("read")
            .expect("present");
        assert_eq!(found.name, "Api");
        assert_eq!(group.projects.len(), 1);
    }

    #[test]
    fn update_project_keeps_id_and_records_color() {
        let backends = StorageBackends::in_memory();
        let service = service_on(backends.clone(), DashboardSettings::default());
        service.add_project(project("p1", "Api"), None).expect("add");

        let patch = ProjectPatch {
            name: Some("Gateway".to_string()),
            color: Some(Some("#ff0000".to_string())),
            ..ProjectPatch::default()
        };
        service.update_project("p1", &patch).expect("update");

        let updated = service.get_project("p1").expect("read").expect("present");
        assert_eq!(updated.name, "Gateway");
        assert_eq!(updated.color.as_deref(), Some("#ff0000"));
        let colors = backends
            .read_recent_colors(BackendKind::GlobalState)
            .expect("colors");
        assert_eq!(colors[0].0, "#ff0000");
    }

    #[test]
    fn updating_unknown_project_writes_nothing() {
        let backends = StorageBackends::in_memory();
        let service = service_on(backends.clone(), DashboardSettings::default());

        let patch = ProjectPatch {
            color: Some(Some("#00ff00".to_string())),
            ..ProjectPatch::default()
        };
        service.update_project("ghost", &patch).expect("update");

        assert!(service.get_raw_groups().expect("raw").is_none());
        assert!(backends
            .read_recent_colors(BackendKind::GlobalState)
            .expect("colors")
            .is_empty());
    }

    #[test]
    fn update_group_collapses_and_renames() {
        let service = service();
        let group = service.add_group(Some("Work"), Vec::new()).expect("group");

        service
            .update_group(
                &group.id,
                &GroupPatch {
                    group_name: Some(Some("Play".to_string())),
                    collapsed: Some(true),
                },
            )
            .expect("update");

        let stored = service.get_group(&group.id).expect("read").expect("present");
        assert_eq!(stored.display_name(), "Play");
        assert!(stored.collapsed);
    }

    #[test]
    fn color_failures_do_not_fail_project_creation() {
        let backends = StorageBackends::new(
            Arc::new(ColorlessStore(MemoryStore::new())),
            Arc::new(MemoryStore::new()),
        );
        let service = service_on(backends, DashboardSettings::default());

        let mut colored = project("p1", "Api");
        colored.color = Some("#123456".to_string());
        let groups = service.add_project(colored, None).expect("add");
        assert_eq!(groups[0].projects.len(), 1);
    }

    #[test]
    fn removing_last_project_keeps_the_group() {
        let service = service();
        service.add_project(project("p1", "Api"), None).expect("add");

        let groups = service.remove_project("p1").expect("remove");
        assert_eq!(groups.len(), 1);
        assert!(groups[0].projects.is_empty());
    }

    #[test]
    fn remove_group_respects_test_if_empty() {
        let service = service();
        let groups = service.add_project(project("p1", "Api"), None).expect("add");
        let group_id = groups[0].id.clone();

        let kept = service.remove_group(&group_id, true).expect("remove");
        assert_eq!(kept.len(), 1);

        let removed = service.remove_group(&group_id, false).expect("remove");
        assert!(removed.is_empty());
        assert!(service.get_groups().expect("read").is_empty());
    }

    #[test]
    fn save_groups_repairs_missing_ids() {
        let service = service();
        let mut group = Group::new(Some("Work".to_string()), vec![project("", "Api")]);
        group.id.clear();

        service.save_groups(vec![group]).expect("save");
        let groups = service.get_groups().expect("read");
        assert!(groups[0].id.starts_with("work"));
        assert!(groups[0].projects[0].id.starts_with("api"));
    }

    #[test]
    fn save_groups_regenerates_repeated_ids() {
        let service = service();
        let first = Group {
            id: "g1".to_string(),
            group_name: Some("One".to_string()),
            collapsed: false,
            projects: vec![project("dup", "Api")],
        };
        let second = Group {
            id: "g1".to_string(),
            group_name: Some("Two".to_string()),
            collapsed: false,
            projects: vec![project("dup", "Web"), project("p3", "Docs")],
        };

        service.save_groups(vec![first, second]).expect("save");

        let groups = service.get_groups().expect("read");
        assert_eq!(groups[0].id, "g1");
        assert_ne!(groups[1].id, "g1");
        assert!(groups[1].id.starts_with("two"));
        assert_eq!(groups[0].projects[0].id, "dup");
        assert_ne!(groups[1].projects[0].id, "dup");
        assert!(groups[1].projects[0].id.starts_with("web"));
        assert_eq!(groups[1].projects[1].id, "p3");
    }

    #[test]
    fn hand_edited_fields_survive_a_later_mutation() {
        let global = MemoryStore::with_values([(
            "projects",
            json!([
                {
                    "id": "g1",
                    "groupName": "Edited",
                    "collapsed": "yes",
                    "projects": [
                        { "id": "p1", "name": "One", "path": "/one" },
                        { "id": "p2", "name": "Two", "path": "/two" }
                    ]
                },
                {
                    "id": "g2",
                    "groupName": null,
                    "projects": [{ "id": "p3", "name": "Three", "path": "/three", "color": 7 }]
                }
            ]),
        )]);
        let backends = StorageBackends::new(Arc::new(global), Arc::new(MemoryStore::new()));
        let service = service_on(backends.clone(), DashboardSettings::default());

        service
            .add_project(project("new", "Fresh"), Some("g2"))
            .expect("add");

        let stored = backends
            .read_groups(BackendKind::GlobalState, true)
            .expect("raw")
            .expect("written");
        assert_eq!(stored[0]["id"], json!("g1"));
        assert_eq!(stored[0]["collapsed"], json!(false));
        assert_eq!(stored[0]["projects"].as_array().map(Vec::len), Some(2));
        assert_eq!(stored[1]["projects"][0]["id"], json!("p3"));
        assert_eq!(stored[1]["projects"][0]["color"], Value::Null);
        assert_eq!(stored[1]["projects"][1]["id"], json!("new"));
    }

    #[test]
    fn malformed_store_reads_as_empty() {
        let global = MemoryStore::with_values([("projects", json!({ "oops": true }))]);
        let backends = StorageBackends::new(Arc::new(global), Arc::new(MemoryStore::new()));
        let service = service_on(backends, DashboardSettings::default());
        assert!(service.get_groups().expect("read").is_empty());
    }

    #[test]
    fn active_backend_is_read_on_every_call() {
        let backends = StorageBackends::in_memory();
        let use_settings = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&use_settings);
        let settings: Arc<dyn SettingsSource> = Arc::new(move || DashboardSettings {
            store_projects_in_settings: flag.load(std::sync::atomic::Ordering::SeqCst),
            ..DashboardSettings::default()
        });
        let colors = Arc::new(ColorService::new(backends.clone(), Arc::clone(&settings)));
        let service = ProjectService::new(backends.clone(), settings, colors);

        service.add_project(project("p1", "Api"), None).expect("add");
        use_settings.store(true, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(service.active_backend(), BackendKind::Settings);
        assert!(service.get_groups().expect("read").is_empty());

        assert!(service.migrate_if_needed().expect("migrate"));
        assert_eq!(service.get_projects_flat().expect("flat").len(), 1);
        assert!(backends
            .read_groups(BackendKind::GlobalState, true)
            .expect("source")
            .is_some());
    }
}
