//! Storage and reconciliation core for a project dashboard: groups of project
//! shortcuts persisted in one of two key/value backends, drag-and-drop
//! reorder reconciliation, recent-color history and open-plan resolution.

pub mod backend;
mod error;
mod workspace;

use std::path::Path;
use std::sync::Arc;

pub use backend::app_settings::{
    load_settings, resolve_data_dir, save_settings, DashboardSettings, SettingsSource,
    StoreSettingsSource,
};
pub use backend::color_history::{ColorMatch, ColorNameSource, ColorService, NamedColorTable};
pub use backend::common::dtos::{Group, GroupOrder, GroupPatch, Project, ProjectPatch, RecentColor};
pub use backend::common::ids::generate_id;
pub use backend::frontend_messages::{
    handle_dashboard_message, DashboardMessage, DashboardMessageResponse,
};
pub use backend::project_groups::{
    parse_manual_edit_document, render_manual_edit_document, ProjectService,
};
pub use backend::project_open::{
    classify_local_path, parse_ssh_remote, read_workspace_manifest_folders, remote_type,
    resolve_open_plan, OpenAction, OpenPlan, ProjectPathKind, RemoteType, SshRemoteTarget,
};
pub use backend::project_storage::{
    BackendKind, JsonFileStore, KeyValueStore, MemoryStore, StorageBackends,
};
pub use error::{DashboardError, DashboardResult};

/// Wires both services over one pair of backends, with settings read from
/// the configuration store on every call.
pub struct Dashboard {
    backends: StorageBackends,
    settings: Arc<dyn SettingsSource>,
    colors: Arc<ColorService>,
    projects: ProjectService,
}

impl Dashboard {
    /// File-backed stores under `data_dir` (or the resolved default).
    pub fn open(data_dir: Option<&Path>) -> DashboardResult<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        Ok(Self::from_backends(StorageBackends::open_dir(&data_dir)))
    }

    pub fn in_memory() -> Self {
        Self::from_backends(StorageBackends::in_memory())
    }

    pub fn from_backends(backends: StorageBackends) -> Self {
        let settings: Arc<dyn SettingsSource> =
            Arc::new(StoreSettingsSource::new(backends.settings_store()));
        Self::with_settings(backends, settings)
    }

    pub fn with_settings(backends: StorageBackends, settings: Arc<dyn SettingsSource>) -> Self {
        let colors = Arc::new(ColorService::new(backends.clone(), Arc::clone(&settings)));
        let projects = ProjectService::new(backends.clone(), Arc::clone(&settings), Arc::clone(&colors));
        Self {
            backends,
            settings,
            colors,
            projects,
        }
    }

    pub fn projects(&self) -> &ProjectService {
        &self.projects
    }

    pub fn colors(&self) -> &ColorService {
        &self.colors
    }

    pub fn settings(&self) -> DashboardSettings {
        self.settings.current()
    }

    pub fn save_settings(&self, settings: &DashboardSettings) -> DashboardResult<()> {
        save_settings(self.backends.settings_store().as_ref(), settings)
    }

    pub fn handle_message(&self, raw: &str) -> DashboardMessageResponse {
        handle_dashboard_message(&self.projects, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_saved_through_the_dashboard_switch_backends() {
        let dashboard = Dashboard::in_memory();
        assert_eq!(dashboard.projects().active_backend(), BackendKind::GlobalState);

        dashboard
            .save_settings(&DashboardSettings {
                store_projects_in_settings: true,
                ..DashboardSettings::default()
            })
            .expect("save settings");

        assert!(dashboard.settings().store_projects_in_settings);
        assert_eq!(dashboard.projects().active_backend(), BackendKind::Settings);
    }

    #[test]
    fn color_history_shares_the_dashboard_backends() {
        let dashboard = Dashboard::in_memory();
        let mut project = Project::new("Site", "/nonexistent/site", Some("#00ff00".to_string()));
        project.id = "p1".to_string();
        dashboard.projects().add_project(project, None).expect("add");

        let colors = dashboard.colors().get_recent_colors().expect("colors");
        assert_eq!(colors, vec![("#00ff00".to_string(), Some("Lime".to_string()))]);
    }
}
