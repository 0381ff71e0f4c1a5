use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::backend::common::constants::{DEFAULT_RECENT_COLORS_TO_REMEMBER, SETTINGS_KEYS};
use crate::backend::project_storage::KeyValueStore;
use crate::error::{DashboardError, DashboardResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    #[serde(default)]
    pub store_projects_in_settings: bool,
    #[serde(default = "default_recent_colors_to_remember")]
    pub recent_colors_to_remember: usize,
    #[serde(default)]
    pub add_new_projects_to_front: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            store_projects_in_settings: false,
            recent_colors_to_remember: default_recent_colors_to_remember(),
            add_new_projects_to_front: false,
        }
    }
}

fn default_recent_colors_to_remember() -> usize {
    DEFAULT_RECENT_COLORS_TO_REMEMBER
}

/// Accessor for the current settings. Services call it on every operation
/// so a toggled flag takes effect immediately.
pub trait SettingsSource: Send + Sync {
    fn current(&self) -> DashboardSettings;
}

impl<F> SettingsSource for F
where
    F: Fn() -> DashboardSettings + Send + Sync,
{
    fn current(&self) -> DashboardSettings {
        self()
    }
}

/// Reads settings from the configuration store, next to `projectData`.
pub struct StoreSettingsSource {
    store: Arc<dyn KeyValueStore>,
}

impl StoreSettingsSource {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl SettingsSource for StoreSettingsSource {
    fn current(&self) -> DashboardSettings {
        load_settings(self.store.as_ref()).unwrap_or_else(|error| {
            tracing::warn!(error = %error, "falling back to default dashboard settings");
            DashboardSettings::default()
        })
    }
}

pub fn load_settings(store: &dyn KeyValueStore) -> DashboardResult<DashboardSettings> {
    let mut fields = Map::new();
    for key in SETTINGS_KEYS {
        if let Some(value) = store.get(key)?.filter(|value| !value.is_null()) {
            fields.insert(key.to_string(), value);
        }
    }

    serde_json::from_value::<DashboardSettings>(Value::Object(fields))
        .map_err(|error| DashboardError::validation(format!("Failed to parse dashboard settings: {error}")))
}

pub fn save_settings(store: &dyn KeyValueStore, settings: &DashboardSettings) -> DashboardResult<()> {
    let value = serde_json::to_value(settings).map_err(|error| {
        DashboardError::storage(format!("Failed to serialize dashboard settings: {error}"))
    })?;
    let Value::Object(fields) = value else {
        return Err(DashboardError::storage(
            "Dashboard settings must serialize to an object.",
        ));
    };

    for (key, value) in fields {
        store.update(&key, Some(value))?;
    }
    Ok(())
}
