mod settings_runtime;
mod settings_scope;

pub use settings_runtime::{
    load_settings, save_settings, DashboardSettings, SettingsSource, StoreSettingsSource,
};
pub use settings_scope::resolve_data_dir;
