pub mod app_settings;
pub mod color_history;
pub mod common;
pub mod frontend_messages;
pub mod project_groups;
pub mod project_open;
pub mod project_storage;
