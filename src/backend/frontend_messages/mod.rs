mod messages_runtime;
mod messages_scope;

pub use messages_runtime::handle_dashboard_message;
pub use messages_scope::{DashboardMessage, DashboardMessageResponse};
