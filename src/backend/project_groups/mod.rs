mod groups_runtime;
mod manual_edit;
mod reorder_runtime;

pub use groups_runtime::ProjectService;
pub use manual_edit::{parse_manual_edit_document, render_manual_edit_document};
