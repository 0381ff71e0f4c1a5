mod color_names;
mod color_runtime;

pub use color_names::{ColorMatch, ColorNameSource, NamedColorTable};
pub use color_runtime::ColorService;
