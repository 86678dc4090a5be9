//! CLI command implementations.

pub mod bundle;
pub mod canonicalize;
pub mod metadata;
pub mod outline;
pub mod render;

pub use bundle::{export_document, import_document};
pub use canonicalize::canonicalize_file;
pub use metadata::show_metadata;
pub use outline::show_outline;
pub use render::{render_document, RenderArgs};
