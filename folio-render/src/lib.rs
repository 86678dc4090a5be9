//! # folio-render
//!
//! Page chrome for standalone folio output.
//!
//! The engine renders a document to a single `<article>`; this crate wraps it
//! in an HTML page using Askama.

pub mod templates;

pub use templates::{render_page, PageTemplate, RenderError};
