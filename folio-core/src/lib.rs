//! Core wiki engine for folio
//!
//! This crate turns a document, a map of part slugs to wiki text, into one
//! cross-linked HTML article: numbered sections, a table of contents,
//! footnotes, citations with a bibliography, cross-references and a tag
//! index.

pub mod bibliography;
pub mod blocks;
pub mod config;
pub mod counters;
pub mod cross_references;
pub mod demo;
pub mod document;
pub mod error;
pub mod footnotes;
pub mod functions;
pub mod geometry;
pub mod grammar;
pub mod index;
pub mod inline;
pub mod isolate;
pub mod metadata;
pub mod outline;
pub mod placeholders;
pub mod settings;
pub mod slug;
pub mod store;
pub mod text;
pub mod wiki;

pub use config::{default_counters, ConfigError, EngineConfig};
pub use document::{canonicalize_part, export_text, extract_title_data, import_text, outline};
pub use error::{ContentProblem, Result, WikiError};
pub use metadata::{compile_metadata, is_index_part, is_published, split_author};
pub use outline::Outline;
pub use settings::Settings;
pub use slug::slugify;
pub use store::{DocumentStore, MemoryStore, StoreError};
pub use wiki::{render, RenderOptions, Wiki};

// Re-export types
pub use folio_types::*;
