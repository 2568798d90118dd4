//! owl-importer - imports OWL ontologies and JSON exports into a content store.
//!
//! Classes under `Vocabulary` become vocabularies and their subclasses tags;
//! individuals (and optionally classes) under `Node` become nodes whose fields
//! are resolved from annotated ontology properties.

pub mod cli;
pub mod config;
pub mod fields;
pub mod graph;
pub mod importer;
pub mod io;
pub mod json_handler;
pub mod model;
pub mod navigator;
pub mod ontology;
pub mod owl_handler;
pub mod pipeline;
pub mod store;
pub mod warnings;

pub use config::{ImportConfig, ImportOptions};
pub use importer::{Counts, ImportError, Importer};
pub use pipeline::{ImportSummary, import_file};
pub use store::{ContentStore, MemoryStore};
