//! File handlers and format dispatch
//!
//! A [`FileHandler`] opens one input format and yields an [`ImportSource`],
//! which feeds vocabularies and nodes to the [`Importer`]. The
//! [`HandlerRegistry`] picks the handler by file extension.

use std::path::Path;

use thiserror::Error;

use crate::config::ImportConfig;
use crate::graph::RdfSyntax;
use crate::importer::{ImportResult, Importer};
use crate::json_handler::JsonHandler;
use crate::owl_handler::OwlHandler;

/// Errors that can occur while reading an input file
#[derive(Error, Debug)]
pub enum IoError {
    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type for file handling
pub type IoResult<T> = Result<T, IoError>;

/// Parsed content of an input file, ready to be imported
pub trait ImportSource {
    /// Create vocabularies and their tags
    fn import_vocabularies(&self, importer: &mut Importer<'_>) -> ImportResult<()>;

    /// Create nodes; reference fields are queued in the importer
    fn import_nodes(&self, importer: &mut Importer<'_>) -> ImportResult<()>;
}

/// A handler parses one input format
pub trait FileHandler {
    /// Parse the input file. Malformed input fails here, before anything is
    /// written.
    fn open(&self, input: &Path, config: &ImportConfig) -> IoResult<Box<dyn ImportSource>>;

    /// File extensions this handler can open (e.g., ["ttl", "turtle"])
    fn supported_extensions(&self) -> &[&str];

    /// Check if this handler can open the given file extension
    fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Registry of available file handlers
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn FileHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Create a registry with all default handlers registered
    ///
    /// Currently registers:
    /// - `JsonHandler` (json)
    /// - `OwlHandler` for RDF/XML (owl, rdf, xml), Turtle (ttl, turtle) and
    ///   N-Triples (nt)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(JsonHandler::new()));
        registry.register(Box::new(OwlHandler::new(
            RdfSyntax::RdfXml,
            &["owl", "rdf", "xml"],
        )));
        registry.register(Box::new(OwlHandler::new(RdfSyntax::Turtle, &["ttl", "turtle"])));
        registry.register(Box::new(OwlHandler::new(RdfSyntax::NTriples, &["nt"])));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn FileHandler>) {
        self.handlers.push(handler);
    }

    /// Find a handler for the given file extension
    pub fn handler_for_extension(&self, ext: &str) -> Option<&dyn FileHandler> {
        self.handlers
            .iter()
            .find(|h| h.supports_extension(ext))
            .map(|h| h.as_ref())
    }

    /// Get file extension from a path
    pub fn extension_from_path(path: &Path) -> Option<&str> {
        path.extension().and_then(|e| e.to_str())
    }

    /// Find a handler for the given path based on its extension
    pub fn handler_for_path(&self, path: &Path) -> IoResult<&dyn FileHandler> {
        let ext = Self::extension_from_path(path)
            .ok_or_else(|| IoError::UnknownExtension(path.display().to_string()))?;

        self.handler_for_extension(ext)
            .ok_or_else(|| IoError::UnsupportedFormat(ext.to_string()))
    }

    /// Open the file with the matching handler
    pub fn open(&self, path: &Path, config: &ImportConfig) -> IoResult<Box<dyn ImportSource>> {
        self.handler_for_path(path)?.open(path, config)
    }
}
