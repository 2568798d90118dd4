//! JSON input files
//!
//! The JSON format is a direct serialization of [`ImportData`]:
//!
//! ```json
//! {
//!   "vocabularies": [{"vid": "colors", "name": "Colors", "tags": [{"name": "Red"}]}],
//!   "nodes": [{"title": "Hello", "type": "article", "fields": []}]
//! }
//! ```

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::ImportConfig;
use crate::importer::{ImportResult, Importer};
use crate::io::{FileHandler, ImportSource, IoError, IoResult};
use crate::model::ImportData;

pub struct JsonHandler;

impl JsonHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(content: &str) -> IoResult<ImportData> {
        serde_json::from_str(content).map_err(|e| IoError::Parse(e.to_string()))
    }
}

impl Default for JsonHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler for JsonHandler {
    fn open(&self, input: &Path, _config: &ImportConfig) -> IoResult<Box<dyn ImportSource>> {
        let content = fs::read_to_string(input)?;
        Ok(Box::new(Self::parse_str(&content)?))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}

impl ImportSource for ImportData {
    fn import_vocabularies(&self, importer: &mut Importer<'_>) -> ImportResult<()> {
        for vocabulary in &self.vocabularies {
            info!(vid = %vocabulary.vid, tags = vocabulary.tags.len(), "importing vocabulary");
            importer.create_vocabulary(&vocabulary.vid, &vocabulary.name)?;
            for tag in &vocabulary.tags {
                importer.create_tag(&vocabulary.vid, tag)?;
            }
            for tag in &vocabulary.tags {
                importer.set_tag_parents(&vocabulary.vid, tag)?;
            }
        }
        Ok(())
    }

    fn import_nodes(&self, importer: &mut Importer<'_>) -> ImportResult<()> {
        info!(nodes = self.nodes.len(), "importing nodes");
        for node in &self.nodes {
            importer.create_node(node)?;
        }
        Ok(())
    }
}
