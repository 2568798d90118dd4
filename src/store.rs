//! Content store interface
//!
//! [`ContentStore`] is everything the importer needs from the target content
//! management system. [`MemoryStore`] implements it in memory and can be
//! loaded from and saved to a `store.json` file inside a store directory.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::ReferenceKind;

pub type EntityId = u64;

/// File name of the persisted store inside the store directory
pub const STORE_FILE: &str = "store.json";

/// Directory holding the backing files of file entities
pub const FILES_DIR: &str = "files";

/// Errors raised by a content store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} does not exist")]
    Missing(EntityRef),

    #[error("vocabulary '{0}' does not exist")]
    MissingVocabulary(String),

    #[error("content type '{0}' does not exist")]
    UnknownBundle(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity types that carry fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Node,
    TaxonomyTerm,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Node => "node",
            EntityType::TaxonomyTerm => "taxonomy_term",
        }
    }
}

/// A reference to a stored entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum EntityRef {
    Vocabulary(String),
    TaxonomyTerm(EntityId),
    Node(EntityId),
    File(EntityId),
    Alias(EntityId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Vocabulary(vid) => write!(f, "vocabulary '{vid}'"),
            EntityRef::TaxonomyTerm(id) => write!(f, "taxonomy term {id}"),
            EntityRef::Node(id) => write!(f, "node {id}"),
            EntityRef::File(id) => write!(f, "file {id}"),
            EntityRef::Alias(id) => write!(f, "alias {id}"),
        }
    }
}

/// One stored field item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FieldItem {
    Text {
        value: String,
    },
    Link {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Body {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        format: String,
    },
    /// Reference to a node or taxonomy term
    Target { target_id: EntityId },
    /// Reference to a file entity
    File {
        target_id: EntityId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

/// The persistence operations the importer relies on
pub trait ContentStore {
    fn vocabulary_exists(&self, vid: &str) -> bool;

    fn create_vocabulary(&mut self, vid: &str, name: &str) -> StoreResult<()>;

    /// Delete every term of a vocabulary, returning how many were removed
    fn clear_vocabulary(&mut self, vid: &str) -> StoreResult<usize>;

    fn find_term(&self, vid: &str, name: &str) -> Option<EntityId>;

    fn find_term_by_uuid(&self, uuid: &str) -> Option<EntityId>;

    fn create_term(&mut self, vid: &str, name: &str, uuid: &str) -> StoreResult<EntityId>;

    fn rename_term(&mut self, id: EntityId, name: &str) -> StoreResult<()>;

    fn set_term_parents(&mut self, id: EntityId, parents: &[EntityId]) -> StoreResult<()>;

    fn bundle_exists(&self, bundle: &str) -> bool;

    fn find_node_by_uuid(&self, uuid: &str) -> Option<EntityId>;

    fn create_node(
        &mut self,
        bundle: &str,
        title: &str,
        uuid: &str,
        owner: u64,
    ) -> StoreResult<EntityId>;

    /// Set a new title, recorded as a new revision
    fn update_node_title(&mut self, id: EntityId, title: &str) -> StoreResult<()>;

    /// True if `field` is attached to the bundle (node) or vocabulary (term)
    fn has_field(&self, entity_type: EntityType, bundle: &str, field: &str) -> bool;

    /// Target type of a reference field, `None` for plain fields
    fn field_target_type(&self, entity_type: EntityType, field: &str) -> Option<ReferenceKind>;

    fn set_field(&mut self, entity: &EntityRef, field: &str, items: Vec<FieldItem>)
    -> StoreResult<()>;

    fn find_file(&self, uri: &str) -> Option<EntityId>;

    fn create_file(&mut self, uri: &str, owner: u64) -> StoreResult<EntityId>;

    /// True if the backing file of `uri` is present
    fn file_available(&self, uri: &str) -> bool;

    /// Remove every alias with the given path, returning how many were removed
    fn delete_alias(&mut self, alias: &str) -> StoreResult<usize>;

    fn create_alias(&mut self, source: &str, alias: &str) -> StoreResult<EntityId>;

    fn delete(&mut self, entity: &EntityRef) -> StoreResult<()>;
}

/// Storage settings of a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStorage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<ReferenceKind>,
}

/// Content types and their fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Field storages of nodes, shared by all bundles
    #[serde(default)]
    pub node_fields: BTreeMap<String, FieldStorage>,
    /// Field storages of taxonomy terms, attached to every vocabulary
    #[serde(default)]
    pub term_fields: BTreeMap<String, FieldStorage>,
    /// Bundle name -> names of the node fields attached to it
    #[serde(default)]
    pub bundles: BTreeMap<String, Vec<String>>,
}

impl Schema {
    /// Attach a node field to a bundle, creating both if needed
    pub fn add_node_field(&mut self, bundle: &str, field: &str, target: Option<ReferenceKind>) {
        self.node_fields
            .entry(field.to_string())
            .or_insert(FieldStorage {
                target_type: target,
            });
        let fields = self.bundles.entry(bundle.to_string()).or_default();
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }

    pub fn add_term_field(&mut self, field: &str, target: Option<ReferenceKind>) {
        self.term_fields.insert(
            field.to_string(),
            FieldStorage {
                target_type: target,
            },
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyRecord {
    pub vid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    pub vid: String,
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub parents: Vec<EntityId>,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub bundle: String,
    pub title: String,
    pub uuid: String,
    pub owner: u64,
    pub revision: u32,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub uri: String,
    pub owner: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub source: String,
    pub alias: String,
}

/// In-memory content store, persisted as JSON
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    next_id: EntityId,
    #[serde(default)]
    vocabularies: BTreeMap<String, VocabularyRecord>,
    #[serde(default)]
    terms: BTreeMap<EntityId, TermRecord>,
    #[serde(default)]
    nodes: BTreeMap<EntityId, NodeRecord>,
    #[serde(default)]
    files: BTreeMap<EntityId, FileRecord>,
    #[serde(default)]
    aliases: BTreeMap<EntityId, AliasRecord>,
    #[serde(skip)]
    files_root: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Open the store kept in `dir`. A directory without a store file yields
    /// an empty store.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        if !dir.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("store directory '{}' not found", dir.display()),
            )));
        }

        let path = dir.join(STORE_FILE);
        let mut store = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };
        store.files_root = Some(dir.join(FILES_DIR));
        debug!(path = %path.display(), "opened store");
        Ok(store)
    }

    /// Write the store to `store.json` in `dir`
    pub fn save(&self, dir: &Path) -> StoreResult<()> {
        let path = dir.join(STORE_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "saved store");
        Ok(())
    }

    /// Directory that file URIs are resolved against
    pub fn set_files_root(&mut self, root: impl Into<PathBuf>) {
        self.files_root = Some(root.into());
    }

    pub fn vocabulary(&self, vid: &str) -> Option<&VocabularyRecord> {
        self.vocabularies.get(vid)
    }

    pub fn vocabularies(&self) -> impl Iterator<Item = &VocabularyRecord> {
        self.vocabularies.values()
    }

    pub fn term(&self, id: EntityId) -> Option<&TermRecord> {
        self.terms.get(&id)
    }

    /// Terms of a vocabulary in creation order
    pub fn terms_in<'a>(&'a self, vid: &'a str) -> impl Iterator<Item = (EntityId, &'a TermRecord)> {
        self.terms
            .iter()
            .filter(move |(_, term)| term.vid == vid)
            .map(|(id, term)| (*id, term))
    }

    pub fn node(&self, id: EntityId) -> Option<&NodeRecord> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (EntityId, &NodeRecord)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn file(&self, id: EntityId) -> Option<&FileRecord> {
        self.files.get(&id)
    }

    pub fn alias_of(&self, source: &str) -> Option<&str> {
        self.aliases
            .values()
            .find(|a| a.source == source)
            .map(|a| a.alias.as_str())
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    fn fields_mut(
        &mut self,
        entity: &EntityRef,
    ) -> StoreResult<&mut BTreeMap<String, Vec<FieldItem>>> {
        let fields = match entity {
            EntityRef::TaxonomyTerm(id) => self.terms.get_mut(id).map(|t| &mut t.fields),
            EntityRef::Node(id) => self.nodes.get_mut(id).map(|n| &mut n.fields),
            _ => None,
        };
        fields.ok_or_else(|| StoreError::Missing(entity.clone()))
    }
}

impl ContentStore for MemoryStore {
    fn vocabulary_exists(&self, vid: &str) -> bool {
        self.vocabularies.contains_key(vid)
    }

    fn create_vocabulary(&mut self, vid: &str, name: &str) -> StoreResult<()> {
        self.vocabularies.insert(
            vid.to_string(),
            VocabularyRecord {
                vid: vid.to_string(),
                name: name.to_string(),
            },
        );
        Ok(())
    }

    fn clear_vocabulary(&mut self, vid: &str) -> StoreResult<usize> {
        if !self.vocabulary_exists(vid) {
            return Err(StoreError::MissingVocabulary(vid.to_string()));
        }
        let before = self.terms.len();
        self.terms.retain(|_, term| term.vid != vid);
        Ok(before - self.terms.len())
    }

    fn find_term(&self, vid: &str, name: &str) -> Option<EntityId> {
        self.terms
            .iter()
            .find(|(_, term)| term.vid == vid && term.name == name)
            .map(|(id, _)| *id)
    }

    fn find_term_by_uuid(&self, uuid: &str) -> Option<EntityId> {
        self.terms
            .iter()
            .find(|(_, term)| term.uuid == uuid)
            .map(|(id, _)| *id)
    }

    fn create_term(&mut self, vid: &str, name: &str, uuid: &str) -> StoreResult<EntityId> {
        if !self.vocabulary_exists(vid) {
            return Err(StoreError::MissingVocabulary(vid.to_string()));
        }
        let id = self.allocate_id();
        self.terms.insert(
            id,
            TermRecord {
                vid: vid.to_string(),
                name: name.to_string(),
                uuid: uuid.to_string(),
                parents: Vec::new(),
                fields: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    fn rename_term(&mut self, id: EntityId, name: &str) -> StoreResult<()> {
        let term = self
            .terms
            .get_mut(&id)
            .ok_or(StoreError::Missing(EntityRef::TaxonomyTerm(id)))?;
        term.name = name.to_string();
        Ok(())
    }

    fn set_term_parents(&mut self, id: EntityId, parents: &[EntityId]) -> StoreResult<()> {
        let term = self
            .terms
            .get_mut(&id)
            .ok_or(StoreError::Missing(EntityRef::TaxonomyTerm(id)))?;
        term.parents = parents.to_vec();
        Ok(())
    }

    fn bundle_exists(&self, bundle: &str) -> bool {
        self.schema.bundles.contains_key(bundle)
    }

    fn find_node_by_uuid(&self, uuid: &str) -> Option<EntityId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.uuid == uuid)
            .map(|(id, _)| *id)
    }

    fn create_node(
        &mut self,
        bundle: &str,
        title: &str,
        uuid: &str,
        owner: u64,
    ) -> StoreResult<EntityId> {
        if !self.bundle_exists(bundle) {
            return Err(StoreError::UnknownBundle(bundle.to_string()));
        }
        let id = self.allocate_id();
        self.nodes.insert(
            id,
            NodeRecord {
                bundle: bundle.to_string(),
                title: title.to_string(),
                uuid: uuid.to_string(),
                owner,
                revision: 1,
                fields: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    fn update_node_title(&mut self, id: EntityId, title: &str) -> StoreResult<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(StoreError::Missing(EntityRef::Node(id)))?;
        node.title = title.to_string();
        node.revision += 1;
        Ok(())
    }

    fn has_field(&self, entity_type: EntityType, bundle: &str, field: &str) -> bool {
        match entity_type {
            EntityType::Node => self
                .schema
                .bundles
                .get(bundle)
                .is_some_and(|fields| fields.iter().any(|f| f == field)),
            EntityType::TaxonomyTerm => self.schema.term_fields.contains_key(field),
        }
    }

    fn field_target_type(&self, entity_type: EntityType, field: &str) -> Option<ReferenceKind> {
        let storages = match entity_type {
            EntityType::Node => &self.schema.node_fields,
            EntityType::TaxonomyTerm => &self.schema.term_fields,
        };
        storages.get(field).and_then(|storage| storage.target_type)
    }

    fn set_field(
        &mut self,
        entity: &EntityRef,
        field: &str,
        items: Vec<FieldItem>,
    ) -> StoreResult<()> {
        self.fields_mut(entity)?.insert(field.to_string(), items);
        Ok(())
    }

    fn find_file(&self, uri: &str) -> Option<EntityId> {
        self.files
            .iter()
            .find(|(_, file)| file.uri == uri)
            .map(|(id, _)| *id)
    }

    fn create_file(&mut self, uri: &str, owner: u64) -> StoreResult<EntityId> {
        let id = self.allocate_id();
        self.files.insert(
            id,
            FileRecord {
                uri: uri.to_string(),
                owner,
            },
        );
        Ok(id)
    }

    fn file_available(&self, uri: &str) -> bool {
        let relative = uri.split_once("://").map_or(uri, |(_, path)| path);
        self.files_root
            .as_ref()
            .is_some_and(|root| root.join(relative).is_file())
    }

    fn delete_alias(&mut self, alias: &str) -> StoreResult<usize> {
        let before = self.aliases.len();
        self.aliases.retain(|_, record| record.alias != alias);
        Ok(before - self.aliases.len())
    }

    fn create_alias(&mut self, source: &str, alias: &str) -> StoreResult<EntityId> {
        let id = self.allocate_id();
        self.aliases.insert(
            id,
            AliasRecord {
                source: source.to_string(),
                alias: alias.to_string(),
            },
        );
        Ok(id)
    }

    fn delete(&mut self, entity: &EntityRef) -> StoreResult<()> {
        let removed = match entity {
            EntityRef::Vocabulary(vid) => {
                self.terms.retain(|_, term| &term.vid != vid);
                self.vocabularies.remove(vid).is_some()
            }
            EntityRef::TaxonomyTerm(id) => self.terms.remove(id).is_some(),
            EntityRef::Node(id) => self.nodes.remove(id).is_some(),
            EntityRef::File(id) => self.files.remove(id).is_some(),
            EntityRef::Alias(id) => self.aliases.remove(id).is_some(),
        };
        if removed {
            Ok(())
        } else {
            Err(StoreError::Missing(entity.clone()))
        }
    }
}
