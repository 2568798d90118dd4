//! Writing import requests to a content store
//!
//! [`Importer`] owns the state of one import run: the ledger of created
//! entities, the table of deferred entity references, the counters reported
//! at the end, and the warning collector. Handlers feed it vocabularies, tags
//! and nodes; node and term references are only written by
//! [`Importer::resolve_references`], once every entity exists.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{DuplicatePolicy, ImportConfig, ImportOptions};
use crate::io::IoError;
use crate::model::{FieldDescriptor, FieldValue, NodeRequest, ReferenceKind, TagRequest};
use crate::store::{ContentStore, EntityId, EntityRef, EntityType, FieldItem, StoreError};
use crate::warnings::Warnings;

/// Fatal import errors. Everything recoverable goes to [`Warnings`] instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("required parameter '{0}' is missing")]
    MissingParameter(&'static str),

    #[error("{kind} with uuid '{uuid}' already exists")]
    DuplicateEntity { kind: &'static str, uuid: String },

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Entities handled during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub vocabularies: usize,
    pub terms: usize,
    pub nodes: usize,
    pub files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DeferredReference {
    entity: EntityRef,
    field: String,
    kind: ReferenceKind,
    values: Vec<FieldValue>,
}

/// Reference fields waiting for their targets to exist, keyed by
/// (entity, field). A later entry for the same key replaces the earlier one.
#[derive(Debug, Default)]
pub struct DeferredReferences {
    entries: Vec<DeferredReference>,
    index: HashMap<(EntityRef, String), usize>,
}

impl DeferredReferences {
    pub fn insert(
        &mut self,
        entity: EntityRef,
        field: &str,
        kind: ReferenceKind,
        values: Vec<FieldValue>,
    ) {
        let entry = DeferredReference {
            entity: entity.clone(),
            field: field.to_string(),
            kind,
            values,
        };
        match self.index.get(&(entity.clone(), field.to_string())) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert((entity, field.to_string()), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take(&mut self) -> Vec<DeferredReference> {
        self.index.clear();
        std::mem::take(&mut self.entries)
    }
}

/// State of one import run against a content store
pub struct Importer<'s> {
    store: &'s mut dyn ContentStore,
    config: &'s ImportConfig,
    options: ImportOptions,
    warnings: Warnings,
    ledger: Vec<EntityRef>,
    deferred: DeferredReferences,
    counts: Counts,
}

impl<'s> Importer<'s> {
    pub fn new(
        store: &'s mut dyn ContentStore,
        config: &'s ImportConfig,
        options: ImportOptions,
    ) -> Self {
        Self {
            store,
            config,
            options,
            warnings: Warnings::new(),
            ledger: Vec::new(),
            deferred: DeferredReferences::default(),
            counts: Counts::default(),
        }
    }

    pub fn options(&self) -> ImportOptions {
        self.options
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Entities created so far, oldest first
    pub fn ledger(&self) -> &[EntityRef] {
        &self.ledger
    }

    pub fn deferred(&self) -> &DeferredReferences {
        &self.deferred
    }

    /// Read access to the store together with the warning collector, for
    /// resolving fields while the importer is borrowed
    pub fn lookup(&mut self) -> (&dyn ContentStore, &mut Warnings) {
        (&*self.store, &mut self.warnings)
    }

    /// Create a vocabulary, or reuse an existing one. With overwrite on, the
    /// terms of an existing vocabulary are deleted first.
    pub fn create_vocabulary(&mut self, vid: &str, name: &str) -> ImportResult<()> {
        if vid.is_empty() {
            return Err(ImportError::MissingParameter("vid"));
        }
        if name.is_empty() {
            return Err(ImportError::MissingParameter("name"));
        }

        if !self.store.vocabulary_exists(vid) {
            self.store.create_vocabulary(vid, name)?;
            self.ledger.push(EntityRef::Vocabulary(vid.to_string()));
            self.counts.vocabularies += 1;
            info!(vid, "created vocabulary");
        } else if self.options.overwrite {
            let removed = self.store.clear_vocabulary(vid)?;
            info!(vid, removed, "cleared vocabulary");
        } else {
            debug!(vid, "reusing vocabulary");
        }
        Ok(())
    }

    /// Create or update a tag. Parents are set separately, once every tag of
    /// the vocabulary exists. Tags without a name are skipped.
    pub fn create_tag(&mut self, vid: &str, tag: &TagRequest) -> ImportResult<Option<EntityId>> {
        if vid.is_empty() {
            return Err(ImportError::MissingParameter("vid"));
        }
        if tag.name.is_empty() {
            return Ok(None);
        }

        let uuid = tag.uuid_in(vid);
        let id = match self.store.find_term_by_uuid(&uuid) {
            Some(id) => {
                self.check_duplicate("taxonomy term", &uuid)?;
                self.store.rename_term(id, &tag.name)?;
                id
            }
            None => {
                let id = self.store.create_term(vid, &tag.name, &uuid)?;
                self.ledger.push(EntityRef::TaxonomyTerm(id));
                id
            }
        };

        self.insert_fields(&EntityRef::TaxonomyTerm(id), EntityType::TaxonomyTerm, vid, &tag.fields)?;
        self.counts.terms += 1;
        Ok(Some(id))
    }

    /// Replace the parents of a tag. Parents are looked up by uuid, then by
    /// name within the vocabulary; an empty list clears them.
    pub fn set_tag_parents(&mut self, vid: &str, tag: &TagRequest) -> ImportResult<()> {
        if tag.name.is_empty() {
            return Ok(());
        }
        let Some(id) = self.store.find_term_by_uuid(&tag.uuid_in(vid)) else {
            self.warnings.push(format!(
                "Tag '{}' does not exist in vocabulary '{vid}', parents not set.",
                tag.name
            ));
            return Ok(());
        };

        let mut parents = Vec::new();
        for parent in &tag.parents {
            let found = self
                .store
                .find_term_by_uuid(parent)
                .or_else(|| self.store.find_term(vid, parent));
            match found {
                Some(parent_id) if parent_id != id => {
                    if !parents.contains(&parent_id) {
                        parents.push(parent_id);
                    }
                }
                Some(_) => {}
                None => {
                    self.warnings.push(format!(
                        "Parent tag '{parent}' of '{}' does not exist in vocabulary '{vid}'.",
                        tag.name
                    ));
                }
            }
        }
        self.store.set_term_parents(id, &parents)?;
        Ok(())
    }

    /// Create or update a node by uuid. Nodes of an unknown content type are
    /// skipped with a warning.
    pub fn create_node(&mut self, node: &NodeRequest) -> ImportResult<Option<EntityId>> {
        if node.title.is_empty() {
            return Err(ImportError::MissingParameter("title"));
        }
        if node.bundle.is_empty() {
            return Err(ImportError::MissingParameter("type"));
        }
        if !self.store.bundle_exists(&node.bundle) {
            self.warnings
                .push(format!("Content type '{}' does not exist.", node.bundle));
            return Ok(None);
        }

        let uuid = node.effective_uuid();
        let id = match self.store.find_node_by_uuid(uuid) {
            Some(id) => {
                self.check_duplicate("node", uuid)?;
                self.store.update_node_title(id, &node.title)?;
                debug!(id, uuid, "updated node");
                id
            }
            None => {
                let id =
                    self.store
                        .create_node(&node.bundle, &node.title, uuid, self.options.user_id)?;
                self.ledger.push(EntityRef::Node(id));
                id
            }
        };

        self.insert_fields(&EntityRef::Node(id), EntityType::Node, &node.bundle, &node.fields)?;

        if let Some(alias) = node.alias.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            let path = format!("/{}", alias.trim_start_matches('/'));
            self.store.delete_alias(&path)?;
            let alias_id = self.store.create_alias(&format!("/node/{id}"), &path)?;
            self.ledger.push(EntityRef::Alias(alias_id));
        }

        self.counts.nodes += 1;
        Ok(Some(id))
    }

    fn check_duplicate(&self, kind: &'static str, uuid: &str) -> ImportResult<()> {
        if self.config.duplicate_policy == DuplicatePolicy::Reject && !self.options.overwrite {
            return Err(ImportError::DuplicateEntity {
                kind,
                uuid: uuid.to_string(),
            });
        }
        Ok(())
    }

    fn insert_fields(
        &mut self,
        entity: &EntityRef,
        entity_type: EntityType,
        bundle: &str,
        fields: &[FieldDescriptor],
    ) -> ImportResult<()> {
        for field in fields {
            let name = field.storage_name(self.config.max_field_name_length);
            if !self.store.has_field(entity_type, bundle, name) {
                self.warnings
                    .push(format!("field '{name}' does not exist in '{bundle}'"));
                continue;
            }

            let items = match field.references {
                Some(kind) if kind.is_deferred() => {
                    self.deferred
                        .insert(entity.clone(), name, kind, field.values.clone());
                    continue;
                }
                Some(ReferenceKind::File) => self.file_items(&field.values)?,
                _ => plain_items(&field.values),
            };

            if !items.is_empty() {
                self.store.set_field(entity, name, items)?;
            }
        }
        Ok(())
    }

    /// File entities for the given paths, reusing existing ones by URI
    fn file_items(&mut self, values: &[FieldValue]) -> ImportResult<Vec<FieldItem>> {
        let mut items = Vec::new();
        for value in values {
            let (path, title) = match value {
                FieldValue::Link { uri, title } => (uri.as_str(), title.clone()),
                FieldValue::Text(uri) => (uri.as_str(), None),
                _ => continue,
            };
            if path.is_empty() {
                continue;
            }

            let uri = self.config.file_uri(path);
            if !self.store.file_available(&uri) {
                self.warnings.push(format!(
                    "File '{uri}' does not exist, but the URI entry was stored. Upload the file manually."
                ));
            }
            let target_id = match self.store.find_file(&uri) {
                Some(id) => id,
                None => {
                    let id = self.store.create_file(&uri, self.options.user_id)?;
                    self.ledger.push(EntityRef::File(id));
                    self.counts.files += 1;
                    id
                }
            };
            items.push(FieldItem::File { target_id, title });
        }
        Ok(items)
    }

    /// Write every deferred reference field, resolving uuids and tag names to
    /// entity ids. The table is drained; returns the number of fields written.
    pub fn resolve_references(&mut self) -> ImportResult<usize> {
        if self.deferred.is_empty() {
            return Ok(0);
        }
        let entries = self.deferred.take();
        let mut written = 0;

        for entry in entries {
            let mut items = Vec::new();
            for value in &entry.values {
                match self.resolve_target(entry.kind, value) {
                    Some(target_id) => items.push(FieldItem::Target { target_id }),
                    None => {
                        self.warnings.push(format!(
                            "Referenced {} '{}' in field '{}' does not exist.",
                            entry.kind.as_str(),
                            describe(value),
                            entry.field
                        ));
                    }
                }
            }

            if items.is_empty() {
                continue;
            }
            self.store.set_field(&entry.entity, &entry.field, items)?;
            written += 1;
        }

        debug!(written, "resolved entity references");
        Ok(written)
    }

    fn resolve_target(&self, kind: ReferenceKind, value: &FieldValue) -> Option<EntityId> {
        match (kind, value) {
            (ReferenceKind::Node, FieldValue::Text(uuid)) => self.store.find_node_by_uuid(uuid),
            (ReferenceKind::TaxonomyTerm, FieldValue::Tag { vid, name }) => {
                self.store.find_term(vid, name)
            }
            (ReferenceKind::TaxonomyTerm, FieldValue::Text(uuid)) => {
                self.store.find_term_by_uuid(uuid)
            }
            _ => None,
        }
    }

    /// Delete every entity created during this run, newest first.
    ///
    /// Best effort: failures are logged and the remaining entities are still
    /// deleted. Returns how many entities were removed.
    pub fn rollback(&mut self) -> usize {
        let mut removed = 0;
        while let Some(entity) = self.ledger.pop() {
            match self.store.delete(&entity) {
                Ok(()) => removed += 1,
                Err(err) => warn!(%entity, error = %err, "rollback failed"),
            }
        }
        info!(removed, "rolled back import");
        removed
    }

    /// Finish the run, returning the counters and the distinct warnings
    pub fn finish(self) -> (Counts, Vec<String>) {
        (self.counts, self.warnings.into_messages())
    }
}

fn plain_items(values: &[FieldValue]) -> Vec<FieldItem> {
    values
        .iter()
        .filter(|value| !value.is_empty_body())
        .filter_map(|value| match value {
            FieldValue::Text(text) => Some(FieldItem::Text {
                value: text.clone(),
            }),
            FieldValue::Tag { name, .. } => Some(FieldItem::Text {
                value: name.clone(),
            }),
            FieldValue::Link { uri, title } => Some(FieldItem::Link {
                uri: uri.clone(),
                title: title.clone(),
            }),
            FieldValue::Body {
                value,
                summary,
                format,
            } => value.as_ref().map(|value| FieldItem::Body {
                value: value.clone(),
                summary: summary.clone(),
                format: format.clone(),
            }),
        })
        .collect()
}

fn describe(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Tag { vid, name } => format!("{vid}/{name}"),
        FieldValue::Link { uri, .. } => uri.clone(),
        FieldValue::Body { .. } => "body".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Schema};

    fn store() -> MemoryStore {
        let mut schema = Schema::default();
        schema.add_node_field("article", "body", None);
        schema.add_node_field("article", "field_tags", Some(ReferenceKind::TaxonomyTerm));
        schema.add_node_field("article", "field_related", Some(ReferenceKind::Node));
        schema.add_node_field("article", "field_image", Some(ReferenceKind::File));
        schema.add_node_field("article", "field_a_really_long_property_nam", None);
        schema.add_term_field("field_code", None);
        MemoryStore::new(schema)
    }

    fn options() -> ImportOptions {
        ImportOptions::everything(7)
    }

    fn tag(name: &str, parents: &[&str]) -> TagRequest {
        TagRequest {
            name: name.to_string(),
            uuid: None,
            parents: parents.iter().map(|p| p.to_string()).collect(),
            fields: vec![],
        }
    }

    fn node(title: &str, fields: Vec<FieldDescriptor>) -> NodeRequest {
        NodeRequest {
            title: title.to_string(),
            bundle: "article".to_string(),
            uuid: None,
            alias: None,
            fields,
        }
    }

    #[test]
    fn vocabulary_is_created_once() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        importer.create_vocabulary("colors", "Colors").unwrap();
        importer.create_vocabulary("colors", "Colors").unwrap();
        assert_eq!(importer.counts().vocabularies, 1);
        assert_eq!(importer.ledger(), &[EntityRef::Vocabulary("colors".into())]);
    }

    #[test]
    fn overwrite_clears_existing_vocabulary() {
        let mut store = store();
        store.create_vocabulary("colors", "Colors").unwrap();
        store.create_term("colors", "Old", "colors/Old").unwrap();
        let config = ImportConfig::default();

        let mut opts = options();
        opts.overwrite = true;
        let mut importer = Importer::new(&mut store, &config, opts);
        importer.create_vocabulary("colors", "Colors").unwrap();
        drop(importer);

        assert_eq!(store.term_count(), 0);
    }

    #[test]
    fn missing_vid_is_fatal() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());
        assert!(matches!(
            importer.create_vocabulary("", "Colors"),
            Err(ImportError::MissingParameter("vid"))
        ));
    }

    #[test]
    fn tag_parents_resolve_by_name_and_uuid() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        importer.create_vocabulary("colors", "Colors").unwrap();
        let red = importer.create_tag("colors", &tag("Red", &[])).unwrap().unwrap();
        let warm = importer.create_tag("colors", &tag("Warm", &[])).unwrap().unwrap();
        let crimson = tag("Crimson", &["Red", "colors/Warm", "Ghost"]);
        let crimson_id = importer.create_tag("colors", &crimson).unwrap().unwrap();
        importer.set_tag_parents("colors", &crimson).unwrap();

        assert!(importer.warnings().contains(
            "Parent tag 'Ghost' of 'Crimson' does not exist in vocabulary 'colors'."
        ));
        drop(importer);
        assert_eq!(store.term(crimson_id).unwrap().parents, vec![red, warm]);
    }

    #[test]
    fn reimported_tag_without_parents_loses_old_parents() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());
        importer.create_vocabulary("colors", "Colors").unwrap();
        importer.create_tag("colors", &tag("Red", &[])).unwrap();
        let crimson = tag("Crimson", &["Red"]);
        let id = importer.create_tag("colors", &crimson).unwrap().unwrap();
        importer.set_tag_parents("colors", &crimson).unwrap();
        drop(importer);
        assert_eq!(store.term(id).unwrap().parents.len(), 1);

        let mut importer = Importer::new(&mut store, &config, options());
        let orphan = tag("Crimson", &[]);
        assert_eq!(importer.create_tag("colors", &orphan).unwrap(), Some(id));
        importer.set_tag_parents("colors", &orphan).unwrap();
        assert!(importer.warnings().is_empty());
        drop(importer);

        assert!(store.term(id).unwrap().parents.is_empty());
        assert_eq!(store.term_count(), 2);
    }

    #[test]
    fn reimporting_a_tag_updates_it() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());
        importer.create_vocabulary("colors", "Colors").unwrap();

        let mut red = tag("Red", &[]);
        red.uuid = Some("urn:red".into());
        let first = importer.create_tag("colors", &red).unwrap();
        red.name = "Scarlet".into();
        let second = importer.create_tag("colors", &red).unwrap();

        assert_eq!(first, second);
        assert_eq!(importer.counts().terms, 2);
        drop(importer);
        assert_eq!(store.term_count(), 1);
        assert_eq!(store.find_term("colors", "Scarlet"), first);
    }

    #[test]
    fn reject_policy_refuses_duplicates() {
        let mut store = store();
        store.create_node("article", "Hello", "Hello", 1).unwrap();
        let config = ImportConfig {
            duplicate_policy: DuplicatePolicy::Reject,
            ..ImportConfig::default()
        };
        let mut importer = Importer::new(&mut store, &config, options());
        let result = importer.create_node(&node("Hello", vec![]));
        assert!(matches!(result, Err(ImportError::DuplicateEntity { kind: "node", .. })));
    }

    #[test]
    fn existing_node_is_updated_by_uuid() {
        let mut store = store();
        let existing = store.create_node("article", "Old", "urn:hello", 1).unwrap();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        let mut request = node("Hello", vec![]);
        request.uuid = Some("urn:hello".into());
        assert_eq!(importer.create_node(&request).unwrap(), Some(existing));
        assert!(importer.ledger().is_empty());
        drop(importer);

        let node = store.node(existing).unwrap();
        assert_eq!(node.title, "Hello");
        assert_eq!(node.revision, 2);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn unknown_bundle_skips_node_with_warning() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        let mut request = node("About", vec![]);
        request.bundle = "page".into();
        assert_eq!(importer.create_node(&request).unwrap(), None);
        assert!(importer.warnings().contains("Content type 'page' does not exist."));
        assert_eq!(importer.counts().nodes, 0);
    }

    #[test]
    fn missing_title_is_fatal() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());
        assert!(matches!(
            importer.create_node(&node("", vec![])),
            Err(ImportError::MissingParameter("title"))
        ));
    }

    #[test]
    fn fields_are_written_truncated_and_checked() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        let fields = vec![
            FieldDescriptor::new(
                "body",
                vec![FieldValue::Body {
                    value: Some("<p>Hi</p>".into()),
                    summary: None,
                    format: "full_html".into(),
                }],
            ),
            FieldDescriptor::new(
                "field_a_really_long_property_name_from_owl",
                vec![FieldValue::text("long")],
            ),
            FieldDescriptor::new("field_unknown", vec![FieldValue::text("x")]),
        ];
        let id = importer.create_node(&node("Hello", fields)).unwrap().unwrap();
        assert!(importer
            .warnings()
            .contains("field 'field_unknown' does not exist in 'article'"));
        drop(importer);

        let node = store.node(id).unwrap();
        assert_eq!(
            node.fields["field_a_really_long_property_nam"],
            vec![FieldItem::Text {
                value: "long".into()
            }]
        );
        assert!(matches!(node.fields["body"][0], FieldItem::Body { .. }));
    }

    #[test]
    fn empty_body_is_not_written() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        let body = FieldDescriptor::new(
            "body",
            vec![FieldValue::Body {
                value: None,
                summary: None,
                format: "full_html".into(),
            }],
        );
        let id = importer.create_node(&node("Hello", vec![body])).unwrap().unwrap();
        drop(importer);
        assert!(store.node(id).unwrap().fields.is_empty());
    }

    #[test]
    fn files_are_created_once_per_uri() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        let image = |uri: &str| {
            FieldDescriptor::new(
                "field_image",
                vec![FieldValue::Link {
                    uri: uri.to_string(),
                    title: None,
                }],
            )
            .referencing(ReferenceKind::File)
        };
        importer.create_node(&node("One", vec![image("img/a.png")])).unwrap();
        importer.create_node(&node("Two", vec![image("img/a.png")])).unwrap();

        assert_eq!(importer.counts().files, 1);
        assert_eq!(importer.warnings().len(), 1);
        drop(importer);
        let file = store.find_file("public://img/a.png").unwrap();
        assert_eq!(store.file(file).unwrap().owner, 7);
        assert_eq!(store.file_count(), 1);
    }

    #[test]
    fn references_are_deferred_until_resolved() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        let related = FieldDescriptor::new("field_related", vec![FieldValue::text("Second")])
            .referencing(ReferenceKind::Node);
        let first = importer.create_node(&node("First", vec![related])).unwrap().unwrap();
        let second = importer.create_node(&node("Second", vec![])).unwrap().unwrap();
        assert_eq!(importer.deferred().len(), 1);

        assert_eq!(importer.resolve_references().unwrap(), 1);
        assert!(importer.deferred().is_empty());
        assert_eq!(importer.resolve_references().unwrap(), 0);
        drop(importer);

        assert_eq!(
            store.node(first).unwrap().fields["field_related"],
            vec![FieldItem::Target { target_id: second }]
        );
    }

    #[test]
    fn unresolved_term_references_are_warned() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());
        importer.create_vocabulary("colors", "Colors").unwrap();
        importer.create_tag("colors", &tag("Red", &[])).unwrap();

        let tags = FieldDescriptor::new(
            "field_tags",
            vec![FieldValue::tag("colors", "Red"), FieldValue::tag("colors", "Blue")],
        )
        .referencing(ReferenceKind::TaxonomyTerm);
        let id = importer.create_node(&node("Hello", vec![tags])).unwrap().unwrap();
        importer.resolve_references().unwrap();

        assert!(importer.warnings().contains(
            "Referenced taxonomy_term 'colors/Blue' in field 'field_tags' does not exist."
        ));
        drop(importer);
        assert_eq!(store.node(id).unwrap().fields["field_tags"].len(), 1);
    }

    #[test]
    fn alias_is_replaced() {
        let mut store = store();
        store.create_alias("/node/99", "/hello-world").unwrap();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        let mut request = node("Hello", vec![]);
        request.alias = Some("hello-world".into());
        let id = importer.create_node(&request).unwrap().unwrap();
        drop(importer);

        assert_eq!(store.alias_of(&format!("/node/{id}")), Some("/hello-world"));
        assert_eq!(store.alias_of("/node/99"), None);
    }

    #[test]
    fn rollback_deletes_in_reverse_order() {
        let mut store = store();
        let config = ImportConfig::default();
        let mut importer = Importer::new(&mut store, &config, options());

        importer.create_vocabulary("colors", "Colors").unwrap();
        importer.create_tag("colors", &tag("Red", &[])).unwrap();
        let mut request = node("Hello", vec![]);
        request.alias = Some("hello".into());
        importer.create_node(&request).unwrap();

        assert_eq!(importer.ledger().len(), 4);
        assert_eq!(importer.rollback(), 4);
        assert!(importer.ledger().is_empty());
        drop(importer);

        assert_eq!(store.node_count(), 0);
        assert_eq!(store.term_count(), 0);
        assert!(!store.vocabulary_exists("colors"));
    }
}
