//! Import model types
//!
//! These types describe what gets written to the content store: vocabularies,
//! tags and nodes together with their field descriptors. The JSON input format
//! is a direct serialization of [`ImportData`].

use serde::{Deserialize, Deserializer, Serialize};

/// Entity type a reference field points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Node,
    TaxonomyTerm,
    File,
}

impl ReferenceKind {
    /// Node and term references are written after all entities exist
    pub fn is_deferred(self) -> bool {
        matches!(self, ReferenceKind::Node | ReferenceKind::TaxonomyTerm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Node => "node",
            ReferenceKind::TaxonomyTerm => "taxonomy_term",
            ReferenceKind::File => "file",
        }
    }
}

/// A single value of a field.
///
/// Variant order matters for untagged deserialization: a body accepts any
/// object, so it has to come last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Literal text, a formatted date, or the uuid of a referenced node/term
    Text(String),
    /// A tag addressed by vocabulary id and name
    Tag { vid: String, name: String },
    /// A link or file path with an optional title
    Link {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// Formatted long text with summary
    Body {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        summary: Option<String>,
        #[serde(default = "default_body_format")]
        format: String,
    },
}

fn default_body_format() -> String {
    "full_html".to_string()
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn tag(vid: impl Into<String>, name: impl Into<String>) -> Self {
        FieldValue::Tag {
            vid: vid.into(),
            name: name.into(),
        }
    }

    /// True for a body without content, which is never written
    pub fn is_empty_body(&self) -> bool {
        matches!(self, FieldValue::Body { value: None, .. })
    }
}

/// One field of a vocabulary term or node, ready to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub field_name: String,
    #[serde(rename = "value", deserialize_with = "one_or_many")]
    pub values: Vec<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ReferenceKind>,
}

impl FieldDescriptor {
    pub fn new(field_name: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self {
            field_name: field_name.into(),
            values,
            references: None,
        }
    }

    pub fn referencing(mut self, kind: ReferenceKind) -> Self {
        self.references = Some(kind);
        self
    }

    /// Field name as stored, cut to at most `max_len` characters
    pub fn storage_name(&self, max_len: usize) -> &str {
        storage_name(&self.field_name, max_len)
    }
}

/// Cut a field name to at most `max_len` characters
pub fn storage_name(name: &str, max_len: usize) -> &str {
    match name.char_indices().nth(max_len) {
        Some((end, _)) => &name[..end],
        None => name,
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<FieldValue>),
        One(FieldValue),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(values) => values,
        OneOrMany::One(value) => vec![value],
    })
}

/// A taxonomy term to create inside a vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    pub name: String,
    #[serde(default)]
    pub uuid: Option<String>,
    /// Parent tags, by uuid or by name within the same vocabulary
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl TagRequest {
    /// The stable identifier used to find the tag again on later imports
    pub fn uuid_in(&self, vid: &str) -> String {
        self.uuid
            .clone()
            .filter(|uuid| !uuid.is_empty())
            .unwrap_or_else(|| format!("{vid}/{}", self.name))
    }
}

/// A vocabulary together with its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyRequest {
    pub vid: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<TagRequest>,
}

/// A content record to create or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub bundle: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl NodeRequest {
    /// Nodes without an explicit uuid are identified by their title
    pub fn effective_uuid(&self) -> &str {
        self.uuid
            .as_deref()
            .filter(|uuid| !uuid.is_empty())
            .unwrap_or(&self.title)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.field_name == name)
    }
}

/// Normalized content of an import file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportData {
    #[serde(default)]
    pub vocabularies: Vec<VocabularyRequest>,
    #[serde(default)]
    pub nodes: Vec<NodeRequest>,
}
