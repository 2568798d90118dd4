//! Built-in ontology vocabulary
//!
//! The importer understands a small set of classes and annotation properties
//! from a fixed namespace. Domain classes subclass the built-in classes and
//! domain properties subproperty the three field markers.

/// Default namespace of the built-in vocabulary
pub const DEFAULT_NAMESPACE: &str = "http://www.lha.org/duo#";

/// Full IRIs of the built-in classes and predicates for one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub namespace: String,
    pub vocabulary: String,
    pub node: String,
    pub entity: String,
    pub file: String,
    pub title: String,
    pub alias: String,
    pub content: String,
    pub summary: String,
    pub ref_num: String,
    /// Marker for annotation-style fields, and the axiom annotation that
    /// selects which property of a referenced entity to inline
    pub field: String,
    pub literal_field: String,
    pub reference_field: String,
    pub uri: String,
    pub alt: String,
}

impl Vocabulary {
    pub fn new(namespace: &str) -> Self {
        let iri = |name: &str| format!("{namespace}{name}");
        Self {
            namespace: namespace.to_string(),
            vocabulary: iri("Vocabulary"),
            node: iri("Node"),
            entity: iri("Entity"),
            file: iri("File"),
            title: iri("title"),
            alias: iri("alias"),
            content: iri("content"),
            summary: iri("summary"),
            ref_num: iri("ref_num"),
            field: iri("field"),
            literal_field: iri("literal_field"),
            reference_field: iri("reference_field"),
            uri: iri("uri"),
            alt: iri("alt"),
        }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_namespace_builds_iris() {
        let duo = Vocabulary::default();
        assert_eq!(duo.node, "http://www.lha.org/duo#Node");
        assert_eq!(duo.ref_num, "http://www.lha.org/duo#ref_num");
        assert_eq!(duo.reference_field, "http://www.lha.org/duo#reference_field");
    }

    #[test]
    fn custom_namespace_is_respected() {
        let duo = Vocabulary::new("http://example.org/cms#");
        assert_eq!(duo.vocabulary, "http://example.org/cms#Vocabulary");
        assert_eq!(duo.namespace, "http://example.org/cms#");
    }
}
