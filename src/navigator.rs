//! Class and instance hierarchy traversal
//!
//! Builds subclass/superclass adjacency lists once from the graph. All
//! transitive walks are iterative with a visited set, so subclass cycles in the
//! input terminate.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::graph::{
    OWL_ANNOTATION_PROPERTY, OWL_CLASS, OWL_DATATYPE_PROPERTY, OWL_NAMED_INDIVIDUAL,
    OWL_OBJECT_PROPERTY, OntologyGraph, RDF_TYPE, RDFS_SUBCLASS_OF, RDFS_SUBPROPERTY_OF, Term,
};
use crate::ontology::Vocabulary;

pub struct Navigator<'g> {
    graph: &'g OntologyGraph,
    duo: &'g Vocabulary,
    subclasses: HashMap<&'g Term, Vec<&'g Term>>,
    superclasses: HashMap<&'g Term, Vec<&'g Term>>,
    ancestors: RefCell<HashMap<&'g Term, HashSet<&'g Term>>>,
    tag_vocabularies: HashMap<&'g Term, &'g Term>,
}

impl<'g> Navigator<'g> {
    pub fn new(graph: &'g OntologyGraph, duo: &'g Vocabulary) -> Self {
        let mut navigator = Self {
            graph,
            duo,
            subclasses: HashMap::new(),
            superclasses: HashMap::new(),
            ancestors: RefCell::new(HashMap::new()),
            tag_vocabularies: HashMap::new(),
        };
        navigator.index_subclass_edges();
        navigator.index_tag_vocabularies();
        navigator
    }

    fn index_subclass_edges(&mut self) {
        let graph = self.graph;
        let edges = graph
            .triples()
            .filter(|t| t.predicate == RDFS_SUBCLASS_OF && t.object.is_resource());
        for triple in edges {
            let (class, superclass) = (&triple.subject, &triple.object);
            if superclass == class {
                continue;
            }
            let subs = self.subclasses.entry(superclass).or_default();
            if !subs.contains(&class) {
                subs.push(class);
            }
            let sups = self.superclasses.entry(class).or_default();
            if !sups.contains(&superclass) {
                sups.push(superclass);
            }
        }
    }

    fn index_tag_vocabularies(&mut self) {
        for vocabulary in self.vocabulary_classes() {
            for tag in self.all_subclasses_of(vocabulary) {
                self.tag_vocabularies.entry(tag).or_insert(vocabulary);
            }
        }
    }

    pub fn graph(&self) -> &'g OntologyGraph {
        self.graph
    }

    pub fn vocabulary(&self) -> &'g Vocabulary {
        self.duo
    }

    /// Classes declaring `rdfs:subClassOf class`, self-loops excluded
    pub fn direct_subclasses_of(&self, class: &Term) -> Vec<&'g Term> {
        self.subclasses.get(class).cloned().unwrap_or_default()
    }

    pub fn direct_superclasses_of(&self, class: &Term) -> Vec<&'g Term> {
        self.superclasses.get(class).cloned().unwrap_or_default()
    }

    /// All transitive subclasses in depth-first preorder, without duplicates.
    /// Blank-node class expressions are skipped.
    pub fn all_subclasses_of(&self, class: &Term) -> Vec<&'g Term> {
        self.closure(class, &self.subclasses)
            .into_iter()
            .filter(|c| !c.is_blank())
            .collect()
    }

    /// All transitive superclasses, nearest first
    pub fn all_superclasses_of(&self, class: &Term) -> Vec<&'g Term> {
        self.closure(class, &self.superclasses)
    }

    fn closure(&self, start: &Term, edges: &HashMap<&'g Term, Vec<&'g Term>>) -> Vec<&'g Term> {
        let mut result = Vec::new();
        let mut visited: HashSet<&Term> = HashSet::new();
        visited.insert(start);

        let mut stack: Vec<&'g Term> = edges.get(start).into_iter().flatten().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                continue;
            }
            result.push(next);
            if let Some(children) = edges.get(next) {
                stack.extend(children.iter().rev().copied());
            }
        }
        result
    }

    /// True if `superclass` is reachable from `class` through `rdfs:subClassOf`
    pub fn has_transitive_superclass(&self, class: &Term, superclass: &str) -> bool {
        let Some(class) = self.graph_term(class) else {
            return false;
        };
        let mut cache = self.ancestors.borrow_mut();
        let ancestors = cache
            .entry(class)
            .or_insert_with(|| self.closure(class, &self.superclasses).into_iter().collect());
        ancestors.iter().any(|a| a.as_iri() == Some(superclass))
    }

    pub fn has_direct_superclass(&self, class: &Term, superclass: &str) -> bool {
        self.direct_superclasses_of(class)
            .iter()
            .any(|s| s.as_iri() == Some(superclass))
    }

    /// True if `individual` is typed as `class` or as any transitive subclass
    /// of it. Both the direct `rdf:type` assertion and the declared type chain
    /// are checked.
    pub fn is_transitive_instance_of(&self, individual: &Term, class: &str) -> bool {
        if self.graph.is_a(individual, class) {
            return true;
        }
        self.graph
            .resources_of(individual, RDF_TYPE)
            .into_iter()
            .filter(|ty| *ty != individual)
            .any(|ty| ty.as_iri() == Some(class) || self.has_transitive_superclass(ty, class))
    }

    /// Instance or subclass of `class`, transitively. Classes imported as
    /// nodes are handled through the subclass path.
    pub fn falls_under(&self, resource: &Term, class: &str) -> bool {
        self.is_transitive_instance_of(resource, class)
            || self.has_transitive_superclass(resource, class)
    }

    /// Subclasses of `class` that have no subclasses themselves
    pub fn leaf_subclasses_of(&self, class: &Term) -> Vec<&'g Term> {
        self.all_subclasses_of(class)
            .into_iter()
            .filter(|c| self.direct_subclasses_of(c).is_empty())
            .collect()
    }

    /// Direct subclasses of the built-in `Vocabulary` class
    pub fn vocabulary_classes(&self) -> Vec<&'g Term> {
        self.direct_subclasses_of(&Term::iri(&self.duo.vocabulary))
    }

    /// The vocabulary class a tag transitively belongs to
    pub fn vocabulary_for_tag(&self, tag: &Term) -> Option<&'g Term> {
        self.tag_vocabularies.get(tag).copied()
    }

    /// Direct subclasses of `Node`, ordered by IRI
    pub fn bundle_classes(&self) -> Vec<&'g Term> {
        let mut classes = self.direct_subclasses_of(&Term::iri(&self.duo.node));
        classes.sort();
        classes
    }

    /// Bundle name of a node resource: the normalized local name of the
    /// direct `Node` subclass it falls under. Ties go to the smallest IRI.
    pub fn bundle_for(&self, resource: &Term) -> Option<String> {
        self.bundle_classes()
            .into_iter()
            .find(|bundle| {
                bundle
                    .as_iri()
                    .is_some_and(|iri| self.falls_under(resource, iri))
            })
            .map(|bundle| machine_name(bundle.local_name()))
    }

    /// Named individuals that are nodes, excluding blank nodes and direct
    /// instances of `Node` itself
    pub fn node_individuals(&self) -> Vec<&'g Term> {
        self.graph
            .all_of_type(OWL_NAMED_INDIVIDUAL)
            .into_iter()
            .filter(|ind| !ind.is_blank())
            .filter(|ind| self.is_transitive_instance_of(ind, &self.duo.node))
            .filter(|ind| !self.graph.is_a(ind, &self.duo.node))
            .collect()
    }

    /// Display title: `title` annotation, then `rdfs:label`, then local name
    pub fn title(&self, resource: &Term) -> String {
        self.graph
            .property(resource, &self.duo.title)
            .filter(|t| !t.is_empty())
            .or_else(|| self.graph.label(resource))
            .unwrap_or_else(|| resource.local_name().to_string())
    }

    /// Label or local name, used for path segments and tag names
    pub fn label_or_local_name(&self, resource: &Term) -> String {
        self.graph
            .label(resource)
            .unwrap_or_else(|| resource.local_name().to_string())
    }

    /// Relative path of a file resource.
    ///
    /// Walks the `File` subclasses the resource belongs to, outermost first,
    /// and appends the resource's `uri` annotation. For a class the direct
    /// superclasses are used, for an individual its types.
    pub fn file_path_for(&self, file: &Term) -> Option<String> {
        let uri = self.graph.property(file, &self.duo.uri);

        let superclasses = self.direct_superclasses_of(file);
        let candidates = if superclasses.is_empty() {
            self.graph.resources_of(file, RDF_TYPE)
        } else {
            superclasses
        };

        for class in candidates {
            if !self.has_transitive_superclass(class, &self.duo.file) {
                continue;
            }
            let mut segments = vec![self.label_or_local_name(class)];
            for superclass in self.all_superclasses_of(class) {
                if self.has_transitive_superclass(superclass, &self.duo.file) {
                    segments.push(self.label_or_local_name(superclass));
                }
            }
            segments.reverse();
            if let Some(uri) = &uri {
                segments.push(uri.clone());
            }
            return Some(segments.join("/"));
        }

        uri
    }

    /// Vocabulary id of a vocabulary class
    pub fn vid(&self, vocabulary: &Term) -> String {
        vocabulary.local_name().to_lowercase()
    }

    /// Parent tags of a tag: direct superclasses that lie inside the same
    /// vocabulary without being the vocabulary class itself
    pub fn parent_tags(&self, tag: &Term) -> Vec<&'g Term> {
        let vocabulary = self.vocabulary_for_tag(tag);
        self.direct_superclasses_of(tag)
            .into_iter()
            .filter(|parent| {
                !self.has_direct_superclass(parent, &self.duo.vocabulary)
                    && self.has_transitive_superclass(parent, &self.duo.vocabulary)
                    && self.vocabulary_for_tag(parent) == vocabulary
            })
            .collect()
    }

    /// Tags a node resource is classified under, as (vocabulary, tag) pairs.
    /// Both declared types and direct superclasses are considered.
    pub fn tags_of(&self, resource: &Term) -> Vec<(&'g Term, &'g Term)> {
        let mut candidates = self.graph.resources_of(resource, RDF_TYPE);
        candidates.extend(self.direct_superclasses_of(resource));

        let mut tags = Vec::new();
        for candidate in candidates {
            if let Some(vocabulary) = self.vocabulary_for_tag(candidate) {
                if !tags.contains(&(vocabulary, candidate)) {
                    tags.push((vocabulary, candidate));
                }
            }
        }
        tags
    }

    /// Node classes above a resource that are not bundles themselves: direct
    /// superclasses for a class, declared types for an individual
    pub fn parent_nodes(&self, resource: &Term) -> Vec<&'g Term> {
        let candidates = if self.is_class(resource) {
            self.direct_superclasses_of(resource)
        } else {
            self.graph.resources_of(resource, RDF_TYPE)
        };
        candidates
            .into_iter()
            .filter(|c| {
                self.has_transitive_superclass(c, &self.duo.node)
                    && !self.has_direct_superclass(c, &self.duo.node)
            })
            .collect()
    }

    /// Direct subclasses followed by direct instances of a class
    pub fn child_nodes(&self, class: &Term) -> Vec<&'g Term> {
        let mut children = self.direct_subclasses_of(class);
        for instance in self.graph.subjects_with(RDF_TYPE, class) {
            if !children.contains(&instance) {
                children.push(instance);
            }
        }
        children
    }

    /// True for resources declared as `owl:Class` or taking part in the
    /// subclass hierarchy
    pub fn is_class(&self, resource: &Term) -> bool {
        self.graph.is_a(resource, OWL_CLASS) || self.graph_term(resource).is_some()
    }

    /// Properties that map to fields: annotation properties under `field`,
    /// datatype properties under `literal_field` and object properties under
    /// `reference_field`. `content` and `summary` are synthesized separately.
    pub fn field_properties(&self) -> Vec<&'g str> {
        let markers = [
            (OWL_ANNOTATION_PROPERTY, &self.duo.field),
            (OWL_DATATYPE_PROPERTY, &self.duo.literal_field),
            (OWL_OBJECT_PROPERTY, &self.duo.reference_field),
        ];

        let mut properties = Vec::new();
        for (property_type, marker) in markers {
            for property in self.graph.all_of_type(property_type) {
                let Some(iri) = property.as_iri() else {
                    continue;
                };
                if iri == self.duo.content || iri == self.duo.summary {
                    continue;
                }
                let is_field = self
                    .graph
                    .objects(property, RDFS_SUBPROPERTY_OF)
                    .any(|sup| sup.as_iri() == Some(marker.as_str()));
                if is_field && !properties.contains(&iri) {
                    properties.push(iri);
                }
            }
        }
        properties
    }

    fn graph_term(&self, term: &Term) -> Option<&'g Term> {
        self.superclasses
            .get_key_value(term)
            .map(|(k, _)| *k)
            .or_else(|| self.subclasses.get_key_value(term).map(|(k, _)| *k))
    }
}

/// Lowercase, with every non-alphanumeric character replaced by `_`
pub fn machine_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
