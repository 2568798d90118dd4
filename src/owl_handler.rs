//! OWL ontology input files
//!
//! Vocabularies are the direct subclasses of `Vocabulary`; every transitive
//! subclass of a vocabulary is one of its tags. Nodes are the named
//! individuals under `Node` and, when classes are imported as nodes, the
//! classes under each bundle class.

use std::path::Path;

use tracing::{debug, info};

use crate::config::{ImportConfig, ImportOptions};
use crate::fields::FieldResolver;
use crate::graph::{OntologyGraph, RdfSyntax, Term};
use crate::importer::{ImportResult, Importer};
use crate::io::{FileHandler, ImportSource, IoResult};
use crate::model::{FieldDescriptor, FieldValue, NodeRequest, ReferenceKind, TagRequest};
use crate::navigator::Navigator;
use crate::ontology::Vocabulary;
use crate::store::{ContentStore, EntityType};
use crate::warnings::Warnings;

/// Opens OWL ontologies in one RDF serialization
pub struct OwlHandler {
    syntax: RdfSyntax,
    extensions: &'static [&'static str],
}

impl OwlHandler {
    pub fn new(syntax: RdfSyntax, extensions: &'static [&'static str]) -> Self {
        Self { syntax, extensions }
    }
}

impl FileHandler for OwlHandler {
    fn open(&self, input: &Path, config: &ImportConfig) -> IoResult<Box<dyn ImportSource>> {
        let graph = OntologyGraph::parse_file(input, self.syntax)?;
        info!(triples = graph.len(), "graph parsed");
        Ok(Box::new(OwlSource::new(graph, config)))
    }

    fn supported_extensions(&self) -> &[&str] {
        self.extensions
    }
}

/// A parsed ontology together with the settings needed to map it
pub struct OwlSource {
    graph: OntologyGraph,
    duo: Vocabulary,
    body_format: String,
    max_field_name_length: usize,
}

impl OwlSource {
    pub fn new(graph: OntologyGraph, config: &ImportConfig) -> Self {
        Self {
            graph,
            duo: config.vocabulary(),
            body_format: config.body_format.clone(),
            max_field_name_length: config.max_field_name_length,
        }
    }

    /// Creation request for a single node resource, `None` if it has no bundle
    pub fn node_request(
        &self,
        resource: &Term,
        options: ImportOptions,
        store: &dyn ContentStore,
        warnings: &mut Warnings,
    ) -> Option<NodeRequest> {
        let nav = Navigator::new(&self.graph, &self.duo);
        self.assembler(&nav).node_request(resource, options, store, warnings)
    }

    /// Resources imported as nodes, in import order
    pub fn node_resources(&self, options: ImportOptions) -> Vec<Term> {
        let nav = Navigator::new(&self.graph, &self.duo);
        self.assembler(&nav)
            .node_resources(options)
            .into_iter()
            .cloned()
            .collect()
    }

    fn assembler<'n, 'g>(&'n self, nav: &'n Navigator<'g>) -> Assembler<'n, 'g> {
        Assembler {
            nav,
            resolver: FieldResolver::new(nav, self.max_field_name_length),
            properties: nav.field_properties(),
            body_format: &self.body_format,
        }
    }
}

impl ImportSource for OwlSource {
    fn import_vocabularies(&self, importer: &mut Importer<'_>) -> ImportResult<()> {
        let nav = Navigator::new(&self.graph, &self.duo);
        let assembler = self.assembler(&nav);

        for vocabulary in nav.vocabulary_classes() {
            let vid = nav.vid(vocabulary);
            info!(vid = %vid, "handling vocabulary");
            importer.create_vocabulary(&vid, &nav.title(vocabulary))?;

            let tags = nav.all_subclasses_of(vocabulary);
            info!(vid = %vid, terms = tags.len(), "collected terms");

            let mut requests = Vec::with_capacity(tags.len());
            for tag in tags {
                let (store, warnings) = importer.lookup();
                let request = assembler.tag_request(tag, store, warnings);
                importer.create_tag(&vid, &request)?;
                requests.push(request);
            }

            for request in &requests {
                importer.set_tag_parents(&vid, request)?;
            }
        }
        Ok(())
    }

    fn import_nodes(&self, importer: &mut Importer<'_>) -> ImportResult<()> {
        let nav = Navigator::new(&self.graph, &self.duo);
        let assembler = self.assembler(&nav);
        let options = importer.options();

        let resources = assembler.node_resources(options);
        info!(nodes = resources.len(), "collected nodes");

        for resource in resources {
            let (store, warnings) = importer.lookup();
            let Some(request) = assembler.node_request(resource, options, store, warnings) else {
                continue;
            };
            importer.create_node(&request)?;
        }
        Ok(())
    }
}

/// Builds tag and node requests from the ontology
struct Assembler<'n, 'g> {
    nav: &'n Navigator<'g>,
    resolver: FieldResolver<'n, 'g>,
    properties: Vec<&'g str>,
    body_format: &'n str,
}

impl<'n, 'g> Assembler<'n, 'g> {
    fn tag_request(
        &self,
        tag: &Term,
        store: &dyn ContentStore,
        warnings: &mut Warnings,
    ) -> TagRequest {
        TagRequest {
            name: self.nav.title(tag),
            uuid: Some(tag.value().to_string()),
            parents: self
                .nav
                .parent_tags(tag)
                .into_iter()
                .map(|parent| parent.value().to_string())
                .collect(),
            fields: self.swept_fields(EntityType::TaxonomyTerm, tag, store, warnings),
        }
    }

    /// Classes under each bundle class (all of them, or only leaves) when
    /// classes are imported as nodes, followed by the node individuals
    fn node_resources(&self, options: ImportOptions) -> Vec<&'g Term> {
        let nav = self.nav;
        let mut resources: Vec<&'g Term> = Vec::new();

        if options.classes_as_nodes {
            for bundle in nav.direct_subclasses_of(&Term::iri(&nav.vocabulary().node)) {
                let classes = if options.only_leaf_classes {
                    nav.leaf_subclasses_of(bundle)
                } else {
                    nav.all_subclasses_of(bundle)
                };
                for class in classes {
                    if !resources.contains(&class) {
                        resources.push(class);
                    }
                }
            }
        }

        for individual in nav.node_individuals() {
            if !resources.contains(&individual) {
                resources.push(individual);
            }
        }
        resources
    }

    fn node_request(
        &self,
        resource: &Term,
        options: ImportOptions,
        store: &dyn ContentStore,
        warnings: &mut Warnings,
    ) -> Option<NodeRequest> {
        let nav = self.nav;
        let duo = nav.vocabulary();
        let graph = nav.graph();

        let Some(bundle) = nav.bundle_for(resource) else {
            warnings.push(format!(
                "No content type found for '{}'.",
                resource.local_name()
            ));
            return None;
        };

        let mut fields = vec![FieldDescriptor::new(
            "body",
            vec![FieldValue::Body {
                value: graph.property(resource, &duo.content),
                summary: graph.property(resource, &duo.summary),
                format: self.body_format.to_string(),
            }],
        )];

        if options.classes_as_nodes && !options.only_leaf_classes {
            fields.extend(self.hierarchy_fields(resource));
        }

        if nav.falls_under(resource, &duo.vocabulary) {
            let tags: Vec<FieldValue> = nav
                .tags_of(resource)
                .into_iter()
                .map(|(vocabulary, tag)| FieldValue::tag(nav.vid(vocabulary), nav.title(tag)))
                .collect();
            if !tags.is_empty() {
                fields.push(
                    FieldDescriptor::new("field_tags", tags).referencing(ReferenceKind::TaxonomyTerm),
                );
            }
        }

        fields.extend(self.swept_fields(EntityType::Node, resource, store, warnings));

        let request = NodeRequest {
            title: nav.title(resource),
            bundle,
            uuid: Some(resource.value().to_string()),
            alias: graph.property(resource, &duo.alias),
            fields,
        };
        debug!(title = %request.title, bundle = %request.bundle, "assembled node");
        Some(request)
    }

    /// `field_parent` and, for classes, `field_child` node references
    fn hierarchy_fields(&self, resource: &Term) -> Vec<FieldDescriptor> {
        let nav = self.nav;
        let references = |name: &str, targets: Vec<&Term>| {
            let values: Vec<FieldValue> = targets
                .into_iter()
                .filter(|t| !t.is_blank())
                .map(|t| FieldValue::text(t.value()))
                .collect();
            (!values.is_empty())
                .then(|| FieldDescriptor::new(name, values).referencing(ReferenceKind::Node))
        };

        let mut fields = Vec::new();
        fields.extend(references("field_parent", nav.parent_nodes(resource)));
        if nav.is_class(resource) {
            fields.extend(references("field_child", nav.child_nodes(resource)));
        }
        fields
    }

    fn swept_fields(
        &self,
        entity_type: EntityType,
        resource: &Term,
        store: &dyn ContentStore,
        warnings: &mut Warnings,
    ) -> Vec<FieldDescriptor> {
        let graph = self.nav.graph();
        self.properties
            .iter()
            .filter(|property| graph.has_property(resource, property))
            .filter_map(|property| {
                self.resolver
                    .resolve(entity_type, resource, property, store, warnings)
            })
            .collect()
    }
}
