//! RDF graph access
//!
//! Parses OWL ontologies with sophia and copies the triples once into an owned,
//! indexed graph. Everything above this module queries the ontology through
//! [`OntologyGraph`] and never touches sophia types directly.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use sophia::api::prelude::*;
use sophia::api::term::SimpleTerm;
use sophia::turtle::parser::{nt, turtle};
use sophia::xml::parser as rdfxml;

use crate::io::{IoError, IoResult};

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_SUBPROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_NAMED_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#NamedIndividual";
pub const OWL_ANNOTATION_PROPERTY: &str = "http://www.w3.org/2002/07/owl#AnnotationProperty";
pub const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
pub const OWL_ANNOTATED_SOURCE: &str = "http://www.w3.org/2002/07/owl#annotatedSource";
pub const OWL_ANNOTATED_PROPERTY: &str = "http://www.w3.org/2002/07/owl#annotatedProperty";
pub const OWL_ANNOTATED_TARGET: &str = "http://www.w3.org/2002/07/owl#annotatedTarget";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";

/// Extract the local name (fragment or last path segment) from an IRI
pub fn local_name(iri: &str) -> &str {
    if let Some(pos) = iri.rfind('#') {
        return &iri[pos + 1..];
    }
    if let Some(pos) = iri.rfind('/') {
        return &iri[pos + 1..];
    }
    iri
}

/// Serializations the graph can be parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfSyntax {
    Turtle,
    NTriples,
    RdfXml,
}

/// A literal value with its datatype IRI and language tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    pub fn is_date_time(&self) -> bool {
        matches!(self.datatype.as_deref(), Some(XSD_DATE_TIME) | Some(XSD_DATE))
    }
}

/// An owned RDF term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    /// True for IRIs and blank nodes
    pub fn is_resource(&self) -> bool {
        !matches!(self, Term::Literal(_))
    }

    /// Local name of an IRI, the id of a blank node, or the literal text
    pub fn local_name(&self) -> &str {
        match self {
            Term::Iri(iri) => local_name(iri),
            Term::Blank(id) => id,
            Term::Literal(lit) => &lit.lexical,
        }
    }

    /// The string form used as a field value: IRI, blank node id or lexical form
    pub fn value(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::Blank(id) => id,
            Term::Literal(lit) => &lit.lexical,
        }
    }

    /// Same resource, or literals with the same lexical value
    pub fn same_value(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Literal(a), Term::Literal(b)) => a.lexical == b.lexical,
            _ => self == other,
        }
    }

    fn from_simple(term: &SimpleTerm<'_>) -> Option<Self> {
        match term {
            SimpleTerm::Iri(iri) => Some(Term::Iri(iri.to_string())),
            SimpleTerm::BlankNode(id) => Some(Term::Blank(id.as_str().to_string())),
            SimpleTerm::LiteralDatatype(lit, dt) => Some(Term::Literal(Literal {
                lexical: lit.to_string(),
                datatype: Some(dt.to_string()),
                language: None,
            })),
            SimpleTerm::LiteralLanguage(lit, tag) => Some(Term::Literal(Literal {
                lexical: lit.to_string(),
                datatype: None,
                language: Some(tag.as_str().to_string()),
            })),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(id) => write!(f, "_:{id}"),
            Term::Literal(lit) => match (&lit.language, &lit.datatype) {
                (Some(lang), _) => write!(f, "\"{}\"@{lang}", lit.lexical),
                (None, Some(dt)) => write!(f, "\"{}\"^^<{dt}>", lit.lexical),
                (None, None) => write!(f, "\"{}\"", lit.lexical),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

/// Read-only triple store indexed by subject and by (predicate, object).
///
/// Triples keep their source order, so every query returns values in the
/// order they appear in the parsed file.
#[derive(Debug, Default)]
pub struct OntologyGraph {
    triples: Vec<Triple>,
    by_subject: HashMap<Term, Vec<usize>>,
    by_predicate_object: HashMap<(String, Term), Vec<usize>>,
}

impl OntologyGraph {
    /// Parse an RDF file into a graph
    pub fn parse_file(path: &Path, syntax: RdfSyntax) -> IoResult<Self> {
        let file = File::open(path)?;
        Self::parse_reader(BufReader::new(file), syntax)
    }

    /// Parse an RDF document held in memory
    pub fn parse_str(content: &str, syntax: RdfSyntax) -> IoResult<Self> {
        Self::parse_reader(content.as_bytes(), syntax)
    }

    fn parse_reader<R: BufRead>(reader: R, syntax: RdfSyntax) -> IoResult<Self> {
        let raw: Vec<[SimpleTerm<'static>; 3]> = match syntax {
            RdfSyntax::Turtle => turtle::parse_bufread(reader)
                .collect_triples()
                .map_err(|e| IoError::Parse(e.to_string()))?,
            RdfSyntax::NTriples => nt::parse_bufread(reader)
                .collect_triples()
                .map_err(|e| IoError::Parse(e.to_string()))?,
            RdfSyntax::RdfXml => rdfxml::parse_bufread(reader)
                .collect_triples()
                .map_err(|e| IoError::Parse(e.to_string()))?,
        };

        let triples = raw.iter().filter_map(|[s, p, o]| {
            let predicate = match p {
                SimpleTerm::Iri(iri) => iri.to_string(),
                _ => return None,
            };
            Some(Triple {
                subject: Term::from_simple(s)?,
                predicate,
                object: Term::from_simple(o)?,
            })
        });

        Ok(Self::from_triples(triples))
    }

    /// Build the indexes over an ordered sequence of triples
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut graph = Self::default();
        for triple in triples {
            let index = graph.triples.len();
            graph
                .by_subject
                .entry(triple.subject.clone())
                .or_default()
                .push(index);
            graph
                .by_predicate_object
                .entry((triple.predicate.clone(), triple.object.clone()))
                .or_default()
                .push(index);
            graph.triples.push(triple);
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// All triples in source order
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// All triples with the given subject, in source order
    pub fn triples_of<'a>(&'a self, subject: &Term) -> impl Iterator<Item = &'a Triple> + use<'a> {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .map(|&i| &self.triples[i])
    }

    /// Objects of `subject predicate ?o`, in source order
    pub fn objects<'a, 'p>(
        &'a self,
        subject: &Term,
        predicate: &'p str,
    ) -> impl Iterator<Item = &'a Term> + use<'a, 'p> {
        self.triples_of(subject)
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Resource (IRI or blank node) values of a property
    pub fn resources_of<'a>(&'a self, subject: &Term, predicate: &str) -> Vec<&'a Term> {
        self.objects(subject, predicate)
            .filter(|o| o.is_resource())
            .collect()
    }

    /// Literal values of a property
    pub fn literals_of<'a>(&'a self, subject: &Term, predicate: &str) -> Vec<&'a Literal> {
        self.objects(subject, predicate)
            .filter_map(Term::as_literal)
            .collect()
    }

    pub fn has_property(&self, subject: &Term, predicate: &str) -> bool {
        self.objects(subject, predicate).next().is_some()
    }

    /// Subjects of `?s predicate object`, de-duplicated, in source order
    pub fn subjects_with(&self, predicate: &str, object: &Term) -> Vec<&Term> {
        let mut subjects: Vec<&Term> = Vec::new();
        let key = (predicate.to_string(), object.clone());
        for &i in self.by_predicate_object.get(&key).into_iter().flatten() {
            let subject = &self.triples[i].subject;
            if !subjects.contains(&subject) {
                subjects.push(subject);
            }
        }
        subjects
    }

    /// All resources declared with `rdf:type type_iri`
    pub fn all_of_type(&self, type_iri: &str) -> Vec<&Term> {
        self.subjects_with(RDF_TYPE, &Term::iri(type_iri))
    }

    /// True if `subject rdf:type class_iri` is asserted
    pub fn is_a(&self, subject: &Term, class_iri: &str) -> bool {
        self.objects(subject, RDF_TYPE)
            .any(|o| o.as_iri() == Some(class_iri))
    }

    /// Last value of a single property, trimmed
    pub fn property(&self, subject: &Term, predicate: &str) -> Option<String> {
        self.objects(subject, predicate)
            .last()
            .map(|o| o.value().trim().to_string())
    }

    /// rdfs:label of a resource
    pub fn label(&self, subject: &Term) -> Option<String> {
        self.property(subject, RDFS_LABEL)
            .filter(|label| !label.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        @prefix ex: <http://example.org/onto#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

        ex:Animal a owl:Class ; rdfs:label "Animal" .
        ex:Dog a owl:Class ; rdfs:subClassOf ex:Animal .
        ex:fido a owl:NamedIndividual, ex:Dog ;
            ex:name "Fido" , "  Rex  " ;
            ex:born "2015-03-01T10:00:00"^^xsd:dateTime ;
            ex:friend ex:rex .
    "#;

    fn sample() -> OntologyGraph {
        OntologyGraph::parse_str(SAMPLE, RdfSyntax::Turtle).expect("sample parses")
    }

    fn ex(name: &str) -> Term {
        Term::iri(format!("http://example.org/onto#{name}"))
    }

    #[test]
    fn local_name_prefers_fragment() {
        assert_eq!(local_name("http://example.org/onto#Dog"), "Dog");
        assert_eq!(local_name("http://example.org/onto/Dog"), "Dog");
        assert_eq!(local_name("Dog"), "Dog");
    }

    #[test]
    fn parses_turtle_into_indexed_graph() {
        let graph = sample();
        assert!(!graph.is_empty());
        assert!(graph.is_a(&ex("fido"), "http://example.org/onto#Dog"));
        assert!(graph.is_a(&ex("fido"), OWL_NAMED_INDIVIDUAL));
        assert!(!graph.is_a(&ex("fido"), "http://example.org/onto#Animal"));
    }

    #[test]
    fn literals_keep_source_order() {
        let graph = sample();
        let names: Vec<&str> = graph
            .literals_of(&ex("fido"), "http://example.org/onto#name")
            .iter()
            .map(|l| l.lexical.as_str())
            .collect();
        assert_eq!(names, vec!["Fido", "  Rex  "]);
    }

    #[test]
    fn property_is_last_value_trimmed() {
        let graph = sample();
        assert_eq!(
            graph.property(&ex("fido"), "http://example.org/onto#name"),
            Some("Rex".to_string())
        );
    }

    #[test]
    fn date_time_literals_are_recognised() {
        let graph = sample();
        let born = graph.literals_of(&ex("fido"), "http://example.org/onto#born");
        assert_eq!(born.len(), 1);
        assert!(born[0].is_date_time());
    }

    #[test]
    fn subjects_with_and_all_of_type() {
        let graph = sample();
        let subclasses = graph.subjects_with(RDFS_SUBCLASS_OF, &ex("Animal"));
        assert_eq!(subclasses, vec![&ex("Dog")]);

        let classes = graph.all_of_type(OWL_CLASS);
        assert_eq!(classes, vec![&ex("Animal"), &ex("Dog")]);
    }

    #[test]
    fn resources_exclude_literals() {
        let graph = sample();
        assert_eq!(
            graph.resources_of(&ex("fido"), "http://example.org/onto#friend"),
            vec![&ex("rex")]
        );
        assert!(
            graph
                .resources_of(&ex("fido"), "http://example.org/onto#name")
                .is_empty()
        );
    }

    #[test]
    fn label_reads_rdfs_label() {
        let graph = sample();
        assert_eq!(graph.label(&ex("Animal")), Some("Animal".to_string()));
        assert_eq!(graph.label(&ex("Dog")), None);
    }

    #[test]
    fn malformed_turtle_is_a_parse_error() {
        let result = OntologyGraph::parse_str("ex:broken a", RdfSyntax::Turtle);
        assert!(matches!(result, Err(IoError::Parse(_))));
    }

    #[test]
    fn term_display_round_trips_kinds() {
        assert_eq!(ex("Dog").to_string(), "<http://example.org/onto#Dog>");
        assert_eq!(Term::Blank("b0".into()).to_string(), "_:b0");
        assert_eq!(ex("Dog").local_name(), "Dog");
    }
}
