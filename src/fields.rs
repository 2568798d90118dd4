//! Field resolution
//!
//! Turns the values of one property on one resource into a field descriptor.
//! Values are ordered by their reifying axioms (`ref_num`), literals are
//! formatted, and resource values are classified into node, file, taxonomy
//! term or inline entity values. Unresolvable values are reported to the
//! [`Warnings`] collector and dropped.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::graph::{
    Literal, OWL_ANNOTATED_PROPERTY, OWL_ANNOTATED_SOURCE, OWL_ANNOTATED_TARGET, Term, local_name,
};
use crate::model::{FieldDescriptor, FieldValue, ReferenceKind, storage_name};
use crate::navigator::Navigator;
use crate::store::{ContentStore, EntityType};
use crate::warnings::Warnings;

/// Resolves properties of ontology resources into field descriptors
pub struct FieldResolver<'n, 'g> {
    nav: &'n Navigator<'g>,
    max_field_name_length: usize,
}

impl<'n, 'g> FieldResolver<'n, 'g> {
    pub fn new(nav: &'n Navigator<'g>, max_field_name_length: usize) -> Self {
        Self {
            nav,
            max_field_name_length,
        }
    }

    /// Resolve `property` of `subject` into at most one field.
    ///
    /// Literal values take precedence: a property with any literal value is a
    /// literal field. Returns `None` when no value survives resolution.
    pub fn resolve(
        &self,
        entity_type: EntityType,
        subject: &Term,
        property: &str,
        store: &dyn ContentStore,
        warnings: &mut Warnings,
    ) -> Option<FieldDescriptor> {
        let graph = self.nav.graph();
        let values: Vec<&'g Term> = graph.objects(subject, property).collect();
        if values.is_empty() {
            return None;
        }

        let axioms = self.axioms_for(subject, property);
        if values.iter().any(|v| v.as_literal().is_some()) {
            let literals = ordered(&axioms, values.into_iter().filter(|v| !v.is_resource()));
            let values = literals
                .into_iter()
                .filter_map(|term| Some(self.literal_value(term.as_literal()?, &axioms)))
                .collect();
            return Some(FieldDescriptor::new(local_name(property), values));
        }

        let targets = ordered(&axioms, values.into_iter());
        self.resource_field(entity_type, subject, property, targets, &axioms, store, warnings)
    }

    /// Axioms annotating `subject property ?`, ordered by `ref_num`.
    ///
    /// An axiom without `ref_num` takes the previous axiom's number plus one;
    /// a later axiom with the same number replaces an earlier one.
    pub fn axioms_for(&self, subject: &Term, property: &str) -> Vec<Axiom<'g>> {
        let graph = self.nav.graph();
        let duo = self.nav.vocabulary();

        let mut by_number: BTreeMap<i64, Axiom<'g>> = BTreeMap::new();
        let mut previous = 0;
        for axiom in graph.subjects_with(OWL_ANNOTATED_SOURCE, subject) {
            let annotates_property = graph
                .objects(axiom, OWL_ANNOTATED_PROPERTY)
                .any(|p| p.as_iri() == Some(property));
            if !annotates_property {
                continue;
            }
            let Some(target) = graph.objects(axiom, OWL_ANNOTATED_TARGET).next() else {
                continue;
            };

            let number = graph
                .property(axiom, &duo.ref_num)
                .and_then(|n| n.parse::<i64>().ok())
                .unwrap_or(previous + 1);
            by_number.insert(
                number,
                Axiom {
                    node: axiom,
                    target,
                },
            );
            previous = number;
        }
        by_number.into_values().collect()
    }

    fn literal_value(&self, literal: &Literal, axioms: &[Axiom<'g>]) -> FieldValue {
        if literal.is_date_time() {
            return FieldValue::text(format_date(&literal.lexical));
        }

        let title = axioms
            .iter()
            .find(|a| a.target.as_literal().is_some_and(|t| t.lexical == literal.lexical))
            .and_then(|a| self.nav.graph().property(a.node, &self.nav.vocabulary().title));
        match title {
            Some(title) => FieldValue::Link {
                uri: literal.lexical.trim().to_string(),
                title: Some(title),
            },
            None => FieldValue::text(literal.lexical.trim()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resource_field(
        &self,
        entity_type: EntityType,
        subject: &Term,
        property: &str,
        targets: Vec<&'g Term>,
        axioms: &[Axiom<'g>],
        store: &dyn ContentStore,
        warnings: &mut Warnings,
    ) -> Option<FieldDescriptor> {
        let nav = self.nav;
        let duo = nav.vocabulary();
        let field_name = local_name(property);
        let target_type =
            store.field_target_type(entity_type, storage_name(field_name, self.max_field_name_length));

        let mut values = Vec::new();
        let mut kind: Option<Option<ReferenceKind>> = None;

        for target in targets {
            let (value, value_kind) = if nav.falls_under(target, &duo.node)
                && target_type == Some(ReferenceKind::Node)
            {
                (FieldValue::text(target.value()), Some(ReferenceKind::Node))
            } else if nav.falls_under(target, &duo.file) {
                let uri = nav.file_path_for(target).unwrap_or_default();
                let title = nav.graph().property(target, &duo.alt);
                (FieldValue::Link { uri, title }, Some(ReferenceKind::File))
            } else if let (Some(vocabulary), Some(ReferenceKind::TaxonomyTerm)) =
                (nav.vocabulary_for_tag(target), target_type)
            {
                let vid = nav.vid(vocabulary);
                let name = nav.title(target);
                if store.find_term(&vid, &name).is_none() {
                    warnings.push(format!(
                        "Non-existing tag '{name}' in vocabulary '{vid}' referenced by '{}' and property '{field_name}'.",
                        subject.local_name()
                    ));
                    return None;
                }
                (FieldValue::tag(vid, name), Some(ReferenceKind::TaxonomyTerm))
            } else if nav.is_transitive_instance_of(target, &duo.entity) {
                match self.entity_value(target, axioms) {
                    Some(value) => (FieldValue::text(value), None),
                    None => {
                        warnings.push(format!(
                            "Entity '{}' by '{}' referenced but no field given. ('{field_name}')",
                            target.local_name(),
                            subject.local_name()
                        ));
                        continue;
                    }
                }
            } else if store.find_node_by_uuid(target.value()).is_some() {
                (FieldValue::text(target.value()), Some(ReferenceKind::Node))
            } else {
                warnings.push(format!(
                    "Non-existing entity '{}' referenced by '{}' and property '{field_name}'.",
                    target.local_name(),
                    subject.local_name()
                ));
                continue;
            };

            match kind {
                None => kind = Some(value_kind),
                Some(existing) if existing != value_kind => {
                    warnings.push(format!(
                        "Mixed reference types in property '{field_name}' of '{}', dropped '{}'.",
                        subject.local_name(),
                        target.local_name()
                    ));
                    continue;
                }
                Some(_) => {}
            }
            values.push(value);
        }

        if values.is_empty() {
            return None;
        }
        let field = FieldDescriptor::new(field_name, values);
        Some(match kind.flatten() {
            Some(kind) => field.referencing(kind),
            None => field,
        })
    }

    /// Inline value of an entity target: the target's property named by the
    /// `field` annotation of the axiom pointing at it
    fn entity_value(&self, target: &Term, axioms: &[Axiom<'g>]) -> Option<String> {
        let graph = self.nav.graph();
        let duo = self.nav.vocabulary();

        let axiom = axioms.iter().find(|a| a.target == target)?;
        let selector = graph.objects(axiom.node, &duo.field).last()?;

        match selector {
            Term::Iri(iri) => graph.property(target, iri),
            other => {
                let name = other.value().trim();
                graph
                    .triples_of(target)
                    .filter(|t| t.predicate == name || local_name(&t.predicate) == name)
                    .last()
                    .map(|t| t.object.value().trim().to_string())
            }
        }
    }
}

/// A reified statement about one value of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axiom<'g> {
    pub node: &'g Term,
    pub target: &'g Term,
}

/// Axiom targets of the same kind as `values` first, then the values no axiom
/// covers, in graph order
fn ordered<'g>(axioms: &[Axiom<'g>], values: impl Iterator<Item = &'g Term>) -> Vec<&'g Term> {
    let values: Vec<&'g Term> = values.collect();
    let literal_values = values.first().is_some_and(|v| !v.is_resource());

    let mut result: Vec<&'g Term> = axioms
        .iter()
        .map(|a| a.target)
        .filter(|t| t.is_resource() != literal_values)
        .collect();
    for value in values {
        if !result.iter().any(|r| r.same_value(value)) {
            result.push(value);
        }
    }
    result
}

/// Render an `xsd:dateTime`/`xsd:date` lexical form as `YYYY-MM-DD`
fn format_date(lexical: &str) -> String {
    let lexical = lexical.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(lexical) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(lexical, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(lexical, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    lexical.to_string()
}
