//! Read-only views over the loaded ontology: status, stats, forms and lookup.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dictionary::lexeme_key;
use crate::federation::LoadSource;
use crate::graph::{Iri, Term, closure};
use crate::ontology::Ontology;
use crate::vocab::sh;

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub status: &'static str,
    pub triples: usize,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<LoadSource>,
}

pub fn status(ontology: &Ontology) -> Status {
    let report = ontology.load_report();
    Status {
        status: "ok",
        triples: ontology.graph().len(),
        degraded: report.is_some_and(|r| r.is_degraded()),
        source: report.map(|r| r.source.clone()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologyStats {
    pub shapes: usize,
    /// Instances of the role class or any of its subclasses.
    pub roles: usize,
    pub rules: usize,
    pub lemmas: usize,
    pub senses: usize,
    pub triples: usize,
}

pub fn stats(ontology: &Ontology) -> OntologyStats {
    let graph = ontology.graph();
    let vocabulary = ontology.vocabulary();
    let role_class = Term::Iri(vocabulary.role_class());
    let rules: BTreeSet<&Term> = graph
        .subjects_with(&Iri::new(sh::RULE))
        .into_iter()
        .flat_map(|shape| graph.objects(shape, &Iri::new(sh::RULE)))
        .collect();

    OntologyStats {
        shapes: graph.subjects_with(&Iri::new(sh::TARGET_CLASS)).len(),
        roles: closure::instances_of(graph, &[graph], &role_class).len(),
        rules: rules.len(),
        lemmas: ontology.dictionary().len(),
        senses: graph.subjects_with(&vocabulary.sense()).len(),
        triples: graph.len(),
    }
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub label: String,
    pub path: Iri,
    pub required: bool,
}

/// Input fields per shape, keyed by the shape's local name. Shapes without
/// usable fields are left out.
pub fn forms(ontology: &Ontology) -> BTreeMap<String, Vec<FormField>> {
    let graph = ontology.graph();
    let property_p = Iri::new(sh::PROPERTY);
    let path_p = Iri::new(sh::PATH);
    let name_p = Iri::new(sh::NAME);
    let min_count_p = Iri::new(sh::MIN_COUNT);
    let order_p = Iri::new(sh::ORDER);

    let mut out = BTreeMap::new();
    for shape in graph.subjects_with(&Iri::new(sh::TARGET_CLASS)) {
        let mut fields: Vec<(i64, FormField)> = graph
            .objects(shape, &property_p)
            .filter_map(|node| {
                let path = graph.value(node, &path_p)?.as_iri()?.clone();
                let label = graph
                    .value(node, &name_p)
                    .map(|t| t.lexical().to_string())
                    .unwrap_or_else(|| path.local_name().to_string());
                let required = graph
                    .value(node, &min_count_p)
                    .and_then(Term::as_literal)
                    .and_then(|l| l.as_i64())
                    .is_some_and(|n| n > 0);
                let order = graph
                    .value(node, &order_p)
                    .and_then(Term::as_literal)
                    .and_then(|l| l.as_i64())
                    .unwrap_or(i64::MAX);
                Some((order, FormField { label, path, required }))
            })
            .collect();
        if fields.is_empty() {
            continue;
        }
        fields.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.path.cmp(&b.1.path)));

        let name = match shape {
            Term::Iri(iri) => iri.local_name().to_string(),
            other => other.to_string(),
        };
        out.insert(name, fields.into_iter().map(|(_, f)| f).collect());
    }
    out
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sense {
    pub id: String,
    pub gloss: String,
    pub situations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lookup {
    pub verb: String,
    pub found: bool,
    pub senses: Vec<Sense>,
}

/// Senses of the lexical entries for `verb`, matched by lemma or, failing
/// that, by third-person present form. Senses without a gloss are skipped.
pub fn lookup(ontology: &Ontology, verb: &str) -> Lookup {
    let graph = ontology.graph();
    let vocabulary = ontology.vocabulary();

    let mut entries: BTreeSet<Term> = ontology.dictionary().resolve(verb).cloned().collect();
    if entries.is_empty() {
        let key = lexeme_key(verb);
        entries = graph
            .matching(None, Some(&vocabulary.present3sg()), None)
            .filter(|t| t.object.as_literal().is_some_and(|l| lexeme_key(l.value()) == key))
            .map(|t| t.subject)
            .collect();
    }

    let sense_p = vocabulary.sense();
    let gloss_p = vocabulary.gloss();
    let situation_p = vocabulary.situation();
    let mut senses: Vec<Sense> = entries
        .iter()
        .flat_map(|entry| graph.subjects(&sense_p, entry))
        .filter_map(|sense| {
            let gloss = graph.value(sense, &gloss_p)?.lexical().to_string();
            Some(Sense {
                id: local(sense),
                gloss,
                situations: graph.objects(sense, &situation_p).map(local).collect(),
            })
        })
        .collect();
    senses.sort_by(|a, b| a.id.cmp(&b.id));
    senses.dedup();

    Lookup {
        verb: verb.to_string(),
        found: !senses.is_empty(),
        senses,
    }
}

fn local(term: &Term) -> String {
    match term {
        Term::Iri(iri) => iri.local_name().to_string(),
        other => other.lexical().to_string(),
    }
}
