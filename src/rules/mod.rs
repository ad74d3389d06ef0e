//! Ontology-declared inference rules.
//!
//! A rule is the object of `sh:rule` on a node with `sh:targetClass`. Its body
//! (`sh:construct`) is parsed by [`parse`] into a pattern, optional MINT
//! bindings and a template. [`engine::RuleEngine`] applies them in order.

pub mod engine;
pub mod mint;
pub mod parse;

use std::collections::BTreeMap;
use std::fmt;

use crate::config::Vocabulary;
use crate::error::{RuleError, RuleResult};
use crate::graph::pattern::{PatternTerm, TriplePattern};
use crate::graph::{GraphStore, Iri, Term};
use crate::vocab::{self, sh};

pub use engine::{InferenceResult, InferenceStats, RuleEngine};

/// Variable bound to the focus node (`$this` / `?this`).
pub const FOCUS_VAR: &str = "this";

// ---------------------------------------------------------------------------
// Rule body
// ---------------------------------------------------------------------------

/// A template position: variable, constant, or a blank node fresh per solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateTerm {
    Var(String),
    Const(Term),
    Fresh(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTriple {
    pub subject: TemplateTerm,
    pub predicate: TemplateTerm,
    pub object: TemplateTerm,
}

/// `BIND(MINT(base, root, gloss) AS ?target)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintBind {
    pub base: Iri,
    pub root: PatternTerm,
    pub gloss: PatternTerm,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBody {
    pub pattern: Vec<TriplePattern>,
    pub binds: Vec<MintBind>,
    pub template: Vec<TemplateTriple>,
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// One rule bound to one target class.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The rule node in the ontology.
    pub id: Term,
    pub target_class: Term,
    pub order: i64,
    pub body: RuleBody,
}

impl Rule {
    /// A short display name: the local name of an IRI rule node, else its N-Triples form.
    pub fn name(&self) -> String {
        rule_name(&self.id)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (order {})", self.name(), self.order)
    }
}

fn rule_name(id: &Term) -> String {
    match id {
        Term::Iri(iri) => iri.local_name().to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

/// Every active rule of an ontology, sorted for application.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Collect and parse the rules declared in `graph`.
    ///
    /// Sorted ascending by `sh:order`, ties by rule node then target class.
    /// Deactivated rules are skipped.
    pub fn from_graph(graph: &GraphStore, vocabulary: &Vocabulary) -> RuleResult<Self> {
        let rule_p = Iri::new(sh::RULE);
        let target_p = Iri::new(sh::TARGET_CLASS);
        let construct_p = Iri::new(sh::CONSTRUCT);
        let order_p = Iri::new(sh::ORDER);
        let deactivated_p = Iri::new(sh::DEACTIVATED);

        let mut rules = Vec::new();
        for link in graph.matching(None, Some(&rule_p), None) {
            let shape = &link.subject;
            let id = link.object;
            let name = rule_name(&id);

            let deactivated = graph
                .value(&id, &deactivated_p)
                .and_then(Term::as_literal)
                .and_then(|l| l.as_bool())
                .unwrap_or(false);
            if deactivated {
                tracing::debug!(rule = %name, "rule deactivated, skipping");
                continue;
            }

            let targets: Vec<&Term> = graph.objects(shape, &target_p).collect();
            if targets.is_empty() {
                tracing::warn!(rule = %name, shape = %shape, "rule attached to a node without sh:targetClass, skipping");
                continue;
            }

            let construct = match graph.value(&id, &construct_p) {
                Some(Term::Literal(lit)) => lit.value(),
                Some(other) => {
                    return Err(RuleError::Definition {
                        rule: name,
                        message: format!("sh:construct must be a string, got {other}"),
                    });
                }
                None => {
                    return Err(RuleError::Definition {
                        rule: name,
                        message: "missing sh:construct".into(),
                    });
                }
            };

            let order = match graph.value(&id, &order_p) {
                None => 0,
                Some(term) => term
                    .as_literal()
                    .and_then(|l| l.as_i64())
                    .ok_or_else(|| RuleError::Definition {
                        rule: name.clone(),
                        message: format!("sh:order must be an integer, got {term}"),
                    })?,
            };

            let prefixes = declared_prefixes(graph, &id, vocabulary);
            let body = parse::parse_construct(&name, construct, &prefixes)?;

            for target in targets {
                rules.push(Rule {
                    id: id.clone(),
                    target_class: target.clone(),
                    order,
                    body: body.clone(),
                });
            }
        }

        rules.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.id.cmp(&b.id))
                .then_with(|| a.target_class.cmp(&b.target_class))
        });
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Built-in prefixes plus every `sh:prefixes / sh:declare` reachable from `rule`.
fn declared_prefixes(graph: &GraphStore, rule: &Term, vocabulary: &Vocabulary) -> BTreeMap<String, String> {
    let mut prefixes = BTreeMap::from([
        (String::new(), vocabulary.namespace.clone()),
        ("rdf".to_string(), vocab::RDF_NS.to_string()),
        ("rdfs".to_string(), vocab::RDFS_NS.to_string()),
        ("sh".to_string(), vocab::SH_NS.to_string()),
        ("xsd".to_string(), vocab::XSD_NS.to_string()),
    ]);

    let prefixes_p = Iri::new(sh::PREFIXES);
    let declare_p = Iri::new(sh::DECLARE);
    let prefix_p = Iri::new(sh::PREFIX);
    let namespace_p = Iri::new(sh::NAMESPACE);
    for holder in graph.objects(rule, &prefixes_p) {
        for decl in graph.objects(holder, &declare_p) {
            let prefix = graph.value(decl, &prefix_p).map(Term::lexical);
            let namespace = graph.value(decl, &namespace_p).map(Term::lexical);
            if let (Some(prefix), Some(namespace)) = (prefix, namespace) {
                prefixes.insert(prefix.to_string(), namespace.to_string());
            }
        }
    }
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::io::RdfSyntax;

    const RULES: &str = r#"
        @prefix : <http://example.org/ontology/> .
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

        :Shape sh:targetClass :Deal ;
            sh:rule :late , :early , :off , :unordered .

        :late a sh:SPARQLRule ; sh:order 5 ;
            sh:construct "CONSTRUCT { ?this :late 1 . } WHERE { ?this a :Deal . }" .
        :early a sh:SPARQLRule ; sh:order 1 ;
            sh:prefixes :p ;
            sh:construct "CONSTRUCT { ?this ex:early 1 . } WHERE { ?this a :Deal . }" .
        :off a sh:SPARQLRule ; sh:order 0 ; sh:deactivated true ;
            sh:construct "CONSTRUCT { ?this :off 1 . } WHERE { ?this a :Deal . }" .
        :unordered a sh:SPARQLRule ;
            sh:construct "CONSTRUCT { ?this :zero 1 . } WHERE { ?this a :Deal . }" .

        :p sh:declare [ sh:prefix "ex" ; sh:namespace "http://ex.org/"^^xsd:anyURI ] .
    "#;

    #[test]
    fn rules_sorted_and_filtered() {
        let graph = GraphStore::parse(RULES, RdfSyntax::Turtle, None).unwrap();
        let set = RuleSet::from_graph(&graph, &Vocabulary::default()).unwrap();
        let names: Vec<_> = set.rules.iter().map(Rule::name).collect();
        assert_eq!(names, ["unordered", "early", "late"]);
    }

    #[test]
    fn declared_prefixes_are_in_scope() {
        let graph = GraphStore::parse(RULES, RdfSyntax::Turtle, None).unwrap();
        let set = RuleSet::from_graph(&graph, &Vocabulary::default()).unwrap();
        let early = &set.rules[1];
        assert_eq!(
            early.body.template[0].predicate,
            TemplateTerm::Const(Term::iri("http://ex.org/early"))
        );
    }

    #[test]
    fn missing_construct_is_a_definition_error() {
        let graph = GraphStore::parse(
            r#"@prefix : <http://example.org/ontology/> .
               @prefix sh: <http://www.w3.org/ns/shacl#> .
               :S sh:targetClass :T ; sh:rule :r .
               :r sh:order 1 ."#,
            RdfSyntax::Turtle,
            None,
        )
        .unwrap();
        let err = RuleSet::from_graph(&graph, &Vocabulary::default()).unwrap_err();
        assert!(matches!(err, RuleError::Definition { .. }));
    }
}
