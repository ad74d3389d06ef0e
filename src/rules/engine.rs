//! Ordered forward-chaining over ontology ∪ request data.
//!
//! One call runs: dictionary hydration, working-context assembly, each rule
//! exactly once in ascending order (later rules see earlier derivations),
//! then removal of anything that only mentions hydration scratch nodes.
//! Any evaluation error aborts the call with no partial result.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{RuleError, RuleResult};
use crate::graph::closure;
use crate::graph::pattern::{self, Bindings, PatternTerm};
use crate::graph::{GraphStore, Iri, Term, Triple};
use crate::ontology::Ontology;
use crate::vocab;

use super::mint::{self, mint_iri};
use super::{FOCUS_VAR, MintBind, Rule, RuleSet, TemplateTerm, TemplateTriple};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Counters for one inference call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InferenceStats {
    pub input_triples: usize,
    pub lexemes: usize,
    pub hydrated_triples: usize,
    pub rules_applied: usize,
    /// New triples before scratch cleanup.
    pub derived_triples: usize,
    pub removed_scratch: usize,
    pub inferred_triples: usize,
}

#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Only the newly derived triples.
    pub delta: GraphStore,
    pub stats: InferenceStats,
}

// ---------------------------------------------------------------------------
// Rule engine
// ---------------------------------------------------------------------------

/// Applies the ontology's rules to request graphs. Holds only a shared borrow.
pub struct RuleEngine<'o> {
    ontology: &'o Ontology,
}

impl<'o> RuleEngine<'o> {
    pub fn new(ontology: &'o Ontology) -> Self {
        Self { ontology }
    }

    /// Derive new facts for `data`. Neither `data` nor the ontology is modified.
    pub fn infer(&self, data: &GraphStore) -> RuleResult<InferenceResult> {
        let ontology = self.ontology.graph();
        let vocabulary = self.ontology.vocabulary();
        let rules = RuleSet::from_graph(ontology, vocabulary)?;

        // Step 1: hydrate dictionary entries for every lexeme in the request.
        let lemma = vocabulary.lemma();
        let lexemes: BTreeSet<String> = data
            .matching(None, Some(&lemma), None)
            .filter_map(|t| t.object.as_literal().map(|l| l.value().to_string()))
            .collect();
        let dictionary = self.ontology.dictionary();
        let mut scratch = GraphStore::new();
        let mut entries = BTreeSet::new();
        for lexeme in &lexemes {
            entries.extend(dictionary.resolve(lexeme).cloned());
            scratch.merge(&dictionary.describe(ontology, lexeme));
        }
        tracing::debug!(
            input = data.len(),
            lexemes = lexemes.len(),
            hydrated = scratch.len(),
            "dictionary hydration"
        );

        // Step 2: private working context.
        let mut context = ontology.clone();
        context.merge(data);
        context.merge(&scratch);

        // Step 3: each rule once, in order.
        let mut delta = GraphStore::new();
        let mut fresh = FreshBlanks::default();
        for rule in &rules.rules {
            let derivations = self.apply(rule, &context, &mut fresh)?;
            let mut added = 0;
            for derivation in derivations {
                let mut new_triples = Vec::new();
                for triple in derivation.produced {
                    if context.insert(triple.clone()) {
                        new_triples.push(triple);
                    }
                }
                for (iri, base) in derivation.minted {
                    let term = Term::Iri(iri.clone());
                    let used = new_triples
                        .iter()
                        .any(|t| t.predicate == iri || t.mentions(&term));
                    let side = Triple::new(iri, Iri::new(vocab::RDFS_SUBPROPERTY_OF), base);
                    if used && context.insert(side.clone()) {
                        new_triples.push(side);
                    }
                }
                added += new_triples.len();
                for triple in new_triples {
                    delta.insert(triple);
                }
            }
            tracing::debug!(rule = %rule, target = %rule.target_class, added, "rule applied");
        }
        let derived = delta.len();

        // Step 5: drop derivations that mention hydration-only nodes.
        let scratch_nodes = scratch_nodes(ontology, data, &scratch, entries);
        let doomed: Vec<Triple> = delta
            .iter()
            .filter(|t| scratch_nodes.contains(&t.subject) || scratch_nodes.contains(&t.object))
            .collect();
        for triple in &doomed {
            delta.remove_triple(triple);
        }

        let stats = InferenceStats {
            input_triples: data.len(),
            lexemes: lexemes.len(),
            hydrated_triples: scratch.len(),
            rules_applied: rules.len(),
            derived_triples: derived,
            removed_scratch: doomed.len(),
            inferred_triples: delta.len(),
        };
        tracing::info!(
            input = stats.input_triples,
            lexemes = stats.lexemes,
            hydrated = stats.hydrated_triples,
            derived = stats.derived_triples,
            removed = stats.removed_scratch,
            inferred = stats.inferred_triples,
            "inference complete"
        );
        Ok(InferenceResult { delta, stats })
    }

    /// All derivations of one rule, computed against `context` as it stands.
    fn apply(&self, rule: &Rule, context: &GraphStore, fresh: &mut FreshBlanks) -> RuleResult<Vec<Derivation>> {
        let focus_nodes = closure::instances_of(context, &[context], &rule.target_class);
        let mut out = Vec::new();
        for focus in focus_nodes {
            let mut initial = Bindings::new();
            initial.insert(FOCUS_VAR.to_string(), focus);
            for mut solution in pattern::solve(context, &rule.body.pattern, initial) {
                let mut minted = Vec::new();
                for bind in &rule.body.binds {
                    let iri = evaluate_mint(rule, bind, &solution)?;
                    solution.insert(bind.target.clone(), Term::Iri(iri.clone()));
                    minted.push((iri, bind.base.clone()));
                }

                let labels = fresh.scope();
                let produced = rule
                    .body
                    .template
                    .iter()
                    .map(|t| instantiate(rule, t, &solution, &labels, fresh))
                    .collect::<RuleResult<Vec<_>>>()?;

                out.push(Derivation { produced, minted });
            }
        }
        Ok(out)
    }
}

/// One instantiated template, with the `(minted, base)` pairs it was built from.
struct Derivation {
    produced: Vec<Triple>,
    minted: Vec<(Iri, Iri)>,
}

/// Nodes that only exist because of hydration: the resolved lexical entries,
/// plus blank nodes the ontology mentions nowhere outside the hydrated facts.
/// Anything the request itself mentions is never scratch.
fn scratch_nodes(
    ontology: &GraphStore,
    data: &GraphStore,
    scratch: &GraphStore,
    entries: BTreeSet<Term>,
) -> BTreeSet<Term> {
    let blanks = scratch
        .iter()
        .flat_map(|t| [t.subject, t.object])
        .filter(Term::is_blank)
        .filter(|node| {
            ontology
                .matching(Some(node), None, None)
                .chain(ontology.matching(None, None, Some(node)))
                .all(|t| scratch.contains(&t))
        });
    entries
        .into_iter()
        .chain(blanks)
        .filter(|node| !data.mentions(node))
        .collect()
}

fn evaluate_mint(rule: &Rule, bind: &MintBind, solution: &Bindings) -> RuleResult<Iri> {
    let part = |term: &PatternTerm, what: &str| -> RuleResult<String> {
        let bound = term.resolve(solution).ok_or_else(|| RuleError::UnboundVariable {
            rule: rule.name(),
            variable: term.as_var().unwrap_or_default().to_string(),
        })?;
        mint::key_part(bound)
            .map(str::to_string)
            .ok_or_else(|| RuleError::InvalidMintKey {
                rule: rule.name(),
                message: format!("{what} is bound to blank node {bound}"),
            })
    };
    let root = part(&bind.root, "root")?;
    let gloss = part(&bind.gloss, "gloss")?;
    Ok(mint_iri(&bind.base, &root, &gloss))
}

fn instantiate(
    rule: &Rule,
    template: &TemplateTriple,
    solution: &Bindings,
    labels: &FreshScope,
    fresh: &mut FreshBlanks,
) -> RuleResult<Triple> {
    let mut resolve = |t: &TemplateTerm| -> RuleResult<Term> {
        match t {
            TemplateTerm::Const(term) => Ok(term.clone()),
            TemplateTerm::Var(name) => solution.get(name).cloned().ok_or_else(|| RuleError::UnboundVariable {
                rule: rule.name(),
                variable: name.clone(),
            }),
            TemplateTerm::Fresh(label) => Ok(fresh.get(labels, label)),
        }
    };
    let subject = resolve(&template.subject)?;
    let predicate = resolve(&template.predicate)?;
    let object = resolve(&template.object)?;

    if subject.is_literal() {
        return Err(RuleError::InvalidTriple {
            rule: rule.name(),
            message: format!("literal {subject} in subject position"),
        });
    }
    let Term::Iri(predicate) = predicate else {
        return Err(RuleError::InvalidTriple {
            rule: rule.name(),
            message: format!("non-IRI predicate {predicate}"),
        });
    };
    Ok(Triple::new(subject, predicate, object))
}

// ---------------------------------------------------------------------------
// Fresh blank nodes
// ---------------------------------------------------------------------------

/// Identifies one template instantiation; labels repeat within it, never across.
#[derive(Debug, Clone, Copy)]
struct FreshScope(u64);

/// Allocator for template blank nodes. Identifiers contain non-hex letters, so
/// they never collide with the parser's renamed blank nodes.
#[derive(Debug, Default)]
struct FreshBlanks {
    scopes: u64,
    issued: BTreeMap<(u64, String), Term>,
}

impl FreshBlanks {
    fn scope(&mut self) -> FreshScope {
        self.scopes += 1;
        FreshScope(self.scopes)
    }

    fn get(&mut self, scope: &FreshScope, label: &str) -> Term {
        let next = self.issued.len();
        self.issued
            .entry((scope.0, label.to_string()))
            .or_insert_with(|| Term::blank(format!("sgx{next}")))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Vocabulary;
    use crate::graph::io::RdfSyntax;

    const NS: &str = "http://example.org/ontology/";

    fn ontology(rules: &str) -> Ontology {
        let text = format!(
            r#"@prefix : <{NS}> .
               @prefix sh: <http://www.w3.org/ns/shacl#> .
               :Shape sh:targetClass :Deal ; sh:rule :r1 , :r2 .
               {rules}"#
        );
        let graph = GraphStore::parse(&text, RdfSyntax::Turtle, None).unwrap();
        Ontology::new(graph, Vocabulary::default())
    }

    fn data(text: &str) -> GraphStore {
        let text = format!("@prefix : <{NS}> .\n{text}");
        GraphStore::parse(&text, RdfSyntax::Turtle, None).unwrap()
    }

    #[test]
    fn template_blank_nodes_are_fresh_per_solution() {
        let ont = ontology(
            r#":r1 sh:order 1 ; sh:construct "CONSTRUCT { _:n :about ?this ; :kind :Note . } WHERE { ?this a :Deal . }" .
               :r2 sh:order 2 ; sh:construct "CONSTRUCT { ?this :seen true . } WHERE { ?this a :Deal . }" ."#,
        );
        let result = RuleEngine::new(&ont)
            .infer(&data(":d1 a :Deal . :d2 a :Deal ."))
            .unwrap();
        let about = Iri::new(format!("{NS}about"));
        let notes: BTreeSet<Term> = result
            .delta
            .matching(None, Some(&about), None)
            .map(|t| t.subject)
            .collect();
        assert_eq!(notes.len(), 2);
        for note in &notes {
            assert!(note.is_blank());
            assert_eq!(result.delta.matching(Some(note), None, None).count(), 2);
        }
        assert_eq!(result.stats.inferred_triples, 6);
    }

    #[test]
    fn later_rules_see_earlier_derivations() {
        let ont = ontology(
            r#":r1 sh:order 1 ; sh:construct "CONSTRUCT { ?b :owned true . } WHERE { ?this :buyer ?a ; :target ?b . }" .
               :r2 sh:order 2 ; sh:construct "CONSTRUCT { ?this :closed true . } WHERE { ?this :target ?b . ?b :owned true . }" ."#,
        );
        let result = RuleEngine::new(&ont)
            .infer(&data(":d a :Deal ; :buyer :g ; :target :y ."))
            .unwrap();
        assert_eq!(result.delta.len(), 2);
    }

    #[test]
    fn known_triples_never_enter_delta() {
        let ont = ontology(
            r#":r1 sh:order 1 ; sh:construct "CONSTRUCT { ?this :seen true . } WHERE { ?this a :Deal . }" .
               :r2 sh:order 2 ; sh:construct "CONSTRUCT { ?this a :Deal . } WHERE { ?this a :Deal . }" ."#,
        );
        let result = RuleEngine::new(&ont)
            .infer(&data(":d a :Deal ; :seen true ."))
            .unwrap();
        assert!(result.delta.is_empty());
    }

    #[test]
    fn evaluation_errors_abort_without_delta() {
        let ont = ontology(
            r#":r1 sh:order 1 ; sh:construct "CONSTRUCT { ?this :seen true . } WHERE { ?this a :Deal . }" .
               :r2 sh:order 2 ; sh:construct "CONSTRUCT { ?v :p ?this . } WHERE { ?this :label ?v . }" ."#,
        );
        let err = RuleEngine::new(&ont)
            .infer(&data(r#":d a :Deal ; :label "lit" ."#))
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidTriple { .. }));
    }

    #[test]
    fn sub_property_link_follows_new_minted_triples_only() {
        let ont = ontology(
            r#":r1 sh:order 1 ; sh:construct "CONSTRUCT { ?this ?m :x . } WHERE { ?this :key ?k . BIND(MINT(:rel, ?k, ?k) AS ?m) }" .
               :r2 sh:deactivated true ."#,
        );
        let minted = mint_iri(&Iri::new(format!("{NS}rel")), "k", "k");
        let link = Triple::new(minted.clone(), Iri::new(vocab::RDFS_SUBPROPERTY_OF), Iri::new(format!("{NS}rel")));

        let fresh = RuleEngine::new(&ont)
            .infer(&data(r#":d a :Deal ; :key "k" ."#))
            .unwrap();
        assert_eq!(fresh.delta.len(), 2);
        assert!(fresh.delta.contains(&link));

        let known = format!(r#":d a :Deal ; :key "k" ; <{}> :x ."#, minted.as_str());
        let result = RuleEngine::new(&ont).infer(&data(&known)).unwrap();
        assert!(result.delta.is_empty());
    }

    #[test]
    fn blank_mint_key_is_rejected() {
        let ont = ontology(
            r#":r1 sh:order 1 ; sh:construct "CONSTRUCT { ?this ?m ?this . } WHERE { ?this :key ?k . BIND(MINT(:rel, ?k, ?k) AS ?m) }" .
               :r2 sh:deactivated true ."#,
        );
        let err = RuleEngine::new(&ont)
            .infer(&data(":d a :Deal ; :key [] ."))
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidMintKey { .. }));
    }
}
