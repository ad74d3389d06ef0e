//! Declarative basic-graph-pattern matching.
//!
//! One primitive serves both the rule engine (rule bodies bound at a focus
//! node) and the shape validator (value lookups along a path). Patterns are
//! joined left to right, each extending the bindings of the previous step.

use std::collections::BTreeMap;
use std::fmt;

use super::{GraphStore, Term, Triple};

/// Variable name → bound term. Ordered so solutions compare and print stably.
pub type Bindings = BTreeMap<String, Term>;

/// A position in a triple pattern: a variable or a constant term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatternTerm {
    Var(String),
    Const(Term),
}

impl PatternTerm {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Const(Term::iri(iri))
    }

    /// The term this position denotes under `bindings`, if any.
    pub fn resolve<'a>(&'a self, bindings: &'a Bindings) -> Option<&'a Term> {
        match self {
            Self::Const(term) => Some(term),
            Self::Var(name) => bindings.get(name),
        }
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Self::Var(name) => Some(name),
            Self::Const(_) => None,
        }
    }
}

impl From<Term> for PatternTerm {
    fn from(term: Term) -> Self {
        Self::Const(term)
    }
}

impl fmt::Display for PatternTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => write!(f, "?{name}"),
            Self::Const(term) => term.fmt(f),
        }
    }
}

/// A triple whose positions may be variables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

impl TriplePattern {
    pub fn new(subject: PatternTerm, predicate: PatternTerm, object: PatternTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Variables in subject, predicate, object order (duplicates kept).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter_map(PatternTerm::as_var)
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// All solutions of the conjunction `patterns` over `graph`, each extending `initial`.
///
/// An empty pattern list has exactly one solution: `initial` itself.
pub fn solve(graph: &GraphStore, patterns: &[TriplePattern], initial: Bindings) -> Vec<Bindings> {
    let mut solutions = vec![initial];
    for pattern in patterns {
        let mut extended = Vec::new();
        for bindings in &solutions {
            extended.extend(match_pattern(graph, pattern, bindings));
        }
        solutions = extended;
        if solutions.is_empty() {
            break;
        }
    }
    solutions
}

/// Match a single pattern given existing bindings, returning each extended binding set.
pub fn match_pattern(graph: &GraphStore, pattern: &TriplePattern, bindings: &Bindings) -> Vec<Bindings> {
    let subject = pattern.subject.resolve(bindings);
    let object = pattern.object.resolve(bindings);
    let predicate = match pattern.predicate.resolve(bindings) {
        Some(Term::Iri(iri)) => Some(iri),
        // A predicate bound to a blank node or literal can never match.
        Some(_) => return Vec::new(),
        None => None,
    };

    graph
        .matching(subject, predicate, object)
        .filter_map(|triple| extend(pattern, &triple, bindings))
        .collect()
}

fn extend(pattern: &TriplePattern, triple: &Triple, bindings: &Bindings) -> Option<Bindings> {
    let mut out = bindings.clone();
    let predicate = Term::Iri(triple.predicate.clone());
    for (position, value) in [
        (&pattern.subject, &triple.subject),
        (&pattern.predicate, &predicate),
        (&pattern.object, &triple.object),
    ] {
        if let PatternTerm::Var(name) = position {
            match out.get(name) {
                Some(bound) if bound != value => return None,
                Some(_) => {}
                None => {
                    out.insert(name.clone(), value.clone());
                }
            }
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Iri;

    fn g() -> GraphStore {
        [
            Triple::new(Term::iri("s"), Iri::new("type"), Term::iri("Deal")),
            Triple::new(Term::iri("s"), Iri::new("buyer"), Term::iri("G")),
            Triple::new(Term::iri("s"), Iri::new("target"), Term::iri("Y")),
            Triple::new(Term::iri("t"), Iri::new("type"), Term::iri("Deal")),
            Triple::new(Term::iri("t"), Iri::new("buyer"), Term::iri("M")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn joins_share_variables() {
        let patterns = [
            TriplePattern::new(PatternTerm::var("d"), PatternTerm::iri("type"), PatternTerm::iri("Deal")),
            TriplePattern::new(PatternTerm::var("d"), PatternTerm::iri("buyer"), PatternTerm::var("b")),
            TriplePattern::new(PatternTerm::var("d"), PatternTerm::iri("target"), PatternTerm::var("t")),
        ];
        let solutions = solve(&g(), &patterns, Bindings::new());
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0]["b"], Term::iri("G"));
        assert_eq!(solutions[0]["t"], Term::iri("Y"));
    }

    #[test]
    fn initial_bindings_restrict_the_focus() {
        let patterns = [TriplePattern::new(
            PatternTerm::var("this"),
            PatternTerm::iri("buyer"),
            PatternTerm::var("b"),
        )];
        let mut initial = Bindings::new();
        initial.insert("this".into(), Term::iri("t"));
        let solutions = solve(&g(), &patterns, initial);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0]["b"], Term::iri("M"));
    }

    #[test]
    fn repeated_variable_must_agree() {
        let mut graph = g();
        graph.insert(Triple::new(Term::iri("x"), Iri::new("knows"), Term::iri("x")));
        graph.insert(Triple::new(Term::iri("x"), Iri::new("knows"), Term::iri("y")));
        let patterns = [TriplePattern::new(
            PatternTerm::var("a"),
            PatternTerm::iri("knows"),
            PatternTerm::var("a"),
        )];
        assert_eq!(solve(&graph, &patterns, Bindings::new()).len(), 1);
    }

    #[test]
    fn variable_predicates_bind_iris() {
        let patterns = [TriplePattern::new(
            PatternTerm::iri("s"),
            PatternTerm::var("p"),
            PatternTerm::iri("Y"),
        )];
        let solutions = solve(&g(), &patterns, Bindings::new());
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0]["p"], Term::iri("target"));
    }

    #[test]
    fn empty_conjunction_has_one_solution() {
        assert_eq!(solve(&g(), &[], Bindings::new()).len(), 1);
    }
}
