//! Lexeme → lexical entry lookup.
//!
//! The index is built once from the ontology: every literal bound through the
//! lexeme predicate is NFC-normalized and mapped to the subjects carrying it.

use std::collections::{BTreeMap, BTreeSet};

use unicode_normalization::UnicodeNormalization;

use crate::graph::{GraphStore, Iri, Term};

/// Read-only lexeme index over the ontology graph.
#[derive(Debug, Clone, Default)]
pub struct DictionaryResolver {
    entries: BTreeMap<String, BTreeSet<Term>>,
}

/// Normalized form used for index keys.
pub fn lexeme_key(value: &str) -> String {
    value.trim().nfc().collect()
}

impl DictionaryResolver {
    /// Index every `(entry lexeme "literal")` triple of `graph`.
    pub fn build(graph: &GraphStore, lexeme: Iri) -> Self {
        let mut entries: BTreeMap<String, BTreeSet<Term>> = BTreeMap::new();
        for triple in graph.matching(None, Some(&lexeme), None) {
            if let Term::Literal(lit) = &triple.object {
                entries
                    .entry(lexeme_key(lit.value()))
                    .or_default()
                    .insert(triple.subject);
            }
        }
        tracing::debug!(lexemes = entries.len(), "dictionary index built");
        Self { entries }
    }

    /// Lexical entries whose lexeme normalizes to the same key as `key`.
    pub fn resolve<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Term> + use<'a> {
        self.entries.get(&lexeme_key(key)).into_iter().flatten()
    }

    /// Every triple of `graph` whose subject is an entry matching `key`.
    pub fn describe(&self, graph: &GraphStore, key: &str) -> GraphStore {
        self.resolve(key)
            .flat_map(|entry| graph.matching(Some(entry), None, None))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;

    fn dictionary() -> (GraphStore, DictionaryResolver) {
        let lemma = Iri::new("http://ex.org/lemma");
        let p3sg = Iri::new("http://ex.org/present3sg");
        let graph: GraphStore = [
            Triple::new(Term::iri("http://ex.org/lex_cafe"), lemma.clone(), Term::literal("caf\u{e9}")),
            Triple::new(Term::iri("http://ex.org/lex_cafe"), p3sg.clone(), Term::literal("caf\u{e9}s")),
            Triple::new(Term::iri("http://ex.org/lex_buy"), lemma.clone(), Term::literal("buy")),
            Triple::new(Term::iri("http://ex.org/lex_buy"), p3sg, Term::literal("buys")),
        ]
        .into_iter()
        .collect();
        let resolver = DictionaryResolver::build(&graph, lemma);
        (graph, resolver)
    }

    #[test]
    fn lookup_is_normalization_insensitive() {
        let (_, resolver) = dictionary();
        // Decomposed e + combining acute.
        let hits: Vec<_> = resolver.resolve("cafe\u{301}").collect();
        assert_eq!(hits, vec![&Term::iri("http://ex.org/lex_cafe")]);
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn describe_copies_the_whole_entry() {
        let (graph, resolver) = dictionary();
        let facts = resolver.describe(&graph, "buy");
        assert_eq!(facts.len(), 2);
        assert!(resolver.describe(&graph, "sell").is_empty());
    }
}
