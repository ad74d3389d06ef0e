//! Fact graph: the triple data model and its in-memory store.
//!
//! - **Model** ([`Term`], [`Iri`], [`BlankNode`], [`Literal`], [`Triple`]): oxigraph terms made `Ord` for the indexes
//! - **Store** ([`GraphStore`]): a triple set with SPO/POS/OSP indexes and a prefix table
//! - **I/O** ([`io`]): Turtle and N-Triples via oxigraph's parsers and serializers
//! - **Pattern** ([`pattern`]): the declarative matcher shared by rules and shapes
//! - **Closure** ([`closure`]): iterative, cycle-safe transitive closure

pub mod closure;
pub mod io;
pub mod pattern;
pub mod store;

use std::cmp::Ordering;
use std::fmt;

use oxigraph::model as ox;
use serde::{Serialize, Serializer};

use crate::vocab;

pub use store::GraphStore;

/// An IRI, backed by an oxigraph named node.
///
/// Not validated on construction; oxigraph validates whatever it parses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Iri(ox::NamedNode);

impl Iri {
    pub fn new(iri: impl Into<String>) -> Self {
        Self(ox::NamedNode::new_unchecked(iri))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_ox(&self) -> ox::NamedNodeRef<'_> {
        self.0.as_ref()
    }

    /// The part after the last `#` or `/`, or the whole IRI if neither occurs.
    pub fn local_name(&self) -> &str {
        let iri = self.as_str();
        match iri.rfind(['#', '/']) {
            Some(idx) if idx + 1 < iri.len() => &iri[idx + 1..],
            _ => iri,
        }
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Iri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ox::NamedNode> for Iri {
    fn from(node: ox::NamedNode) -> Self {
        Self(node)
    }
}

/// A blank node. Ordered by identifier, which oxigraph's type is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(ox::BlankNode);

impl BlankNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self(ox::BlankNode::new_unchecked(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_ox(&self) -> ox::BlankNodeRef<'_> {
        self.0.as_ref()
    }
}

impl Ord for BlankNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for BlankNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<ox::BlankNode> for BlankNode {
    fn from(node: ox::BlankNode) -> Self {
        Self(node)
    }
}

/// A literal, backed by an oxigraph literal and ordered by
/// (lexical form, datatype, language).
///
/// Language tags are kept lowercase, so a language-tagged literal always has
/// datatype `rdf:langString` and compares case-insensitively on its tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(ox::Literal);

impl Literal {
    /// A plain `xsd:string` literal.
    pub fn simple(value: impl Into<String>) -> Self {
        Self(ox::Literal::new_simple_literal(value))
    }

    pub fn typed(value: impl Into<String>, datatype: Iri) -> Self {
        Self(ox::Literal::new_typed_literal(value, datatype.0))
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self(ox::Literal::new_language_tagged_literal_unchecked(
            value,
            language.into().to_ascii_lowercase(),
        ))
    }

    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), Iri::new(vocab::XSD_INTEGER))
    }

    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), Iri::new(vocab::XSD_BOOLEAN))
    }

    pub fn value(&self) -> &str {
        self.0.value()
    }

    pub fn datatype(&self) -> Iri {
        Iri(self.0.datatype().into_owned())
    }

    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    pub fn as_ox(&self) -> ox::LiteralRef<'_> {
        self.0.as_ref()
    }

    /// Parse the lexical form as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        self.value().trim().parse().ok()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value().trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value()
            .cmp(other.value())
            .then_with(|| self.0.datatype().as_str().cmp(other.0.datatype().as_str()))
            .then_with(|| self.language().cmp(&other.language()))
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<ox::Literal> for Literal {
    fn from(lit: ox::Literal) -> Self {
        match lit.language() {
            Some(lang) if lang.bytes().any(|b| b.is_ascii_uppercase()) => Self::lang(lit.value(), lang),
            _ => Self(lit),
        }
    }
}

/// An RDF term: IRI, blank node, or literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(Iri::new(iri))
    }

    /// A blank node with identifier `id` (no `_:` prefix).
    pub fn blank(id: impl Into<String>) -> Self {
        Self::Blank(BlankNode::new(id))
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(Literal::simple(value))
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    /// The string form used when a term feeds a content key: lexical form for
    /// literals, the bare IRI for IRIs, the identifier for blank nodes.
    pub fn lexical(&self) -> &str {
        match self {
            Self::Iri(iri) => iri.as_str(),
            Self::Blank(node) => node.as_str(),
            Self::Literal(lit) => lit.value(),
        }
    }

    pub fn as_ox(&self) -> ox::TermRef<'_> {
        match self {
            Self::Iri(iri) => iri.as_ox().into(),
            Self::Blank(node) => node.as_ox().into(),
            Self::Literal(lit) => lit.as_ox().into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => iri.fmt(f),
            Self::Blank(node) => node.0.fmt(f),
            Self::Literal(lit) => lit.fmt(f),
        }
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Iri(iri) => serializer.serialize_str(iri.as_str()),
            other => serializer.collect_str(other),
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Self::Blank(node)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

/// A triple (subject, predicate, object).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Iri,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: impl Into<Term>, predicate: impl Into<Iri>, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Whether `term` occurs in subject or object position.
    pub fn mentions(&self, term: &Term) -> bool {
        &self.subject == term || &self.object == term
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_after_hash_or_slash() {
        assert_eq!(Iri::new("http://ex.org/ont#Acquisition").local_name(), "Acquisition");
        assert_eq!(Iri::new("http://ex.org/ont/acquirer").local_name(), "acquirer");
        assert_eq!(Iri::new("urn:x").local_name(), "urn:x");
    }

    #[test]
    fn ntriples_rendering() {
        let t = Triple::new(
            Term::blank("b0"),
            Iri::new("http://ex.org/p"),
            Literal::lang("say \"hi\"", "EN"),
        );
        assert_eq!(t.to_string(), r#"_:b0 <http://ex.org/p> "say \"hi\""@en ."#);

        let n = Term::Literal(Literal::integer(3));
        assert_eq!(n.to_string(), "\"3\"^^<http://www.w3.org/2001/XMLSchema#integer>");
        assert_eq!(Term::literal("x").to_string(), "\"x\"");
    }

    #[test]
    fn oxigraph_terms_convert_without_loss() {
        let tagged = Literal::from(ox::Literal::new_language_tagged_literal_unchecked("deal", "EN"));
        assert_eq!(tagged, Literal::lang("deal", "en"));
        assert_eq!(tagged.datatype(), Iri::new(vocab::RDF_LANG_STRING));

        let typed = Literal::typed("x", Iri::new(vocab::XSD_STRING));
        assert_eq!(typed, Literal::simple("x"));
        assert_eq!(typed.cmp(&Literal::simple("x")), Ordering::Equal);

        let iri = Iri::from(ox::NamedNode::new_unchecked("http://ex.org/a"));
        assert_eq!(iri.as_ox().as_str(), "http://ex.org/a");
        assert_eq!(Term::Iri(iri).as_ox(), ox::TermRef::from(ox::NamedNodeRef::new_unchecked("http://ex.org/a")));
    }

    #[test]
    fn terms_order_for_the_indexes() {
        let mut terms = vec![
            Term::literal("b"),
            Term::blank("z1"),
            Term::literal("a"),
            Term::blank("a1"),
            Term::iri("http://ex.org/b"),
        ];
        terms.sort();
        assert_eq!(
            terms,
            [
                Term::iri("http://ex.org/b"),
                Term::blank("a1"),
                Term::blank("z1"),
                Term::literal("a"),
                Term::literal("b"),
            ]
        );
    }

    #[test]
    fn boolean_lexical_forms() {
        assert_eq!(Literal::simple("1").as_bool(), Some(true));
        assert_eq!(Literal::simple("false").as_bool(), Some(false));
        assert_eq!(Literal::simple("yes").as_bool(), None);
    }
}
