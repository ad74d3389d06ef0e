//! Turtle / N-Triples I/O through oxigraph's parsers and serializers.
//!
//! Terms are oxigraph's own; only the triple shape differs, so conversion is a
//! move on the way in and a borrow on the way out.

use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model as ox;

use super::{BlankNode, GraphStore, Iri, Literal, Term, Triple};
use crate::error::{GraphError, GraphResult};

/// Concrete syntaxes accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RdfSyntax {
    #[default]
    Turtle,
    NTriples,
}

impl RdfSyntax {
    fn format(self) -> RdfFormat {
        match self {
            Self::Turtle => RdfFormat::Turtle,
            Self::NTriples => RdfFormat::NTriples,
        }
    }

    /// Guess from a locator's extension; anything unknown is treated as Turtle.
    pub fn from_locator(locator: &str) -> Self {
        if locator.ends_with(".nt") {
            Self::NTriples
        } else {
            Self::Turtle
        }
    }
}

/// Parse `input`. Blank nodes are renamed on every call so independent parses never share identifiers.
pub fn parse(input: &str, syntax: RdfSyntax, base_iri: Option<&str>) -> GraphResult<Vec<Triple>> {
    let mut parser = RdfParser::from_format(syntax.format()).rename_blank_nodes();
    if let Some(base) = base_iri {
        parser = parser.with_base_iri(base).map_err(|e| GraphError::InvalidIri {
            iri: base.to_string(),
            message: e.to_string(),
        })?;
    }

    let mut triples = Vec::new();
    for quad in parser.for_reader(input.as_bytes()) {
        let quad = quad.map_err(|e| GraphError::Parse {
            message: e.to_string(),
        })?;
        let subject = from_ox_term(ox::Term::from(quad.subject))?;
        let object = from_ox_term(quad.object)?;
        triples.push(Triple::new(subject, Iri::from(quad.predicate), object));
    }
    Ok(triples)
}

/// Serialize every triple of `store`, with its prefix table where the syntax has one.
pub fn serialize(store: &GraphStore, syntax: RdfSyntax) -> GraphResult<String> {
    let mut serializer = RdfSerializer::from_format(syntax.format());
    if syntax == RdfSyntax::Turtle {
        for (name, ns) in store.prefixes() {
            serializer = serializer
                .with_prefix(name.as_str(), ns.as_str())
                .map_err(|e| GraphError::InvalidIri {
                    iri: ns.clone(),
                    message: e.to_string(),
                })?;
        }
    }

    let mut writer = serializer.for_writer(Vec::new());
    for triple in store.iter() {
        let subject = match &triple.subject {
            Term::Iri(iri) => ox::NamedOrBlankNodeRef::from(iri.as_ox()),
            Term::Blank(node) => ox::NamedOrBlankNodeRef::from(node.as_ox()),
            Term::Literal(lit) => {
                return Err(GraphError::Serialize {
                    message: format!("literal {lit} in subject position"),
                });
            }
        };
        writer
            .serialize_triple(ox::TripleRef::new(subject, triple.predicate.as_ox(), triple.object.as_ox()))
            .map_err(|e| GraphError::Serialize {
                message: e.to_string(),
            })?;
    }
    let bytes = writer.finish().map_err(|e| GraphError::Serialize {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| GraphError::Serialize {
        message: e.to_string(),
    })
}

fn from_ox_term(term: ox::Term) -> GraphResult<Term> {
    match term {
        ox::Term::NamedNode(node) => Ok(Iri::from(node).into()),
        ox::Term::BlankNode(node) => Ok(BlankNode::from(node).into()),
        ox::Term::Literal(lit) => Ok(Literal::from(lit).into()),
        #[allow(unreachable_patterns)]
        _ => Err(GraphError::Parse {
            message: "quoted triples are not supported".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        @prefix : <http://ex.org/ont#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        _:s a :Acquisition ;
            :acquirer <http://ex.org/Google> ;
            :label "deal"@EN ;
            :amount "3"^^xsd:integer ;
            :note "plain" .
    "#;

    #[test]
    fn parses_literals_and_blank_nodes() {
        let g = GraphStore::parse(DOC, RdfSyntax::Turtle, None).unwrap();
        assert_eq!(g.len(), 5);
        let subject = g.iter().next().unwrap().subject;
        assert!(subject.is_blank());

        let label = g
            .value(&subject, &Iri::new("http://ex.org/ont#label"))
            .and_then(Term::as_literal)
            .unwrap();
        assert_eq!(label.language(), Some("en"));

        let note = g
            .value(&subject, &Iri::new("http://ex.org/ont#note"))
            .unwrap();
        assert_eq!(note, &Term::literal("plain"));
    }

    #[test]
    fn independent_parses_rename_blank_nodes() {
        let a = GraphStore::parse(DOC, RdfSyntax::Turtle, None).unwrap();
        let b = GraphStore::parse(DOC, RdfSyntax::Turtle, None).unwrap();
        let sa = a.iter().next().unwrap().subject;
        let sb = b.iter().next().unwrap().subject;
        assert_ne!(sa, sb);
    }

    #[test]
    fn turtle_survives_serialization() {
        let g = GraphStore::parse(DOC, RdfSyntax::Turtle, None)
            .unwrap()
            .with_prefixes([("", "http://ex.org/ont#")]);
        let text = g.serialize(RdfSyntax::Turtle).unwrap();
        assert!(text.contains("@prefix : <http://ex.org/ont#>"));
        let back = GraphStore::parse(&text, RdfSyntax::Turtle, None).unwrap();
        assert_eq!(back.len(), g.len());
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let err = GraphStore::parse("<a> <b", RdfSyntax::Turtle, None).unwrap_err();
        assert!(matches!(err, GraphError::Parse { .. }));
    }

    #[test]
    fn relative_iris_resolve_against_base() {
        let g = GraphStore::parse("<x> <p> <y> .", RdfSyntax::Turtle, Some("http://ex.org/")).unwrap();
        assert!(g.contains(&Triple::new(
            Term::iri("http://ex.org/x"),
            Iri::new("http://ex.org/p"),
            Term::iri("http://ex.org/y"),
        )));
    }
}
