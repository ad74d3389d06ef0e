//! Shape definitions read from the ontology graph.

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

use crate::error::{ValidationError, ValidationResult};
use crate::graph::{GraphStore, Iri, Term};
use crate::vocab::{self, sh};

/// Non-validating annotations allowed on property nodes.
const PROPERTY_ANNOTATIONS: &[&str] = &[
    "path",
    "name",
    "description",
    "order",
    "group",
    "message",
    "severity",
    "defaultValue",
];

/// Components implemented on property nodes.
const PROPERTY_COMPONENTS: &[&str] = &["minCount", "maxCount", "datatype", "class", "pattern", "flags", "in"];

/// Predicates allowed directly on a shape node.
const SHAPE_KEYS: &[&str] = &[
    "targetClass",
    "property",
    "rule",
    "name",
    "description",
    "order",
    "group",
    "message",
    "severity",
    "deactivated",
    "prefixes",
];

/// A node shape with its class targets.
#[derive(Debug, Clone)]
pub struct Shape {
    pub id: Term,
    pub targets: Vec<Term>,
    pub constraints: Vec<PropertyConstraint>,
}

impl Shape {
    pub fn name(&self) -> String {
        display(&self.id)
    }
}

/// Constraints on the values reachable from a focus node along `path`.
#[derive(Debug, Clone)]
pub struct PropertyConstraint {
    pub path: Iri,
    pub name: Option<String>,
    pub min_count: usize,
    pub max_count: Option<usize>,
    pub datatype: Option<Iri>,
    pub class: Option<Term>,
    pub pattern: Option<ValuePattern>,
    pub values_in: Option<Vec<Term>>,
}

impl PropertyConstraint {
    /// `sh:name` when present, else the path's local name.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.path.local_name())
    }
}

/// A compiled `sh:pattern`, keeping its source for messages.
#[derive(Debug, Clone)]
pub struct ValuePattern {
    pub source: String,
    pub regex: Regex,
}

/// Every active shape in `graph`, in subject order.
pub fn shapes(graph: &GraphStore) -> ValidationResult<Vec<Shape>> {
    let target_p = Iri::new(sh::TARGET_CLASS);
    let property_p = Iri::new(sh::PROPERTY);
    let deactivated_p = Iri::new(sh::DEACTIVATED);

    let mut out = Vec::new();
    for id in graph.subjects_with(&target_p) {
        let deactivated = graph
            .value(id, &deactivated_p)
            .and_then(Term::as_literal)
            .and_then(|l| l.as_bool())
            .unwrap_or(false);
        if deactivated {
            continue;
        }
        let name = display(id);
        check_keys(graph, id, SHAPE_KEYS, &name)?;

        let constraints = graph
            .objects(id, &property_p)
            .map(|node| property_constraint(graph, node, &name))
            .collect::<ValidationResult<Vec<_>>>()?;
        out.push(Shape {
            id: id.clone(),
            targets: graph.objects(id, &target_p).cloned().collect(),
            constraints,
        });
    }
    Ok(out)
}

fn property_constraint(graph: &GraphStore, node: &Term, shape: &str) -> ValidationResult<PropertyConstraint> {
    let allowed: Vec<&str> = PROPERTY_ANNOTATIONS
        .iter()
        .chain(PROPERTY_COMPONENTS)
        .copied()
        .collect();
    check_keys(graph, node, &allowed, shape)?;

    let get = |local: &str| graph.value(node, &Iri::new(format!("{}{local}", vocab::SH_NS)));

    let path = match get("path") {
        Some(Term::Iri(iri)) => iri.clone(),
        _ => {
            return Err(ValidationError::NonIriPath {
                shape: shape.to_string(),
            });
        }
    };

    let count = |local: &str| -> ValidationResult<Option<usize>> {
        match get(local) {
            None => Ok(None),
            Some(term) => term
                .as_literal()
                .and_then(|l| l.as_i64())
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| ValidationError::InvalidCount {
                    shape: shape.to_string(),
                    component: format!("sh:{local}"),
                    value: term.to_string(),
                }),
        }
    };

    let pattern = match get("pattern") {
        None => None,
        Some(term) => {
            let flags = get("flags").map(Term::lexical).unwrap_or("");
            Some(compile_pattern(term.lexical(), flags, shape)?)
        }
    };

    let values_in = match get("in") {
        None => None,
        Some(head) => Some(rdf_list(graph, head).ok_or_else(|| ValidationError::MalformedList {
            shape: shape.to_string(),
            component: "sh:in".into(),
        })?),
    };

    Ok(PropertyConstraint {
        path,
        name: get("name").map(|t| t.lexical().to_string()),
        min_count: count("minCount")?.unwrap_or(0),
        max_count: count("maxCount")?,
        datatype: get("datatype").and_then(Term::as_iri).cloned(),
        class: get("class").cloned(),
        pattern,
        values_in,
    })
}

/// Reject any `sh:` predicate on `node` outside `allowed`.
fn check_keys(graph: &GraphStore, node: &Term, allowed: &[&str], shape: &str) -> ValidationResult<()> {
    for triple in graph.matching(Some(node), None, None) {
        if let Some(local) = triple.predicate.as_str().strip_prefix(vocab::SH_NS) {
            if !allowed.contains(&local) {
                return Err(ValidationError::Unsupported {
                    shape: shape.to_string(),
                    component: format!("sh:{local}"),
                });
            }
        }
    }
    Ok(())
}

fn compile_pattern(source: &str, flags: &str, shape: &str) -> ValidationResult<ValuePattern> {
    let invalid = |message: String| ValidationError::InvalidPattern {
        shape: shape.to_string(),
        pattern: source.to_string(),
        message,
    };
    let mut builder = RegexBuilder::new(source);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => return Err(invalid(format!("unsupported flag {other:?}"))),
        };
    }
    let regex = builder.build().map_err(|e| invalid(e.to_string()))?;
    Ok(ValuePattern {
        source: source.to_string(),
        regex,
    })
}

/// Members of an RDF list, or `None` if it is malformed or cyclic.
pub fn rdf_list(graph: &GraphStore, head: &Term) -> Option<Vec<Term>> {
    let first_p = Iri::new(vocab::RDF_FIRST);
    let rest_p = Iri::new(vocab::RDF_REST);
    let nil = Term::iri(vocab::RDF_NIL);

    let mut items = Vec::new();
    let mut seen = BTreeSet::new();
    let mut current = head.clone();
    while current != nil {
        if !seen.insert(current.clone()) {
            return None;
        }
        items.push(graph.value(&current, &first_p)?.clone());
        current = graph.value(&current, &rest_p)?.clone();
    }
    Some(items)
}

fn display(term: &Term) -> String {
    match term {
        Term::Iri(iri) => iri.local_name().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::io::RdfSyntax;

    fn parse(body: &str) -> GraphStore {
        let text = format!(
            "@prefix : <http://ex.org/> .\n@prefix sh: <http://www.w3.org/ns/shacl#> .\n\
             @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n{body}"
        );
        GraphStore::parse(&text, RdfSyntax::Turtle, None).unwrap()
    }

    #[test]
    fn reads_supported_components() {
        let g = parse(
            r#":S sh:targetClass :T ; sh:property [
                  sh:path :code ; sh:name "Code" ; sh:minCount 1 ; sh:maxCount 2 ;
                  sh:datatype xsd:string ; sh:pattern "^[a-z]+$" ; sh:flags "i" ;
                  sh:in ( "ab" "cd" ) ; sh:order 3
               ] ."#,
        );
        let shapes = shapes(&g).unwrap();
        assert_eq!(shapes.len(), 1);
        let c = &shapes[0].constraints[0];
        assert_eq!(c.label(), "Code");
        assert_eq!(c.min_count, 1);
        assert_eq!(c.max_count, Some(2));
        assert!(c.pattern.as_ref().unwrap().regex.is_match("AB"));
        assert_eq!(c.values_in.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn unsupported_component_is_an_error() {
        let g = parse(":S sh:targetClass :T ; sh:property [ sh:path :p ; sh:minLength 3 ] .");
        let err = shapes(&g).unwrap_err();
        assert!(matches!(err, ValidationError::Unsupported { component, .. } if component == "sh:minLength"));

        let g = parse(":S sh:targetClass :T ; sh:sparql [ ] .");
        assert!(matches!(shapes(&g), Err(ValidationError::Unsupported { .. })));
    }

    #[test]
    fn non_iri_path_and_bad_counts() {
        let g = parse(":S sh:targetClass :T ; sh:property [ sh:path ( :a :b ) ] .");
        assert!(matches!(shapes(&g), Err(ValidationError::NonIriPath { .. })));

        let g = parse(r#":S sh:targetClass :T ; sh:property [ sh:path :a ; sh:minCount "-1"^^xsd:integer ] ."#);
        assert!(matches!(shapes(&g), Err(ValidationError::InvalidCount { .. })));
    }

    #[test]
    fn invalid_regex_is_reported() {
        let g = parse(r#":S sh:targetClass :T ; sh:property [ sh:path :a ; sh:pattern "(" ] ."#);
        assert!(matches!(shapes(&g), Err(ValidationError::InvalidPattern { .. })));
    }

    #[test]
    fn deactivated_shapes_are_skipped() {
        let g = parse(":S sh:targetClass :T ; sh:deactivated true ; sh:sparql [ ] .");
        assert!(shapes(&g).unwrap().is_empty());
    }
}
