//! Shape-based structural validation.
//!
//! Every shape in the ontology targets one or more classes. Each node of the
//! data graph typed with a target (or a subclass, hierarchy read from ontology
//! and data together) is checked against the shape's property constraints.

pub mod report;
pub mod shape;

use crate::error::ValidationResult;
use crate::graph::pattern::{self, Bindings, PatternTerm, TriplePattern};
use crate::graph::{GraphStore, Iri, Literal, Term, closure};
use crate::ontology::Ontology;
use crate::vocab;

pub use report::{ValidationReport, Violation};
pub use shape::{PropertyConstraint, Shape};

const VALUE_VAR: &str = "value";

fn component(local: &str) -> Iri {
    Iri::new(format!("{}{local}ConstraintComponent", vocab::SH_NS))
}

/// Validates data graphs against the ontology's shapes.
pub struct ShapeValidator<'o> {
    ontology: &'o Ontology,
}

impl<'o> ShapeValidator<'o> {
    pub fn new(ontology: &'o Ontology) -> Self {
        Self { ontology }
    }

    /// Validate `data`. Fails only when a shape cannot be evaluated.
    pub fn validate(&self, data: &GraphStore) -> ValidationResult<ValidationReport> {
        let shapes = shape::shapes(self.ontology.graph())?;
        let hierarchy = [self.ontology.graph(), data];

        let mut violations = Vec::new();
        for shape in &shapes {
            for target in &shape.targets {
                for focus in closure::instances_of(data, &hierarchy, target) {
                    for constraint in &shape.constraints {
                        self.check(shape, constraint, &focus, data, &hierarchy, &mut violations);
                    }
                }
            }
        }
        violations.sort();
        violations.dedup();

        let report = ValidationReport::new(violations);
        tracing::info!(
            shapes = shapes.len(),
            conforms = report.conforms,
            violations = report.violations.len(),
            "validation complete"
        );
        Ok(report)
    }

    fn check(
        &self,
        shape: &Shape,
        constraint: &PropertyConstraint,
        focus: &Term,
        data: &GraphStore,
        hierarchy: &[&GraphStore],
        out: &mut Vec<Violation>,
    ) {
        let lookup = [TriplePattern::new(
            PatternTerm::Const(focus.clone()),
            PatternTerm::Const(Term::Iri(constraint.path.clone())),
            PatternTerm::var(VALUE_VAR),
        )];
        let values: Vec<Term> = pattern::solve(data, &lookup, Bindings::new())
            .into_iter()
            .filter_map(|mut b| b.remove(VALUE_VAR))
            .collect();

        let mut violation = |local: &str, message: String, value: Option<&Term>| {
            out.push(Violation {
                focus_node: focus.clone(),
                path: constraint.path.clone(),
                message,
                component: component(local),
                source_shape: shape.id.clone(),
                value: value.cloned(),
            });
        };

        if values.len() < constraint.min_count {
            violation(
                "MinCount",
                format!(
                    "Less than {} values on {}",
                    constraint.min_count,
                    constraint.label()
                ),
                None,
            );
        }
        if let Some(max) = constraint.max_count {
            if values.len() > max {
                violation(
                    "MaxCount",
                    format!("More than {max} values on {}", constraint.label()),
                    None,
                );
            }
        }

        for value in &values {
            if let Some(datatype) = &constraint.datatype {
                let ok = value.as_literal().is_some_and(|lit| has_datatype(lit, datatype));
                if !ok {
                    violation(
                        "Datatype",
                        format!("Value does not have datatype {}", datatype.local_name()),
                        Some(value),
                    );
                }
            }
            if let Some(class) = &constraint.class {
                let ok = closure::is_instance_of(data, hierarchy, value, class)
                    || closure::is_instance_of(self.ontology.graph(), hierarchy, value, class);
                if !ok {
                    violation(
                        "Class",
                        format!("Value does not have class {}", class_name(class)),
                        Some(value),
                    );
                }
            }
            if let Some(pattern) = &constraint.pattern {
                let ok = !value.is_blank() && pattern.regex.is_match(value.lexical());
                if !ok {
                    violation(
                        "Pattern",
                        format!("Value does not match pattern \"{}\"", pattern.source),
                        Some(value),
                    );
                }
            }
            if let Some(allowed) = &constraint.values_in {
                if !allowed.contains(value) {
                    violation(
                        "In",
                        format!("Value is not in the allowed list of {}", constraint.label()),
                        Some(value),
                    );
                }
            }
        }
    }
}

fn class_name(class: &Term) -> String {
    match class {
        Term::Iri(iri) => iri.local_name().to_string(),
        other => other.to_string(),
    }
}

/// Datatype equality plus a lexical check for the numeric and boolean types.
fn has_datatype(lit: &Literal, datatype: &Iri) -> bool {
    if lit.datatype() != *datatype {
        return false;
    }
    let lexical = lit.value();
    match datatype.as_str() {
        vocab::XSD_INTEGER => {
            let digits = lexical.strip_prefix(['+', '-']).unwrap_or(lexical);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        vocab::XSD_DECIMAL => {
            let body = lexical.strip_prefix(['+', '-']).unwrap_or(lexical);
            let (int, frac) = body.split_once('.').unwrap_or((body, ""));
            (!int.is_empty() || !frac.is_empty())
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        vocab::XSD_DOUBLE => {
            matches!(lexical, "INF" | "-INF" | "+INF" | "NaN")
                || (lexical
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
                    && lexical.parse::<f64>().is_ok())
        }
        vocab::XSD_BOOLEAN => lit.as_bool().is_some() && lexical.trim() == lexical,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Vocabulary;
    use crate::graph::io::RdfSyntax;

    const SHAPES: &str = r#"
        @prefix : <http://example.org/ontology/> .
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

        :Merger rdfs:subClassOf :Acquisition .
        :Company rdfs:subClassOf :Organization .

        :Shape sh:targetClass :Acquisition ;
            sh:property [ sh:path :acquirer ; sh:name "Acquirer" ; sh:minCount 1 ; sh:maxCount 1 ;
                          sh:class :Organization ] ,
                        [ sh:path :year ; sh:datatype xsd:integer ] ,
                        [ sh:path :code ; sh:pattern "^[A-Z]{3}$" ] ,
                        [ sh:path :status ; sh:in ( "open" "closed" ) ] .
    "#;

    fn validator_report(data: &str) -> ValidationReport {
        let graph = GraphStore::parse(SHAPES, RdfSyntax::Turtle, None).unwrap();
        let ontology = Ontology::new(graph, Vocabulary::default());
        let text = format!(
            "@prefix : <http://example.org/ontology/> .\n\
             @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n{data}"
        );
        let data = GraphStore::parse(&text, RdfSyntax::Turtle, None).unwrap();
        ShapeValidator::new(&ontology).validate(&data).unwrap()
    }

    fn components(report: &ValidationReport) -> Vec<&str> {
        report
            .violations
            .iter()
            .map(|v| v.component.local_name())
            .collect()
    }

    #[test]
    fn conforming_data() {
        let report = validator_report(
            r#":g a :Company . :d a :Merger ; :acquirer :g ; :year 2006 ; :code "YTB" ; :status "open" ."#,
        );
        assert!(report.conforms, "{:?}", report.violations);
    }

    #[test]
    fn missing_required_property() {
        let report = validator_report(":d a :Acquisition .");
        assert_eq!(report.violations.len(), 1);
        let v = &report.violations[0];
        assert_eq!(v.path.as_str(), "http://example.org/ontology/acquirer");
        assert_eq!(v.component.local_name(), "MinCountConstraintComponent");
    }

    #[test]
    fn value_constraints() {
        let report = validator_report(
            r#":g a :Company . :h a :Person .
               :d a :Acquisition ; :acquirer :g , :h ; :year "soon" ; :code "ytb" ; :status "pending" ."#,
        );
        let mut found = components(&report);
        found.sort();
        assert_eq!(
            found,
            [
                "ClassConstraintComponent",
                "DatatypeConstraintComponent",
                "InConstraintComponent",
                "MaxCountConstraintComponent",
                "PatternConstraintComponent",
            ]
        );
    }

    #[test]
    fn datatype_lexical_checks() {
        let int = Iri::new(vocab::XSD_INTEGER);
        assert!(has_datatype(&Literal::typed("-42", int.clone()), &int));
        assert!(!has_datatype(&Literal::typed("4.2", int.clone()), &int));
        let dec = Iri::new(vocab::XSD_DECIMAL);
        assert!(has_datatype(&Literal::typed("4.", dec.clone()), &dec));
        assert!(!has_datatype(&Literal::typed("4e2", dec.clone()), &dec));
        let string = Iri::new(vocab::XSD_STRING);
        assert!(has_datatype(&Literal::simple("plain"), &string));
        assert!(!has_datatype(&Literal::lang("tagged", "en"), &string));
    }

    #[test]
    fn validation_is_repeatable() {
        let data = ":d a :Acquisition ; :year \"x\" .";
        assert_eq!(validator_report(data), validator_report(data));
    }
}
