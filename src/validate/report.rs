//! Conformance reports.

use serde::Serialize;

use crate::error::GraphResult;
use crate::graph::io::RdfSyntax;
use crate::graph::{GraphStore, Iri, Literal, Term, Triple};
use crate::vocab::{self, sh};

/// One failed constraint on one focus node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Violation {
    pub focus_node: Term,
    pub path: Iri,
    pub message: String,
    /// Constraint component IRI, e.g. `sh:MinCountConstraintComponent`.
    pub component: Iri,
    pub source_shape: Term,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub conforms: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self {
            conforms: violations.is_empty(),
            violations,
        }
    }

    /// The report as an `sh:ValidationReport` graph.
    pub fn to_graph(&self) -> GraphStore {
        let rdf_type = Iri::new(vocab::RDF_TYPE);
        let report = Term::blank("report");
        let mut graph = GraphStore::new().with_prefixes([("sh", vocab::SH_NS)]);

        graph.insert(Triple::new(report.clone(), rdf_type.clone(), Term::iri(sh::VALIDATION_REPORT)));
        graph.insert(Triple::new(
            report.clone(),
            Iri::new(sh::CONFORMS),
            Literal::boolean(self.conforms),
        ));

        for (i, v) in self.violations.iter().enumerate() {
            let result = Term::blank(format!("result{i}"));
            graph.insert(Triple::new(report.clone(), Iri::new(sh::RESULT), result.clone()));
            graph.insert(Triple::new(result.clone(), rdf_type.clone(), Term::iri(sh::VALIDATION_RESULT)));
            graph.insert(Triple::new(result.clone(), Iri::new(sh::FOCUS_NODE), v.focus_node.clone()));
            graph.insert(Triple::new(result.clone(), Iri::new(sh::RESULT_PATH), v.path.clone()));
            graph.insert(Triple::new(
                result.clone(),
                Iri::new(sh::RESULT_MESSAGE),
                Literal::simple(v.message.clone()),
            ));
            graph.insert(Triple::new(result.clone(), Iri::new(sh::RESULT_SEVERITY), Term::iri(sh::VIOLATION)));
            graph.insert(Triple::new(result.clone(), Iri::new(sh::SOURCE_SHAPE), v.source_shape.clone()));
            graph.insert(Triple::new(
                result.clone(),
                Iri::new(sh::SOURCE_CONSTRAINT_COMPONENT),
                v.component.clone(),
            ));
            if let Some(value) = &v.value {
                graph.insert(Triple::new(result, Iri::new(sh::VALUE), value.clone()));
            }
        }
        graph
    }

    /// Turtle rendering of [`ValidationReport::to_graph`].
    pub fn report_text(&self) -> GraphResult<String> {
        self.to_graph().serialize(RdfSyntax::Turtle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conforming_report_graph() {
        let report = ValidationReport::new(Vec::new());
        assert!(report.conforms);
        let graph = report.to_graph();
        assert_eq!(graph.len(), 2);
        assert!(graph.contains(&Triple::new(
            Term::blank("report"),
            Iri::new(sh::CONFORMS),
            Literal::boolean(true),
        )));
    }

    #[test]
    fn violations_become_results() {
        let report = ValidationReport::new(vec![Violation {
            focus_node: Term::blank("s"),
            path: Iri::new("http://ex.org/acquirer"),
            message: "Less than 1 values".into(),
            component: Iri::new("http://www.w3.org/ns/shacl#MinCountConstraintComponent"),
            source_shape: Term::iri("http://ex.org/Shape"),
            value: None,
        }]);
        assert!(!report.conforms);
        let graph = report.to_graph();
        assert_eq!(graph.matching(None, Some(&Iri::new(sh::RESULT)), None).count(), 1);
        let text = report.report_text().unwrap();
        assert!(text.contains("Less than 1 values"));
    }
}
