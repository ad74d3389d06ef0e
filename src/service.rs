//! Request-level operations shared by the CLI and the HTTP daemon.
//!
//! Every call parses the caller's Turtle into a private graph and runs to
//! completion against the shared [`Ontology`]. Parse and rule errors are hard
//! failures; a validation-engine failure during `expand` degrades to a report
//! error while the expanded graph is still returned.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{GraphError, GraphResult, ShapegraphResult};
use crate::graph::GraphStore;
use crate::graph::io::RdfSyntax;
use crate::ontology::{Ontology, standard_prefixes};
use crate::persist::TripleSink;
use crate::rules::{InferenceStats, RuleEngine};
use crate::validate::{ShapeValidator, ValidationReport, Violation};

/// Triple counts returned with every inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferCounts {
    pub input_triples: usize,
    pub inferred_triples: usize,
    pub total_triples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferResponse {
    pub success: bool,
    /// Turtle of the request graph plus every derived triple.
    pub inferred_data: String,
    pub stats: InferCounts,
    #[serde(skip)]
    pub details: InferenceStats,
    #[serde(skip)]
    pub expanded: GraphStore,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub conforms: bool,
    pub violations: Vec<Violation>,
    pub report_text: String,
}

impl ValidateResponse {
    fn from_report(report: ValidationReport) -> GraphResult<Self> {
        let report_text = report.report_text()?;
        Ok(Self {
            conforms: report.conforms,
            violations: report.violations,
            report_text,
        })
    }
}

/// Validation outcome of an `expand` call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    Report(ValidateResponse),
    /// The validator failed; the expanded graph is still usable.
    Degraded { report_error: String },
}

impl ReportOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpandResponse {
    #[serde(flatten)]
    pub inference: InferResponse,
    pub validation: ReportOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveResponse {
    pub saved: usize,
}

/// Stateless request handler over a shared ontology.
#[derive(Debug, Clone)]
pub struct Service {
    ontology: Arc<Ontology>,
}

impl Service {
    pub fn new(ontology: Arc<Ontology>) -> Self {
        Self { ontology }
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    /// Parse a request body. Blank input is rejected before parsing.
    pub fn parse_request(&self, turtle: &str) -> GraphResult<GraphStore> {
        if turtle.trim().is_empty() {
            return Err(GraphError::EmptyInput);
        }
        GraphStore::parse(turtle, RdfSyntax::Turtle, None)
    }

    /// Request graph ∪ derived triples, serialized as Turtle.
    pub fn infer(&self, turtle: &str) -> ShapegraphResult<InferResponse> {
        let data = self.parse_request(turtle)?;
        let result = RuleEngine::new(&self.ontology).infer(&data)?;

        let mut expanded = data.with_prefixes(standard_prefixes(self.ontology.vocabulary()));
        let input_triples = expanded.len();
        let inferred_triples = expanded.merge(&result.delta);
        let inferred_data = expanded.serialize(RdfSyntax::Turtle)?;

        Ok(InferResponse {
            success: true,
            inferred_data,
            stats: InferCounts {
                input_triples,
                inferred_triples,
                total_triples: expanded.len(),
            },
            details: result.stats,
            expanded,
        })
    }

    pub fn validate(&self, turtle: &str) -> ShapegraphResult<ValidateResponse> {
        let data = self.parse_request(turtle)?;
        let report = ShapeValidator::new(&self.ontology).validate(&data)?;
        Ok(ValidateResponse::from_report(report)?)
    }

    /// Infer, then validate the expanded graph.
    pub fn expand(&self, turtle: &str) -> ShapegraphResult<ExpandResponse> {
        let inference = self.infer(turtle)?;
        let validation = match ShapeValidator::new(&self.ontology).validate(&inference.expanded) {
            Ok(report) => match ValidateResponse::from_report(report) {
                Ok(response) => ReportOutcome::Report(response),
                Err(e) => ReportOutcome::Degraded {
                    report_error: e.to_string(),
                },
            },
            Err(e) => {
                tracing::warn!(error = %e, "validation failed, returning expanded graph without report");
                ReportOutcome::Degraded {
                    report_error: e.to_string(),
                }
            }
        };
        Ok(ExpandResponse {
            inference,
            validation,
        })
    }

    /// Parse the body and hand it to `sink`.
    pub fn save(&self, turtle: &str, sink: &dyn TripleSink) -> ShapegraphResult<SaveResponse> {
        let data = self.parse_request(turtle)?;
        let saved = sink.store(&data)?;
        Ok(SaveResponse { saved })
    }
}
