//! The immutable ontology context shared by every request.

use std::sync::Arc;

use crate::config::{ShapegraphConfig, Vocabulary};
use crate::dictionary::DictionaryResolver;
use crate::error::ManifestResult;
use crate::federation::{FederationLoader, LoadReport};
use crate::graph::GraphStore;
use crate::vocab;

/// Ontology graph plus everything derived from it once at startup.
///
/// Constructed once and handed out as `Arc<Ontology>`; only `&` access exists.
#[derive(Debug)]
pub struct Ontology {
    graph: GraphStore,
    vocabulary: Vocabulary,
    dictionary: DictionaryResolver,
    report: Option<LoadReport>,
}

impl Ontology {
    pub fn new(graph: GraphStore, vocabulary: Vocabulary) -> Self {
        let graph = graph.with_prefixes(standard_prefixes(&vocabulary));
        let dictionary = DictionaryResolver::build(&graph, vocabulary.lemma());
        Self {
            graph,
            vocabulary,
            dictionary,
            report: None,
        }
    }

    /// Federate (or fall back) according to `config`.
    pub fn load(config: &ShapegraphConfig) -> ManifestResult<Arc<Self>> {
        let loader = FederationLoader::new(config.federation.clone(), config.vocabulary.clone());
        Self::load_with(loader, config.vocabulary.clone())
    }

    pub fn load_with(loader: FederationLoader, vocabulary: Vocabulary) -> ManifestResult<Arc<Self>> {
        let (graph, report) = loader.load()?;
        let mut ontology = Self::new(graph, vocabulary);
        ontology.report = Some(report);
        Ok(Arc::new(ontology))
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn dictionary(&self) -> &DictionaryResolver {
        &self.dictionary
    }

    /// How the graph was loaded; `None` for ontologies built directly with [`Ontology::new`].
    pub fn load_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }
}

/// Prefixes used when serializing ontology-derived graphs.
pub fn standard_prefixes(vocabulary: &Vocabulary) -> Vec<(String, String)> {
    vec![
        (String::new(), vocabulary.namespace.clone()),
        ("temp".into(), vocabulary.temp_namespace.clone()),
        ("rdf".into(), vocab::RDF_NS.into()),
        ("rdfs".into(), vocab::RDFS_NS.into()),
        ("sh".into(), vocab::SH_NS.into()),
        ("xsd".into(), vocab::XSD_NS.into()),
    ]
}
