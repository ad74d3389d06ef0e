//! Durable storage of accepted triples in an external graph store.
//!
//! The store is addressed through SPARQL 1.1 Update: the graph is rendered as
//! N-Triples inside `INSERT DATA { GRAPH <g> { ... } }` and POSTed with HTTP
//! basic auth.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::config::PersistenceConfig;
use crate::error::{PersistError, PersistResult};
use crate::graph::io::RdfSyntax;
use crate::graph::{GraphStore, Iri};

/// Accepts final triples for storage.
pub trait TripleSink: Send + Sync {
    /// Store every triple of `graph`. Returns the number of triples sent.
    fn store(&self, graph: &GraphStore) -> PersistResult<usize>;
}

/// A SPARQL 1.1 Update endpoint with an optional basic-auth login.
pub struct SparqlUpdateSink {
    url: String,
    graph: Iri,
    authorization: Option<String>,
    agent: ureq::Agent,
}

impl SparqlUpdateSink {
    pub fn new(url: impl Into<String>, graph: Iri, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            graph,
            authorization: None,
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> Self {
        self.authorization = Some(basic_auth(user, password));
        self
    }

    /// Build from the `[persistence]` section. Fails when no endpoint is set.
    pub fn from_config(config: &PersistenceConfig) -> PersistResult<Self> {
        let url = config.update_url.as_deref().ok_or(PersistError::NotConfigured)?;
        let mut sink = Self::new(
            url,
            Iri::new(config.instance_graph.clone()),
            Duration::from_secs(config.timeout_secs),
        );
        if let Some(user) = &config.user {
            sink = sink.with_credentials(user, config.password.as_deref().unwrap_or(""));
        }
        Ok(sink)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn graph(&self) -> &Iri {
        &self.graph
    }
}

impl TripleSink for SparqlUpdateSink {
    fn store(&self, graph: &GraphStore) -> PersistResult<usize> {
        if graph.is_empty() {
            tracing::debug!(url = %self.url, "nothing to persist");
            return Ok(0);
        }
        let update = insert_data(graph, &self.graph)?;

        let mut request = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/sparql-update");
        if let Some(auth) = &self.authorization {
            request = request.set("Authorization", auth);
        }

        match request.send_string(&update) {
            Ok(_) => {
                tracing::info!(url = %self.url, graph = %self.graph, triples = graph.len(), "triples persisted");
                Ok(graph.len())
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                tracing::warn!(url = %self.url, status, "graph store rejected update");
                Err(PersistError::Status {
                    url: self.url.clone(),
                    status,
                    body,
                })
            }
            Err(ureq::Error::Transport(t)) => Err(PersistError::Transport {
                url: self.url.clone(),
                message: t.to_string(),
            }),
        }
    }
}

/// `INSERT DATA { GRAPH <target> { ...N-Triples... } }`.
pub fn insert_data(graph: &GraphStore, target: &Iri) -> PersistResult<String> {
    let body = graph.serialize(RdfSyntax::NTriples)?;
    Ok(format!("INSERT DATA {{ GRAPH {target} {{\n{body}}} }}"))
}

fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}
