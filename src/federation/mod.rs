//! Federated ontology loading.
//!
//! A manifest lists partitions as `{order, locator}`. Partitions are read
//! (cache, local path, or HTTP) and merged in ascending order into one graph.
//! Any failure abandons federation for a single fallback snapshot, so the
//! process always comes up with some ontology.

pub mod fetch;
pub mod manifest;

use serde::Serialize;

use crate::config::{FederationConfig, Vocabulary};
use crate::error::{ManifestError, ManifestResult};
use crate::graph::GraphStore;
use crate::graph::io::RdfSyntax;

use fetch::{Fetch, HttpFetcher, Location, Reader};
pub use manifest::Partition;

/// The snapshot compiled into the binary.
pub const BUNDLED_SNAPSHOT: &str = include_str!("../../data/fallback.ttl");

/// One merged partition, in the order it was merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionProgress {
    pub order: i64,
    pub locator: String,
    /// Triples this partition contributed that were not already present.
    pub added: usize,
    /// Running total after merging.
    pub total: usize,
}

/// How the ontology ended up being loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadSource {
    Federated { manifest: String },
    Fallback { snapshot: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub source: LoadSource,
    /// Empty when the fallback was used.
    pub progress: Vec<PartitionProgress>,
    pub triples: usize,
}

impl LoadReport {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, LoadSource::Fallback { .. })
    }
}

/// Builds the ontology graph at startup.
pub struct FederationLoader {
    config: FederationConfig,
    vocabulary: Vocabulary,
    fetcher: Box<dyn Fetch>,
}

impl FederationLoader {
    /// A loader fetching remote partitions over HTTP.
    pub fn new(config: FederationConfig, vocabulary: Vocabulary) -> Self {
        let fetcher = Box::new(HttpFetcher::new(config.fetch_timeout()));
        Self {
            config,
            vocabulary,
            fetcher,
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetch + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Federate, or fall back. Only fails if the bundled snapshot itself is unreadable.
    pub fn load(&self) -> ManifestResult<(GraphStore, LoadReport)> {
        let Some(manifest) = self.config.manifest.as_deref() else {
            return self.degrade("no manifest configured".into());
        };

        match self.federate(manifest) {
            Ok((graph, progress)) => {
                tracing::info!(
                    manifest,
                    partitions = progress.len(),
                    triples = graph.len(),
                    "ontology federated"
                );
                let report = LoadReport {
                    source: LoadSource::Federated {
                        manifest: manifest.to_string(),
                    },
                    triples: graph.len(),
                    progress,
                };
                Ok((graph, report))
            }
            Err(e) => {
                tracing::warn!(error = %e, manifest, "federation failed, loading fallback snapshot");
                self.degrade(e.to_string())
            }
        }
    }

    /// Read the manifest and merge every partition it lists, in order.
    pub fn federate(&self, manifest: &str) -> ManifestResult<(GraphStore, Vec<PartitionProgress>)> {
        let reader = Reader {
            cache_dir: self.config.cache_dir.as_deref(),
            fetcher: self.fetcher.as_ref(),
        };

        let manifest_location = Location::parse(manifest);
        let manifest_graph = read_graph(&reader, &manifest_location)?;
        let partitions = manifest::partitions(&manifest_graph, &self.vocabulary);
        if partitions.is_empty() {
            return Err(ManifestError::Empty {
                manifest: manifest.to_string(),
            });
        }
        tracing::info!(manifest, partitions = partitions.len(), "manifest loaded");

        let mut unified = GraphStore::new();
        let mut progress = Vec::with_capacity(partitions.len());
        for partition in partitions {
            let location = manifest_location.join(&partition.locator);
            let graph = read_graph(&reader, &location)?;
            let added = unified.merge(&graph);
            let total = unified.len();
            tracing::info!(
                order = partition.order,
                locator = %partition.locator,
                added,
                total,
                "+{added} triples (total: {total})"
            );
            progress.push(PartitionProgress {
                order: partition.order,
                locator: partition.locator,
                added,
                total,
            });
        }
        Ok((unified, progress))
    }

    fn degrade(&self, reason: String) -> ManifestResult<(GraphStore, LoadReport)> {
        let (graph, snapshot) = self.fallback()?;
        tracing::warn!(%snapshot, triples = graph.len(), %reason, "serving degraded ontology");
        let report = LoadReport {
            source: LoadSource::Fallback { snapshot, reason },
            progress: Vec::new(),
            triples: graph.len(),
        };
        Ok((graph, report))
    }

    /// The operator-configured snapshot if it loads, else the bundled one.
    fn fallback(&self) -> ManifestResult<(GraphStore, String)> {
        if let Some(path) = &self.config.fallback {
            let location = Location::Local(path.clone());
            let reader = Reader {
                cache_dir: None,
                fetcher: self.fetcher.as_ref(),
            };
            match read_graph(&reader, &location) {
                Ok(graph) => return Ok((graph, location.to_string())),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "configured fallback unusable, using bundled snapshot");
                }
            }
        }
        let graph = GraphStore::parse(BUNDLED_SNAPSHOT, RdfSyntax::Turtle, None).map_err(|source| {
            ManifestError::Parse {
                locator: "<bundled>".into(),
                source,
            }
        })?;
        Ok((graph, "<bundled>".into()))
    }
}

fn read_graph(reader: &Reader<'_>, location: &Location) -> ManifestResult<GraphStore> {
    let text = reader.read(location)?;
    let base = location.base_iri();
    GraphStore::parse(&text, RdfSyntax::from_locator(&location.to_string()), base.as_deref()).map_err(
        |source| ManifestError::Parse {
            locator: location.to_string(),
            source,
        },
    )
}
