// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # shapegraph
//!
//! An ontology graph engine: clients submit a small fact graph, it is enriched
//! with facts derived by rules declared in the ontology, and the result is
//! checked against the ontology's shapes.
//!
//! ## Architecture
//!
//! - **Fact graph** (`graph`): indexed in-memory triple store, Turtle I/O, pattern matching
//! - **Federation** (`federation`): ordered loading of ontology partitions with fallback
//! - **Dictionary** (`dictionary`): lexeme → lexical entry index
//! - **Rules** (`rules`): ordered forward chaining with content-addressed minting
//! - **Validation** (`validate`): shape constraints and conformance reports
//! - **Service** (`service`): request-level operations for the CLI and daemon
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shapegraph::config::Vocabulary;
//! use shapegraph::federation::BUNDLED_SNAPSHOT;
//! use shapegraph::graph::GraphStore;
//! use shapegraph::graph::io::RdfSyntax;
//! use shapegraph::ontology::Ontology;
//! use shapegraph::service::Service;
//!
//! let graph = GraphStore::parse(BUNDLED_SNAPSHOT, RdfSyntax::Turtle, None).unwrap();
//! let service = Service::new(Arc::new(Ontology::new(graph, Vocabulary::default())));
//! let response = service
//!     .expand("@prefix : <http://example.org/ontology/> .\n_:s a :Acquisition ; :acquirer :Google .")
//!     .unwrap();
//! println!("{}", response.inference.inferred_data);
//! ```

pub mod config;
pub mod dictionary;
pub mod error;
pub mod federation;
pub mod graph;
pub mod ontology;
pub mod persist;
pub mod projection;
pub mod rules;
pub mod service;
pub mod validate;
pub mod vocab;
