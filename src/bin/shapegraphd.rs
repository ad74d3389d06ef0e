//! shapegraph HTTP daemon.
//!
//! Loads the ontology once at startup and serves:
//!
//! **Projections:**
//! - `GET  /api/status` — triple count and load source
//! - `GET  /api/stats` — shape, role, rule, lemma and sense counts
//! - `GET  /api/forms` — input fields per shape
//! - `GET  /api/lookup?verb=` — senses of a verb
//!
//! **Requests (Turtle body):**
//! - `POST /api/infer` — request graph plus derived triples
//! - `POST /api/validate` — conformance report
//! - `POST /api/expand` — infer, then validate the expanded graph
//! - `POST /api/save` — store the graph in the configured graph store
//!
//! Build and run: `cargo run --features server --bin shapegraphd`

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use shapegraph::config::ShapegraphConfig;
use shapegraph::error::{GraphError, PersistError, ShapegraphError};
use shapegraph::ontology::Ontology;
use shapegraph::persist::{SparqlUpdateSink, TripleSink};
use shapegraph::projection::{self, FormField, Lookup, OntologyStats, Status};
use shapegraph::service::{ExpandResponse, InferResponse, SaveResponse, Service, ValidateResponse};

// ── Server state ──────────────────────────────────────────────────────────

struct ServerState {
    service: Service,
    sink: Option<Arc<dyn TripleSink>>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Hard failures: caller errors are 400, engine errors 500, the graph store 502.
fn reject(error: ShapegraphError) -> (StatusCode, String) {
    let status = match &error {
        ShapegraphError::Graph(GraphError::Serialize { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        ShapegraphError::Graph(_) => StatusCode::BAD_REQUEST,
        ShapegraphError::Persist(PersistError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
        ShapegraphError::Persist(PersistError::Graph(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        ShapegraphError::Persist(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), "{error}");
    } else {
        tracing::debug!(status = status.as_u16(), "{error}");
    }
    (status, error.to_string())
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn status(State(state): State<Arc<ServerState>>) -> Json<Status> {
    Json(projection::status(state.service.ontology()))
}

async fn stats(State(state): State<Arc<ServerState>>) -> Json<OntologyStats> {
    Json(projection::stats(state.service.ontology()))
}

async fn forms(State(state): State<Arc<ServerState>>) -> Json<BTreeMap<String, Vec<FormField>>> {
    Json(projection::forms(state.service.ontology()))
}

#[derive(Deserialize)]
struct LookupParams {
    verb: Option<String>,
}

async fn lookup(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LookupParams>,
) -> ApiResult<Lookup> {
    match params.verb.filter(|v| !v.trim().is_empty()) {
        Some(verb) => Ok(Json(projection::lookup(state.service.ontology(), &verb))),
        None => Err((StatusCode::BAD_REQUEST, "missing `verb` query parameter".into())),
    }
}

async fn infer(State(state): State<Arc<ServerState>>, body: String) -> ApiResult<InferResponse> {
    state.service.infer(&body).map(Json).map_err(reject)
}

async fn validate(State(state): State<Arc<ServerState>>, body: String) -> ApiResult<ValidateResponse> {
    state.service.validate(&body).map(Json).map_err(reject)
}

async fn expand(State(state): State<Arc<ServerState>>, body: String) -> ApiResult<ExpandResponse> {
    state.service.expand(&body).map(Json).map_err(reject)
}

async fn save(State(state): State<Arc<ServerState>>, body: String) -> ApiResult<SaveResponse> {
    let Some(sink) = state.sink.clone() else {
        return Err(reject(PersistError::NotConfigured.into()));
    };
    let service = state.service.clone();
    // The graph store client blocks.
    tokio::task::spawn_blocking(move || service.save(&body, sink.as_ref()))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("save task failed: {e}")))?
        .map(Json)
        .map_err(reject)
}

// ── Main ──────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var("SHAPEGRAPH_CONFIG").ok().map(PathBuf::from);
    let config = ShapegraphConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::error!("failed to load configuration: {e}");
        std::process::exit(1);
    });

    let ontology = Ontology::load(&config).unwrap_or_else(|e| {
        tracing::error!("failed to load ontology: {e}");
        std::process::exit(1);
    });

    let sink: Option<Arc<dyn TripleSink>> = match SparqlUpdateSink::from_config(&config.persistence) {
        Ok(sink) => Some(Arc::new(sink)),
        Err(_) => {
            tracing::info!("no graph store configured, /api/save disabled");
            None
        }
    };

    let state = Arc::new(ServerState {
        service: Service::new(ontology),
        sink,
    });

    let app = Router::new()
        // Projections.
        .route("/api/status", get(status))
        .route("/api/stats", get(stats))
        .route("/api/forms", get(forms))
        .route("/api/lookup", get(lookup))
        // Requests.
        .route("/api/infer", post(infer))
        .route("/api/validate", post(validate))
        .route("/api/expand", post(expand))
        .route("/api/save", post(save))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = config.server.bind.clone();
    tracing::info!("shapegraphd listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    // Serve with graceful shutdown on SIGTERM/SIGINT.
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let ctrl_c = tokio::signal::ctrl_c();
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        tokio::select! {
                            _ = ctrl_c => {},
                            _ = sigterm.recv() => {},
                        }
                    }
                    Err(_) => {
                        ctrl_c.await.ok();
                    }
                }
            }
            #[cfg(not(unix))]
            {
                ctrl_c.await.ok();
            }
            tracing::info!("shapegraphd shutting down");
        })
        .await;
    if let Err(e) = served {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
