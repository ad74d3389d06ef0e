//! Runtime configuration.
//!
//! Loaded from an optional TOML file (every key optional), then overridden by
//! environment variables. Vocabulary entries are local names resolved against
//! the ontology namespace unless they already look like absolute IRIs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::graph::Iri;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapegraphConfig {
    #[serde(default)]
    pub federation: FederationConfig,
    #[serde(default)]
    pub vocabulary: Vocabulary,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the ontology comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Manifest locator (path or URL). `None` loads the fallback snapshot directly.
    #[serde(default)]
    pub manifest: Option<String>,
    /// Directory of pre-fetched partitions, matched by file name.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Operator-supplied fallback snapshot; the bundled one is used when unset.
    #[serde(default)]
    pub fallback: Option<PathBuf>,
    /// Timeout for each remote fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_fetch_timeout() -> u64 {
    30
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            manifest: None,
            cache_dir: None,
            fallback: None,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl FederationConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Ontology-specific predicate and class names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Ontology namespace; also the empty prefix in rule bodies and output.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Namespace for request-local scratch nodes.
    #[serde(default = "default_temp_namespace")]
    pub temp_namespace: String,
    #[serde(default = "default_load_order")]
    pub load_order: String,
    #[serde(default = "default_source_file")]
    pub source_file: String,
    /// Lexeme predicate driving dictionary hydration.
    #[serde(default = "default_lemma")]
    pub lemma: String,
    #[serde(default = "default_present3sg")]
    pub present3sg: String,
    /// `(sense :sense lexical-entry)`.
    #[serde(default = "default_sense")]
    pub sense: String,
    #[serde(default = "default_gloss")]
    pub gloss: String,
    /// `(sense :situation SituationClass)`.
    #[serde(default = "default_situation")]
    pub situation: String,
    #[serde(default = "default_role_class")]
    pub role_class: String,
}

fn default_namespace() -> String {
    "http://example.org/ontology/".into()
}
fn default_temp_namespace() -> String {
    "http://example.org/temp/".into()
}
fn default_load_order() -> String {
    "loadOrder".into()
}
fn default_source_file() -> String {
    "sourceFile".into()
}
fn default_lemma() -> String {
    "lemma".into()
}
fn default_present3sg() -> String {
    "present3sg".into()
}
fn default_sense() -> String {
    "sense".into()
}
fn default_gloss() -> String {
    "gloss".into()
}
fn default_situation() -> String {
    "situation".into()
}
fn default_role_class() -> String {
    "Role".into()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            temp_namespace: default_temp_namespace(),
            load_order: default_load_order(),
            source_file: default_source_file(),
            lemma: default_lemma(),
            present3sg: default_present3sg(),
            sense: default_sense(),
            gloss: default_gloss(),
            situation: default_situation(),
            role_class: default_role_class(),
        }
    }
}

impl Vocabulary {
    /// Resolve a configured name: absolute IRIs pass through, local names join the namespace.
    pub fn resolve(&self, name: &str) -> Iri {
        if name.contains("://") || name.starts_with("urn:") {
            Iri::new(name)
        } else {
            Iri::new(format!("{}{name}", self.namespace))
        }
    }

    pub fn load_order(&self) -> Iri {
        self.resolve(&self.load_order)
    }

    pub fn source_file(&self) -> Iri {
        self.resolve(&self.source_file)
    }

    pub fn lemma(&self) -> Iri {
        self.resolve(&self.lemma)
    }

    pub fn present3sg(&self) -> Iri {
        self.resolve(&self.present3sg)
    }

    pub fn sense(&self) -> Iri {
        self.resolve(&self.sense)
    }

    pub fn gloss(&self) -> Iri {
        self.resolve(&self.gloss)
    }

    pub fn situation(&self) -> Iri {
        self.resolve(&self.situation)
    }

    pub fn role_class(&self) -> Iri {
        self.resolve(&self.role_class)
    }
}

/// External graph store receiving accepted triples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SPARQL 1.1 Update endpoint. Persistence is disabled when unset.
    #[serde(default)]
    pub update_url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Named graph written by `INSERT DATA`.
    #[serde(default = "default_instance_graph")]
    pub instance_graph: String,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

fn default_instance_graph() -> String {
    "http://example.org/token".into()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            update_url: None,
            user: None,
            password: None,
            instance_graph: default_instance_graph(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl ShapegraphConfig {
    /// Read a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Toml { message, .. } => ConfigError::Toml {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Toml {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// File (if any) then process environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally `std::env::var`). Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ONTOLOGY_MANIFEST") {
            self.federation.manifest = Some(v);
        }
        if let Some(v) = get("SHAPEGRAPH_CACHE_DIR") {
            self.federation.cache_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("SHAPEGRAPH_FALLBACK") {
            self.federation.fallback = Some(PathBuf::from(v));
        }
        if let Some(v) = get("SHAPEGRAPH_FETCH_TIMEOUT") {
            self.federation.fetch_timeout_secs =
                v.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "SHAPEGRAPH_FETCH_TIMEOUT".into(),
                    message: format!("expected seconds, got {v:?}"),
                })?;
        }
        if let Some(v) = get("SHAPEGRAPH_NAMESPACE") {
            self.vocabulary.namespace = v;
        }
        if let Some(v) = get("VIRTUOSO_SPARQL_UPDATE_URL") {
            self.persistence.update_url = Some(v);
        }
        if let Some(v) = get("VIRTUOSO_USER") {
            self.persistence.user = Some(v);
        }
        if let Some(v) = get("VIRTUOSO_PASSWORD") {
            self.persistence.password = Some(v);
        }
        if let Some(v) = get("VIRTUOSO_INSTANCE_GRAPH") {
            self.persistence.instance_graph = v;
        }
        if let Some(v) = get("SHAPEGRAPH_BIND") {
            self.server.bind = v;
        }
        Ok(())
    }
}
