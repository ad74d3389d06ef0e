//! Rich diagnostic error types for the shapegraph engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. The top-level [`ShapegraphError`] wraps
//! them transparently so the full diagnostic survives to the CLI.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the shapegraph engine.
#[derive(Debug, Error, Diagnostic)]
pub enum ShapegraphError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Persist(#[from] PersistError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("malformed RDF input: {message}")]
    #[diagnostic(
        code(shapegraph::graph::parse),
        help(
            "The input is not valid Turtle / N-Triples. Check prefixes are declared \
             and every statement ends with `.`."
        )
    )]
    Parse { message: String },

    #[error("empty input: nothing to parse")]
    #[diagnostic(
        code(shapegraph::graph::empty_input),
        help("Submit a non-empty Turtle document.")
    )]
    EmptyInput,

    #[error("cannot serialize graph: {message}")]
    #[diagnostic(code(shapegraph::graph::serialize))]
    Serialize { message: String },

    #[error("invalid IRI <{iri}>: {message}")]
    #[diagnostic(
        code(shapegraph::graph::invalid_iri),
        help("IRIs must be absolute, e.g. `http://example.org/thing`.")
    )]
    InvalidIri { iri: String, message: String },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

// ---------------------------------------------------------------------------
// Rule errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RuleError {
    #[error("rule {rule}: syntax error at offset {offset}: {message}")]
    #[diagnostic(
        code(shapegraph::rule::syntax),
        help(
            "Rule bodies use `CONSTRUCT {{ template }} WHERE {{ pattern }}` with \
             Turtle-style triples, optional PREFIX lines and BIND(MINT(...) AS ?v)."
        )
    )]
    Syntax {
        rule: String,
        offset: usize,
        message: String,
    },

    #[error("rule {rule}: unknown prefix `{prefix}:`")]
    #[diagnostic(
        code(shapegraph::rule::unknown_prefix),
        help("Declare it with a PREFIX line or through sh:prefixes / sh:declare.")
    )]
    UnknownPrefix { rule: String, prefix: String },

    #[error("rule {rule}: template variable ?{variable} is not bound by the pattern")]
    #[diagnostic(
        code(shapegraph::rule::unbound_variable),
        help("Every variable in CONSTRUCT must occur in WHERE or be introduced by BIND.")
    )]
    UnboundVariable { rule: String, variable: String },

    #[error("rule {rule}: cannot build a triple: {message}")]
    #[diagnostic(
        code(shapegraph::rule::invalid_triple),
        help("Subjects must be IRIs or blank nodes and predicates must be IRIs.")
    )]
    InvalidTriple { rule: String, message: String },

    #[error("rule {rule}: invalid mint key: {message}")]
    #[diagnostic(
        code(shapegraph::rule::invalid_mint_key),
        help("MINT(<base>, ?root, ?gloss) needs an IRI base and IRI or literal key values.")
    )]
    InvalidMintKey { rule: String, message: String },

    #[error("rule {rule}: {message}")]
    #[diagnostic(
        code(shapegraph::rule::definition),
        help("A rule needs a string sh:construct and an integer sh:order (default 0).")
    )]
    Definition { rule: String, message: String },
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("shape {shape}: unsupported constraint component {component}")]
    #[diagnostic(
        code(shapegraph::validate::unsupported),
        help(
            "Supported components: minCount, maxCount, datatype, class, pattern, in. \
             Remove or rewrite the constraint."
        )
    )]
    Unsupported { shape: String, component: String },

    #[error("shape {shape}: sh:path must be an IRI")]
    #[diagnostic(
        code(shapegraph::validate::path),
        help("Property paths (sequences, inverses, alternatives) are not supported.")
    )]
    NonIriPath { shape: String },

    #[error("shape {shape}: {component} must be a non-negative integer, got {value}")]
    #[diagnostic(code(shapegraph::validate::count))]
    InvalidCount {
        shape: String,
        component: String,
        value: String,
    },

    #[error("shape {shape}: invalid sh:pattern {pattern}: {message}")]
    #[diagnostic(code(shapegraph::validate::pattern))]
    InvalidPattern {
        shape: String,
        pattern: String,
        message: String,
    },

    #[error("shape {shape}: {component} must point at a well-formed RDF list")]
    #[diagnostic(code(shapegraph::validate::list))]
    MalformedList { shape: String, component: String },
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

// ---------------------------------------------------------------------------
// Manifest errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("cannot read {locator}: {message}")]
    #[diagnostic(
        code(shapegraph::manifest::read),
        help("Check the path exists and is readable, or set SHAPEGRAPH_CACHE_DIR.")
    )]
    Read { locator: String, message: String },

    #[error("cannot fetch {locator}: {message}")]
    #[diagnostic(
        code(shapegraph::manifest::fetch),
        help("The remote partition could not be downloaded. Check the URL and network.")
    )]
    Fetch { locator: String, message: String },

    #[error("cannot parse {locator}")]
    #[diagnostic(code(shapegraph::manifest::parse))]
    Parse {
        locator: String,
        #[source]
        #[diagnostic_source]
        source: GraphError,
    },

    #[error("manifest {manifest} lists no usable partitions")]
    #[diagnostic(
        code(shapegraph::manifest::empty),
        help("Each partition needs both a load-order integer and a source-file locator.")
    )]
    Empty { manifest: String },
}

pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    #[diagnostic(code(shapegraph::config::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    #[diagnostic(
        code(shapegraph::config::toml),
        help("See the `ShapegraphConfig` fields; every key is optional.")
    )]
    Toml { path: String, message: String },

    #[error("invalid value for {key}: {message}")]
    #[diagnostic(code(shapegraph::config::invalid))]
    Invalid { key: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PersistError {
    #[error("persistence is not configured")]
    #[diagnostic(
        code(shapegraph::persist::not_configured),
        help("Set VIRTUOSO_SPARQL_UPDATE_URL (and credentials) or [persistence] in the config.")
    )]
    NotConfigured,

    #[error("graph store at {url} rejected the update with HTTP {status}: {body}")]
    #[diagnostic(code(shapegraph::persist::status))]
    Status { url: String, status: u16, body: String },

    #[error("cannot reach graph store at {url}: {message}")]
    #[diagnostic(code(shapegraph::persist::transport))]
    Transport { url: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

pub type PersistResult<T> = std::result::Result<T, PersistError>;

/// Convenience alias for functions returning the top-level error.
pub type ShapegraphResult<T> = std::result::Result<T, ShapegraphError>;
