//! Rich diagnostic error types for the curricula engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so operators know exactly
//! what went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the curricula engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the operator.
#[derive(Debug, Error, Diagnostic)]
pub enum CurriculaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reseed(#[from] ReseedError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    PathMap(#[from] PathMapError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(curricula::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(curricula::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption — try running with a fresh data directory. \
             If the problem persists, file a bug report."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(curricula::store::serde),
        help(
            "Failed to serialize or deserialize a stored document. \
             This usually means the stored data format has changed between versions. \
             Reseed the affected topic to rewrite its documents."
        )
    )]
    Serialization { message: String },

    #[error("topic not found: \"{slug}\"")]
    #[diagnostic(
        code(curricula::store::topic_not_found),
        help("List known topics with `curricula info`, or reseed the topic first.")
    )]
    TopicNotFound { slug: String },

    #[error("category not found: \"{slug}\" in topic \"{topic}\"")]
    #[diagnostic(
        code(curricula::store::category_not_found),
        help("List a topic's categories with `curricula categories --topic <slug>`.")
    )]
    CategoryNotFound { topic: String, slug: String },
}

// ---------------------------------------------------------------------------
// Taxonomy errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TaxonomyError {
    #[error("failed to parse taxonomy: {message}")]
    #[diagnostic(
        code(curricula::taxonomy::parse),
        help(
            "The taxonomy document is not valid JSON, or its top level is not an \
             object of group keys. See `data/curricula/` for the expected shape."
        )
    )]
    Parse { message: String },

    #[error("taxonomy is empty: no groups defined")]
    #[diagnostic(
        code(curricula::taxonomy::empty),
        help("A curriculum taxonomy needs at least one top-level group key.")
    )]
    Empty,
}

// ---------------------------------------------------------------------------
// Curriculum source errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("curriculum source not found: \"{id}\"")]
    #[diagnostic(
        code(curricula::source::not_found),
        help(
            "List available sources with `curricula source list`. External sources \
             are discovered from the configured sources directory."
        )
    )]
    NotFound { id: String },

    #[error("failed to parse curriculum source \"{id}\": {message}")]
    #[diagnostic(
        code(curricula::source::parse),
        help("Check the source JSON against the documented shape in data/curricula/.")
    )]
    Parse { id: String, message: String },

    #[error("failed to read curriculum source file: {path}")]
    #[diagnostic(
        code(curricula::source::io),
        help("Ensure the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Reseed errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ReseedError {
    #[error(
        "staged section \"{section}\" references a category of topic {category_topic}, expected topic {topic}"
    )]
    #[diagnostic(
        code(curricula::reseed::topic_mismatch),
        help(
            "Every section must belong to a category of the same topic. \
             This indicates a bug in the normalizer staging — please file a report."
        )
    )]
    TopicMismatch {
        section: String,
        topic: u64,
        category_topic: u64,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

// ---------------------------------------------------------------------------
// PathMap errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PathMapError {
    #[error("unknown experience level: \"{value}\"")]
    #[diagnostic(
        code(curricula::pathmap::unknown_level),
        help("Valid levels are: 0-1_year, 1-3_years, 3-5_years (or 0-1y, 1-3y, 3-5y).")
    )]
    UnknownLevel { value: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Suggest-service errors
// ---------------------------------------------------------------------------

/// Errors from the external label-suggestion service.
///
/// These never propagate out of the grouping classifier — every variant is
/// absorbed by the deterministic fallback — but they carry diagnostics so the
/// fallback warnings stay actionable.
#[derive(Debug, Error, Diagnostic)]
pub enum SuggestError {
    #[error("suggest service is not available at {url}")]
    #[diagnostic(
        code(curricula::suggest::unavailable),
        help("Start the service, or disable it with `--no-suggest` to use pattern rules only.")
    )]
    Unavailable { url: String },

    #[error("suggest request failed: {message}")]
    #[diagnostic(
        code(curricula::suggest::request_failed),
        help("Check that the suggest service is running and reachable.")
    )]
    RequestFailed { message: String },

    #[error("failed to parse suggest response: {message}")]
    #[diagnostic(
        code(curricula::suggest::parse_error),
        help("The service returned an unexpected response format.")
    )]
    ParseError { message: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(curricula::config::io),
        help("Ensure the config file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(curricula::config::parse),
        help("Check the TOML syntax. See the documented fields in `curricula::config`.")
    )]
    Parse { path: String, message: String },
}

/// Convenience alias for functions returning curricula results.
pub type CurriculaResult<T> = std::result::Result<T, CurriculaError>;
