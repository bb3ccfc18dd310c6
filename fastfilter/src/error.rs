//! Error types for the fast filter.

use crate::model::DocId;

/// Errors raised while compiling or evaluating a fast filter.
///
/// Construction errors (`InvalidEncodingText`, `MalformedEncoding`,
/// `MissingParameter`, `InvalidParameter`, `InvalidOperation`) reject the
/// filter before any evaluator exists. Evaluation errors (`ValueParse`,
/// `ValueOverflow`) fail a single document and must reach the caller
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The `terms` parameter is not valid base64 text.
    #[error("invalid base64 in terms: {0}")]
    InvalidEncodingText(String),

    /// The decoded `terms` bytes are not a valid compressed integer set.
    #[error("malformed terms encoding: {0}")]
    MalformedEncoding(String),

    /// A required construction parameter is absent.
    #[error("Missing parameter [{0}]")]
    MissingParameter(String),

    /// A construction parameter has an unusable value.
    #[error("invalid parameter [{name}]: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The `operation` parameter is neither `include` nor `exclude`.
    #[error("invalid operation [{0}], expected [include] or [exclude]")]
    InvalidOperation(String),

    /// The document identifier is not an integer.
    #[error("doc {doc}: cannot parse identifier [{value}] as an integer")]
    ValueParse { doc: DocId, value: String },

    /// The document value does not fit in an unsigned 32-bit integer.
    #[error("doc {doc}: value {value} is outside the unsigned 32-bit range")]
    ValueOverflow { doc: DocId, value: String },

    /// Documents were visited out of order within one segment.
    #[error("doc {requested} requested after doc {current}; doc ids must increase")]
    DocOrder { current: DocId, requested: DocId },

    /// The evaluator was used before being bound to a segment.
    #[error("evaluator is not bound to a segment")]
    Unbound,

    /// The script engine was asked to compile for a context it does not serve.
    #[error("{engine} scripts cannot be used for context [{context}]")]
    UnsupportedContext {
        engine: &'static str,
        context: &'static str,
    },

    /// The script source does not name a known script.
    #[error("Unknown script name {0}")]
    UnknownScript(String),

    /// The command line configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for fast filter operations.
pub type Result<T> = std::result::Result<T, Error>;
