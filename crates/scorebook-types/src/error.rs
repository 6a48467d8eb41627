use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown match format: {0}")]
    UnknownFormat(String),

    #[error("match format already registered: {0}")]
    DuplicateFormat(String),

    #[error("invalid rules for {code}: {reason}")]
    InvalidRules { code: String, reason: String },

    #[error("illegal {entity} transition: {from} -> {to}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}
