use thiserror::Error;

/// A configured detection or domain pattern that failed to compile.
#[derive(Debug, Error)]
#[error("invalid pattern {pattern:?} for {name}: {source}")]
pub struct PatternError {
    pub name: String,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A queue payload that lacks the fields a worker needs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload field `{0}` is missing")]
    MissingField(&'static str),
    #[error("payload field `{0}` has the wrong type")]
    InvalidField(&'static str),
}
