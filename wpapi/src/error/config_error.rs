use thiserror::Error;

/// Errors raised while constructing a client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No `endpoint` key was supplied.
    #[error("an API endpoint must be provided")]
    MissingEndpoint,

    /// The `endpoint` key held something other than a string.
    #[error("the API endpoint must be a string, found {found}")]
    InvalidEndpoint { found: &'static str },

    /// The `endpoint` string was empty.
    #[error("the API endpoint must not be empty")]
    EmptyEndpoint,

    /// The configuration object could not be deserialized.
    #[error("invalid client configuration: {0}")]
    Invalid(String),
}
