use thiserror::Error;

/// Errors raised by namespace lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceError {
    /// No namespace name was given.
    #[error("a namespace must be provided")]
    Missing,

    /// The namespace was never bootstrapped on this client.
    #[error("the namespace `{name}` is not recognized")]
    Unknown { name: String },
}
