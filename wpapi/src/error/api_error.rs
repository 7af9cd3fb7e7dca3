use thiserror::Error;

use super::{
    AuthError, ClientError, ConfigError, DescriptorError, DiscoveryError, NamespaceError,
    RequestError, TransportError,
};

/// Top-level error for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum WpApiError {
    /// The client configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A namespace lookup failed.
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    /// A route descriptor could not be turned into a handler.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// A request builder was used incorrectly.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// A transport table refused a modification.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The HTTP exchange failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The remote API rejected the credentials.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The route index of a remote API could not be discovered.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
