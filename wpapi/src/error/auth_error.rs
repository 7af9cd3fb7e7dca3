use thiserror::Error;

/// Authentication and authorization failures reported by the remote API.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server answered `401 Unauthorized`.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The server answered `403 Forbidden`.
    #[error("insufficient permissions for {method} {url}")]
    InsufficientPermissions { method: String, url: String },
}
