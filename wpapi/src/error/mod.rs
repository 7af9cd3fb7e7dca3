//! Layered error types for the wpapi crate.
//!
//! The error hierarchy is structured for actionable diagnostics:
//! - [`WpApiError`] - Top-level error type for all client operations
//! - [`ConfigError`] - Client construction and endpoint configuration errors
//! - [`NamespaceError`] - Lookups of namespaces that were never bootstrapped
//! - [`DescriptorError`] - Malformed route descriptors and path templates
//! - [`RequestError`] - Misuse of a generated request builder
//! - [`TransportError`] - Attempts to modify the immutable default transport
//! - [`ClientError`] - HTTP client and network errors
//! - [`AuthError`] - Authentication and authorization errors
//! - [`DiscoveryError`] - Failures locating or reading a remote route index

mod api_error;
mod auth_error;
mod client_error;
mod config_error;
mod descriptor_error;
mod discovery_error;
mod namespace_error;
mod request_error;
mod transport_error;

pub use api_error::WpApiError;
pub use auth_error::AuthError;
pub use client_error::ClientError;
pub use config_error::ConfigError;
pub use descriptor_error::DescriptorError;
pub use discovery_error::DiscoveryError;
pub use namespace_error::NamespaceError;
pub use request_error::RequestError;
pub use transport_error::TransportError;
