//! Chainable request builders for WordPress-style REST APIs, generated at
//! runtime from a route map.
//!
//! A route map (the `routes` object of an API index) is bootstrapped into a
//! registry of [`HandlerFactory`] values, one per resource and namespace.
//! Every factory produces [`RequestBuilder`]s whose setters come from the
//! resource's path templates and endpoint arguments.
//!
//! ```rust
//! use wpapi::WpApi;
//!
//! let site = WpApi::site("http://example.com/wp-json", None).unwrap();
//! let drafts = site
//!     .handler("posts")
//!     .unwrap()
//!     .request()
//!     .param("status", "draft")
//!     .per_page(5);
//!
//! assert_eq!(
//!     drafts.to_string(),
//!     "http://example.com/wp-json/wp/v2/posts?per_page=5&status=draft"
//! );
//! ```
//!
//! Requests are issued through a transport table. The default one uses
//! `reqwest`; each client may override individual verbs with
//! [`WpApi::transport`].

mod client;
mod config;
mod discovery;
mod error;
mod handler;
mod method;
mod registry;
mod request;
pub mod route;
pub mod transport;

pub use client::{AuthOptions, RouteOptions, WpApi, DEFAULT_NAMESPACE};
pub use config::{normalize_endpoint, ClientConfig, ClientOptions};
pub use discovery::{discover, API_LINK_REL};
pub use error::{
    AuthError, ClientError, ConfigError, DescriptorError, DiscoveryError, NamespaceError,
    RequestError, TransportError, WpApiError,
};
pub use handler::{Capability, HandlerFactory, ResourceHandler};
pub use method::RestMethod;
pub use registry::{NamespaceHandlers, NamespaceRegistry};
pub use request::{RequestBuilder, RequestOptions};
pub use route::{ArgSchema, EndpointVariant, RouteDescriptor, RouteMap};
pub use transport::{
    default_transport, TransportFn, TransportFuture, TransportHandle, TransportOverrides,
    TransportTable, TransportVerb,
};
