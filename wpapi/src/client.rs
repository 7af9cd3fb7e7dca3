//! The client root object.

use std::collections::BTreeSet;

use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::config::{ClientConfig, ClientOptions, SharedOptions};
use crate::error::{DescriptorError, NamespaceError, WpApiError};
use crate::handler::HandlerFactory;
use crate::method::RestMethod;
use crate::registry::{NamespaceHandlers, NamespaceRegistry};
use crate::request::RequestBuilder;
use crate::route::{ArgSchema, EndpointVariant, RouteDescriptor, RouteMap};
use crate::transport::{default_transport, TransportFn, TransportOverrides, TransportTable, TransportVerb};

/// Namespace exposed directly on the client unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "wp/v2";

/// A client for one REST API root.
///
/// Each client owns its option record, transport overrides and namespace
/// registry; nothing is shared between two clients.
///
/// ## Examples
///
/// ```rust
/// use wpapi::{RouteMap, WpApi};
///
/// let routes = RouteMap::from_json(r#"{
///     "/myplugin/v1/customendpoint/(?P<thing>[\\w-]+)": {
///         "namespace": "myplugin/v1",
///         "methods": ["GET"],
///         "endpoints": [{ "methods": ["GET"], "args": {} }]
///     }
/// }"#).unwrap();
///
/// let site = WpApi::site("http://example.com/wp-json", Some(routes)).unwrap();
/// let request = site
///     .namespace("myplugin/v1")
///     .unwrap()
///     .handler("customendpoint")
///     .unwrap()
///     .request()
///     .set("thing", "foobar")
///     .unwrap();
///
/// assert_eq!(
///     request.to_string(),
///     "http://example.com/wp-json/myplugin/v1/customendpoint/foobar"
/// );
/// ```
#[derive(Debug)]
pub struct WpApi {
    options: SharedOptions,
    registry: NamespaceRegistry,
    default_namespace: String,
}

impl WpApi {
    /// Creates a client and bootstraps it with the configured routes, or with
    /// the bundled `wp/v2` routes when none are configured.
    ///
    /// ## Errors
    ///
    /// - [`WpApiError::Config`] when the endpoint is missing or empty
    /// - [`WpApiError::Descriptor`] when a configured route is malformed
    pub fn new(mut config: ClientConfig) -> Result<Self, WpApiError> {
        let routes = config.routes.take();
        let default_namespace = config
            .default_namespace
            .take()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let options = SharedOptions::new(ClientOptions::from_config(config)?);
        let mut client = Self {
            registry: NamespaceRegistry::new(options.clone()),
            options,
            default_namespace,
        };

        let routes = routes.as_ref().unwrap_or_else(|| RouteMap::default_routes());
        client.registry.bootstrap(routes)?;
        Ok(client)
    }

    /// Creates a client from untyped JSON such as `{"endpoint": "..."}`.
    ///
    /// ## Errors
    ///
    /// Fails like [`ClientConfig::from_value`] and [`WpApi::new`].
    pub fn from_value(config: Value) -> Result<Self, WpApiError> {
        Self::new(ClientConfig::from_value(config)?)
    }

    /// Shorthand for a client of `endpoint` bootstrapped with `routes`.
    ///
    /// ## Errors
    ///
    /// Fails like [`WpApi::new`].
    pub fn site(endpoint: impl Into<String>, routes: Option<RouteMap>) -> Result<Self, WpApiError> {
        let config = ClientConfig::new(endpoint);
        Self::new(match routes {
            Some(routes) => config.routes(routes),
            None => config,
        })
    }

    /// The immutable process-wide default transport table.
    pub fn default_transport() -> &'static TransportTable {
        default_transport()
    }

    /// A copy of the client's current options.
    pub fn options(&self) -> ClientOptions {
        self.options.snapshot()
    }

    /// The normalized endpoint.
    pub fn endpoint(&self) -> String {
        self.options.snapshot().endpoint
    }

    /// Merges `routes` into the registry.
    ///
    /// ## Errors
    ///
    /// Returns [`WpApiError::Descriptor`] for a malformed route; the registry
    /// is left unchanged then.
    pub fn bootstrap(&mut self, routes: &RouteMap) -> Result<&mut Self, WpApiError> {
        self.registry.bootstrap(routes)?;
        Ok(self)
    }

    /// The handlers of namespace `name`.
    ///
    /// ## Errors
    ///
    /// Returns a [`NamespaceError`] for an empty or unknown name.
    pub fn namespace(&self, name: &str) -> Result<&NamespaceHandlers, NamespaceError> {
        self.registry.namespace(name)
    }

    /// Bootstrapped namespace names.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    /// Namespace whose handlers [`WpApi::handler`] looks up.
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// A factory of the default namespace; the same reference as
    /// `self.namespace(self.default_namespace())?.handler(key)`.
    pub fn handler(&self, key: &str) -> Option<&HandlerFactory> {
        self.registry
            .namespace(&self.default_namespace)
            .ok()?
            .handler(key)
    }

    /// Resource keys of the default namespace.
    pub fn handler_keys(&self) -> impl Iterator<Item = &str> {
        self.registry
            .namespace(&self.default_namespace)
            .into_iter()
            .flat_map(NamespaceHandlers::keys)
    }

    /// Enables authentication and overwrites whichever credentials are given.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use wpapi::{AuthOptions, WpApi};
    ///
    /// let mut site = WpApi::site("http://example.com", None).unwrap();
    /// site.auth(("admin", "secret")).auth(AuthOptions::new().nonce("abc"));
    ///
    /// let options = site.options();
    /// assert!(options.auth);
    /// assert_eq!(options.username.as_deref(), Some("admin"));
    /// assert_eq!(options.nonce.as_deref(), Some("abc"));
    /// ```
    pub fn auth(&mut self, credentials: impl Into<AuthOptions>) -> &mut Self {
        let credentials = credentials.into();
        self.options.update(|options| {
            options.auth = true;
            if let Some(username) = credentials.username {
                options.username = Some(username);
            }
            if let Some(password) = credentials.password {
                options.password = Some(password);
            }
            if let Some(nonce) = credentials.nonce {
                options.nonce = Some(nonce);
            }
        });
        self
    }

    /// Merges `overrides` into this client's transport table.
    ///
    /// Verbs not mentioned keep their previous function. Builders created
    /// before this call see the change too.
    pub fn transport(&mut self, overrides: TransportOverrides) -> &mut Self {
        let verbs: Vec<TransportVerb> = overrides.verbs().collect();
        debug!(?verbs, "Installing transport overrides");
        self.options.update(|options| options.transport.merge(overrides));
        self
    }

    /// The function this client uses for `verb`.
    pub fn transport_fn(&self, verb: TransportVerb) -> TransportFn {
        self.options.snapshot().transport.resolve(verb)
    }

    /// A builder bound to an absolute URL, bypassing route resolution.
    pub fn url(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::for_url(self.options.request_options(), url.into())
    }

    /// A builder for `endpoint + path`; `""` targets the API root.
    pub fn root(&self, path: &str) -> RequestBuilder {
        RequestBuilder::rooted(self.options.request_options(), path)
    }

    /// Registers one route outside of a full route map.
    ///
    /// `rest_base` may contain named parameters, e.g.
    /// `authors/(?P<name>[\w-]+)`.
    ///
    /// ## Errors
    ///
    /// Returns [`WpApiError::Descriptor`] when the route is malformed.
    pub fn register_route(
        &mut self,
        namespace: &str,
        rest_base: &str,
        options: RouteOptions,
    ) -> Result<HandlerFactory, WpApiError> {
        let namespace = namespace.trim_matches('/');
        let rest_base = rest_base.trim_matches('/');
        let template = format!("/{namespace}/{rest_base}");
        if rest_base.is_empty() {
            return Err(DescriptorError::NoResource { route: template }.into());
        }

        let methods = if options.methods.is_empty() {
            TransportVerb::iter().map(TransportVerb::method).collect()
        } else {
            options.methods
        };
        let variant = options
            .params
            .into_iter()
            .fold(EndpointVariant::new(methods), |variant, param| {
                variant.arg(param, ArgSchema::optional())
            });
        let descriptor = RouteDescriptor::new(namespace).endpoint(variant);

        self.registry
            .register(&template, &descriptor)?
            .ok_or_else(|| DescriptorError::NoResource { route: template }.into())
    }
}

/// Credentials for [`WpApi::auth`]; only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOptions {
    pub username: Option<String>,
    pub password: Option<String>,
    pub nonce: Option<String>,
}

impl AuthOptions {
    /// Empty options; [`WpApi::auth`] with these only turns `auth` on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Username for HTTP basic auth.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Password for HTTP basic auth, usually an application password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Nonce sent as `X-WP-Nonce` for cookie authentication.
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

impl<U: Into<String>, P: Into<String>> From<(U, P)> for AuthOptions {
    fn from((username, password): (U, P)) -> Self {
        Self::new().username(username).password(password)
    }
}

/// Options for [`WpApi::register_route`].
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Allowed verbs; every transport verb when empty.
    pub methods: BTreeSet<RestMethod>,
    /// Argument names exposed as mixins.
    pub params: Vec<String>,
}

impl RouteOptions {
    /// No methods and no params: every verb is allowed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows `method` on the route.
    pub fn method(mut self, method: RestMethod) -> Self {
        self.methods.insert(method);
        self
    }

    /// Declares an optional argument, exposed as a mixin of the same name.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(name.into());
        self
    }
}
