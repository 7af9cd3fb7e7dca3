//! Client configuration.
//!
//! [`ClientConfig`] is what callers hand to [`WpApi::new`](crate::WpApi::new);
//! [`ClientOptions`] is the live per-client record derived from it.

use std::env;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::request::RequestOptions;
use crate::route::RouteMap;
use crate::transport::{TransportHandle, TransportOverrides};

/// Environment variable holding the API root URL.
pub const ENDPOINT_ENV: &str = "WPAPI_ENDPOINT";
/// Environment variable holding the basic-auth username.
pub const USERNAME_ENV: &str = "WPAPI_USERNAME";
/// Environment variable holding the basic-auth password.
pub const PASSWORD_ENV: &str = "WPAPI_PASSWORD";
/// Environment variable holding the `X-WP-Nonce` value.
pub const NONCE_ENV: &str = "WPAPI_NONCE";

/// Configuration for a new client.
///
/// Use the builder pattern, deserialize it from JSON, or read it from the
/// environment with [`ClientConfig::from_env`].
///
/// ## Examples
///
/// ```
/// use wpapi::ClientConfig;
///
/// let config = ClientConfig::new("http://example.com/wp-json")
///     .username("admin")
///     .password("secret")
///     .option("lang", "en");
/// assert_eq!(config.extra["lang"], "en");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the API, e.g. `http://example.com/wp-json`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Send credentials from the first request on, without calling `auth()`.
    #[serde(default)]
    pub auth: bool,
    /// Route map to bootstrap with; the bundled `wp/v2` routes when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<RouteMap>,
    /// Namespace whose handlers are exposed on the client; `wp/v2` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,
    /// Per-client transport overrides.
    #[serde(skip)]
    pub transport: TransportOverrides,
    /// Passthrough options, kept on the client but never copied to requests.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientConfig {
    /// A config for the API rooted at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    /// Username for HTTP basic auth.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Password for HTTP basic auth.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Nonce sent as `X-WP-Nonce`.
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sends credentials from the first request on.
    pub fn auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    /// Bootstraps with `routes` instead of the bundled map.
    pub fn routes(mut self, routes: RouteMap) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Exposes the handlers of `namespace` on the client.
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    /// Transport overrides installed at construction.
    pub fn transport(mut self, overrides: TransportOverrides) -> Self {
        self.transport = overrides;
        self
    }

    /// Adds a passthrough option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Reads a configuration from untyped JSON.
    ///
    /// ## Errors
    ///
    /// - [`ConfigError::MissingEndpoint`] when `endpoint` is absent or null
    /// - [`ConfigError::InvalidEndpoint`] when `endpoint` is not a string
    /// - [`ConfigError::Invalid`] when the value is not an object or another
    ///   key has the wrong shape
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Value::Object(object) = &value else {
            return Err(ConfigError::Invalid(format!(
                "expected an object, found {}",
                json_type(&value)
            )));
        };

        match object.get("endpoint") {
            None | Some(Value::Null) => return Err(ConfigError::MissingEndpoint),
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(ConfigError::InvalidEndpoint {
                    found: json_type(other),
                })
            }
        }

        serde_json::from_value(value).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reads `WPAPI_ENDPOINT`, `WPAPI_USERNAME`, `WPAPI_PASSWORD` and
    /// `WPAPI_NONCE`. Credentials enable `auth` when both are present.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::MissingEndpoint`] when `WPAPI_ENDPOINT` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env::var(ENDPOINT_ENV).map_err(|_| ConfigError::MissingEndpoint)?;
        let username = env::var(USERNAME_ENV).ok();
        let password = env::var(PASSWORD_ENV).ok();

        Ok(Self {
            endpoint: Some(endpoint),
            auth: username.is_some() && password.is_some(),
            username,
            password,
            nonce: env::var(NONCE_ENV).ok(),
            ..Self::default()
        })
    }
}

/// The live option record of one client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Normalized root URL, always ending in exactly one `/`.
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub nonce: Option<String>,
    pub auth: bool,
    /// Handle on the client's transport overrides.
    pub transport: TransportHandle,
    /// Passthrough options given at construction.
    pub extra: Map<String, Value>,
}

impl ClientOptions {
    /// Builds the record from a config, normalizing the endpoint.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::MissingEndpoint`] or [`ConfigError::EmptyEndpoint`].
    pub(crate) fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint.ok_or(ConfigError::MissingEndpoint)?;
        Ok(Self {
            endpoint: normalize_endpoint(&endpoint)?,
            username: config.username,
            password: config.password,
            nonce: config.nonce,
            auth: config.auth,
            transport: TransportHandle::new(config.transport),
            extra: config.extra,
        })
    }

    /// The whitelisted subset handed to request builders.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            endpoint: self.endpoint.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            nonce: self.nonce.clone(),
            auth: self.auth,
            transport: self.transport.clone(),
        }
    }
}

/// One client's option record, shared with its handler factories.
#[derive(Debug, Clone)]
pub(crate) struct SharedOptions(Arc<RwLock<ClientOptions>>);

impl SharedOptions {
    pub(crate) fn new(options: ClientOptions) -> Self {
        Self(Arc::new(RwLock::new(options)))
    }

    pub(crate) fn snapshot(&self) -> ClientOptions {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn request_options(&self) -> RequestOptions {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .request_options()
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ClientOptions) -> R) -> R {
        f(&mut self.0.write().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Ensures `endpoint` ends in exactly one `/`.
///
/// ## Errors
///
/// Returns [`ConfigError::EmptyEndpoint`] for an empty or blank string.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ConfigError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::EmptyEndpoint);
    }
    Ok(format!("{}/", endpoint.trim_end_matches('/')))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
