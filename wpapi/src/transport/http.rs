//! Default HTTP transport with tracing instrumentation.
//!
//! These are the functions behind the process-wide default
//! [`TransportTable`](super::TransportTable). Each one captures what it needs
//! from the [`RequestBuilder`] up front and returns a `'static` future that
//! sends the request through a shared `reqwest::Client`.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use tracing::{debug, instrument, Span};
use url::Url;

use super::TransportFuture;
use crate::error::{AuthError, ClientError, WpApiError};
use crate::method::RestMethod;
use crate::request::RequestBuilder;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying a cookie-authentication nonce.
pub const NONCE_HEADER: &str = "X-WP-Nonce";

static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// The shared HTTP client used by the default transport and discovery.
///
/// Built on first use; a failed build is returned and retried on the next call.
pub(crate) fn http_client() -> Result<&'static reqwest::Client, ClientError> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client);
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        // idle connections would outlive the async runtime that opened them
        .pool_max_idle_per_host(0)
        .build()
        .map_err(ClientError::Request)?;
    Ok(HTTP_CLIENT.get_or_init(|| client))
}

/// Default `get` transport.
pub fn get(request: &RequestBuilder, _data: Option<&Value>) -> TransportFuture {
    execute(RestMethod::Get, request, None)
}

/// Default `head` transport; resolves to the response headers as a JSON object.
pub fn head(request: &RequestBuilder, _data: Option<&Value>) -> TransportFuture {
    execute(RestMethod::Head, request, None)
}

/// Default `post` transport.
pub fn post(request: &RequestBuilder, data: Option<&Value>) -> TransportFuture {
    execute(RestMethod::Post, request, data)
}

/// Default `put` transport.
pub fn put(request: &RequestBuilder, data: Option<&Value>) -> TransportFuture {
    execute(RestMethod::Put, request, data)
}

/// Default `delete` transport.
pub fn delete(request: &RequestBuilder, data: Option<&Value>) -> TransportFuture {
    execute(RestMethod::Delete, request, data)
}

/// Everything a request needs once it has left the builder.
#[derive(Debug)]
struct Outgoing {
    method: RestMethod,
    url: String,
    basic_auth: Option<(String, String)>,
    nonce: Option<String>,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
}

fn execute(method: RestMethod, request: &RequestBuilder, data: Option<&Value>) -> TransportFuture {
    let options = request.options();
    let basic_auth = match (&options.username, &options.password) {
        (Some(username), Some(password)) if options.auth => {
            Some((username.clone(), password.clone()))
        }
        _ => None,
    };

    let outgoing = Outgoing {
        method,
        url: request.to_string(),
        basic_auth,
        nonce: options.nonce.clone(),
        headers: request.headers().clone(),
        body: data.filter(|_| method.has_body()).cloned(),
    };

    send(outgoing).boxed()
}

#[instrument(
    name = "wpapi_request",
    skip(outgoing),
    fields(
        http.method = %outgoing.method,
        http.url = %outgoing.url,
        http.status_code = tracing::field::Empty,
        otel.kind = "client",
        otel.status_code = tracing::field::Empty,
    )
)]
async fn send(outgoing: Outgoing) -> Result<Value, WpApiError> {
    let url = Url::parse(&outgoing.url).map_err(|source| ClientError::InvalidUrl {
        url: outgoing.url.clone(),
        source,
    })?;

    let mut request = http_client()?.request(outgoing.method.to_reqwest(), url);

    if let Some((username, password)) = &outgoing.basic_auth {
        request = request.basic_auth(username, Some(password));
    }
    if let Some(nonce) = &outgoing.nonce {
        request = request.header(NONCE_HEADER, nonce);
    }
    request = request.headers(header_map(&outgoing.headers)?);
    if let Some(body) = &outgoing.body {
        request = request.json(body);
    }

    debug!("Sending request");
    let response = request.send().await.map_err(ClientError::Request)?;

    let status = response.status();
    let status_code = status.as_u16();
    Span::current().record("http.status_code", status_code);
    debug!(status = status_code, "Received response");

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());

        let otel_status = if status.is_server_error() {
            "ERROR"
        } else {
            "UNSET"
        };
        Span::current().record("otel.status_code", otel_status);

        if status_code == 401 {
            return Err(AuthError::AuthenticationFailed { message }.into());
        }
        if status_code == 403 {
            return Err(AuthError::InsufficientPermissions {
                method: outgoing.method.to_string(),
                url: outgoing.url,
            }
            .into());
        }

        return Err(ClientError::HttpStatus {
            status: status_code,
            message,
        }
        .into());
    }

    Span::current().record("otel.status_code", "OK");

    if outgoing.method == RestMethod::Head {
        return Ok(headers_to_json(response.headers()));
    }

    let body = response.bytes().await.map_err(ClientError::Request)?;
    if body.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let invalid = || ClientError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::try_from(name.as_str()).map_err(|_| invalid())?;
        let header_value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid())?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut object = Map::new();
    for (name, value) in headers {
        if let Ok(text) = value.to_str() {
            object.insert(name.as_str().to_string(), Value::String(text.to_string()));
        }
    }
    Value::Object(object)
}
