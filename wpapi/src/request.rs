//! Chainable request builder.
//!
//! A [`RequestBuilder`] accumulates a path, query parameters and headers, and
//! materializes to a URL string through [`Display`](fmt::Display). Builders
//! produced by a [`HandlerFactory`](crate::HandlerFactory) hold a shared
//! reference to their resource's capability table, which decides what the
//! named setters ([`RequestBuilder::set`], [`RequestBuilder::segment`]) do.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use url::form_urlencoded::byte_serialize;

use crate::error::RequestError;
use crate::handler::{Capability, ResourceHandler};
use crate::route::PathToken;
use crate::transport::{TransportFuture, TransportHandle, TransportVerb};

/// The options a builder inherits from its client.
///
/// Only these keys are copied; passthrough options given to the client are
/// never visible here.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Base URL, or the full target URL for builders made by `WpApi::url`.
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub nonce: Option<String>,
    /// Whether credentials should be sent.
    pub auth: bool,
    /// Live handle on the client's transport overrides.
    pub transport: TransportHandle,
}

/// Where the builder's path comes from.
#[derive(Debug, Clone)]
enum Target {
    /// A bootstrapped resource; levels are filled by setters.
    Resource {
        handler: Arc<ResourceHandler>,
        levels: BTreeMap<usize, PathPart>,
    },
    /// A literal path below the endpoint.
    Root(String),
    /// The endpoint itself.
    Url,
}

/// One filled path level and the setter that filled it.
#[derive(Debug, Clone)]
struct PathPart {
    name: String,
    value: String,
}

/// A request under construction.
///
/// ## Examples
///
/// ```rust
/// use wpapi::WpApi;
///
/// let site = WpApi::site("http://example.com/wp-json", None).unwrap();
/// let request = site
///     .handler("posts")
///     .unwrap()
///     .request()
///     .set("id", 7)
///     .unwrap()
///     .param("context", "edit");
///
/// assert_eq!(
///     request.to_string(),
///     "http://example.com/wp-json/wp/v2/posts/7?context=edit"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    options: RequestOptions,
    target: Target,
    query: BTreeMap<String, Value>,
    headers: BTreeMap<String, String>,
}

impl RequestBuilder {
    /// A builder for `handler`'s resource, with level 0 already set.
    pub(crate) fn for_resource(options: RequestOptions, handler: Arc<ResourceHandler>) -> Self {
        let mut levels = BTreeMap::new();
        let resource = handler.resource().to_string();
        levels.insert(
            0,
            PathPart {
                name: resource.clone(),
                value: resource,
            },
        );
        Self::with_target(options, Target::Resource { handler, levels })
    }

    /// A builder for `endpoint + path`.
    pub(crate) fn rooted(options: RequestOptions, path: &str) -> Self {
        Self::with_target(options, Target::Root(path.trim_start_matches('/').to_string()))
    }

    /// A builder bound to `url`, ignoring the client's endpoint.
    pub(crate) fn for_url(mut options: RequestOptions, url: String) -> Self {
        options.endpoint = url;
        Self::with_target(options, Target::Url)
    }

    /// Fills `level` directly, bypassing setter dispatch.
    pub(crate) fn with_level(mut self, level: usize, name: &str, value: &Value) -> Self {
        if let Target::Resource { levels, .. } = &mut self.target {
            levels.insert(
                level,
                PathPart {
                    name: name.to_string(),
                    value: path_value(value),
                },
            );
        }
        self
    }

    fn with_target(options: RequestOptions, target: Target) -> Self {
        Self {
            options,
            target,
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Sets a path parameter or an argument mixin by name.
    ///
    /// Path parameters take precedence over arguments of the same name; use
    /// [`RequestBuilder::param`] to reach such an argument. Setting a parameter
    /// again overwrites its previous value, never a level filled by another
    /// setter.
    ///
    /// ## Errors
    ///
    /// - [`RequestError::UnknownSetter`] when the resource has no such name
    /// - [`RequestError::NotAParameter`] when the name is a literal sub-resource
    /// - [`RequestError::MissingLevel`] when the parameter's only free level
    ///   sits below an unset one
    /// - [`RequestError::LevelTaken`] when every level of the parameter is
    ///   held by another setter
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Result<Self, RequestError> {
        let value = value.into();
        let Target::Resource { handler, levels } = &mut self.target else {
            return Err(RequestError::UnknownSetter { name: name.to_string() });
        };

        match handler.capability(name) {
            Some(Capability::Param { slots }) => {
                let slots: Vec<usize> = slots.iter().map(|(level, _)| *level).collect();
                let level = param_level(levels, name, &slots)?;
                levels.insert(
                    level,
                    PathPart {
                        name: name.to_string(),
                        value: path_value(&value),
                    },
                );
            }
            Some(Capability::Arg { .. }) => {
                self.query.insert(name.to_string(), value);
            }
            Some(Capability::Segment { .. }) => {
                return Err(RequestError::NotAParameter { name: name.to_string() })
            }
            None => return Err(RequestError::UnknownSetter { name: name.to_string() }),
        }
        Ok(self)
    }

    /// Appends a literal sub-resource such as `revisions` or `me`.
    ///
    /// ## Errors
    ///
    /// - [`RequestError::UnknownSetter`] when the resource has no such name
    /// - [`RequestError::NotASegment`] when the name takes a value
    pub fn segment(mut self, name: &str) -> Result<Self, RequestError> {
        let Target::Resource { handler, levels } = &mut self.target else {
            return Err(RequestError::UnknownSetter { name: name.to_string() });
        };

        match handler.capability(name) {
            Some(Capability::Segment { levels: slots }) => {
                let level = segment_level(levels, slots);
                levels.insert(
                    level,
                    PathPart {
                        name: name.to_string(),
                        value: name.to_string(),
                    },
                );
            }
            Some(_) => return Err(RequestError::NotASegment { name: name.to_string() }),
            None => return Err(RequestError::UnknownSetter { name: name.to_string() }),
        }
        Ok(self)
    }

    /// Sets a query parameter; `Value::Null` removes it.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        match value.into() {
            Value::Null => {
                self.query.remove(&key);
            }
            value => {
                self.query.insert(key, value);
            }
        }
        self
    }

    /// Sets the 1-based `page` of a collection.
    pub fn page(self, page: u64) -> Self {
        self.param("page", page)
    }

    /// Sets how many items a collection page holds.
    pub fn per_page(self, per_page: u64) -> Self {
        self.param("per_page", per_page)
    }

    /// Sets the `search` term of a collection.
    pub fn search(self, term: impl Into<String>) -> Self {
        self.param("search", term.into())
    }

    /// Sets the `context` parameter (`view`, `embed` or `edit`).
    pub fn context(self, context: impl Into<String>) -> Self {
        self.param("context", context.into())
    }

    /// Asks the server to embed linked resources in the response.
    pub fn embed(self) -> Self {
        self.param("_embed", true)
    }

    /// Adds a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns `true` when `name` is a path setter or argument mixin of this resource.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities()
            .is_some_and(|handler| handler.capability(name).is_some())
    }

    /// The shared capability table, for builders created from a handler factory.
    pub fn capabilities(&self) -> Option<&Arc<ResourceHandler>> {
        match &self.target {
            Target::Resource { handler, .. } => Some(handler),
            Target::Root(_) | Target::Url => None,
        }
    }

    /// Query parameters set on this builder.
    pub fn query_params(&self) -> &BTreeMap<String, Value> {
        &self.query
    }

    /// Headers added with [`RequestBuilder::header`].
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The options inherited from the client when this builder was created.
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Checks the path set so far against the resource's templates.
    ///
    /// This is never called implicitly; the remote API is the final authority.
    ///
    /// ## Errors
    ///
    /// - [`RequestError::MissingLevel`] when a level is set but an earlier one is not
    /// - [`RequestError::InvalidPathValue`] when a value matches no token of its level
    pub fn validate_path(&self) -> Result<(), RequestError> {
        let Target::Resource { handler, levels } = &self.target else {
            return Ok(());
        };

        let mut expected = 0;
        for (&level, PathPart { value, .. }) in levels {
            if level != expected {
                return Err(RequestError::MissingLevel {
                    missing: expected,
                    set: level,
                });
            }
            expected = level + 1;

            let Some(tokens) = handler.levels().get(level) else {
                continue;
            };
            let accepted = tokens.iter().any(|token| match token {
                PathToken::Literal(text) => text == value,
                PathToken::Param(param) => param.accepts(value),
            });
            if !accepted {
                let (name, pattern) = tokens
                    .iter()
                    .find_map(|token| match token {
                        PathToken::Param(param) => {
                            Some((param.name().to_string(), param.pattern().to_string()))
                        }
                        PathToken::Literal(_) => None,
                    })
                    .unwrap_or_else(|| (String::new(), String::new()));
                return Err(RequestError::InvalidPathValue {
                    name,
                    value: value.clone(),
                    pattern,
                });
            }
        }
        Ok(())
    }

    /// Issues a GET through the client's transport.
    pub fn get(&self) -> TransportFuture {
        self.dispatch(TransportVerb::Get, None)
    }

    /// Issues a HEAD through the client's transport.
    pub fn head(&self) -> TransportFuture {
        self.dispatch(TransportVerb::Head, None)
    }

    /// Issues a POST with `data` as the body.
    pub fn create(&self, data: Value) -> TransportFuture {
        self.dispatch(TransportVerb::Post, Some(&data))
    }

    /// Issues a PUT with `data` as the body.
    pub fn update(&self, data: Value) -> TransportFuture {
        self.dispatch(TransportVerb::Put, Some(&data))
    }

    /// Issues a DELETE, optionally with a body such as `{"force": true}`.
    pub fn delete(&self, data: Option<Value>) -> TransportFuture {
        self.dispatch(TransportVerb::Delete, data.as_ref())
    }

    fn dispatch(&self, verb: TransportVerb, data: Option<&Value>) -> TransportFuture {
        let transport = self.options.transport.resolve(verb);
        transport(self, data)
    }
}

impl fmt::Display for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.options.endpoint)?;
        let has_query = match &self.target {
            Target::Resource { handler, levels } => {
                write!(f, "{}/", handler.namespace())?;
                let path: Vec<&str> = levels.values().map(|part| part.value.as_str()).collect();
                f.write_str(&path.join("/"))?;
                false
            }
            Target::Root(path) => {
                f.write_str(path)?;
                self.options.endpoint.contains('?') || path.contains('?')
            }
            Target::Url => self.options.endpoint.contains('?'),
        };

        let mut pairs = Vec::new();
        for (key, value) in &self.query {
            query_pairs(&mut pairs, key.clone(), value);
        }
        if pairs.is_empty() {
            return Ok(());
        }

        let separator = if has_query { '&' } else { '?' };
        write!(f, "{separator}{}", pairs.join("&"))
    }
}

fn extends_path(levels: &BTreeMap<usize, PathPart>, level: usize) -> bool {
    !levels.contains_key(&level) && (level == 0 || levels.contains_key(&(level - 1)))
}

/// Picks the level a parameter writes to.
///
/// An empty slot that directly extends the path wins, then the deepest slot
/// this parameter already holds. A parameter never skips a level nor takes
/// one from another setter.
fn param_level(
    levels: &BTreeMap<usize, PathPart>,
    name: &str,
    slots: &[usize],
) -> Result<usize, RequestError> {
    if let Some(level) = slots.iter().copied().find(|&level| extends_path(levels, level)) {
        return Ok(level);
    }
    if let Some(level) = slots
        .iter()
        .copied()
        .rev()
        .find(|level| levels.get(level).is_some_and(|part| part.name == name))
    {
        return Ok(level);
    }
    if let Some(level) = slots.iter().copied().find(|level| !levels.contains_key(level)) {
        let missing = (0..level).find(|l| !levels.contains_key(l)).unwrap_or(level);
        return Err(RequestError::MissingLevel { missing, set: level });
    }

    let level = slots.first().copied().unwrap_or(0);
    Err(RequestError::LevelTaken {
        name: name.to_string(),
        level,
        by: levels.get(&level).map(|part| part.name.clone()).unwrap_or_default(),
    })
}

/// Picks the level a literal segment writes to; the first slot when none
/// extends the path, which [`RequestBuilder::validate_path`] then reports.
fn segment_level(levels: &BTreeMap<usize, PathPart>, slots: &[usize]) -> usize {
    slots
        .iter()
        .copied()
        .find(|&level| extends_path(levels, level))
        .or_else(|| slots.first().copied())
        .unwrap_or(0)
}

fn path_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Flattens one query value into `key=value` pairs, bracketing nested keys.
fn query_pairs(pairs: &mut Vec<String>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                query_pairs(pairs, format!("{key}[]"), item);
            }
        }
        Value::Object(fields) => {
            for (field, item) in fields {
                query_pairs(pairs, format!("{key}[{field}]"), item);
            }
        }
        scalar => pairs.push(format!("{}={}", encode(&key), encode(&path_value(scalar)))),
    }
}

fn encode(text: &str) -> String {
    // brackets stay readable in keys such as filter[status]
    byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace("%5B", "[")
        .replace("%5D", "]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{ArgSchema, EndpointVariant, RouteDescriptor, RouteMap};
    use crate::{RestMethod, WpApi};
    use serde_json::json;

    fn site() -> WpApi {
        WpApi::site("http://example.com/wp-json", None).unwrap()
    }

    #[test]
    fn resource_url_includes_namespace() {
        let site = site();
        let posts = site.handler("posts").unwrap().request();
        assert_eq!(posts.to_string(), "http://example.com/wp-json/wp/v2/posts");
    }

    #[test]
    fn query_params_are_sorted_and_encoded() {
        let site = site();
        let request = site
            .handler("posts")
            .unwrap()
            .request()
            .search("hello world")
            .page(2)
            .param("categories", json!([1, 2]))
            .param("filter", json!({ "status": "draft" }));

        assert_eq!(
            request.to_string(),
            "http://example.com/wp-json/wp/v2/posts?categories[]=1&categories[]=2&filter[status]=draft&page=2&search=hello+world"
        );
    }

    #[test]
    fn null_removes_a_param() {
        let site = site();
        let request = site
            .handler("tags")
            .unwrap()
            .request()
            .per_page(5)
            .param("per_page", Value::Null);

        assert!(request.query_params().is_empty());
    }

    #[test]
    fn mixins_are_not_builder_state() {
        let site = site();
        let request = site.handler("posts").unwrap().request();

        assert!(request.has_capability("search"));
        assert!(request.query_params().is_empty());

        let request = request.set("search", "rust").unwrap();
        assert_eq!(request.query_params()["search"], "rust");
    }

    #[test]
    fn builders_share_one_capability_table() {
        let site = site();
        let factory = site.handler("pages").unwrap();
        let a = factory.request();
        let b = factory.request();

        assert!(Arc::ptr_eq(a.capabilities().unwrap(), b.capabilities().unwrap()));
    }

    #[test]
    fn segment_and_param_chain() {
        let site = site();
        let request = site
            .handler("posts")
            .unwrap()
            .request()
            .set("parent", 3)
            .unwrap()
            .segment("revisions")
            .unwrap()
            .set("id", 9)
            .unwrap();

        assert_eq!(
            request.to_string(),
            "http://example.com/wp-json/wp/v2/posts/3/revisions/9"
        );
        assert!(request.validate_path().is_ok());
    }

    #[test]
    fn setting_a_param_twice_overwrites() {
        let site = site();
        let request = site
            .handler("posts")
            .unwrap()
            .request()
            .set("id", 1)
            .unwrap()
            .set("id", 2)
            .unwrap();

        assert_eq!(request.to_string(), "http://example.com/wp-json/wp/v2/posts/2");
    }

    #[test]
    fn params_never_take_another_setters_level() {
        let site = site();
        let posts = site.handler("posts").unwrap();

        // id's free slot sits below the unset revisions level
        assert_eq!(
            posts.request().set("parent", 3).unwrap().set("id", 9).unwrap_err(),
            RequestError::MissingLevel { missing: 2, set: 3 }
        );
        assert_eq!(
            posts.request().set("id", 1).unwrap().set("parent", 2).unwrap_err(),
            RequestError::LevelTaken {
                name: "parent".into(),
                level: 1,
                by: "id".into(),
            }
        );
    }

    #[test]
    fn context_and_embed_are_query_params() {
        let site = site();
        let request = site.handler("posts").unwrap().request().context("edit").embed();

        assert_eq!(request.query_params()["context"], "edit");
        assert_eq!(request.query_params()["_embed"], true);
        assert_eq!(
            request.to_string(),
            "http://example.com/wp-json/wp/v2/posts?_embed=true&context=edit"
        );
    }

    #[test]
    fn headers_accumulate_by_name() {
        let site = site();
        let request = site
            .root("wp/v2/posts")
            .header("X-Custom", "a")
            .header("X-Custom", "b")
            .header("Accept-Language", "fr");

        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.headers()["X-Custom"], "b");
        assert_eq!(request.to_string(), "http://example.com/wp-json/wp/v2/posts");
    }

    #[test]
    fn unknown_and_misused_setters_fail() {
        let site = site();
        let users = site.handler("users").unwrap();

        assert_eq!(
            users.request().set("nope", 1).unwrap_err(),
            RequestError::UnknownSetter { name: "nope".into() }
        );
        assert_eq!(
            users.request().set("me", 1).unwrap_err(),
            RequestError::NotAParameter { name: "me".into() }
        );
        assert_eq!(
            users.request().segment("id").unwrap_err(),
            RequestError::NotASegment { name: "id".into() }
        );
    }

    #[test]
    fn path_setter_wins_over_arg_of_same_name() {
        let routes = RouteMap::new().route(
            r"/myplugin/v1/authors/(?P<name>[\w-]+)",
            RouteDescriptor::new("myplugin/v1").endpoint(
                EndpointVariant::new([RestMethod::Get]).arg("name", ArgSchema::optional()),
            ),
        );
        let site = WpApi::site("http://example.com", Some(routes)).unwrap();
        let authors = site.namespace("myplugin/v1").unwrap().handler("authors").unwrap();

        let by_path = authors.request().set("name", "ada").unwrap();
        assert_eq!(by_path.to_string(), "http://example.com/myplugin/v1/authors/ada");

        let by_query = authors.request().param("name", "ada");
        assert_eq!(by_query.to_string(), "http://example.com/myplugin/v1/authors?name=ada");
    }

    #[test]
    fn validate_path_reports_gaps_and_bad_values() {
        let site = site();
        let posts = site.handler("posts").unwrap();

        let bad = posts.request().set("id", "abc").unwrap();
        assert!(matches!(
            bad.validate_path(),
            Err(RequestError::InvalidPathValue { ref name, .. }) if name == "id"
        ));

        // level 2 literal set without level 1
        let gap = posts.request().segment("revisions").unwrap();
        assert_eq!(
            gap.validate_path(),
            Err(RequestError::MissingLevel { missing: 1, set: 2 })
        );
    }

    #[test]
    fn root_and_url_builders() {
        let site = site();
        assert_eq!(site.root("").to_string(), "http://example.com/wp-json/");
        assert_eq!(
            site.root("/a-resource").param("force", true).to_string(),
            "http://example.com/wp-json/a-resource?force=true"
        );
        assert_eq!(
            site.url("http://other.example/feed?x=1").param("y", 2).to_string(),
            "http://other.example/feed?x=1&y=2"
        );
        assert!(site.root("x").set("id", 1).is_err());
        assert_eq!(
            site.root("search?a=1").param("b", 2).to_string(),
            "http://example.com/wp-json/search?a=1&b=2"
        );
    }
}
