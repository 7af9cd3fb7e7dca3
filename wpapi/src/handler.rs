//! Handler factories and their capability tables.
//!
//! Every resource (the first path segment below a namespace, e.g. `posts`)
//! gets one [`ResourceHandler`]: the union of all route templates, verbs and
//! arguments registered for it. The handler is built once, wrapped in an
//! `Arc`, and shared read-only by every [`RequestBuilder`] its
//! [`HandlerFactory`] produces.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::SharedOptions;
use crate::error::RequestError;
use crate::method::RestMethod;
use crate::request::RequestBuilder;
use crate::route::{ArgSchema, PathParam, PathTemplate, PathToken, RouteDescriptor};

/// What a name does when used on a [`RequestBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    /// A literal sub-resource, set with [`RequestBuilder::segment`].
    Segment { levels: Vec<usize> },
    /// A named path parameter, set with [`RequestBuilder::set`].
    ///
    /// The same name may appear at several levels (`/posts/(?P<id>..)` and
    /// `/posts/(?P<parent>..)/revisions/(?P<id>..)`); each occurrence is a slot.
    Param { slots: Vec<(usize, PathParam)> },
    /// An endpoint argument, recorded as a query parameter.
    Arg { schema: ArgSchema },
}

/// Mutable accumulator for one resource while routes are being merged.
#[derive(Debug, Clone)]
pub(crate) struct ResourceSpec {
    namespace: String,
    resource: String,
    levels: Vec<Vec<PathToken>>,
    deepest: Vec<PathToken>,
    methods: BTreeSet<RestMethod>,
    args: BTreeMap<String, ArgSchema>,
    routes: BTreeSet<String>,
}

impl ResourceSpec {
    pub(crate) fn new(namespace: &str, resource: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            resource: resource.to_string(),
            levels: Vec::new(),
            deepest: Vec::new(),
            methods: BTreeSet::new(),
            args: BTreeMap::new(),
            routes: BTreeSet::new(),
        }
    }

    /// Folds one route into the spec. `tokens` are the template's tokens
    /// below the namespace, starting with the resource literal.
    pub(crate) fn add_route(
        &mut self,
        template: &PathTemplate,
        tokens: &[PathToken],
        descriptor: &RouteDescriptor,
    ) {
        for (level, token) in tokens.iter().enumerate() {
            if self.levels.len() <= level {
                self.levels.push(Vec::new());
            }
            if !self.levels[level].contains(token) {
                self.levels[level].push(token.clone());
            }
        }

        // the template with the most parameters fixes the positional order
        if param_count(tokens) > param_count(&self.deepest) {
            self.deepest = tokens.to_vec();
        }

        self.methods.extend(descriptor.methods.iter().copied());
        for variant in &descriptor.endpoints {
            self.methods.extend(variant.methods.iter().copied());
        }
        for (name, schema) in descriptor.args() {
            self.args
                .entry(name.clone())
                .or_insert_with(|| schema.clone());
        }
        self.routes.insert(template.source().to_string());
    }

    /// Freezes the merged routes into a capability table.
    pub(crate) fn build(&self) -> ResourceHandler {
        let mut capabilities: BTreeMap<String, Capability> = BTreeMap::new();

        for (level, tokens) in self.levels.iter().enumerate().skip(1) {
            for token in tokens {
                let name = token.name();
                if let Some(existing) = capabilities.get_mut(name) {
                    match (token, existing) {
                        (PathToken::Literal(_), Capability::Segment { levels }) => levels.push(level),
                        (PathToken::Param(param), Capability::Param { slots }) => {
                            slots.push((level, param.clone()));
                        }
                        _ => debug!(
                            resource = %self.resource,
                            name,
                            level,
                            "Path token shadowed by an earlier token of the same name"
                        ),
                    }
                    continue;
                }

                let capability = match token {
                    PathToken::Literal(_) => Capability::Segment { levels: vec![level] },
                    PathToken::Param(param) => Capability::Param {
                        slots: vec![(level, param.clone())],
                    },
                };
                capabilities.insert(name.to_string(), capability);
            }
        }

        for (name, schema) in &self.args {
            if capabilities.contains_key(name) {
                debug!(
                    resource = %self.resource,
                    name = %name,
                    "Argument shadowed by a path setter; reachable through param()"
                );
                continue;
            }
            capabilities.insert(name.clone(), Capability::Arg { schema: schema.clone() });
        }

        ResourceHandler {
            namespace: self.namespace.clone(),
            resource: self.resource.clone(),
            levels: self.levels.clone(),
            methods: self.methods.clone(),
            args: self.args.clone(),
            capabilities,
            positional: self.deepest.clone(),
            routes: self.routes.clone(),
        }
    }
}

/// The shared, read-only capability table of one resource.
#[derive(Debug)]
pub struct ResourceHandler {
    namespace: String,
    resource: String,
    levels: Vec<Vec<PathToken>>,
    methods: BTreeSet<RestMethod>,
    args: BTreeMap<String, ArgSchema>,
    capabilities: BTreeMap<String, Capability>,
    positional: Vec<PathToken>,
    routes: BTreeSet<String>,
}

fn param_count(tokens: &[PathToken]) -> usize {
    tokens
        .iter()
        .filter(|token| matches!(token, PathToken::Param(_)))
        .count()
}

impl ResourceHandler {
    /// The namespace the resource was registered under, e.g. `wp/v2`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The resource key, e.g. `posts`.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Path tokens per level; level 0 is the resource itself.
    pub fn levels(&self) -> &[Vec<PathToken>] {
        &self.levels
    }

    /// Union of the verbs of every registered route.
    pub fn methods(&self) -> &BTreeSet<RestMethod> {
        &self.methods
    }

    /// Union of the args of every endpoint variant; the first schema seen wins.
    pub fn args(&self) -> &BTreeMap<String, ArgSchema> {
        &self.args
    }

    /// What `name` does on a builder of this resource, if anything.
    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.capabilities.get(name)
    }

    /// Every setter name, in sorted order.
    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.capabilities.keys().map(String::as_str)
    }

    /// Parameter names in the order positional values fill them: the
    /// declared order of the template with the most parameters.
    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.positional.iter().filter_map(|token| match token {
            PathToken::Param(param) => Some(param.name()),
            PathToken::Literal(_) => None,
        })
    }

    /// The route templates merged into this handler.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(String::as_str)
    }
}

/// Produces request builders for one resource of one client.
///
/// Factories are cheap to clone; clones share the capability table and the
/// client's options.
#[derive(Clone)]
pub struct HandlerFactory {
    handler: Arc<ResourceHandler>,
    options: SharedOptions,
}

impl HandlerFactory {
    pub(crate) fn new(handler: ResourceHandler, options: SharedOptions) -> Self {
        Self {
            handler: Arc::new(handler),
            options,
        }
    }

    /// A fresh builder reflecting the client's current options.
    pub fn request(&self) -> RequestBuilder {
        RequestBuilder::for_resource(self.options.request_options(), Arc::clone(&self.handler))
    }

    /// A builder with path parameters filled positionally, in the declared
    /// order of the resource's deepest template. Literal segments between
    /// parameters are filled as long as values remain, so on `posts`
    /// `request_with([3, 9])` targets `posts/3/revisions/9`.
    ///
    /// ## Errors
    ///
    /// Returns [`RequestError::TooManyParams`] when more values are given than
    /// the resource has parameters.
    pub fn request_with<I, V>(&self, values: I) -> Result<RequestBuilder, RequestError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let expected = self.handler.positional().count();
        if values.len() > expected {
            return Err(RequestError::TooManyParams {
                expected,
                given: values.len(),
            });
        }

        let mut request = self.request();
        let mut values = values.into_iter().peekable();
        for (level, token) in self.handler.positional.iter().enumerate().skip(1) {
            if values.peek().is_none() {
                break;
            }
            request = match token {
                PathToken::Literal(text) => {
                    request.with_level(level, text, &Value::String(text.clone()))
                }
                PathToken::Param(param) => match values.next() {
                    Some(value) => request.with_level(level, param.name(), &value),
                    None => break,
                },
            };
        }
        Ok(request)
    }

    /// The capability table shared by this factory's builders.
    pub fn resource(&self) -> &Arc<ResourceHandler> {
        &self.handler
    }

    /// Returns `true` when both factories are the same registered handler.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler) && self.options.ptr_eq(&other.options)
    }
}

impl fmt::Debug for HandlerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFactory")
            .field("namespace", &self.handler.namespace)
            .field("resource", &self.handler.resource)
            .finish_non_exhaustive()
    }
}
