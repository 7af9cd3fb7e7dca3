//! Namespace registry.
//!
//! Groups handler factories by namespace and resource. Bootstrapping is
//! additive and atomic: every route of a map is parsed and planned before any
//! handler is replaced, so a malformed route leaves the registry untouched.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::SharedOptions;
use crate::error::{DescriptorError, NamespaceError};
use crate::handler::{HandlerFactory, ResourceSpec};
use crate::route::{PathTemplate, PathToken, RouteDescriptor, RouteMap};

/// The handler factories of one namespace.
#[derive(Debug, Clone)]
pub struct NamespaceHandlers {
    name: String,
    specs: BTreeMap<String, ResourceSpec>,
    handlers: BTreeMap<String, HandlerFactory>,
}

impl NamespaceHandlers {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            specs: BTreeMap::new(),
            handlers: BTreeMap::new(),
        }
    }

    /// The namespace, e.g. `wp/v2`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The factory of `resource`, e.g. `posts`.
    pub fn handler(&self, resource: &str) -> Option<&HandlerFactory> {
        self.handlers.get(resource)
    }

    /// Resource keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Resource keys with their factories, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HandlerFactory)> {
        self.handlers.iter().map(|(key, factory)| (key.as_str(), factory))
    }

    /// Number of resources in the namespace.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when the namespace has no resources.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// A route that passed parsing, ready to be merged.
struct PlannedRoute<'a> {
    namespace: &'a str,
    resource: String,
    template: PathTemplate,
    descriptor: &'a RouteDescriptor,
}

/// Every namespace bootstrapped on one client.
#[derive(Debug)]
pub struct NamespaceRegistry {
    options: SharedOptions,
    namespaces: BTreeMap<String, NamespaceHandlers>,
}

impl NamespaceRegistry {
    pub(crate) fn new(options: SharedOptions) -> Self {
        Self {
            options,
            namespaces: BTreeMap::new(),
        }
    }

    /// Merges every route of `routes` into the registry.
    ///
    /// Namespace roots (`/wp/v2`) and the API root (empty namespace) carry no
    /// resource and are skipped.
    ///
    /// ## Errors
    ///
    /// Returns the first [`DescriptorError`] found; nothing is merged then.
    pub fn bootstrap(&mut self, routes: &RouteMap) -> Result<(), DescriptorError> {
        let planned = routes
            .iter()
            .filter_map(|(template, descriptor)| plan_route(template, descriptor).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        let count = planned.len();
        self.merge(planned);
        debug!(routes = count, namespaces = self.namespaces.len(), "Bootstrapped route map");
        Ok(())
    }

    /// Merges a single route and returns the factory it now belongs to.
    ///
    /// ## Errors
    ///
    /// Returns a [`DescriptorError`] when the route is malformed.
    pub fn register(
        &mut self,
        template: &str,
        descriptor: &RouteDescriptor,
    ) -> Result<Option<HandlerFactory>, DescriptorError> {
        let Some(route) = plan_route(template, descriptor)? else {
            return Ok(None);
        };
        let namespace = route.namespace.to_string();
        let resource = route.resource.clone();
        self.merge(vec![route]);

        Ok(self
            .namespaces
            .get(&namespace)
            .and_then(|handlers| handlers.handler(&resource))
            .cloned())
    }

    /// The handlers of `name`.
    ///
    /// ## Errors
    ///
    /// - [`NamespaceError::Missing`] for an empty name
    /// - [`NamespaceError::Unknown`] for a namespace that was never bootstrapped
    pub fn namespace(&self, name: &str) -> Result<&NamespaceHandlers, NamespaceError> {
        if name.is_empty() {
            return Err(NamespaceError::Missing);
        }
        self.namespaces
            .get(name)
            .ok_or_else(|| NamespaceError::Unknown { name: name.to_string() })
    }

    /// Bootstrapped namespace names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    fn merge(&mut self, planned: Vec<PlannedRoute<'_>>) {
        let mut touched: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for route in planned {
            let handlers = self
                .namespaces
                .entry(route.namespace.to_string())
                .or_insert_with(|| NamespaceHandlers::new(route.namespace));
            let tokens = route
                .template
                .below_namespace(route.namespace)
                .unwrap_or_default();
            handlers
                .specs
                .entry(route.resource.clone())
                .or_insert_with(|| ResourceSpec::new(route.namespace, &route.resource))
                .add_route(&route.template, tokens, route.descriptor);
            touched
                .entry(route.namespace.to_string())
                .or_default()
                .insert(route.resource);
        }

        // only rebuilt resources get new factories; the rest keep their identity
        for (namespace, resources) in touched {
            let Some(handlers) = self.namespaces.get_mut(&namespace) else {
                continue;
            };
            for resource in resources {
                if let Some(spec) = handlers.specs.get(&resource) {
                    debug!(namespace = %namespace, resource = %resource, "Rebuilt resource handler");
                    let factory = HandlerFactory::new(spec.build(), self.options.clone());
                    handlers.handlers.insert(resource, factory);
                }
            }
        }
    }
}

/// Parses one route; `Ok(None)` for routes that carry no resource.
fn plan_route<'a>(
    template: &'a str,
    descriptor: &'a RouteDescriptor,
) -> Result<Option<PlannedRoute<'a>>, DescriptorError> {
    let namespace = descriptor
        .namespace
        .as_deref()
        .ok_or_else(|| DescriptorError::MissingNamespace {
            route: template.to_string(),
        })?;
    if namespace.is_empty() {
        debug!(route = template, "Skipping API root route");
        return Ok(None);
    }

    let parsed = PathTemplate::parse(template)?;
    let tokens = parsed
        .below_namespace(namespace)
        .ok_or_else(|| DescriptorError::NamespaceMismatch {
            route: template.to_string(),
            namespace: namespace.to_string(),
        })?;

    let resource = match tokens.first() {
        None => {
            debug!(route = template, "Skipping namespace root route");
            return Ok(None);
        }
        Some(PathToken::Param(_)) => {
            return Err(DescriptorError::ParameterResource {
                route: template.to_string(),
            })
        }
        Some(PathToken::Literal(resource)) => resource.clone(),
    };

    Ok(Some(PlannedRoute {
        namespace,
        resource,
        template: parsed,
        descriptor,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, ClientOptions};
    use crate::method::RestMethod;
    use crate::route::EndpointVariant;

    fn registry() -> NamespaceRegistry {
        let options = ClientOptions::from_config(ClientConfig::new("http://a.com")).unwrap();
        NamespaceRegistry::new(SharedOptions::new(options))
    }

    fn get(namespace: &str) -> RouteDescriptor {
        RouteDescriptor::new(namespace).endpoint(EndpointVariant::new([RestMethod::Get]))
    }

    #[test]
    fn bootstrap_is_additive() {
        let mut registry = registry();
        registry
            .bootstrap(&RouteMap::new().route("/wp/v2/posts", get("wp/v2")))
            .unwrap();
        registry
            .bootstrap(&RouteMap::new().route("/myplugin/v1/books", get("myplugin/v1")))
            .unwrap();

        assert_eq!(registry.names().collect::<Vec<_>>(), ["myplugin/v1", "wp/v2"]);
        assert!(registry.namespace("wp/v2").unwrap().handler("posts").is_some());
    }

    #[test]
    fn untouched_factories_keep_identity() {
        let mut registry = registry();
        registry
            .bootstrap(
                &RouteMap::new()
                    .route("/wp/v2/posts", get("wp/v2"))
                    .route("/wp/v2/tags", get("wp/v2")),
            )
            .unwrap();
        let tags = registry.namespace("wp/v2").unwrap().handler("tags").unwrap().clone();

        registry
            .bootstrap(&RouteMap::new().route(r"/wp/v2/posts/(?P<id>\d+)", get("wp/v2")))
            .unwrap();

        let ns = registry.namespace("wp/v2").unwrap();
        assert!(ns.handler("tags").unwrap().ptr_eq(&tags));
        assert!(ns.handler("posts").unwrap().resource().capability("id").is_some());
    }

    #[test]
    #[tracing_test::traced_test]
    fn each_touched_resource_is_rebuilt_once() {
        let mut registry = registry();
        registry
            .bootstrap(
                &RouteMap::new()
                    .route("/wp/v2/posts", get("wp/v2"))
                    .route(r"/wp/v2/posts/(?P<id>\d+)", get("wp/v2"))
                    .route(r"/wp/v2/posts/(?P<parent>\d+)/revisions", get("wp/v2"))
                    .route("/wp/v2/tags", get("wp/v2")),
            )
            .unwrap();

        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("Rebuilt resource handler"))
                .count()
            {
                2 => Ok(()),
                n => Err(format!("expected 2 rebuilds, found {n}")),
            }
        });
    }

    #[test]
    fn skips_root_routes() {
        let mut registry = registry();
        registry
            .bootstrap(
                &RouteMap::new()
                    .route("/", get(""))
                    .route("/wp/v2", get("wp/v2"))
                    .route("/wp/v2/media", get("wp/v2")),
            )
            .unwrap();

        assert_eq!(registry.namespace("wp/v2").unwrap().keys().collect::<Vec<_>>(), ["media"]);
    }

    #[test]
    fn malformed_route_leaves_registry_untouched() {
        let mut registry = registry();
        let routes = RouteMap::new()
            .route("/wp/v2/posts", get("wp/v2"))
            .route("/wp/v2/zz/(?P<id>[\\d+)", get("wp/v2"));

        assert!(matches!(
            registry.bootstrap(&routes),
            Err(DescriptorError::UnbalancedGroup { .. })
        ));
        assert!(registry.names().next().is_none());
    }

    #[test]
    fn descriptor_errors() {
        let mut registry = registry();

        let orphan = RouteDescriptor {
            namespace: None,
            ..RouteDescriptor::default()
        };
        assert!(matches!(
            registry.register("/orphan", &orphan),
            Err(DescriptorError::MissingNamespace { .. })
        ));
        assert!(matches!(
            registry.register("/other/v1/things", &get("wp/v2")),
            Err(DescriptorError::NamespaceMismatch { .. })
        ));
        assert!(matches!(
            registry.register(r"/wp/v2/(?P<id>\d+)", &get("wp/v2")),
            Err(DescriptorError::ParameterResource { .. })
        ));
    }

    #[test]
    fn namespace_lookup_errors() {
        let registry = registry();
        assert_eq!(registry.namespace("").unwrap_err(), NamespaceError::Missing);
        assert_eq!(
            registry.namespace("wp/v2").unwrap_err(),
            NamespaceError::Unknown { name: "wp/v2".into() }
        );
    }
}
