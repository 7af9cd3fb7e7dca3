//! Route map and route descriptor types.
//!
//! These mirror the `routes` object of a WordPress-style API index:
//!
//! ```json
//! {
//!   "/wp/v2/posts": {
//!     "namespace": "wp/v2",
//!     "methods": ["GET", "POST"],
//!     "endpoints": [
//!       { "methods": ["GET"], "args": { "search": { "required": false } } }
//!     ]
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::method::RestMethod;

/// Bundled route map used by clients constructed without one.
static DEFAULT_ROUTES: LazyLock<RouteMap> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../../data/default-routes.json"))
        .expect("Invalid bundled default routes")
});

/// Schema of one endpoint argument.
///
/// Only `required` is interpreted; everything else (`type`, `default`,
/// `description`, `enum`, ...) is kept verbatim in [`ArgSchema::schema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgSchema {
    /// Whether the remote API requires this argument.
    #[serde(default)]
    pub required: bool,
    /// Remaining schema keys.
    #[serde(flatten)]
    pub schema: Map<String, Value>,
}

impl ArgSchema {
    /// An optional argument with no further schema.
    pub fn optional() -> Self {
        Self::default()
    }

    /// A required argument with no further schema.
    pub fn required() -> Self {
        Self {
            required: true,
            schema: Map::new(),
        }
    }
}

/// One endpoint variant of a route, usually differing from its siblings by verb.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointVariant {
    /// Verbs this variant answers to.
    #[serde(default)]
    pub methods: BTreeSet<RestMethod>,
    /// Arguments accepted by this variant.
    #[serde(default, deserialize_with = "deserialize_args")]
    pub args: BTreeMap<String, ArgSchema>,
}

impl EndpointVariant {
    /// Creates a variant answering to `methods`.
    pub fn new(methods: impl IntoIterator<Item = RestMethod>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
            args: BTreeMap::new(),
        }
    }

    /// Adds an argument.
    pub fn arg(mut self, name: impl Into<String>, schema: ArgSchema) -> Self {
        self.args.insert(name.into(), schema);
        self
    }
}

/// Declarative description of one API path.
///
/// The path template itself is the key of the enclosing [`RouteMap`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Namespace the route belongs to, e.g. `wp/v2`.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Verbs allowed at this path (informational).
    #[serde(default)]
    pub methods: BTreeSet<RestMethod>,
    /// Endpoint variants, in index order.
    #[serde(default)]
    pub endpoints: Vec<EndpointVariant>,
}

impl RouteDescriptor {
    /// Creates an empty descriptor in `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }

    /// Adds an endpoint variant, folding its verbs into [`RouteDescriptor::methods`].
    pub fn endpoint(mut self, variant: EndpointVariant) -> Self {
        self.methods.extend(variant.methods.iter().copied());
        self.endpoints.push(variant);
        self
    }

    /// Iterates over the args of every endpoint variant; names may repeat.
    pub fn args(&self) -> impl Iterator<Item = (&String, &ArgSchema)> {
        self.endpoints.iter().flat_map(|variant| variant.args.iter())
    }
}

/// Mapping from path template to [`RouteDescriptor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteMap(BTreeMap<String, RouteDescriptor>);

impl RouteMap {
    /// Creates an empty route map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled `wp/v2` route map.
    pub fn default_routes() -> &'static RouteMap {
        &DEFAULT_ROUTES
    }

    /// Parses a route map from the JSON `routes` object of an API index.
    ///
    /// ## Errors
    ///
    /// Returns the deserialization error when `json` is not a route map.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds or replaces the descriptor of `template`.
    pub fn insert(&mut self, template: impl Into<String>, descriptor: RouteDescriptor) {
        self.0.insert(template.into(), descriptor);
    }

    /// Builder-style [`RouteMap::insert`].
    pub fn route(mut self, template: impl Into<String>, descriptor: RouteDescriptor) -> Self {
        self.insert(template, descriptor);
        self
    }

    /// Looks up the descriptor of `template`.
    pub fn get(&self, template: &str) -> Option<&RouteDescriptor> {
        self.0.get(template)
    }

    /// Iterates over `(template, descriptor)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RouteDescriptor)> {
        self.0.iter()
    }

    /// Number of routes in the map.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the map has no routes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, RouteDescriptor)> for RouteMap {
    fn from_iter<I: IntoIterator<Item = (String, RouteDescriptor)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// PHP serializes an empty args map as `[]`, so accept both shapes.
fn deserialize_args<'de, D>(deserializer: D) -> Result<BTreeMap<String, ArgSchema>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ArgsRepr {
        Map(BTreeMap<String, ArgSchema>),
        List(Vec<Value>),
    }

    match ArgsRepr::deserialize(deserializer)? {
        ArgsRepr::Map(args) => Ok(args),
        ArgsRepr::List(_) => Ok(BTreeMap::new()),
    }
}
