use thiserror::Error;

/// Errors raised while turning a route descriptor into a handler.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The descriptor carries no `namespace`.
    #[error("route `{route}` does not declare a namespace")]
    MissingNamespace { route: String },

    /// The path template does not start with its declared namespace.
    #[error("route `{route}` is not inside namespace `{namespace}`")]
    NamespaceMismatch { route: String, namespace: String },

    /// A `(` or `[` in the template was never closed.
    #[error("route `{route}` has an unbalanced group at byte {position}")]
    UnbalancedGroup { route: String, position: usize },

    /// A group in the template is not of the form `(?P<name>pattern)`.
    #[error("route `{route}` has an unnamed group at byte {position}")]
    UnnamedGroup { route: String, position: usize },

    /// A named group has an empty or malformed name.
    #[error("route `{route}` has an invalid parameter name `{name}`")]
    InvalidParamName { route: String, name: String },

    /// A parameter pattern is not a valid regular expression.
    #[error("route `{route}` parameter `{name}` has an invalid pattern: {source}")]
    InvalidPattern {
        route: String,
        name: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// A path segment mixes literal text with a parameter.
    #[error("route `{route}` mixes literal text and a parameter in segment `{segment}`")]
    MixedSegment { route: String, segment: String },

    /// The route is the namespace root and names no resource.
    #[error("route `{route}` names no resource below its namespace")]
    NoResource { route: String },

    /// The first segment below the namespace is a parameter.
    #[error("route `{route}` has no literal resource name below its namespace")]
    ParameterResource { route: String },
}
