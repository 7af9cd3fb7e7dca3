use thiserror::Error;

/// Errors raised by generated request builders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// No path setter or arg mixin of that name exists for the resource.
    #[error("`{name}` is not a parameter or argument of this route")]
    UnknownSetter { name: String },

    /// `segment` was called with the name of something other than a literal sub-resource.
    #[error("`{name}` is not a path segment of this route")]
    NotASegment { name: String },

    /// `set` was called with the name of a literal sub-resource, which takes no value.
    #[error("`{name}` is a path segment of this route and takes no value")]
    NotAParameter { name: String },

    /// More positional values were supplied than the route has parameters.
    #[error("route takes {expected} path parameters, {given} were supplied")]
    TooManyParams { expected: usize, given: usize },

    /// A path level was set while an earlier one was left empty.
    #[error("incomplete path: level {missing} must be set before level {set}")]
    MissingLevel { missing: usize, set: usize },

    /// A path parameter's levels are all held by other setters.
    #[error("`{name}` cannot be set: level {level} already holds `{by}`")]
    LevelTaken {
        name: String,
        level: usize,
        by: String,
    },

    /// A path value does not match its parameter pattern.
    #[error("`{value}` does not match the pattern `{pattern}` of `{name}`")]
    InvalidPathValue {
        name: String,
        value: String,
        pattern: String,
    },
}
