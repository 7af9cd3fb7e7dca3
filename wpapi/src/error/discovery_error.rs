use thiserror::Error;

/// Errors raised while discovering a remote API's route index.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The site did not advertise an API root through its `Link` header.
    #[error("no REST API link found at {url}")]
    NoApiLink { url: String },

    /// The advertised API root is not a valid URL.
    #[error("invalid API root `{link}`: {source}")]
    InvalidApiRoot {
        link: String,
        #[source]
        source: url::ParseError,
    },

    /// The API root did not return a route index.
    #[error("the index at {url} is not a valid route index: {source}")]
    InvalidIndex {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
