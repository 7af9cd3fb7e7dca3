use thiserror::Error;

/// HTTP client and network errors raised by the default transport.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or its body could not be read.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The rendered request URL is not a valid absolute URL.
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A header name or value could not be encoded.
    #[error("invalid header `{name}`")]
    InvalidHeader { name: String },
}
