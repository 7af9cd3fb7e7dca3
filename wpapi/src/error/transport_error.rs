use thiserror::Error;

use crate::transport::TransportVerb;

/// Errors raised when modifying transport tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The table is the immutable process-wide default.
    #[error("the default transport is frozen; cannot replace `{verb}`")]
    Frozen { verb: TransportVerb },
}
