//! Transport registry.
//!
//! A transport function performs one HTTP verb for a [`RequestBuilder`]. Two
//! tables exist:
//!
//! - the process-wide default [`TransportTable`], immutable and backed by the
//!   `reqwest` functions in [`http`]
//! - a per-client [`TransportOverrides`] table holding only the verbs a caller
//!   replaced; lookups consult it first and fall back to the default
//!
//! Request builders share their client's override table through a
//! [`TransportHandle`], so overrides installed after a builder was created
//! still apply to it.

pub mod http;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use futures::future::BoxFuture;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::error::{TransportError, WpApiError};
use crate::method::RestMethod;
use crate::request::RequestBuilder;

/// Future returned by every transport function.
pub type TransportFuture = BoxFuture<'static, Result<Value, WpApiError>>;

/// A request-issuing function: `(request, body) -> future response`.
pub type TransportFn =
    Arc<dyn Fn(&RequestBuilder, Option<&Value>) -> TransportFuture + Send + Sync>;

static DEFAULT_TRANSPORT: LazyLock<TransportTable> = LazyLock::new(|| TransportTable {
    get: Arc::new(http::get),
    head: Arc::new(http::head),
    post: Arc::new(http::post),
    put: Arc::new(http::put),
    delete: Arc::new(http::delete),
    frozen: true,
});

/// The immutable process-wide default transport table.
pub fn default_transport() -> &'static TransportTable {
    &DEFAULT_TRANSPORT
}

/// The five verbs a transport table provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TransportVerb {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl TransportVerb {
    /// The HTTP method this verb issues.
    pub fn method(self) -> RestMethod {
        match self {
            Self::Get => RestMethod::Get,
            Self::Head => RestMethod::Head,
            Self::Post => RestMethod::Post,
            Self::Put => RestMethod::Put,
            Self::Delete => RestMethod::Delete,
        }
    }
}

/// A complete verb to function table.
#[derive(Clone)]
pub struct TransportTable {
    get: TransportFn,
    head: TransportFn,
    post: TransportFn,
    put: TransportFn,
    delete: TransportFn,
    frozen: bool,
}

impl TransportTable {
    /// Creates a mutable table from one function per verb.
    pub fn new(
        get: TransportFn,
        head: TransportFn,
        post: TransportFn,
        put: TransportFn,
        delete: TransportFn,
    ) -> Self {
        Self {
            get,
            head,
            post,
            put,
            delete,
            frozen: false,
        }
    }

    /// The function registered for `verb`.
    pub fn handler(&self, verb: TransportVerb) -> &TransportFn {
        match verb {
            TransportVerb::Get => &self.get,
            TransportVerb::Head => &self.head,
            TransportVerb::Post => &self.post,
            TransportVerb::Put => &self.put,
            TransportVerb::Delete => &self.delete,
        }
    }

    /// Returns `true` for the process-wide default table and its clones.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Replaces the function registered for `verb`.
    ///
    /// ## Errors
    ///
    /// Returns [`TransportError::Frozen`] and leaves the table untouched when
    /// the table is frozen.
    pub fn replace(&mut self, verb: TransportVerb, handler: TransportFn) -> Result<(), TransportError> {
        if self.frozen {
            return Err(TransportError::Frozen { verb });
        }
        let slot = match verb {
            TransportVerb::Get => &mut self.get,
            TransportVerb::Head => &mut self.head,
            TransportVerb::Post => &mut self.post,
            TransportVerb::Put => &mut self.put,
            TransportVerb::Delete => &mut self.delete,
        };
        *slot = handler;
        Ok(())
    }
}

impl fmt::Debug for TransportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportTable")
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}

/// A partial verb to function table layered over the default transport.
///
/// ## Examples
///
/// ```rust
/// use wpapi::transport::{TransportOverrides, TransportVerb};
/// use futures::FutureExt;
///
/// let overrides = TransportOverrides::new()
///     .on(TransportVerb::Get, |_request, _data| {
///         async { Ok::<_, wpapi::WpApiError>(serde_json::Value::Null) }.boxed()
///     });
/// assert!(overrides.handler(TransportVerb::Get).is_some());
/// assert!(overrides.handler(TransportVerb::Put).is_none());
/// ```
#[derive(Clone, Default)]
pub struct TransportOverrides {
    handlers: BTreeMap<TransportVerb, TransportFn>,
}

impl TransportOverrides {
    /// An empty override table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the function for `verb`.
    pub fn on<F>(mut self, verb: TransportVerb, handler: F) -> Self
    where
        F: Fn(&RequestBuilder, Option<&Value>) -> TransportFuture + Send + Sync + 'static,
    {
        self.handlers.insert(verb, Arc::new(handler));
        self
    }

    /// Sets an already shared function for `verb`.
    pub fn on_shared(mut self, verb: TransportVerb, handler: TransportFn) -> Self {
        self.handlers.insert(verb, handler);
        self
    }

    /// The override registered for `verb`, if any.
    pub fn handler(&self, verb: TransportVerb) -> Option<&TransportFn> {
        self.handlers.get(&verb)
    }

    /// Copies every verb of `other` over this table; other verbs are kept.
    pub fn merge(&mut self, other: TransportOverrides) {
        self.handlers.extend(other.handlers);
    }

    /// Verbs that are overridden.
    pub fn verbs(&self) -> impl Iterator<Item = TransportVerb> + '_ {
        self.handlers.keys().copied()
    }

    /// Returns `true` when no verb is overridden.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for TransportOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// Live, shared reference to one client's override table.
#[derive(Clone, Default)]
pub struct TransportHandle(Arc<RwLock<TransportOverrides>>);

impl TransportHandle {
    pub(crate) fn new(overrides: TransportOverrides) -> Self {
        Self(Arc::new(RwLock::new(overrides)))
    }

    /// Resolves `verb`: the client's override if one is set, else the default.
    pub fn resolve(&self, verb: TransportVerb) -> TransportFn {
        let overrides = self.0.read().unwrap_or_else(PoisonError::into_inner);
        overrides
            .handler(verb)
            .cloned()
            .unwrap_or_else(|| Arc::clone(default_transport().handler(verb)))
    }

    /// Returns a copy of the current override table.
    pub fn overrides(&self) -> TransportOverrides {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn merge(&self, overrides: TransportOverrides) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(overrides);
    }

    /// Returns `true` when both handles refer to the same client's table.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransportHandle").field(&self.overrides()).finish()
    }
}
