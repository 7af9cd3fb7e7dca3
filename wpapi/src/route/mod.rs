//! Route descriptor model.
//!
//! - [`RouteMap`] / [`RouteDescriptor`] / [`EndpointVariant`] / [`ArgSchema`] -
//!   the declarative route description consumed by bootstrap
//! - [`PathTemplate`] / [`PathToken`] / [`PathParam`] - parsed path templates

mod descriptor;
mod template;

pub use descriptor::{ArgSchema, EndpointVariant, RouteDescriptor, RouteMap};
pub use template::{PathParam, PathTemplate, PathToken};
