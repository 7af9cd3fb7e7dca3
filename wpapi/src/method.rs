//! HTTP method types declared by route descriptors.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// HTTP methods a route or endpoint variant may declare.
///
/// Route indexes list methods as uppercase strings (`"GET"`, `"POST"`, ...);
/// this enum parses and deserializes from that form.
///
/// ## Examples
///
/// ```rust
/// use wpapi::RestMethod;
///
/// let method = RestMethod::Get;
/// assert!(!method.has_body());
///
/// let parsed: RestMethod = "POST".parse().unwrap();
/// assert_eq!(parsed, RestMethod::Post);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RestMethod {
    /// HTTP GET - Retrieve a resource.
    Get,
    /// HTTP POST - Create a resource or trigger an action.
    Post,
    /// HTTP PUT - Replace a resource entirely.
    Put,
    /// HTTP PATCH - Partially update a resource.
    Patch,
    /// HTTP DELETE - Remove a resource.
    Delete,
    /// HTTP HEAD - Retrieve headers only.
    Head,
    /// HTTP OPTIONS - Query supported methods.
    Options,
}

impl RestMethod {
    /// Returns `true` if this method typically has a request body.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }

    /// Converts to the equivalent `reqwest::Method`.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_display() {
        assert_eq!(RestMethod::Get.to_string(), "GET");
        assert_eq!(RestMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_parse() {
        assert_eq!("GET".parse::<RestMethod>().unwrap(), RestMethod::Get);
        assert_eq!("PATCH".parse::<RestMethod>().unwrap(), RestMethod::Patch);
        assert!("FETCH".parse::<RestMethod>().is_err());
    }

    #[test]
    fn test_deserialize_from_route_index() {
        let methods: Vec<RestMethod> =
            serde_json::from_str(r#"["GET", "POST", "PUT", "PATCH", "DELETE"]"#).unwrap();
        assert_eq!(
            methods,
            vec![
                RestMethod::Get,
                RestMethod::Post,
                RestMethod::Put,
                RestMethod::Patch,
                RestMethod::Delete
            ]
        );
    }

    #[test]
    fn test_has_body() {
        assert!(!RestMethod::Get.has_body());
        assert!(RestMethod::Post.has_body());
        assert!(RestMethod::Delete.has_body());
        assert!(!RestMethod::Head.has_body());
    }

    #[test]
    fn test_enum_iteration() {
        assert_eq!(RestMethod::iter().count(), 7);
    }

    #[test]
    fn test_to_reqwest() {
        assert_eq!(RestMethod::Get.to_reqwest(), reqwest::Method::GET);
        assert_eq!(RestMethod::Put.to_reqwest(), reqwest::Method::PUT);
    }
}
