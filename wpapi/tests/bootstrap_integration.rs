use serde_json::json;
use wpapi::{
    AuthOptions, ClientConfig, ConfigError, NamespaceError, RouteMap, WpApi, WpApiError,
};

const ENDPOINT: &str = "http://some.url.com/wp-json";

/// The route map served by a site with a couple of plugin routes.
fn plugin_routes() -> RouteMap {
    RouteMap::from_json(
        &json!({
            "/": {
                "namespace": "",
                "methods": ["GET"],
                "endpoints": [{ "methods": ["GET"], "args": { "context": { "required": false } } }]
            },
            "/wp/v2": {
                "namespace": "wp/v2",
                "methods": ["GET"],
                "endpoints": [{ "methods": ["GET"], "args": [] }]
            },
            "/wp/v2/posts": {
                "namespace": "wp/v2",
                "methods": ["GET", "POST"],
                "endpoints": [
                    { "methods": ["GET"], "args": { "filter": { "required": false } } },
                    { "methods": ["POST"], "args": { "title": { "required": false } } }
                ]
            },
            "/wp/v2/customendpoint/(?P<thing>[\\w-]+)": {
                "namespace": "wp/v2",
                "methods": ["GET", "POST"],
                "endpoints": [
                    { "methods": ["GET"], "args": { "context": { "required": false } } },
                    { "methods": ["POST"], "args": {} }
                ]
            },
            "/myplugin/v1/authors/(?P<name>[\\w-]+)": {
                "namespace": "myplugin/v1",
                "methods": ["GET"],
                "endpoints": [
                    { "methods": ["GET"], "args": { "name": { "required": true } } }
                ]
            }
        })
        .to_string(),
    )
    .unwrap()
}

#[test]
fn endpoint_gets_exactly_one_trailing_slash() {
    let site = WpApi::site(ENDPOINT, None).unwrap();
    assert_eq!(site.endpoint(), "http://some.url.com/wp-json/");

    let again = WpApi::site(site.endpoint(), None).unwrap();
    assert_eq!(again.endpoint(), site.endpoint());
}

#[test]
fn construction_requires_a_string_endpoint() {
    assert!(matches!(
        WpApi::new(ClientConfig::default()),
        Err(WpApiError::Config(ConfigError::MissingEndpoint))
    ));
    for endpoint in [json!(42), json!(["http://a.com"]), json!({ "url": "http://a.com" })] {
        assert!(matches!(
            WpApi::from_value(json!({ "endpoint": endpoint })),
            Err(WpApiError::Config(ConfigError::InvalidEndpoint { .. }))
        ));
    }
    assert!(WpApi::from_value(json!({ "endpoint": ENDPOINT })).is_ok());
}

#[test]
fn passthrough_options_stay_on_the_client() {
    let site = WpApi::from_value(json!({
        "endpoint": ENDPOINT,
        "username": "foouser",
        "password": "barpass",
        "identifier": "some unique value"
    }))
    .unwrap();

    let options = site.options();
    assert_eq!(options.username.as_deref(), Some("foouser"));
    assert_eq!(options.extra["identifier"], "some unique value");

    // only whitelisted keys reach a builder
    let request = site.url("http://new.url/wp-json");
    assert_eq!(request.options().endpoint, "http://new.url/wp-json");
    assert_eq!(request.options().username.as_deref(), Some("foouser"));
    assert_eq!(request.to_string(), "http://new.url/wp-json");
}

#[test]
fn site_with_routes_replaces_default_handlers() {
    let site = WpApi::site(ENDPOINT, Some(plugin_routes())).unwrap();

    let posts = site.handler("posts").unwrap().request();
    assert!(posts.has_capability("filter"));
    assert!(posts.has_capability("title"));
    assert!(!posts.has_capability("id"));
    assert_eq!(posts.to_string(), "http://some.url.com/wp-json/wp/v2/posts");

    assert!(site.handler("comments").is_none());
    assert_eq!(
        site.handler_keys().collect::<Vec<_>>(),
        ["customendpoint", "posts"]
    );
}

#[test]
fn bootstrap_registers_every_route() {
    let mut site = WpApi::site(ENDPOINT, None).unwrap();
    site.bootstrap(&plugin_routes()).unwrap();

    assert_eq!(site.namespaces().collect::<Vec<_>>(), ["myplugin/v1", "wp/v2"]);
    assert!(site.handler("customendpoint").is_some());
    assert!(site.handler("comments").is_some());

    let authors = site.namespace("myplugin/v1").unwrap();
    assert_eq!(authors.keys().collect::<Vec<_>>(), ["authors"]);
}

#[test]
fn default_namespace_handlers_are_identical() {
    let site = WpApi::site(ENDPOINT, Some(plugin_routes())).unwrap();
    let direct = site.handler("customendpoint").unwrap();
    let through_namespace = site.namespace("wp/v2").unwrap().handler("customendpoint").unwrap();

    assert!(std::ptr::eq(direct, through_namespace));
    assert!(direct.ptr_eq(through_namespace));
}

#[test]
fn named_parameter_becomes_a_setter() {
    let site = WpApi::site(ENDPOINT, Some(plugin_routes())).unwrap();
    let factory = site.namespace("wp/v2").unwrap().handler("customendpoint").unwrap();

    let by_name = factory.request().set("thing", "foobar").unwrap();
    assert_eq!(
        by_name.to_string(),
        "http://some.url.com/wp-json/wp/v2/customendpoint/foobar"
    );

    let positional = factory.request_with(["foobar"]).unwrap();
    assert_eq!(positional.to_string(), by_name.to_string());
}

#[test]
fn parameter_and_argument_may_share_a_name() {
    let site = WpApi::site(ENDPOINT, Some(plugin_routes())).unwrap();
    let authors = site.namespace("myplugin/v1").unwrap().handler("authors").unwrap();

    assert!(authors.resource().args()["name"].required);
    assert_eq!(
        authors.request().set("name", "ada").unwrap().to_string(),
        "http://some.url.com/wp-json/myplugin/v1/authors/ada"
    );
}

#[test]
fn namespace_requires_a_registered_name() {
    let site = WpApi::site(ENDPOINT, Some(plugin_routes())).unwrap();

    assert_eq!(site.namespace("").unwrap_err(), NamespaceError::Missing);
    assert_eq!(
        site.namespace("foo/baz").unwrap_err(),
        NamespaceError::Unknown { name: "foo/baz".into() }
    );
    assert_eq!(site.namespace("myplugin/v1").unwrap().len(), 1);
}

#[test]
fn malformed_bootstrap_is_rejected_whole() {
    let mut site = WpApi::site(ENDPOINT, Some(plugin_routes())).unwrap();
    let broken = RouteMap::from_json(
        &json!({
            "/other/v1/books": { "namespace": "other/v1", "methods": ["GET"], "endpoints": [] },
            "/other/v1/books/(\\d+)": { "namespace": "other/v1", "methods": ["GET"], "endpoints": [] }
        })
        .to_string(),
    )
    .unwrap();

    assert!(matches!(site.bootstrap(&broken), Err(WpApiError::Descriptor(_))));
    assert!(site.namespace("other/v1").is_err());
}

#[test]
fn auth_variants() {
    let mut site = WpApi::site(ENDPOINT, None).unwrap();
    site.auth(AuthOptions::default());
    assert!(site.options().auth);
    assert!(site.options().username.is_none());

    let mut by_tuple = WpApi::site(ENDPOINT, None).unwrap();
    by_tuple.auth(("user", "pass"));
    let mut by_struct = WpApi::site(ENDPOINT, None).unwrap();
    by_struct.auth(AuthOptions::new().username("user").password("pass"));
    assert_eq!(by_tuple.options().username, by_struct.options().username);
    assert_eq!(by_tuple.options().password, by_struct.options().password);

    by_tuple.auth(("other", "secret")).auth(AuthOptions::new().nonce("somenonce"));
    let options = by_tuple.options();
    assert!(options.auth);
    assert_eq!(options.username.as_deref(), Some("other"));
    assert_eq!(options.password.as_deref(), Some("secret"));
    assert_eq!(options.nonce.as_deref(), Some("somenonce"));
}

#[test]
fn builders_snapshot_credentials_at_creation() {
    let mut site = WpApi::site(ENDPOINT, None).unwrap();
    let before = site.root("");
    site.auth(("user", "pass"));
    let after = site.root("");

    assert!(!before.options().auth);
    assert!(after.options().auth);
}

#[test]
fn root_targets_arbitrary_paths() {
    let site = WpApi::site(ENDPOINT, None).unwrap();
    assert_eq!(site.root("").to_string(), "http://some.url.com/wp-json/");
    assert_eq!(
        site.root("custom-path").to_string(),
        "http://some.url.com/wp-json/custom-path"
    );
}
