mod helpers;

use std::sync::Arc;

use serde_json::json;

use cambio::{
    CambioError, Credentials, Endpoint, Provider, ProviderDefinition, SigningConfig, signing,
};
use cambio_mock::MockTransport;
use helpers::{no_options, provider_over, sample_credentials, sample_definition, scripted_transport};

#[test]
fn empty_vendor_table_is_a_config_error() {
    let definition = ProviderDefinition::builder("empty", "https://api.empty.example/");
    let err = Provider::with_transport(
        definition,
        sample_credentials(),
        Arc::new(MockTransport::new()),
    )
    .unwrap_err();
    assert!(matches!(err, CambioError::Config(_)), "got: {err:?}");
}

#[test]
fn duplicate_dispatch_name_is_a_config_error() {
    let definition = sample_definition()
        // Alias collides with the endpoint registered under the same name.
        .vendor("trades", Endpoint::path("trades/").alias("ticker"));
    let err = Provider::with_transport(
        definition,
        sample_credentials(),
        Arc::new(MockTransport::new()),
    )
    .unwrap_err();
    assert!(
        err.to_string().contains("duplicate service: vendor.ticker"),
        "got: {err}"
    );
}

#[test]
fn missing_required_credential_field_is_a_config_error() {
    let err = Provider::with_transport(
        sample_definition(),
        Credentials::default(),
        Arc::new(MockTransport::new()),
    )
    .unwrap_err();
    assert!(err.to_string().contains("required field"), "got: {err}");
}

#[test]
fn init_credentials_hook_runs_at_construction() {
    let definition = sample_definition()
        .init_credentials(|credentials| Ok(credentials.with_apikey("derived")));
    let provider = Provider::with_transport(
        definition,
        sample_credentials(),
        Arc::new(MockTransport::new()),
    )
    .unwrap();
    assert_eq!(provider.credentials().apikey.as_deref(), Some("derived"));
}

#[tokio::test]
async fn unknown_endpoint_is_an_error_value_not_a_panic() {
    let provider = provider_over(scripted_transport());
    let err = provider.api("no.such.endpoint", no_options()).await.unwrap_err();
    match err {
        CambioError::UnknownService { service } => {
            assert_eq!(service, "api.no.such.endpoint");
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn nonces_are_strictly_increasing_in_immediate_succession() {
    let provider = provider_over(scripted_transport());
    let first = provider.next_nonce();
    let second = provider.next_nonce();
    let third = provider.next_nonce();
    assert!(second > first);
    assert!(third > second);
    assert_eq!(provider.current_nonce(), third);
}

#[test]
fn namespace_trees_expose_dotted_access() {
    let provider = provider_over(scripted_transport());

    let leaf = provider.api_tree().get("account.balance").unwrap();
    assert_eq!(leaf.leaf(), Some("api.account.balance"));

    // Overlapping prefixes share the interior node.
    let orders = provider.vendor_tree().get("orders").unwrap();
    let children: Vec<_> = orders.children().collect();
    assert_eq!(children, vec!["book", "open"]);
}

#[tokio::test]
async fn fully_qualified_dispatch_matches_table_dispatch() {
    let transport = scripted_transport();
    let provider = provider_over(Arc::clone(&transport));

    let via_table = provider.vendor("ticker", no_options()).await.unwrap();
    let leaf = provider.vendor_tree().get("ticker").unwrap().leaf().unwrap().to_string();
    let via_tree = provider.call(&leaf, no_options()).await.unwrap();

    assert_eq!(via_table, via_tree);
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn auth_keys_returns_the_signed_body_without_sending() {
    let transport = scripted_transport();
    let provider = provider_over(Arc::clone(&transport));

    let keys = provider.auth_keys("vendor.balance", no_options()).unwrap();
    let nonce = keys["nonce"].as_str().unwrap();
    let expected = signing::sign(
        &format!("{nonce}test-key"),
        "test-secret",
        &SigningConfig::default(),
    )
    .unwrap();

    assert_eq!(keys["key"], json!("test-key"));
    assert_eq!(keys["signature"].as_str().unwrap(), expected);
    assert_eq!(nonce, provider.current_nonce().to_string());
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn auth_keys_for_an_unknown_service_is_an_error() {
    let provider = provider_over(scripted_transport());
    let err = provider.auth_keys("vendor.nope", no_options()).unwrap_err();
    assert!(matches!(err, CambioError::UnknownService { .. }));
}

#[test]
fn service_registry_covers_both_tables() {
    let provider = provider_over(scripted_transport());
    let names: Vec<_> = provider.service_names().collect();
    assert!(names.contains(&"vendor.ticker"));
    assert!(names.contains(&"vendor.orders.book"));
    assert!(names.contains(&"api.account.balance"));
    assert!(names.contains(&"api.markets"));
}

#[test]
fn provider_exposes_definition_identity() {
    let provider = provider_over(scripted_transport());
    assert_eq!(provider.name(), "testex");
    assert_eq!(provider.label(), "Test Exchange");
    assert_eq!(provider.currencies(), ["USD"]);
    assert_eq!(provider.assets(), ["BTC"]);
    assert_eq!(
        provider.flags().required_credentials,
        vec!["key", "secret"]
    );
}

#[tokio::test]
async fn authenticated_call_sends_the_signed_form_body() {
    let transport = scripted_transport();
    let provider = provider_over(Arc::clone(&transport));

    provider.vendor("balance", no_options()).await.unwrap();

    let calls = transport.calls_to("balance/");
    assert_eq!(calls.len(), 1);
    let body = &calls[0].body;
    assert_eq!(body["key"], json!("test-key"));
    assert!(body.contains_key("signature"));
    assert!(body.contains_key("nonce"));
    assert!(calls[0].auth);
}

#[tokio::test]
async fn caller_auth_override_disables_signing() {
    let transport = scripted_transport();
    let provider = provider_over(Arc::clone(&transport));

    provider
        .vendor("balance", json!({"auth": false}))
        .await
        .unwrap();

    let calls = transport.calls_to("balance/");
    assert!(!calls[0].auth);
    assert!(!calls[0].body.contains_key("signature"));
}

#[tokio::test]
async fn sequential_authenticated_calls_send_increasing_nonces() {
    let transport = scripted_transport();
    let provider = provider_over(Arc::clone(&transport));

    provider.vendor("balance", no_options()).await.unwrap();
    provider.vendor("balance", no_options()).await.unwrap();

    let calls = transport.calls_to("balance/");
    let first: u64 = calls[0].body["nonce"].as_str().unwrap().parse().unwrap();
    let second: u64 = calls[1].body["nonce"].as_str().unwrap().parse().unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn options_route_into_query_for_read_verbs() {
    let transport = scripted_transport();
    let provider = provider_over(Arc::clone(&transport));

    provider
        .vendor("orders.book", json!({"group": 1}))
        .await
        .unwrap();

    let calls = transport.calls_to("order_book/");
    assert_eq!(calls[0].args["group"], json!(1));
    assert!(calls[0].body.is_empty());
}
