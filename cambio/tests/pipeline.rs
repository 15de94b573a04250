mod helpers;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use cambio::{CambioError, Endpoint, Provider, ProviderDefinition};
use cambio_mock::MockTransport;
use helpers::{no_options, provider_over, sample_credentials, sample_definition, scripted_transport};

#[tokio::test]
async fn literal_endpoints_answer_without_any_network_call() {
    let transport = scripted_transport();
    let provider = provider_over(transport.clone());

    let markets = provider.api("markets", no_options()).await.unwrap();

    assert_eq!(markets[0]["name"], json!("USDBTC"));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn pure_delegates_forward_and_match_the_target() {
    let transport = scripted_transport();
    let provider = provider_over(transport.clone());

    let via_api = provider.api("ticker", no_options()).await.unwrap();
    let via_vendor = provider.vendor("ticker", no_options()).await.unwrap();

    assert_eq!(via_api, via_vendor);
    assert_eq!(transport.calls_to("ticker/").len(), 2);
}

#[tokio::test]
async fn delegates_forward_caller_options_unchanged() {
    let transport = Arc::new(MockTransport::new().route_with("ticker/", |call| {
        Ok(Value::Object(call.args.clone()))
    }));
    let provider = provider_over(transport.clone());

    let echoed = provider
        .api("ticker", json!({"time": "minute"}))
        .await
        .unwrap();
    assert_eq!(echoed, json!({"time": "minute"}));
}

#[tokio::test]
async fn request_transforms_run_before_the_action() {
    let provider = provider_over(scripted_transport());

    // `echo` renames tid -> transactionId on the way in and echoes back.
    let result = provider.api("echo", json!({"tid": 5})).await.unwrap();

    assert_eq!(result, json!({"transactionId": 5}));
}

fn checked_definition(schema_dir: &std::path::Path) -> ProviderDefinition {
    sample_definition()
        .schema_source(schema_dir)
        .vendor("trades", "trades/")
}

fn write_schema(dir: &std::path::Path, name: &str, doc: Value) {
    std::fs::write(dir.join(name), doc.to_string()).unwrap();
}

#[tokio::test]
async fn request_validation_failure_aborts_before_the_action() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "trades.request.json",
        json!({
            "id": "testex.trades.request",
            "type": "object",
            "required": ["symbol"]
        }),
    );
    let transport = Arc::new(MockTransport::new().route("trades/", json!([])));
    let provider = Provider::with_transport(
        checked_definition(dir.path()),
        sample_credentials(),
        transport.clone(),
    )
    .unwrap();

    let err = provider.vendor("trades", json!({})).await.unwrap_err();

    match err {
        CambioError::Validation { service, detail } => {
            assert_eq!(service, "testex.trades.request");
            assert!(detail.contains("symbol"), "detail was: {detail}");
        }
        other => panic!("unexpected variant: {other:?}"),
    }
    // The pipeline never reached the invoke stage.
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn response_validation_failure_aborts_the_response_transform() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "trades.response.json",
        json!({
            "id": "testex.trades.response",
            "type": "array"
        }),
    );
    let transport = Arc::new(MockTransport::new().route("trades/", json!({"oops": true})));
    let provider = Provider::with_transport(
        checked_definition(dir.path()),
        sample_credentials(),
        transport,
    )
    .unwrap();

    let err = provider.vendor("trades", no_options()).await.unwrap_err();
    match err {
        CambioError::Validation { service, .. } => {
            assert_eq!(service, "testex.trades.response");
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[tokio::test]
async fn valid_payloads_flow_through_both_validations() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "trades.request.json",
        json!({
            "id": "testex.trades.request",
            "type": "object",
            "required": ["symbol"],
            "properties": {"symbol": {"type": "string"}}
        }),
    );
    write_schema(
        dir.path(),
        "trades.response.json",
        json!({
            "id": "testex.trades.response",
            "type": "array"
        }),
    );
    let transport = Arc::new(MockTransport::new().route("trades/", json!([{"price": "1.0"}])));
    let provider = Provider::with_transport(
        checked_definition(dir.path()),
        sample_credentials(),
        transport,
    )
    .unwrap();

    let result = provider
        .vendor("trades", json!({"symbol": "USDBTC"}))
        .await
        .unwrap();
    assert_eq!(result, json!([{"price": "1.0"}]));
}

#[tokio::test(start_paused = true)]
async fn coalesced_endpoint_shares_one_invocation_inside_the_window() {
    let transport = Arc::new(
        MockTransport::new()
            .route("slow_ticker/", json!({"last": "511.85"}))
            .with_delay(Duration::from_millis(50)),
    );
    let definition = sample_definition().vendor(
        "slow_ticker",
        Endpoint::path("slow_ticker/").throttle(Duration::from_millis(200)),
    );
    let provider = Arc::new(
        Provider::with_transport(definition, sample_credentials(), transport.clone())
            .unwrap(),
    );

    let futs = (0..5).map(|_| {
        let provider = Arc::clone(&provider);
        async move { provider.vendor("slow_ticker", no_options()).await }
    });
    let results = futures::future::join_all(futs).await;

    assert_eq!(transport.call_count(), 1);
    for result in results {
        assert_eq!(result.unwrap(), json!({"last": "511.85"}));
    }

    // Past the window: a fresh invocation.
    tokio::time::sleep(Duration::from_millis(250)).await;
    provider.vendor("slow_ticker", no_options()).await.unwrap();
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn uncoalesced_endpoints_invoke_every_time() {
    let transport = scripted_transport();
    let provider = provider_over(transport.clone());

    provider.vendor("ticker", no_options()).await.unwrap();
    provider.vendor("ticker", no_options()).await.unwrap();

    assert_eq!(transport.calls_to("ticker/").len(), 2);
}

#[tokio::test]
async fn transport_errors_surface_with_their_status() {
    let transport = Arc::new(MockTransport::new().route_error(
        "ticker/",
        CambioError::transport_status("request failed: ticker/", 503),
    ));
    let provider = provider_over(transport);

    let err = provider.vendor("ticker", no_options()).await.unwrap_err();
    assert!(matches!(
        err,
        CambioError::Transport {
            status: Some(503),
            ..
        }
    ));
}
