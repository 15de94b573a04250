#![allow(dead_code)]

use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Value, json};

use cambio::{
    AuthPlacement, Credentials, Endpoint, HttpMethod, Provider, ProviderDefinition, ProviderFlags,
    TransformRule,
};
use cambio_mock::MockTransport;

/// Small in-memory exchange used by the integration tests.
pub fn sample_definition() -> ProviderDefinition {
    ProviderDefinition::builder("testex", "https://api.testex.example/v1/")
        .label("Test Exchange")
        .currencies(&["USD"])
        .assets(&["BTC"])
        .flags(ProviderFlags::requiring(&["key", "secret"]))
        .auth_placement(AuthPlacement::Body)
        .create_auth_message(|provider, _call| {
            let nonce = provider.next_nonce();
            let key = provider.credentials().key.as_deref().unwrap_or_default();
            format!("{nonce}{key}")
        })
        .get_options(|provider, call| {
            if call.auth {
                let signature = provider.create_auth_signature(call)?;
                let key = provider.credentials().key.clone().unwrap_or_default();
                call.body.insert("key".into(), json!(key));
                call.body.insert("signature".into(), json!(signature));
                call.body
                    .insert("nonce".into(), json!(provider.current_nonce().to_string()));
            }
            Ok(())
        })
        .vendor("ticker", "ticker/")
        .vendor("orders.book", "order_book/")
        .vendor("orders.open", Endpoint::path("open_orders/").method(HttpMethod::Post).authenticated())
        .vendor("balance", Endpoint::path("balance/").method(HttpMethod::Post).authenticated())
        .api("ticker", "ticker")
        .api("account.balance", "balance")
        .api(
            "markets",
            Endpoint::value(json!([{"name": "USDBTC", "currency": "USD", "asset": "BTC"}])),
        )
        .api(
            "echo",
            Endpoint::action(|_provider, options| async move { Ok(options) }.boxed())
                .transform_request("tid", TransformRule::rename("transactionId")),
        )
}

pub fn sample_credentials() -> Credentials {
    Credentials::key_secret("test-key", "test-secret")
}

pub fn provider_over(transport: Arc<MockTransport>) -> Provider {
    Provider::with_transport(sample_definition(), sample_credentials(), transport)
        .expect("sample definition builds")
}

/// Mock with routes for every remote endpoint the sample definition uses.
pub fn scripted_transport() -> Arc<MockTransport> {
    Arc::new(
        MockTransport::new()
            .route("ticker/", json!({"last": "511.85", "bid": "512.74", "ask": "514.86"}))
            .route("order_book/", json!({"bids": [], "asks": []}))
            .route("open_orders/", json!([]))
            .route("balance/", json!({"usd_balance": "2194.80", "btc_balance": "1.00000000"})),
    )
}

pub fn no_options() -> Value {
    Value::Null
}
