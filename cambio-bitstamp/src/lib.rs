//! Bitstamp provider definition.
//!
//! Raw API surface: <https://www.bitstamp.net/api/>. Bodies are
//! form-encoded; authenticated endpoints POST a `key` / `signature` /
//! `nonce` triple in the body, where the signature is the upper-cased
//! HMAC-SHA256 of `nonce + customer id + key`.
//!
//! Rate limit: 600 requests per 10 minutes (advisory).
#![warn(missing_docs)]

use futures::FutureExt;
use serde_json::{Map, Value, json};

use cambio::{
    AuthPlacement, CambioError, Credentials, Endpoint, HttpMethod, Provider, ProviderDefinition,
    ProviderFlags, RateLimit, RequestDefaults, SigningConfig, Transport, TransformRule,
};

/// Authenticated vendor endpoint: POST with signed form body.
fn authenticated(path: &str) -> Endpoint {
    Endpoint::path(path).method(HttpMethod::Post).authenticated()
}

/// The static Bitstamp definition: endpoint tables, signing conventions,
/// and option assembly.
#[must_use]
pub fn definition() -> ProviderDefinition {
    ProviderDefinition::builder("bitstamp", "https://www.bitstamp.net/api/")
        .label("Bitstamp")
        .schema_source(concat!(env!("CARGO_MANIFEST_DIR"), "/schemas"))
        .currencies(&["USD"])
        .assets(&["BTC"])
        .flags(
            ProviderFlags::requiring(&["key", "secret", "user"])
                .with_rate_limit(RateLimit::per_seconds(600, 600)),
        )
        .signing(SigningConfig::default().uppercased())
        .auth_placement(AuthPlacement::Body)
        .request_defaults(RequestDefaults {
            json: false,
            headers: Default::default(),
        })
        .create_auth_message(|provider, _call| {
            // One message build draws one nonce; the body picks the same
            // nonce up via current_nonce() afterwards.
            let nonce = provider.next_nonce();
            let user = provider.credentials().user.as_deref().unwrap_or_default();
            let key = provider.credentials().key.as_deref().unwrap_or_default();
            format!("{nonce}{user}{key}")
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
        // =========== Public vendor API ==============
        .vendor("ticker", "ticker/")
        .vendor("eur_usd", "eur_usd/")
        .vendor("transactions", "transactions/")
        .vendor("order_book", "order_book/")
        // =========== Private vendor API ==============
        .vendor("balance", authenticated("balance/"))
        .vendor("user_transactions", authenticated("user_transactions/"))
        .vendor("open_orders", authenticated("open_orders/"))
        .vendor("cancel_order", authenticated("cancel_order/"))
        .vendor("buy", authenticated("buy/"))
        .vendor("sell", authenticated("sell/"))
        .vendor("withdrawal_requests", authenticated("withdrawal_requests/"))
        .vendor("bitcoin_withdrawal", authenticated("bitcoin_withdrawal/"))
        .vendor(
            "bitcoin_deposit_address",
            authenticated("bitcoin_deposit_address/"),
        )
        .vendor("unconfirmed_btc", authenticated("unconfirmed_btc/"))
        .vendor("ripple_withdrawal", authenticated("ripple_withdrawal/"))
        .vendor("ripple_address", authenticated("ripple_address/"))
        // =========== Normalized api table ==============
        .api("ticker", "ticker")
        .api("currencies.rates", "eur_usd")
        .api(
            "markets",
            Endpoint::value(json!([{
                "name": "USDBTC",
                "currency": "USD",
                "asset": "BTC",
                // Minimum trade is $1 USD.
                "minimum": { "amount": 1, "unit": "currency" }
            }])),
        )
        .api(
            "transactions",
            // Proxies through an action (not a pure delegate) so the
            // schema validation and response rename around it stay live.
            Endpoint::action(|provider, options| {
                async move { provider.vendor("transactions", options).await }.boxed()
            })
            .transform_response("tid", TransformRule::rename("transactionId")),
        )
        .api(
            "orders.book",
            Endpoint::action(|provider, options| {
                async move {
                    let mut opts = Map::new();
                    // Vendor wants group as 1/0, callers pass a bool.
                    if let Some(group) = options.get("group") {
                        let flag = i64::from(group.as_bool().unwrap_or(false));
                        opts.insert("group".into(), json!(flag));
                    }
                    provider.vendor("order_book", Value::Object(opts)).await
                }
                .boxed()
            }),
        )
        .api("account.balance", "balance")
        .api("transactions.user", Endpoint::delegate("user_transactions"))
        .api("orders.open", Endpoint::delegate("open_orders"))
        .api("orders.cancel", Endpoint::delegate("cancel_order"))
        .api(
            "buy",
            Endpoint::action(|provider, options| {
                async move { provider.vendor("buy", options).await }.boxed()
            }),
        )
        .api(
            "sell",
            Endpoint::action(|provider, options| {
                async move { provider.vendor("sell", options).await }.boxed()
            }),
        )
        .api("withdrawal.requests", "withdrawal_requests")
        .api(
            "withdrawal.bitcoin",
            Endpoint::action(|provider, options| {
                async move { provider.vendor("bitcoin_withdrawal", options).await }.boxed()
            }),
        )
        .api(
            "account.receiveAddress",
            // The vendor returns the address as a bare string; callers
            // get an object.
            Endpoint::action(|provider, options| {
                async move {
                    let address = provider.vendor("bitcoin_deposit_address", options).await?;
                    Ok(json!({ "address": address }))
                }
                .boxed()
            }),
        )
}

/// Provider over the real HTTP transport.
///
/// # Errors
/// `Config` when the credential set is missing `key`, `secret`, or `user`.
pub fn provider(credentials: Credentials) -> Result<Provider, CambioError> {
    Provider::new(definition(), credentials)
}

/// Provider over a caller-supplied transport (tests).
///
/// # Errors
/// Same conditions as [`provider`].
pub fn provider_with_transport(
    credentials: Credentials,
    transport: std::sync::Arc<dyn Transport>,
) -> Result<Provider, CambioError> {
    Provider::with_transport(definition(), credentials, transport)
}
