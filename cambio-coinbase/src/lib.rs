//! Coinbase provider definition.
//!
//! Raw API surface: <https://coinbase.com/api/v1/>. Bodies are JSON;
//! authenticated endpoints carry `ACCESS_KEY` / `ACCESS_SIGNATURE` /
//! `ACCESS_NONCE` headers, where the signature is the hex HMAC-SHA256 of
//! `nonce + uri + query + body`. A caller-supplied `access_token` replaces
//! the signed-header auth entirely and travels on the query string.
#![warn(missing_docs)]

use futures::FutureExt;
use serde_json::{Map, Value, json};

use cambio::{
    CallOptions, CambioError, Credentials, Endpoint, HttpMethod, Provider, ProviderDefinition,
    ProviderFlags, Transport,
};

/// Authenticated vendor endpoint with a JSON POST body.
fn authenticated(path: &str) -> Endpoint {
    Endpoint::path(path).method(HttpMethod::Post).authenticated()
}

/// Authenticated read endpoint.
fn authenticated_get(path: &str) -> Endpoint {
    Endpoint::path(path).authenticated()
}

/// `key=value&…` rendering of the query args, matching what actually goes
/// on the wire; part of the signed message.
fn query_string(args: &Map<String, Value>) -> String {
    args.iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}={}", urlencoding::encode(k), urlencoding::encode(&value))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// The static Coinbase definition: endpoint tables, signing conventions,
/// and option assembly.
#[must_use]
pub fn definition() -> ProviderDefinition {
    ProviderDefinition::builder("coinbase", "https://coinbase.com/api/v1/")
        .label("Coinbase")
        .schema_source(concat!(env!("CARGO_MANIFEST_DIR"), "/schemas"))
        .currencies(&["USD"])
        .assets(&["BTC"])
        .flags(ProviderFlags::requiring(&["key", "secret"]))
        .init_credentials(|mut credentials| {
            // Coinbase signs with key + secret only.
            credentials.user = None;
            Ok(credentials)
        })
        .create_auth_message(|provider, call: &CallOptions| {
            let nonce = provider.next_nonce();
            let query = query_string(&call.args);
            let query = if query.is_empty() {
                String::new()
            } else {
                format!("?{query}")
            };
            let body = if call.body.is_empty() {
                String::new()
            } else {
                Value::Object(call.body.clone()).to_string()
            };
            format!("{nonce}{}{query}{body}", call.uri)
        })
        .get_options(|provider, call| {
            // An access token replaces key/signature auth and rides the
            // query string.
            if call.args.contains_key("access_token") {
                return Ok(());
            }
            if call.auth {
                let signature = provider.create_auth_signature(call)?;
                let key = provider.credentials().key.clone().unwrap_or_default();
                call.headers.insert("ACCESS_KEY".into(), key);
                call.headers.insert("ACCESS_SIGNATURE".into(), signature);
                call.headers
                    .insert("ACCESS_NONCE".into(), provider.current_nonce().to_string());
            }
            Ok(())
        })
        // =========== Public vendor API ==============
        .vendor("prices.buy", "prices/buy")
        .vendor("prices.sell", "prices/sell")
        .vendor("prices.spot_rate", "prices/spot_rate")
        .vendor("prices.historical", "prices/historical")
        .vendor("currencies", "currencies")
        .vendor(
            "currencies.exchange_rates",
            Endpoint::path("currencies/exchange_rates").alias("currencies.rates"),
        )
        // =========== Private vendor API ==============
        .vendor("account.balance", authenticated_get("account/balance"))
        .vendor(
            "account.receive_address",
            authenticated_get("account/receive_address"),
        )
        .vendor(
            "account.generate_receive_address",
            authenticated("account/generate_receive_address"),
        )
        .vendor(
            "account_changes",
            authenticated_get("account_changes").alias("account.changes"),
        )
        .vendor("buttons", authenticated("buttons"))
        .vendor(
            "buttons.create_order",
            authenticated("buttons/{{code}}/create_order"),
        )
        .vendor("transactions", authenticated_get("transactions"))
        .vendor(
            "transactions.send_money",
            authenticated("transactions/send_money"),
        )
        // =========== Normalized api table ==============
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
            "prices.buy",
            Endpoint::action(|provider, options| {
                async move {
                    let mut opts = Map::new();
                    if let Some(qty) = options.get("qty")
                        && qty != &json!(1)
                    {
                        opts.insert("qty".into(), qty.clone());
                    }
                    provider.vendor("prices.buy", Value::Object(opts)).await
                }
                .boxed()
            }),
        )
        .api(
            "prices.sell",
            Endpoint::action(|provider, options| {
                async move {
                    let mut opts = Map::new();
                    if let Some(qty) = options.get("qty")
                        && qty != &json!(1)
                    {
                        opts.insert("qty".into(), qty.clone());
                    }
                    provider.vendor("prices.sell", Value::Object(opts)).await
                }
                .boxed()
            }),
        )
        .api(
            "prices.spot",
            Endpoint::action(|provider, options| {
                async move {
                    let mut opts = Map::new();
                    if let Some(currency) = options.get("currency")
                        && currency != &json!("USD")
                    {
                        opts.insert("currency".into(), currency.clone());
                    }
                    provider
                        .vendor("prices.spot_rate", Value::Object(opts))
                        .await
                }
                .boxed()
            }),
        )
        .api("prices.historical", "prices.historical")
        .api(
            "ticker",
            // Composite quote assembled from the three price endpoints.
            // The fan-out is safe only because these are unauthenticated
            // calls: requests carrying a nonce must be issued in order.
            Endpoint::action(|provider, _options| {
                async move {
                    let (buy, sell, spot) = futures::try_join!(
                        provider.api("prices.buy", Value::Null),
                        provider.api("prices.sell", Value::Null),
                        provider.api("prices.spot", Value::Null),
                    )?;
                    Ok(json!({
                        "timestamp": chrono::Utc::now().timestamp_millis(),
                        "high": buy["amount"],
                        "low": sell["amount"],
                        "ask": buy["amount"],
                        "bid": sell["amount"],
                        "last": spot["amount"],
                    }))
                }
                .boxed()
            }),
        )
        .api("currencies", "currencies")
        .api("currencies.rates", "currencies.exchange_rates")
        .api("account.balance", "account.balance")
        .api("account.receiveAddress", "account.receive_address")
        .api(
            "account.receiveAddress.create",
            Endpoint::action(|provider, options| {
                async move {
                    provider
                        .vendor("account.generate_receive_address", options)
                        .await
                }
                .boxed()
            }),
        )
        .api("account.changes", "account_changes")
        .api("buttons.create", "buttons")
        .api("buttons.order.create", "buttons.create_order")
}

/// Provider over the real HTTP transport.
///
/// # Errors
/// `Config` when the credential set is missing `key` or `secret`.
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
