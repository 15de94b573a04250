use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Value, json};

use cambio::{Endpoint, Provider, ProviderDefinition};
use cambio_mock::MockTransport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // 1. Describe an exchange as data: a vendor table and a normalized
    //    api table on top of it.
    let definition = ProviderDefinition::builder("demo", "https://api.demo.example/v1/")
        .label("Demo Exchange")
        .vendor("ticker", "ticker/")
        .api("ticker", "ticker")
        .api(
            "markets",
            Endpoint::value(json!([{"name": "USDBTC", "currency": "USD", "asset": "BTC"}])),
        )
        .api(
            "spread",
            Endpoint::action(|provider, _options| {
                async move {
                    let ticker = provider.vendor("ticker", Value::Null).await?;
                    Ok(json!({
                        "bid": ticker["bid"],
                        "ask": ticker["ask"],
                    }))
                }
                .boxed()
            }),
        );

    // 2. Script the transport so the example runs offline.
    let transport = Arc::new(MockTransport::new().route(
        "ticker/",
        json!({"last": "511.85", "bid": "512.74", "ask": "514.86"}),
    ));

    // 3. Instantiate the provider and call endpoints by name.
    let provider = Provider::with_transport(definition, Default::default(), transport)?;

    let markets = provider.api("markets", Value::Null).await?;
    println!("markets: {markets}");

    let ticker = provider.api("ticker", Value::Null).await?;
    println!("ticker:  {ticker}");

    let spread = provider.api("spread", Value::Null).await?;
    println!("spread:  {spread}");

    // 4. The same endpoints are reachable through the dotted namespace tree.
    for name in provider.api_tree().children() {
        println!("api.{name}");
    }

    Ok(())
}
