use serde_json::Value;

use cambio::{Credentials, Provider};

/// Inspect the auth fragment a signed request would carry, without
/// sending anything. Keys below are throwaways.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let provider = Provider::new(
        cambio_bitstamp::definition(),
        Credentials::key_secret("u3pojF0tBfIdlDBtvF42o8Gry6TOGu5M", "FjrAw2TyI8t6seb6dZdrwYAXw1KeJiUg")
            .with_user("679064"),
    )?;

    let keys = provider.auth_keys("vendor.balance", Value::Null)?;
    println!("---bitstamp keys---\n{keys:#}");

    Ok(())
}
