// src/main.rs

//! Token authorizer entrypoint.
//!
//! Reads one authorizer event as JSON from stdin and writes the policy
//! decision as JSON to stdout:
//!
//! ```text
//! echo '{"type":"TOKEN","authorizationToken":"Bearer eyJ..."}' \
//!     | JWKS_URL=https://tenant.auth0.com/.well-known/jwks.json todo-authorizer
//! ```

use std::io::Read;
use todo_backend::prelude::*;
use todo_backend::telemetry;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let config = ConfigBuilder::from_env()?.build().map_err(|e| {
        error!(error = %e, "Invalid authorizer configuration");
        e
    })?;
    let authorizer = Authorizer::new(config)?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let event: AuthorizerEvent = serde_json::from_str(&input)?;

    let response = authorizer.handle(&event).await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
