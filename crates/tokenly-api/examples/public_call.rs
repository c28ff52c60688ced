//! Example: public and signed calls
//!
//! Performs an unsigned GET, then a signed GET when credentials are present.
//!
//! Run with:
//! TOKENLY_API_BASE_URL=https://api.example.com RUST_LOG=debug \
//!     cargo run -p tokenly-api --example public_call -- status

use serde_json::json;
use std::sync::Arc;
use tokenly_api::{ApiClient, ApiError, HmacGenerator};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "status".to_string());
    let client = ApiClient::from_env(Some(Arc::new(HmacGenerator::new())))?;
    println!("Using {:?}", client);

    match client.get_public(&path, json!({})).await {
        Ok(value) => println!("public {}: {}", path, value),
        Err(ApiError::Api { message, code }) => println!("public {} failed ({}): {}", path, code, message),
        Err(e) => return Err(e.into()),
    }

    if client.client_id().is_some() {
        match client.get(&path, json!({})).await {
            Ok(value) => println!("signed {}: {}", path, value),
            Err(e) => println!("signed {} failed: {}", path, e),
        }
    }

    Ok(())
}
