//! Example demonstrating token refresh and the shared retry budget.
//!
//! A local transport rejects the first token with `401`. The refresh strategy
//! installs a new token and the request is dispatched again.
//!
//! Run with: `cargo run --example token_refresh`

use async_trait::async_trait;
use courier::{Client, Error, RequestDescriptor, Response, Transport};
use http::{Method, StatusCode};
use serde_json::json;
use std::sync::{Arc, RwLock};

/// Accepts only the token "fresh".
struct FakeApi;

#[async_trait]
impl Transport for FakeApi {
    async fn dispatch(
        &self,
        method: &Method,
        descriptor: &RequestDescriptor,
    ) -> courier::Result<Response> {
        let response = match descriptor.header("authorization") {
            Some("Bearer fresh") => Response::new(
                StatusCode::OK,
                json!({ "method": method.as_str(), "url": descriptor.url() }),
            ),
            _ => Response::new(StatusCode::UNAUTHORIZED, json!({ "error": "expired token" })),
        };
        Ok(response)
    }
}

#[derive(Debug, Default)]
enum Session {
    Active(serde_json::Value),
    LoggedOut,
    #[default]
    GaveUp,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("courier=debug,token_refresh=info")
        .init();

    let client = Client::with_transport(Arc::new(FakeApi));
    let token = Arc::new(RwLock::new("expired".to_string()));

    println!("=== Refresh accepted ===");
    let current = token.clone();
    let store = token.clone();
    let session = client
        .get("https://api.example.com/me")
        .max_retry(2)
        .bearer_token_with(move || current.read().ok().map(|t| t.clone()))
        .refresh_token(move || {
            let store = store.clone();
            async move {
                println!("Refreshing token");
                match store.write() {
                    Ok(mut token) => {
                        *token = "fresh".to_string();
                        true
                    }
                    Err(_) => false,
                }
            }
        })
        .on_success(|response| async move { Session::Active(response.data) })
        .on_unauthorized(|_| async { Session::LoggedOut })
        .on_retry_exhausted(|_| async { Session::GaveUp })
        .send()
        .await?;
    println!("{:?}", session);

    println!("=== Refresh declined ===");
    let session = client
        .get("https://api.example.com/me")
        .bearer_token("revoked")
        .refresh_token(|| async { false })
        .unauthorized_side_effect(|response| {
            let body = response.data.clone();
            async move { println!("Unauthorized: {}", body) }
        })
        .on_unauthorized(|_| async { Session::LoggedOut })
        .send()
        .await?;
    println!("{:?}", session);

    println!("=== Refresh never helps ===");
    let session = client
        .get("https://api.example.com/me")
        .bearer_token("revoked")
        .max_retry(3)
        .refresh_token(|| async { true })
        .retry_fallback_side_effect(|descriptor| {
            let url = descriptor.url().to_string();
            async move { println!("Giving up on {}", url) }
        })
        .on_retry_exhausted(|_| async { Session::GaveUp })
        .send()
        .await?;
    println!("{:?}", session);

    Ok(())
}
