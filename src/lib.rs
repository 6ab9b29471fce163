//! # Courier - a declarative HTTP request executor
//!
//! Courier dispatches a request described by a fluent configuration, classifies
//! the response, and hands it to exactly one caller-supplied *strategy*.
//! Observers (*side effects*) run before the strategy of their branch.
//! Unauthorized responses can trigger a token refresh and a redispatch, bounded
//! by a single retry budget.
//!
//! ## Quick Start
//!
//! ```no_run
//! use courier::Client;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[derive(Debug, Default)]
//! enum Lookup {
//!     Found(User),
//!     Missing,
//!     #[default]
//!     Unavailable,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), courier::Error> {
//!     let client = Client::new()?;
//!
//!     let lookup = client
//!         .get("https://api.example.com/users/123")
//!         .bearer_token("secret")
//!         .max_retry(2)
//!         .on_success(|response| async move {
//!             response.json::<User>().map(Lookup::Found).unwrap_or_default()
//!         })
//!         .on_no_content(|_| async { Lookup::Missing })
//!         .failed_side_effect(|response| {
//!             let status = response.status;
//!             async move { eprintln!("lookup failed with {:?}", status) }
//!         })
//!         .send()
//!         .await?;
//!
//!     println!("{:?}", lookup);
//!     Ok(())
//! }
//! ```
//!
//! ## Classification
//!
//! | classification | when | side effects | strategy |
//! |---|---|---|---|
//! | unauthorized | direct or nested status `401` | unauthorized | `on_unauthorized`, after a declined refresh |
//! | failed | no status, or not `2xx` | failed | `on_failed` |
//! | no-content | `204` | success | `on_no_content` |
//! | success | any other `2xx` | success | `on_success` |
//!
//! Once `max_retry` dispatches have happened, the retry-fallback side effects
//! and `on_retry_exhausted` run instead. Unset strategies return `T::default()`.
//!
//! ## Token refresh
//!
//! ```no_run
//! use courier::Client;
//! use std::sync::{Arc, RwLock};
//!
//! # async fn example() -> Result<(), courier::Error> {
//! let token = Arc::new(RwLock::new(String::from("stale")));
//! let current = token.clone();
//!
//! let client = Client::new()?;
//! let body: Option<serde_json::Value> = client
//!     .get("https://api.example.com/me")
//!     .bearer_token_with(move || current.read().ok().map(|t| t.clone()))
//!     .refresh_token(move || {
//!         let token = token.clone();
//!         async move {
//!             // Obtain a new token here.
//!             *token.write().unwrap() = "fresh".to_string();
//!             true
//!         }
//!     })
//!     .on_success(|response| async move { Some(response.data) })
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
mod client;
pub mod config;
mod descriptor;
mod engine;
mod error;
mod response;
pub mod strategy;
mod transport;
mod validate;

pub use classify::{classify, Classification};
pub use client::{Client, ClientBuilder};
pub use config::{BearerAuth, Configuration, RequestBuilder};
pub use descriptor::{RequestDescriptor, ResponseType};
pub use engine::ExecutionEngine;
pub use error::{Error, Result};
pub use response::{NestedResponse, Response};
pub use strategy::Strategies;
pub use transport::{ReqwestTransport, Transport, TransportBuilder};
pub use validate::{validate, ValidationError};
