//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Create a client with basic configuration
//! - Map each response classification to a typed outcome
//! - Observe failures with side effects
//! - Send a JSON body
//!
//! Run with: `cargo run --example basic_call`

use courier::{Client, Error};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[derive(Debug, Default)]
enum Fetched {
    Post(Post),
    Empty,
    Failed(String),
    #[default]
    Unavailable,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("courier=debug,basic_call=info")
        .init();

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .default_header("User-Agent", "courier-demo/0.1")?
        .build()?;

    println!("=== GET Request Example ===");
    let fetched = client
        .get("https://jsonplaceholder.typicode.com/posts/1")
        .on_success(|response| async move {
            match response.json::<Post>() {
                Ok(post) => Fetched::Post(post),
                Err(e) => Fetched::Failed(e.to_string()),
            }
        })
        .on_no_content(|_| async { Fetched::Empty })
        .on_failed(|response| async move {
            Fetched::Failed(format!("{:?}: {}", response.status, response.raw_body))
        })
        .failed_side_effect(|response| {
            let status = response.status;
            async move { eprintln!("GET failed with status {:?}", status) }
        })
        .send()
        .await?;

    println!("{:#?}", fetched);
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let created: Option<u64> = client
        .post("https://jsonplaceholder.typicode.com/posts")
        .json(&new_post)?
        .success_side_effect(|response| {
            let latency = response.latency;
            async move { println!("Request latency: {:?}", latency) }
        })
        .on_success(|response| async move { response.data["id"].as_u64() })
        .send()
        .await?;

    println!("Created post ID: {:?}", created);

    Ok(())
}
