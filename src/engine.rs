//! The execution engine.
//!
//! [`ExecutionEngine::execute`] drives one configuration to exactly one
//! strategy call:
//!
//! 1. Once `max_retry` dispatches have happened, run the retry-fallback side
//!    effects and the retry-fallback strategy.
//! 2. Otherwise derive a fresh descriptor, attach the bearer token and dispatch.
//! 3. Classify the response. An unauthorized response asks the refresh
//!    strategy; `true` goes back to step 1 with the counter incremented. Every
//!    other outcome runs its side effects and then its strategy.
//!
//! Dispatches are strictly sequential. Errors returned by the transport are
//! not caught here and propagate to the caller.

use crate::{
    classify::{classify, Classification},
    config::Configuration,
    transport::Transport,
    validate::ValidationError,
    Result,
};
use std::sync::Arc;
use std::time::Instant;

/// Runs validated configurations against a transport.
#[derive(Clone)]
pub struct ExecutionEngine {
    transport: Arc<dyn Transport>,
}

impl ExecutionEngine {
    /// Creates an engine dispatching through `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Executes `config` with its configured method and returns the terminal
    /// strategy value.
    ///
    /// The configuration is expected to be validated already; see
    /// [`RequestBuilder::build`](crate::RequestBuilder::build).
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingMethod`] if no method is configured, otherwise
    /// only errors returned by the transport itself.
    pub async fn execute<T: Default>(&self, config: &Configuration<T>) -> Result<T> {
        let method = config.method().ok_or(ValidationError::MissingMethod)?;
        let strategies = config.strategies();
        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            if attempt >= config.max_retry() {
                let descriptor = config.descriptor();
                tracing::warn!(
                    attempts = attempt,
                    max_retry = config.max_retry(),
                    method = %method,
                    url = %descriptor.url(),
                    "Retry budget exhausted"
                );
                strategies.observe_exhausted(&descriptor).await;
                return Ok(strategies.resolve_exhausted(descriptor).await);
            }

            let descriptor = config.authorized_descriptor();
            tracing::debug!(
                method = %method,
                url = %descriptor.url(),
                attempt = attempt + 1,
                "Dispatching request"
            );

            let mut response = self.transport.dispatch(method, &descriptor).await?;
            attempt += 1;
            response.attempts = attempt;

            let classification = classify(Some(&response));
            tracing::info!(
                status = ?response.effective_status(),
                classification = %classification,
                attempt = attempt,
                elapsed_ms = start_time.elapsed().as_millis(),
                "Classified response"
            );

            if classification == Classification::Unauthorized {
                if strategies.refresh().await {
                    tracing::info!(attempt = attempt, "Token refreshed, redispatching request");
                    continue;
                }
                tracing::debug!(attempt = attempt, "Token refresh declined");
            }

            strategies.observe(classification, &response).await;
            return Ok(strategies.resolve(classification, response).await);
        }
    }
}
