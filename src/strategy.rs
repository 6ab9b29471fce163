//! Strategies and side effects.
//!
//! A strategy decides the terminal value of one classification branch. A side
//! effect observes a branch for its effect only and always runs before the
//! branch's strategy. Every slot is optional: an unset response strategy yields
//! `T::default()`, the unset refresh strategy never refreshes, and side-effect
//! sequences start empty.

use crate::{Classification, RequestDescriptor, Response};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Produces the terminal value from a classified response.
pub type ResponseStrategy<T> = Arc<dyn Fn(Response) -> BoxFuture<'static, T> + Send + Sync>;

/// Produces the terminal value once the retry budget is exhausted.
pub type RetryFallbackStrategy<T> =
    Arc<dyn Fn(RequestDescriptor) -> BoxFuture<'static, T> + Send + Sync>;

/// Decides whether an unauthorized response should be redispatched.
pub type RefreshTokenStrategy = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Observes a classified response.
pub type ResponseSideEffect = Arc<dyn Fn(&Response) -> BoxFuture<'static, ()> + Send + Sync>;

/// Observes the descriptor handed to the retry fallback.
pub type DescriptorSideEffect =
    Arc<dyn Fn(&RequestDescriptor) -> BoxFuture<'static, ()> + Send + Sync>;

/// The strategy slots and side-effect sequences of one request.
pub struct Strategies<T> {
    pub(crate) success: Option<ResponseStrategy<T>>,
    pub(crate) no_content: Option<ResponseStrategy<T>>,
    pub(crate) failed: Option<ResponseStrategy<T>>,
    pub(crate) unauthorized: Option<ResponseStrategy<T>>,
    pub(crate) retry_fallback: Option<RetryFallbackStrategy<T>>,
    pub(crate) refresh_token: Option<RefreshTokenStrategy>,
    pub(crate) success_side_effects: Vec<ResponseSideEffect>,
    pub(crate) failed_side_effects: Vec<ResponseSideEffect>,
    pub(crate) unauthorized_side_effects: Vec<ResponseSideEffect>,
    pub(crate) retry_fallback_side_effects: Vec<DescriptorSideEffect>,
}

impl<T> Strategies<T> {
    /// Creates a table with every slot unset.
    pub fn new() -> Self {
        Self {
            success: None,
            no_content: None,
            failed: None,
            unauthorized: None,
            retry_fallback: None,
            refresh_token: None,
            success_side_effects: Vec::new(),
            failed_side_effects: Vec::new(),
            unauthorized_side_effects: Vec::new(),
            retry_fallback_side_effects: Vec::new(),
        }
    }

    /// Returns the strategy slot for a classification.
    fn slot(&self, classification: Classification) -> Option<&ResponseStrategy<T>> {
        match classification {
            Classification::Success => self.success.as_ref(),
            Classification::NoContent => self.no_content.as_ref(),
            Classification::Failed => self.failed.as_ref(),
            Classification::Unauthorized => self.unauthorized.as_ref(),
        }
    }

    /// Returns the side-effect sequence for a classification.
    ///
    /// No-content shares the success sequence.
    fn side_effects(&self, classification: Classification) -> &[ResponseSideEffect] {
        match classification {
            Classification::Success | Classification::NoContent => &self.success_side_effects,
            Classification::Failed => &self.failed_side_effects,
            Classification::Unauthorized => &self.unauthorized_side_effects,
        }
    }

    /// Runs the side effects of a classification in registration order.
    pub(crate) async fn observe(&self, classification: Classification, response: &Response) {
        for side_effect in self.side_effects(classification) {
            side_effect(response).await;
        }
    }

    /// Runs the retry-fallback side effects in registration order.
    pub(crate) async fn observe_exhausted(&self, descriptor: &RequestDescriptor) {
        for side_effect in &self.retry_fallback_side_effects {
            side_effect(descriptor).await;
        }
    }

    /// Asks the refresh strategy whether to redispatch.
    pub(crate) async fn refresh(&self) -> bool {
        match &self.refresh_token {
            Some(refresh) => refresh().await,
            None => false,
        }
    }
}

impl<T: Default> Strategies<T> {
    /// Invokes the strategy of a classification.
    pub(crate) async fn resolve(&self, classification: Classification, response: Response) -> T {
        match self.slot(classification) {
            Some(strategy) => strategy(response).await,
            None => {
                tracing::debug!(
                    classification = %classification,
                    "No strategy registered, using default"
                );
                T::default()
            }
        }
    }

    /// Invokes the retry-fallback strategy.
    pub(crate) async fn resolve_exhausted(&self, descriptor: RequestDescriptor) -> T {
        match &self.retry_fallback {
            Some(strategy) => strategy(descriptor).await,
            None => {
                tracing::debug!("No retry fallback strategy registered, using default");
                T::default()
            }
        }
    }
}

impl<T> Default for Strategies<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Strategies<T> {
    fn clone(&self) -> Self {
        Self {
            success: self.success.clone(),
            no_content: self.no_content.clone(),
            failed: self.failed.clone(),
            unauthorized: self.unauthorized.clone(),
            retry_fallback: self.retry_fallback.clone(),
            refresh_token: self.refresh_token.clone(),
            success_side_effects: self.success_side_effects.clone(),
            failed_side_effects: self.failed_side_effects.clone(),
            unauthorized_side_effects: self.unauthorized_side_effects.clone(),
            retry_fallback_side_effects: self.retry_fallback_side_effects.clone(),
        }
    }
}

impl<T> fmt::Debug for Strategies<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategies")
            .field("success", &self.success.is_some())
            .field("no_content", &self.no_content.is_some())
            .field("failed", &self.failed.is_some())
            .field("unauthorized", &self.unauthorized.is_some())
            .field("retry_fallback", &self.retry_fallback.is_some())
            .field("refresh_token", &self.refresh_token.is_some())
            .field("success_side_effects", &self.success_side_effects.len())
            .field("failed_side_effects", &self.failed_side_effects.len())
            .field("unauthorized_side_effects", &self.unauthorized_side_effects.len())
            .field(
                "retry_fallback_side_effects",
                &self.retry_fallback_side_effects.len(),
            )
            .finish()
    }
}

pub(crate) fn response_strategy<T, F, Fut>(f: F) -> ResponseStrategy<T>
where
    T: 'static,
    F: Fn(Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    Arc::new(move |response: Response| f(response).boxed())
}

pub(crate) fn retry_fallback_strategy<T, F, Fut>(f: F) -> RetryFallbackStrategy<T>
where
    T: 'static,
    F: Fn(RequestDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    Arc::new(move |descriptor: RequestDescriptor| f(descriptor).boxed())
}

pub(crate) fn refresh_token_strategy<F, Fut>(f: F) -> RefreshTokenStrategy
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

pub(crate) fn response_side_effect<F, Fut>(f: F) -> ResponseSideEffect
where
    F: Fn(&Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |response: &Response| f(response).boxed())
}

pub(crate) fn descriptor_side_effect<F, Fut>(f: F) -> DescriptorSideEffect
where
    F: Fn(&RequestDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |descriptor: &RequestDescriptor| f(descriptor).boxed())
}
