//! HTTP layer — matcher REST client and retry policies.

pub mod client;
pub mod retry;

pub use client::MatcherHttp;
pub use retry::{RetryConfig, RetryPolicy};

use crate::domain::order::{Order, PlaceOrderRequest, PlaceOrderResponse};
use crate::error::HttpError;
use crate::shared::OrderId;
use async_trait::async_trait;

/// The matcher's order-mutation surface, as the lifecycle coordinator sees
/// it. [`MatcherHttp`] is the production implementation; the trait exists so
/// the coordinator's failure handling can be exercised against fakes.
#[async_trait]
pub trait Matcher: Send + Sync {
    async fn place_order(&self, request: &PlaceOrderRequest)
        -> Result<PlaceOrderResponse, HttpError>;

    async fn cancel_order(&self, order_id: OrderId) -> Result<Order, HttpError>;
}
