use serde_json::{json, Value};

use crate::error::Error;
use crate::transport::TransportClient;
use crate::types::{ProductId, UserId};

/// Read side of the recommendation service.
///
/// Payloads are returned as raw JSON; rendering products is up to the caller.
#[derive(Clone)]
pub struct RecommendationClient {
    transport: TransportClient,
}

impl RecommendationClient {
    pub const DEFAULT_PERSONALIZED_LIMIT: u32 = 10;
    pub const DEFAULT_SIMILAR_LIMIT: u32 = 6;
    pub const DEFAULT_TRENDING_LIMIT: u32 = 8;
    pub const DEFAULT_NEW_ARRIVALS_LIMIT: u32 = 8;
    pub const DEFAULT_NEW_ARRIVALS_DAYS: u32 = 30;

    #[must_use]
    pub fn new(transport: TransportClient) -> Self {
        Self { transport }
    }

    /// Recommendations computed for one user.
    ///
    /// # Errors
    ///
    /// Returns the classified transport error.
    pub async fn personalized(&self, user_id: UserId, limit: u32) -> Result<Value, Error> {
        self.transport
            .get(
                &format!("/recommendations/users/{user_id}/recommendations"),
                Some(&json!({ "limit": limit })),
            )
            .await
    }

    /// Products similar to `product_id`.
    ///
    /// # Errors
    ///
    /// Returns the classified transport error.
    pub async fn similar(&self, product_id: ProductId, limit: u32) -> Result<Value, Error> {
        self.transport
            .get(
                &format!("/recommendations/products/{product_id}/similar_products"),
                Some(&json!({ "limit": limit })),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the classified transport error.
    pub async fn trending(&self, limit: u32) -> Result<Value, Error> {
        self.transport
            .get("/recommendations/trending", Some(&json!({ "limit": limit })))
            .await
    }

    /// Products added within the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns the classified transport error.
    pub async fn new_arrivals(&self, limit: u32, days: u32) -> Result<Value, Error> {
        self.transport
            .get(
                "/recommendations/new_arrivals",
                Some(&json!({ "limit": limit, "days": days })),
            )
            .await
    }
}
