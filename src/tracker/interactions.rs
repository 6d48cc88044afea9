use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};

use super::task::{spawn_detached, FailureSink, TracingFailureSink};
use super::types::{InteractionBody, InteractionEvent, InteractionType, Metadata};
use crate::error::Error;
use crate::session::SessionManager;
use crate::transport::{RequestOptions, TransportClient};
use crate::types::{ProductId, UserId};

const INTERACTIONS_PATH: &str = "/recommendations/interactions";

/// Best-effort behavioral telemetry for the recommendation service.
///
/// Every method returns immediately. Events are sent only for an
/// authenticated session; anonymous events are dropped, not queued. A
/// failed send is reported to the [`FailureSink`] and lost: no retry, no
/// outbox, no user-visible error, no effect on the session.
#[derive(Clone)]
pub struct InteractionTracker {
    session: SessionManager,
    sink: Arc<dyn FailureSink>,
}

impl InteractionTracker {
    #[must_use]
    pub fn new(session: SessionManager) -> Self {
        Self {
            session,
            sink: Arc::new(TracingFailureSink),
        }
    }

    #[must_use]
    pub fn with_failure_sink(mut self, sink: impl FailureSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Record one interaction without waiting for it.
    pub fn track(
        &self,
        product_id: Option<ProductId>,
        interaction_type: InteractionType,
        metadata: Metadata,
    ) {
        let Some(user) = self.session.user() else {
            tracing::trace!(%interaction_type, "Anonymous interaction dropped");
            return;
        };

        let event = InteractionEvent::new(product_id, interaction_type, metadata);
        let transport = self.session.transport().clone();
        spawn_detached("track_interaction", Arc::clone(&self.sink), async move {
            send_event(&transport, user.id, &event).await
        });
    }

    pub fn view_product(&self, product_id: ProductId) {
        self.track(Some(product_id), InteractionType::View, Metadata::new());
    }

    pub fn click_product(&self, product_id: ProductId) {
        self.track(Some(product_id), InteractionType::Click, Metadata::new());
    }

    pub fn add_to_cart(&self, product_id: ProductId, quantity: u32) {
        self.track(
            Some(product_id),
            InteractionType::AddToCart,
            metadata(json!({ "quantity": quantity })),
        );
    }

    pub fn purchase_product(&self, product_id: ProductId, quantity: u32, price: f64) {
        self.track(
            Some(product_id),
            InteractionType::Purchase,
            metadata(json!({ "quantity": quantity, "price": price })),
        );
    }

    pub fn rate_product(&self, product_id: ProductId, rating: u8) {
        self.track(
            Some(product_id),
            InteractionType::Rate,
            metadata(json!({ "rating": rating })),
        );
    }

    pub fn favorite_product(&self, product_id: ProductId, is_favorite: bool) {
        self.track(
            Some(product_id),
            InteractionType::Favorite,
            metadata(json!({ "is_favorite": is_favorite })),
        );
    }

    pub fn search(&self, query: &str) {
        self.track(
            None,
            InteractionType::Search,
            metadata(json!({ "query": query })),
        );
    }
}

async fn send_event(
    transport: &TransportClient,
    user_id: UserId,
    event: &InteractionEvent,
) -> Result<(), Error> {
    let body = serde_json::to_value(InteractionBody { user_id, event }).map_err(|e| {
        Error::Generic {
            status: None,
            message: format!("failed to encode interaction: {e}"),
        }
    })?;

    transport
        .request_with(
            Method::POST,
            INTERACTIONS_PATH,
            Some(&body),
            None,
            &RequestOptions::new().background(),
        )
        .await?;

    tracing::debug!(
        user_id = %user_id,
        interaction_type = %event.interaction_type(),
        "Interaction recorded"
    );
    Ok(())
}

fn metadata(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        _ => Metadata::new(),
    }
}
