use derive_more::Display;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{ProductId, UserId};

/// Free-form event attributes, flattened into the request body.
pub type Metadata = Map<String, Value>;

/// Keys owned by the event envelope; metadata cannot override them.
const RESERVED_KEYS: [&str; 3] = ["user_id", "product_id", "interaction_type"];

/// Closed set of behavioral signals understood by the recommendation
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    #[display("view")]
    View,
    #[display("click")]
    Click,
    #[display("add_to_cart")]
    AddToCart,
    #[display("purchase")]
    Purchase,
    #[display("rate")]
    Rate,
    #[display("favorite")]
    Favorite,
    #[display("search")]
    Search,
}

impl InteractionType {
    pub const ALL: [Self; 7] = [
        Self::View,
        Self::Click,
        Self::AddToCart,
        Self::Purchase,
        Self::Rate,
        Self::Favorite,
        Self::Search,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Click => "click",
            Self::AddToCart => "add_to_cart",
            Self::Purchase => "purchase",
            Self::Rate => "rate",
            Self::Favorite => "favorite",
            Self::Search => "search",
        }
    }
}

/// One interaction, alive only until its request completes.
///
/// Built through [`new`](InteractionEvent::new), which keeps metadata from
/// shadowing the envelope fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionEvent {
    product_id: Option<ProductId>,
    interaction_type: InteractionType,
    #[serde(flatten)]
    metadata: Metadata,
}

impl InteractionEvent {
    #[must_use]
    pub fn new(
        product_id: Option<ProductId>,
        interaction_type: InteractionType,
        mut metadata: Metadata,
    ) -> Self {
        for key in RESERVED_KEYS {
            if metadata.remove(key).is_some() {
                tracing::debug!(key, "Dropping reserved metadata key");
            }
        }
        Self {
            product_id,
            interaction_type,
            metadata,
        }
    }

    #[must_use]
    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    #[must_use]
    pub fn interaction_type(&self) -> InteractionType {
        self.interaction_type
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// `POST /recommendations/interactions` body.
#[derive(Serialize)]
pub(crate) struct InteractionBody<'a> {
    pub(crate) user_id: UserId,
    #[serde(flatten)]
    pub(crate) event: &'a InteractionEvent,
}
