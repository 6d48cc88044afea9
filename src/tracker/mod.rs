//! Fire-and-forget interaction telemetry.
//!
//! ```rust,ignore
//! let tracker = InteractionTracker::new(session.clone());
//!
//! // In a product view: returns immediately, never fails.
//! tracker.view_product(product.id);
//! ```

mod interactions;
mod task;
mod types;

pub use interactions::InteractionTracker;
pub use task::{spawn_detached, FailureSink, TracingFailureSink};
pub use types::{InteractionEvent, InteractionType, Metadata};
