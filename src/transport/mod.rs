//! HTTP transport shared by every storefront component.
//!
//! All outbound calls go through [`TransportClient`], which:
//!
//! - attaches the stored bearer credential (read fresh on every call),
//! - bounds every call by the configured timeout,
//! - classifies failures into [`ErrorKind`](crate::ErrorKind)s,
//! - on a rejected credential outside `/auth/`, clears it and asks the
//!   attached session to refresh, navigating to the login entry point if
//!   that fails,
//! - reports classified errors through the [`Notifier`] unless the route is
//!   under `/auth/`, where the caller renders them inline.

mod classify;
mod client;
mod store;
mod traits;

pub use client::{RequestOptions, TransportClient};
pub use store::{FileCredentialStore, MemoryCredentialStore};
pub use traits::{
    CredentialStore, Navigator, Notifier, StoreError, TracingNavigator, TracingNotifier,
};

pub(crate) use classify::SESSION_EXPIRED;
pub(crate) use traits::Reauthenticate;

/// Re-export so callers need not depend on `reqwest` directly.
pub use reqwest::Method;
