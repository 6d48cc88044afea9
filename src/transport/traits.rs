use std::sync::Arc;

use futures::future::BoxFuture;

use crate::types::Credential;

/// Boxed error returned by consumer-provided collaborators.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer-provided persistence for the bearer credential.
///
/// Exactly one value lives under the configured key; absence means the
/// client is unauthenticated.
///
/// # Example
///
/// ```rust,ignore
/// impl CredentialStore for Keychain {
///     fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
///         Ok(self.entry(key).get_password().ok())
///     }
///
///     fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
///         self.entry(key).set_password(value).map_err(Into::into)
///     }
///
///     fn remove(&self, key: &str) -> Result<(), StoreError> {
///         self.entry(key).delete_credential().map_err(Into::into)
///     }
/// }
/// ```
pub trait CredentialStore: Send + Sync + 'static {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the value under `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Global user-visible error surface (a toast, a status bar, ...).
pub trait Notifier: Send + Sync + 'static {
    fn error(&self, message: &str);
}

/// Hard navigation, used to send the user to the login entry point.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, path: &str);
}

/// Default [`Notifier`]: logs instead of rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::warn!(message = %message, "Request failed");
    }
}

/// Default [`Navigator`]: logs the navigation target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(path = %path, "Navigation requested");
    }
}

/// Raised by the transport when a credential is rejected outside the auth
/// namespace. Resolves to `true` if a fresh credential is now stored.
pub(crate) trait Reauthenticate: Send + Sync {
    fn reauthenticate(self: Arc<Self>, rejected: Option<Credential>) -> BoxFuture<'static, bool>;
}
