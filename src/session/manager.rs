use std::future::Future;
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::{Mutex, MutexGuard};
use reqwest::Method;
use serde_json::Value;
use tokio::sync::watch;

use super::state::{SessionSnapshot, SessionState, SessionStatus};
use super::types::{
    AuthPayload, Identity, LoginRequest, PasswordChange, PasswordReset, ProfileUpdate,
    RegisterRequest,
};
use crate::error::{Error, ErrorKind};
use crate::transport::{Reauthenticate, RequestOptions, TransportClient, SESSION_EXPIRED};
use crate::types::Credential;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const VALIDATE_PATH: &str = "/auth/validate-token";
const REFRESH_PATH: &str = "/auth/refresh-token";
const PROFILE_PATH: &str = "/auth/profile";
const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
const REQUEST_RESET_PATH: &str = "/auth/request-reset";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

const INVALID_CREDENTIALS: &str = "Invalid email or password";

type Exchange = Shared<BoxFuture<'static, bool>>;

/// Owns the authentication state machine.
///
/// Cheap to clone; every clone observes and drives the same session. Hand
/// clones to the views that need them instead of reaching for a global.
///
/// ```rust,ignore
/// let transport = TransportClient::new(ClientConfig::from_env()?)?
///     .with_store(FileCredentialStore::new(data_dir.join("credentials.json")));
/// let session = SessionManager::new(transport);
///
/// session.check_auth_status().await;
/// if !session.is_authenticated() {
///     session.login(&LoginRequest::new(email, password)).await?;
/// }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    transport: TransportClient,
    state: watch::Sender<SessionSnapshot>,
    // Advanced by every login, logout and committed exchange. An exchange
    // only commits if the epoch still matches the one it started under.
    epoch: Mutex<u64>,
    // At most one validate-or-refresh exchange; late callers attach here.
    inflight: Mutex<Option<Exchange>>,
}

impl SessionManager {
    /// Create a session in the `Initializing` state and attach it to the
    /// transport as its refresh handler.
    #[must_use]
    pub fn new(transport: TransportClient) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        let inner = Arc::new(SessionInner {
            transport,
            state,
            epoch: Mutex::new(0),
            inflight: Mutex::new(None),
        });
        let handler: Weak<SessionInner> = Arc::downgrade(&inner);
        inner.transport.set_reauthenticator(handler);
        Self { inner }
    }

    #[must_use]
    pub fn transport(&self) -> &TransportClient {
        &self.inner.transport
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().state.clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.state.borrow().state.status()
    }

    #[must_use]
    pub fn user(&self) -> Option<Arc<Identity>> {
        self.inner.state.borrow().state.identity().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().state.is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Receiver notified on every state or `loading` change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] when the auth service rejects
    /// the credentials; other classified errors pass through unchanged.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Identity, Error> {
        let payload: AuthPayload = self
            .inner
            .transport
            .send_json(
                Method::POST,
                LOGIN_PATH,
                Some(credentials),
                &RequestOptions::new().anonymous(),
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Login failed");
                into_invalid_credentials(e)
            })?;

        let credential = payload.credential().ok_or_else(|| missing_field("token"))?;
        let identity = payload.identity().ok_or_else(|| missing_field("user_id"))?;

        let _epoch = self.inner.advance();
        self.inner.transport.credentials().save(&credential)?;
        self.inner.set_authenticated(identity.clone());
        tracing::info!(user_id = %identity.id, "Login successful");
        Ok(identity)
    }

    /// Clear the credential and identity. Purely local; always succeeds.
    pub fn logout(&self) {
        self.inner.logout();
    }

    /// Exchange the current credential for a fresh one.
    ///
    /// Joins the in-flight exchange if there is one. On failure the session
    /// is logged out. An exchange overtaken by a login or logout leaves the
    /// session as that left it; the result then reports whether the session
    /// is authenticated.
    pub async fn refresh(&self) -> bool {
        Arc::clone(&self.inner).refresh(None).await
    }

    /// Resolve the session from the stored credential. Run once at startup.
    ///
    /// Validates the stored credential, falls back to a single refresh when
    /// it is rejected, and otherwise ends unauthenticated. Concurrent checks
    /// and refreshes share one exchange. `loading` is false on every exit
    /// path.
    #[tracing::instrument(skip_all)]
    pub async fn check_auth_status(&self) {
        let _loading = LoadingGuard::engage(&self.inner.state);

        match Arc::clone(&self.inner).resolve() {
            Some(exchange) => {
                exchange.await;
            }
            None => {
                tracing::debug!("No stored credential");
                self.inner.set_unauthenticated();
            }
        }
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns the classified error for inline display.
    #[tracing::instrument(skip_all)]
    pub async fn register(&self, request: &RegisterRequest) -> Result<Identity, Error> {
        let payload: AuthPayload = self
            .inner
            .transport
            .send_json(
                Method::POST,
                REGISTER_PATH,
                Some(request),
                &RequestOptions::new().anonymous(),
            )
            .await?;

        let identity = payload.identity().ok_or_else(|| missing_field("user_id"))?;
        tracing::info!(user_id = %identity.id, "Account registered");
        Ok(identity)
    }

    /// Update the profile and replace the session identity with the result.
    ///
    /// # Errors
    ///
    /// Returns the classified error for inline display.
    #[tracing::instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, Error> {
        let payload: AuthPayload = self
            .inner
            .transport
            .send_json(
                Method::PUT,
                PROFILE_PATH,
                Some(update),
                &RequestOptions::default(),
            )
            .await?;

        let identity = payload.identity().ok_or_else(|| missing_field("user_id"))?;
        if self.is_authenticated() {
            self.inner.set_authenticated(identity.clone());
        }
        Ok(identity)
    }

    /// # Errors
    ///
    /// Returns the classified error for inline display.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), Error> {
        let _: Value = self
            .inner
            .transport
            .send_json(
                Method::POST,
                CHANGE_PASSWORD_PATH,
                Some(change),
                &RequestOptions::default(),
            )
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the classified error for inline display.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), Error> {
        let _: Value = self
            .inner
            .transport
            .send_json(
                Method::POST,
                REQUEST_RESET_PATH,
                Some(&serde_json::json!({ "email": email })),
                &RequestOptions::new().anonymous(),
            )
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the classified error for inline display.
    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<(), Error> {
        let _: Value = self
            .inner
            .transport
            .send_json(
                Method::POST,
                RESET_PASSWORD_PATH,
                Some(reset),
                &RequestOptions::new().anonymous(),
            )
            .await?;
        Ok(())
    }
}

impl SessionInner {
    fn set_authenticated(&self, identity: Identity) {
        self.state
            .send_modify(|s| s.state = SessionState::Authenticated(Arc::new(identity)));
    }

    fn set_unauthenticated(&self) {
        self.state
            .send_modify(|s| s.state = SessionState::Unauthenticated);
    }

    fn is_authenticated(&self) -> bool {
        self.state.borrow().state.is_authenticated()
    }

    /// Start a new epoch. Held while the caller rewrites session state.
    fn advance(&self) -> MutexGuard<'_, u64> {
        let mut epoch = self.epoch.lock();
        *epoch += 1;
        epoch
    }

    /// Like [`advance`](Self::advance), but only if no login or logout has
    /// happened since `started`.
    fn claim(&self, started: u64) -> Option<MutexGuard<'_, u64>> {
        let mut epoch = self.epoch.lock();
        if *epoch != started {
            tracing::debug!("Session changed during exchange, discarding result");
            return None;
        }
        *epoch += 1;
        Some(epoch)
    }

    fn logout(&self) {
        let _epoch = self.advance();
        self.clear();
    }

    fn clear(&self) {
        self.transport.credentials().clear();
        self.set_unauthenticated();
        tracing::info!("Logged out");
    }

    /// Log out on behalf of a failed exchange, unless it was overtaken.
    fn fail(&self, started: u64) -> bool {
        let Some(_epoch) = self.claim(started) else {
            return self.is_authenticated();
        };
        self.clear();
        false
    }

    async fn validate(&self, credential: Credential) -> Result<Identity, Error> {
        let payload: AuthPayload = self
            .transport
            .send_json::<(), _>(
                Method::GET,
                VALIDATE_PATH,
                None,
                &RequestOptions::new().with_credential(credential),
            )
            .await?;
        payload.identity().ok_or_else(|| missing_field("user_id"))
    }

    /// Start a refresh exchange, or join the one in flight.
    fn refresh(self: Arc<Self>, rejected: Option<Credential>) -> Exchange {
        let mut slot = self.inflight.lock();
        if let Some(pending) = slot.as_ref() {
            tracing::debug!("Joining in-flight exchange");
            return pending.clone();
        }

        Self::start(&self, &mut slot, move |inner, started| async move {
            inner.exchange_refresh(rejected, started).await
        })
    }

    /// Start a validate-then-refresh exchange for the stored credential, or
    /// join the one in flight. `None` when nothing is stored.
    fn resolve(self: Arc<Self>) -> Option<Exchange> {
        let mut slot = self.inflight.lock();
        if let Some(pending) = slot.as_ref() {
            tracing::debug!("Joining in-flight exchange");
            return Some(pending.clone());
        }

        let stored = self.transport.credentials().load()?;
        Some(Self::start(&self, &mut slot, move |inner, started| async move {
            inner.exchange_stored(stored, started).await
        }))
    }

    fn start<F, Fut>(inner: &Arc<Self>, slot: &mut Option<Exchange>, run: F) -> Exchange
    where
        F: FnOnce(Arc<Self>, u64) -> Fut,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let started = *inner.epoch.lock();
        let work = run(Arc::clone(inner), started);
        let owner = Arc::clone(inner);
        let exchange = async move {
            let done = work.await;
            owner.inflight.lock().take();
            done
        }
        .boxed()
        .shared();

        *slot = Some(exchange.clone());
        exchange
    }

    async fn exchange_stored(&self, stored: Credential, started: u64) -> bool {
        match self.validate(stored.clone()).await {
            Ok(identity) => {
                let Some(_epoch) = self.claim(started) else {
                    return self.is_authenticated();
                };
                tracing::info!(user_id = %identity.id, "Stored credential validated");
                self.set_authenticated(identity);
                true
            }
            Err(e) if e.kind() == ErrorKind::Unauthorized => {
                tracing::info!("Stored credential rejected, attempting refresh");
                self.exchange_refresh(Some(stored), started).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Credential validation failed");
                self.fail(started)
            }
        }
    }

    async fn exchange_refresh(&self, rejected: Option<Credential>, started: u64) -> bool {
        let options = match rejected {
            Some(credential) => RequestOptions::new().with_credential(credential),
            None => RequestOptions::new(),
        };

        let payload: AuthPayload = match self
            .transport
            .send_json::<(), _>(Method::POST, REFRESH_PATH, None, &options)
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Credential refresh failed");
                return self.fail(started);
            }
        };

        let Some(credential) = payload.credential() else {
            tracing::warn!("Refresh response carried no token");
            return self.fail(started);
        };

        let identity = match payload.identity() {
            Some(identity) => Some(identity),
            None if *self.epoch.lock() != started => return self.is_authenticated(),
            None if self.is_authenticated() => None,
            // Nothing to keep: resolve the identity behind the new credential.
            None => match self.validate(credential.clone()).await {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::warn!(error = %e, "Refreshed credential failed validation");
                    return self.fail(started);
                }
            },
        };

        let Some(_epoch) = self.claim(started) else {
            return self.is_authenticated();
        };
        if let Err(e) = self.transport.credentials().save(&credential) {
            tracing::warn!(error = %e, "Failed to store refreshed credential");
            self.clear();
            return false;
        }
        if let Some(identity) = identity {
            self.set_authenticated(identity);
        }

        tracing::info!("Credential refreshed");
        true
    }
}

impl Reauthenticate for SessionInner {
    fn reauthenticate(self: Arc<Self>, rejected: Option<Credential>) -> BoxFuture<'static, bool> {
        self.refresh(rejected).boxed()
    }
}

/// Holds `loading` true until dropped.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionSnapshot>,
}

impl<'a> LoadingGuard<'a> {
    fn engage(state: &'a watch::Sender<SessionSnapshot>) -> Self {
        state.send_modify(|s| s.loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

fn into_invalid_credentials(err: Error) -> Error {
    match err {
        Error::Unauthorized(message) if message == SESSION_EXPIRED => {
            Error::InvalidCredentials(INVALID_CREDENTIALS.into())
        }
        Error::Unauthorized(message) => Error::InvalidCredentials(message),
        other => other,
    }
}

fn missing_field(field: &str) -> Error {
    Error::Generic {
        status: None,
        message: format!("auth response is missing `{field}`"),
    }
}
