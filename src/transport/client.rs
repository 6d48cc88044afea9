use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::classify;
use super::store::{CredentialSlot, MemoryCredentialStore};
use super::traits::{
    CredentialStore, Navigator, Notifier, Reauthenticate, TracingNavigator, TracingNotifier,
};
use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind};
use crate::types::Credential;

/// Per-call transport behavior.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) anonymous: bool,
    pub(crate) background: bool,
    pub(crate) credential: Option<Credential>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Never attach the bearer header (login, registration, password reset).
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// No user-visible notification and no 401 remediation.
    #[must_use]
    pub fn background(mut self) -> Self {
        self.background = true;
        self
    }

    /// Present this credential instead of the stored one.
    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }
}

/// Single chokepoint for outbound calls to the storefront services.
///
/// Attaches the stored credential, enforces the configured timeout and
/// classifies every failure before it reaches the caller.
#[derive(Clone)]
pub struct TransportClient {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    credentials: CredentialSlot,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    reauthenticator: Arc<RwLock<Option<Weak<dyn Reauthenticate>>>>,
}

impl TransportClient {
    /// Create a transport with in-memory credential storage and logging
    /// notifier/navigator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            credentials: CredentialSlot::new(
                Arc::new(MemoryCredentialStore::new()),
                config.credential_key.clone(),
            ),
            config: Arc::new(config),
            http,
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(TracingNavigator),
            reauthenticator: Arc::new(RwLock::new(None)),
        })
    }

    /// Use a custom credential store (file, keychain, browser storage).
    #[must_use]
    pub fn with_store(mut self, store: impl CredentialStore) -> Self {
        self.credentials = CredentialSlot::new(Arc::new(store), self.config.credential_key.clone());
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: impl Navigator) -> Self {
        self.navigator = Arc::new(navigator);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn credentials(&self) -> &CredentialSlot {
        &self.credentials
    }

    pub(crate) fn set_reauthenticator(&self, target: Weak<dyn Reauthenticate>) {
        *self.reauthenticator.write() = Some(target);
    }

    /// Send a request and return the decoded JSON payload (`Null` for an
    /// empty body).
    ///
    /// # Errors
    ///
    /// Returns the classified error; see [`ErrorKind`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        params: Option<&Value>,
    ) -> Result<Value, Error> {
        self.request_with(method, path, body, params, &RequestOptions::default())
            .await
    }

    /// [`request`](Self::request) with explicit [`RequestOptions`].
    ///
    /// # Errors
    ///
    /// Returns the classified error; see [`ErrorKind`].
    #[tracing::instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn request_with(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        params: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, Error> {
        let credential = if options.anonymous {
            None
        } else {
            options
                .credential
                .clone()
                .or_else(|| self.credentials.load())
        };

        let mut request = self.http.request(method, self.config.endpoint(path));
        if let Some(params) = params {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(credential) = &credential {
            request = request.bearer_auth(credential.expose());
        }

        tracing::debug!(authenticated = credential.is_some(), "Sending request");

        let outcome = match request.send().await {
            Ok(response) => Self::read_response(response).await,
            Err(e) => Err(classify::classify_send_error(&e)),
        };

        match outcome {
            Ok(payload) => Ok(payload),
            Err(err) if options.background => Err(err),
            Err(err) => Err(self.remediate(path, err, credential).await),
        }
    }

    /// GET and decode into `T`.
    ///
    /// # Errors
    ///
    /// Returns the classified error, or [`Error::Generic`] if the payload
    /// does not match `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&Value>,
    ) -> Result<T, Error> {
        let payload = self.request(Method::GET, path, None, params).await?;
        decode(payload)
    }

    /// POST a JSON body and decode into `T`.
    ///
    /// # Errors
    ///
    /// Returns the classified error, or [`Error::Generic`] if the payload
    /// does not match `T`.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, Some(body), &RequestOptions::default())
            .await
    }

    /// PUT a JSON body and decode into `T`.
    ///
    /// # Errors
    ///
    /// Returns the classified error, or [`Error::Generic`] if the payload
    /// does not match `T`.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, Some(body), &RequestOptions::default())
            .await
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| Error::Generic {
                status: None,
                message: format!("failed to encode request body: {e}"),
            })?;
        let payload = self
            .request_with(method, path, body.as_ref(), None, options)
            .await?;
        decode(payload)
    }

    async fn read_response(response: reqwest::Response) -> Result<Value, Error> {
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(classify::classify_status(status, &body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify::classify_send_error(&e))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| Error::Generic {
            status: Some(status.as_u16()),
            message: format!("malformed response body: {e}"),
        })
    }

    /// Apply the uniform failure policy and hand the error back.
    async fn remediate(&self, path: &str, err: Error, presented: Option<Credential>) -> Error {
        let auth_route = classify::is_auth_route(path);

        if err.kind() == ErrorKind::Unauthorized {
            self.credentials.clear_rejected(presented.as_ref());

            if !auth_route {
                tracing::warn!(path = %path, "Credential rejected, attempting refresh");
                if !self.reauthenticate(presented).await {
                    self.navigator.navigate(&self.config.login_path);
                }
            }
        }

        if !auth_route {
            self.notifier.error(err.message());
        }
        err
    }

    async fn reauthenticate(&self, rejected: Option<Credential>) -> bool {
        let target = self.reauthenticator.read().as_ref().and_then(Weak::upgrade);
        match target {
            Some(target) => target.reauthenticate(rejected).await,
            None => {
                tracing::debug!("No session attached, skipping refresh");
                false
            }
        }
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, Error> {
    serde_json::from_value(payload).map_err(|e| Error::Generic {
        status: None,
        message: format!("unexpected response payload: {e}"),
    })
}
