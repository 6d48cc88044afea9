#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
#[cfg(feature = "tracker")]
pub mod recommendations;
pub mod session;
#[cfg(feature = "tracker")]
pub mod tracker;
pub mod transport;
pub mod types;

// Re-exports for convenient access
pub use config::ClientConfig;
pub use error::{Error, ErrorKind};
#[cfg(feature = "tracker")]
pub use recommendations::RecommendationClient;
pub use session::{
    Identity, LoginRequest, PasswordChange, PasswordReset, ProfileUpdate, RegisterRequest,
    SessionManager, SessionSnapshot, SessionState, SessionStatus,
};
#[cfg(feature = "tracker")]
pub use tracker::{
    FailureSink, InteractionEvent, InteractionTracker, InteractionType, Metadata,
    TracingFailureSink,
};
pub use transport::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, Method, Navigator, Notifier,
    RequestOptions, TracingNavigator, TracingNotifier, TransportClient,
};
pub use types::{Credential, ProductId, UserId};
