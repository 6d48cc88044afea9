//! Authentication session lifecycle.
//!
//! ```text
//! Initializing --no stored credential------------------> Unauthenticated
//! Initializing --validate ok----------------------------> Authenticated
//! Initializing --validate 401, refresh ok---------------> Authenticated
//! Initializing --validate/refresh failed----------------> Unauthenticated
//! Unauthenticated --login ok----------------------------> Authenticated
//! Authenticated --logout / unrecoverable 401------------> Unauthenticated
//! Authenticated --silent refresh ok---------------------> Authenticated
//! ```
//!
//! Refresh is reactive only: it runs when a request is rejected, never on a
//! timer. A login or logout that lands while an exchange is in flight wins;
//! the exchange's late result is dropped.

mod manager;
mod state;
mod types;

pub use manager::SessionManager;
pub use state::{SessionSnapshot, SessionState, SessionStatus};
pub use types::{
    Identity, LoginRequest, PasswordChange, PasswordReset, ProfileUpdate, RegisterRequest,
};
