use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Auth service user identifier (`user_id` in auth payloads).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Catalog product identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct ProductId(pub i64);

/// Opaque bearer credential issued by the auth service.
///
/// Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert_eq!(credential.expose(), "secret-token");
    }

    #[test]
    fn user_id_deserializes_from_number() {
        let id: UserId = serde_json::from_str("7").unwrap();
        assert_eq!(id, UserId(7));
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn newtypes_prevent_mixing() {
        fn takes_user_id(_: UserId) {}
        fn takes_product_id(_: ProductId) {}

        takes_user_id(UserId::from(1));
        takes_product_id(ProductId::from(1));
        // takes_user_id(ProductId(1));  // Compile error!
    }
}
