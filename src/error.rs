/// Classified failure kinds, independent of the carried message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidCredentials,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerFault,
    Unreachable,
    Generic,
    Config,
    Storage,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Login rejected by the auth service.
    #[error("{0}")]
    InvalidCredentials(String),
    /// A credential was rejected mid-session.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    ServerFault { status: u16, message: String },
    /// No response: connection failure or the per-call timeout elapsed.
    #[error("{0}")]
    Unreachable(String),
    #[error("{message}")]
    Generic {
        status: Option<u16>,
        message: String,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials(_) => ErrorKind::InvalidCredentials,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ServerFault { .. } => ErrorKind::ServerFault,
            Self::Unreachable(_) => ErrorKind::Unreachable,
            Self::Generic { .. } => ErrorKind::Generic,
            Self::Config(_) => ErrorKind::Config,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Message suitable for inline display next to a form.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidCredentials(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Unreachable(m)
            | Self::Config(m)
            | Self::Storage(m) => m,
            Self::ServerFault { message, .. } | Self::Generic { message, .. } => message,
        }
    }

    /// HTTP status that produced this error, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredentials(_) | Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerFault { status, .. } => Some(*status),
            Self::Generic { status, .. } => *status,
            Self::Unreachable(_) | Self::Config(_) | Self::Storage(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = Error::ServerFault {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(err.kind(), ErrorKind::ServerFault);
        assert_eq!(err.message(), "bad gateway");
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "bad gateway");
    }

    #[test]
    fn test_unreachable_has_no_status() {
        let err = Error::Unreachable("timed out".into());
        assert_eq!(err.kind(), ErrorKind::Unreachable);
        assert_eq!(err.status(), None);
    }
}
