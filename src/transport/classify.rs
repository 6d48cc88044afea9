use reqwest::StatusCode;
use serde_json::Value;

use crate::error::Error;

/// Routes under this prefix belong to the auth service. Their errors are
/// rendered inline by the caller and never trigger refresh.
pub(crate) const AUTH_NAMESPACE: &str = "/auth/";

pub(crate) const FALLBACK_MESSAGE: &str = "An unexpected error occurred";
pub(crate) const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
const FORBIDDEN: &str = "You do not have permission to access this resource";
const NOT_FOUND: &str = "Resource not found";
const SERVER_FAULT: &str = "Internal server error. Please try again later.";
const UNREACHABLE: &str = "Could not connect to the server. Check your connection.";
const TIMED_OUT: &str = "The server took too long to respond. Please try again.";

pub(crate) fn is_auth_route(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or_default();
    if path.starts_with('/') {
        path.starts_with(AUTH_NAMESPACE)
    } else {
        path.starts_with(&AUTH_NAMESPACE[1..])
    }
}

/// Classify a non-2xx response.
pub(crate) fn classify_status(status: StatusCode, body: &[u8]) -> Error {
    let server = server_message(body);
    let message = |fallback: &str| server.clone().unwrap_or_else(|| fallback.to_owned());

    match status.as_u16() {
        401 => Error::Unauthorized(message(SESSION_EXPIRED)),
        403 => Error::Forbidden(message(FORBIDDEN)),
        404 => Error::NotFound(message(NOT_FOUND)),
        code @ 500.. => Error::ServerFault {
            status: code,
            message: message(SERVER_FAULT),
        },
        code => Error::Generic {
            status: Some(code),
            message: message(FALLBACK_MESSAGE),
        },
    }
}

/// Classify a request that produced no response.
pub(crate) fn classify_send_error(err: &reqwest::Error) -> Error {
    if err.is_builder() {
        return Error::Config(format!("invalid request: {err}"));
    }
    tracing::debug!(error = %err, timeout = err.is_timeout(), "No response received");
    if err.is_timeout() {
        Error::Unreachable(TIMED_OUT.into())
    } else {
        Error::Unreachable(UNREACHABLE.into())
    }
}

/// Human-readable message from an error body, if the service sent one.
///
/// `message` is the gateway's field; the auth service answers with `error`
/// or `detail`.
fn server_message(body: &[u8]) -> Option<String> {
    let json: Value = serde_json::from_slice(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|field| json.get(field).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (500, ErrorKind::ServerFault),
            (503, ErrorKind::ServerFault),
            (400, ErrorKind::Generic),
            (409, ErrorKind::Generic),
            (429, ErrorKind::Generic),
        ];
        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(classify_status(status, b"").kind(), kind, "status {code}");
        }
    }

    #[test]
    fn test_generic_uses_server_message() {
        let err = classify_status(StatusCode::BAD_REQUEST, br#"{"message":"Out of stock"}"#);

        assert_eq!(err.message(), "Out of stock");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_generic_fallback_message() {
        let err = classify_status(StatusCode::CONFLICT, b"<html>oops</html>");
        assert_eq!(err.message(), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_server_message_overrides_status_default() {
        let err = classify_status(StatusCode::UNAUTHORIZED, br#"{"error":"Bad credentials"}"#);
        assert_eq!(err.message(), "Bad credentials");

        let err = classify_status(StatusCode::UNAUTHORIZED, b"");
        assert_eq!(err.message(), SESSION_EXPIRED);
    }

    #[test]
    fn test_auth_route_detection() {
        assert!(is_auth_route("/auth/login"));
        assert!(is_auth_route("auth/validate-token"));
        assert!(!is_auth_route("/recommendations/interactions"));
        assert!(!is_auth_route("/products/auth/"));
        assert!(!is_auth_route("/authors"));
    }
}
