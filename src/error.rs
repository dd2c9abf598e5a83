/// Error Handling Module
///
/// Errors are layered the same way the service is:
/// 1. Storage errors raised by a `TokenStore` implementation
/// 2. Token lifecycle errors raised by the minter, verifier and rotator
/// 3. Route errors that turn either of the above into an HTTP response

use actix_web::{error::ResponseError, http::header::ContentType, http::StatusCode, HttpResponse};
use uuid::Uuid;

// ============================================================================
// 1. STORAGE ERRORS
// ============================================================================

/// Failures of the persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token family {0} already exists")]
    Duplicate(Uuid),
    #[error("token family {0} not found")]
    NotFound(Uuid),
    /// The stored hash no longer matches the one the caller read.
    #[error("token family {0} was rotated concurrently")]
    Conflict(Uuid),
    #[error("token store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ============================================================================
// 2. TOKEN LIFECYCLE ERRORS
// ============================================================================

/// Why an access token was rejected before its claims could be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTokenReason {
    Malformed,
    BadSignature,
}

impl std::fmt::Display for InvalidTokenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTokenReason::Malformed => write!(f, "malformed"),
            InvalidTokenReason::BadSignature => write!(f, "bad signature"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign access token: {0}")]
    Signing(String),
    #[error("failed to hash refresh token: {0}")]
    Hashing(String),
    #[error("token storage failed: {0}")]
    Storage(#[source] StoreError),
    #[error("invalid access token: {0}")]
    InvalidAccessToken(InvalidTokenReason),
    #[error("access token claims are malformed: {0}")]
    MalformedClaims(String),
    #[error("access token has expired")]
    TokenExpired,
    #[error("unknown token family")]
    UnknownTokenFamily,
    #[error("refresh token does not match")]
    RefreshMismatch,
}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => TokenError::UnknownTokenFamily,
            StoreError::Conflict(_) => TokenError::RefreshMismatch,
            other => TokenError::Storage(other),
        }
    }
}

impl TokenError {
    /// Rejections that may indicate a stolen or forged credential.
    pub fn is_security_rejection(&self) -> bool {
        matches!(
            self,
            TokenError::UnknownTokenFamily | TokenError::RefreshMismatch
        )
    }

    /// Failures on our side rather than the client's.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            TokenError::Signing(_) | TokenError::Hashing(_) | TokenError::Storage(_)
        )
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Errors returned by the route handlers.
///
/// Every failure is reported as `500 Internal Server Error` with a plaintext
/// body; the refresh route appends the underlying cause.
#[derive(Debug)]
pub enum RouteError {
    Issue(TokenError),
    Refresh(TokenError),
    MissingHeader(&'static str),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::Issue(_) => write!(f, "Error generating token pair"),
            RouteError::Refresh(e) => write!(f, "Error refreshing access token\n{}", e),
            RouteError::MissingHeader(name) => write!(
                f,
                "Error refreshing access token\nmissing or malformed {} header",
                name
            ),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Issue(e) | RouteError::Refresh(e) => Some(e),
            RouteError::MissingHeader(_) => None,
        }
    }
}

impl RouteError {
    fn operation(&self) -> &'static str {
        match self {
            RouteError::Issue(_) => "issue_pair",
            RouteError::Refresh(_) | RouteError::MissingHeader(_) => "rotate",
        }
    }

    /// Log at a level matching the failure. The request id comes from the
    /// enclosing `http_request` span.
    fn log_error(&self) {
        let operation = self.operation();
        match self {
            RouteError::Issue(e) | RouteError::Refresh(e) if e.is_security_rejection() => {
                tracing::warn!(
                    operation = operation,
                    error = %e,
                    "Rejected refresh attempt"
                );
            }
            RouteError::Issue(e) | RouteError::Refresh(e) if e.is_server_fault() => {
                tracing::error!(
                    operation = operation,
                    error = %e,
                    "Token operation failed"
                );
            }
            RouteError::Issue(e) | RouteError::Refresh(e) => {
                tracing::warn!(
                    operation = operation,
                    error = %e,
                    "Client presented an invalid token"
                );
            }
            RouteError::MissingHeader(name) => {
                tracing::warn!(
                    operation = operation,
                    header = name,
                    "Missing credential header"
                );
            }
        }
    }
}

impl ResponseError for RouteError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        self.log_error();

        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[test]
    fn test_store_not_found_maps_to_unknown_family() {
        let err: TokenError = StoreError::NotFound(Uuid::new_v4()).into();
        assert!(matches!(err, TokenError::UnknownTokenFamily));
        assert!(err.is_security_rejection());
    }

    #[test]
    fn test_store_conflict_maps_to_refresh_mismatch() {
        let err: TokenError = StoreError::Conflict(Uuid::new_v4()).into();
        assert!(matches!(err, TokenError::RefreshMismatch));
    }

    #[test]
    fn test_store_unavailable_is_server_fault() {
        let err: TokenError = StoreError::Unavailable("pool timed out".to_string()).into();
        assert!(err.is_server_fault());
        assert!(!err.is_security_rejection());
        assert_eq!(
            err.to_string(),
            "token storage failed: token store unavailable: pool timed out"
        );
    }

    #[test]
    fn test_refresh_error_body_carries_cause() {
        let err = RouteError::Refresh(TokenError::RefreshMismatch);
        assert_eq!(
            err.to_string(),
            "Error refreshing access token\nrefresh token does not match"
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_issue_error_body_hides_cause() {
        let err = RouteError::Issue(TokenError::Signing("bad key".to_string()));
        assert_eq!(err.to_string(), "Error generating token pair");
    }

    #[derive(Clone, Default)]
    struct EventFields(Arc<Mutex<Vec<String>>>);

    struct FieldNames<'a>(&'a mut Vec<String>);

    impl Visit for FieldNames<'_> {
        fn record_debug(&mut self, field: &Field, _: &dyn std::fmt::Debug) {
            self.0.push(field.name().to_string());
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for EventFields {
        fn on_event(&self, event: &tracing::Event<'_>, _: Context<'_, S>) {
            let mut names = Vec::new();
            event.record(&mut FieldNames(&mut names));
            self.0.lock().unwrap().extend(names);
        }
    }

    #[test]
    fn test_error_log_uses_request_span_id() {
        let fields = EventFields::default();
        let subscriber = tracing_subscriber::registry().with(fields.clone());

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("http_request", request_id = "req-1");
            let _entered = span.enter();
            let _ = RouteError::Refresh(TokenError::RefreshMismatch).error_response();
        });

        let names = fields.0.lock().unwrap();
        assert!(names.iter().any(|n| n == "operation"));
        assert!(!names.iter().any(|n| n == "request_id"));
    }

    #[test]
    fn test_invalid_token_display() {
        let err = TokenError::InvalidAccessToken(InvalidTokenReason::BadSignature);
        assert_eq!(err.to_string(), "invalid access token: bad signature");
    }
}
