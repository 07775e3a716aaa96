//! Error types for the book catalog client.
//!
//! # Design
//! Two failure families reach callers: the backend answered with a
//! JSON error body (`Backend`), or no usable answer arrived
//! (`Network`, and `CredentialStore` when the interceptor could not read the
//! token). [`ApiError::payload`] hands back the backend's JSON exactly as
//! it arrived; anything without a backend payload becomes the
//! `{"message": "Network error"}` sentinel. [`ApiError::body`] is the typed
//! view screens read messages and field errors from.

use thiserror::Error;

use crate::types::ErrorBody;

/// Errors returned by `BookClient` parse methods and `BookApi` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response carrying a JSON payload, kept verbatim.
    #[error("{}", backend_message(.body))]
    Backend {
        status: u16,
        body: serde_json::Value,
    },

    /// No response, or a non-2xx response without a JSON body.
    #[error("Network error")]
    Network { status: Option<u16>, detail: String },

    /// The credential store failed while preparing the request. Nothing was
    /// sent.
    #[error("credential store failed: {0}")]
    CredentialStore(#[from] CredentialError),

    /// Get, update and delete need a non-empty book id.
    #[error("book id must not be empty")]
    MissingBookId,

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A 2xx response body did not match the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

impl ApiError {
    /// The error value handed to callers: the backend payload unchanged, or
    /// a `{message}` object when there is none.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            ApiError::Backend { body, .. } => body.clone(),
            ApiError::MissingBookId => ErrorBody::new(self.to_string()).to_payload(),
            _ => ErrorBody::network().to_payload(),
        }
    }

    /// Typed view of [`payload`](Self::payload).
    pub fn body(&self) -> ErrorBody {
        ErrorBody::from_payload(&self.payload())
    }

    /// The message a screen shows for this error.
    pub fn message(&self) -> String {
        self.body().message
    }

    /// HTTP status of the response that caused the error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            ApiError::Network { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

fn backend_message(body: &serde_json::Value) -> String {
    let message = ErrorBody::from_payload(body).message;
    if message.is_empty() {
        body.to_string()
    } else {
        message
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Network {
            status: None,
            detail: err.to_string(),
        }
    }
}

/// Failure to execute a request: DNS, connect, TLS, timeout, I/O.
#[derive(Debug, Error)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);

/// Failure of the credential store backing.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("credential encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn backend_error_surfaces_its_own_payload() {
        let body = json!({
            "message": "Invalid credentials",
            "errors": {"password": "Password is wrong"}
        });
        let err = ApiError::Backend {
            status: 401,
            body: body.clone(),
        };
        assert_eq!(err.payload(), body);
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(
            err.body().errors.and_then(|e| e.password).as_deref(),
            Some("Password is wrong")
        );
        assert!(err.is_unauthorized());
    }

    #[test]
    fn payload_without_message_is_kept_and_displayed_raw() {
        let body = json!({"error": "Invalid credentials"});
        let err = ApiError::Backend {
            status: 401,
            body: body.clone(),
        };
        assert_eq!(err.payload(), body);
        assert_eq!(err.message(), "");
        assert_eq!(err.body().extra["error"], "Invalid credentials");
        assert_eq!(err.to_string(), r#"{"error":"Invalid credentials"}"#);
    }

    #[test]
    fn transport_failure_normalizes_to_sentinel() {
        let err = ApiError::from(TransportError("connection refused".to_string()));
        assert_eq!(err.payload(), json!({"message": "Network error"}));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn credential_failure_normalizes_to_sentinel() {
        let err = ApiError::from(CredentialError::Unavailable("locked".to_string()));
        assert_eq!(err.message(), "Network error");
    }

    #[test]
    fn unstructured_http_failure_keeps_status() {
        let err = ApiError::Network {
            status: Some(404),
            detail: "<html>".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.body(), ErrorBody::network());
    }

    #[test]
    fn missing_id_payload_names_the_problem() {
        assert_eq!(
            ApiError::MissingBookId.payload(),
            json!({"message": "book id must not be empty"})
        );
    }
}
