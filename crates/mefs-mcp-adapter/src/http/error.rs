/*
[INPUT]:  Error sources (signing, HTTP status, transport, serialization, tool input)
[OUTPUT]: Structured error type shared by auth, storage and tool layers
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or changing the tool error envelope
*/

use std::error::Error as _;
use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the MEFS adapter
///
/// The type is `Clone` so that a single in-flight authentication can hand
/// the same failure to every caller waiting on it.
#[derive(Error, Debug, Clone)]
pub enum MefsError {
    /// A required input was empty
    #[error("{field} must not be empty")]
    EmptyInput { field: &'static str },

    /// Private key was not 32 bytes of hex
    #[error("Invalid private key format: {0}")]
    InvalidKeyFormat(String),

    /// Identity carries no private key, so it cannot authenticate
    #[error("Private key is required for authentication")]
    MissingPrivateKey,

    /// GET /challenge returned a non-success status
    #[error("Failed to get challenge: {status} {status_text} - {body}")]
    ChallengeRequestFailed {
        status: u16,
        status_text: String,
        body: String,
    },

    /// POST /login returned a non-success status
    #[error("Login failed: {status} {status_text} - {body}")]
    LoginFailed {
        status: u16,
        status_text: String,
        body: String,
    },

    /// POST /mefs/ returned a non-success status
    #[error("Upload failed: {status} {status_text} - {body}")]
    UploadFailed {
        status: u16,
        status_text: String,
        body: String,
    },

    /// GET /mefs/{cid} returned a non-success status
    #[error("Download failed: {status} {status_text} - {body}")]
    DownloadFailed {
        status: u16,
        status_text: String,
        body: String,
    },

    /// Payload is not strict base64
    #[error("Invalid base64 encoding in '{field}'")]
    InvalidEncoding { field: String },

    /// Tool arguments were rejected by the input schema
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Message signing failed after the key was accepted
    #[error("Failed to sign message: {0}")]
    Signing(String),

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[source] Arc<reqwest::Error>),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[source] Arc<serde_json::Error>),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for MefsError {
    fn from(err: reqwest::Error) -> Self {
        MefsError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for MefsError {
    fn from(err: serde_json::Error) -> Self {
        MefsError::Serialization(Arc::new(err))
    }
}

impl MefsError {
    /// Stable variant name, used as `name` in the tool error envelope
    pub fn name(&self) -> &'static str {
        match self {
            MefsError::EmptyInput { .. } => "EmptyInput",
            MefsError::InvalidKeyFormat(_) => "InvalidKeyFormat",
            MefsError::MissingPrivateKey => "MissingPrivateKey",
            MefsError::ChallengeRequestFailed { .. } => "ChallengeRequestFailed",
            MefsError::LoginFailed { .. } => "LoginFailed",
            MefsError::UploadFailed { .. } => "UploadFailed",
            MefsError::DownloadFailed { .. } => "DownloadFailed",
            MefsError::InvalidEncoding { .. } => "InvalidEncoding",
            MefsError::ValidationFailed(_) => "ValidationFailed",
            MefsError::Signing(_) => "SigningFailed",
            MefsError::Http(_) => "HttpError",
            MefsError::Serialization(_) => "SerializationError",
            MefsError::UrlParse(_) => "InvalidUrl",
            MefsError::InvalidResponse(_) => "InvalidResponse",
            MefsError::Config(_) => "ConfigError",
        }
    }

    /// HTTP status carried by the error, if it came from a server response
    pub fn status(&self) -> Option<u16> {
        match self {
            MefsError::ChallengeRequestFailed { status, .. }
            | MefsError::LoginFailed { status, .. }
            | MefsError::UploadFailed { status, .. }
            | MefsError::DownloadFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if a storage call was rejected because the access token is no good
    pub fn is_auth_error(&self) -> bool {
        match self {
            MefsError::UploadFailed { status, .. } | MefsError::DownloadFailed { status, .. } => {
                *status == StatusCode::UNAUTHORIZED.as_u16()
                    || *status == StatusCode::FORBIDDEN.as_u16()
            }
            _ => false,
        }
    }

    /// Flattened `source()` chain, or `None` when the error has no cause
    pub fn cause(&self) -> Option<String> {
        let mut source = self.source();
        let mut causes = Vec::new();
        while let Some(err) = source {
            causes.push(err.to_string());
            source = err.source();
        }
        if causes.is_empty() {
            None
        } else {
            Some(causes.join(": "))
        }
    }
}

/// Result type alias for MEFS operations
pub type Result<T> = std::result::Result<T, MefsError>;

/// Split a failed response into `(status, status_text, body)`
pub(crate) async fn failure_parts(response: reqwest::Response) -> (u16, String, String) {
    let status = response.status();
    let status_text = status.canonical_reason().unwrap_or_default().to_string();
    let body = response.text().await.unwrap_or_default();
    (status.as_u16(), status_text, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_failure_message_carries_status_and_body() {
        let err = MefsError::LoginFailed {
            status: 401,
            status_text: "Unauthorized".to_string(),
            body: "bad signature".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("Unauthorized"));
        assert!(message.contains("bad signature"));
        assert_eq!(err.name(), "LoginFailed");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_is_auth_error_only_for_storage_401_403() {
        let upload = MefsError::UploadFailed {
            status: 401,
            status_text: "Unauthorized".to_string(),
            body: String::new(),
        };
        let download = MefsError::DownloadFailed {
            status: 403,
            status_text: "Forbidden".to_string(),
            body: String::new(),
        };
        let not_found = MefsError::DownloadFailed {
            status: 404,
            status_text: "Not Found".to_string(),
            body: String::new(),
        };
        let login = MefsError::LoginFailed {
            status: 401,
            status_text: "Unauthorized".to_string(),
            body: String::new(),
        };

        assert!(upload.is_auth_error());
        assert!(download.is_auth_error());
        assert!(!not_found.is_auth_error());
        assert!(!login.is_auth_error());
        assert!(!MefsError::MissingPrivateKey.is_auth_error());
    }

    #[test]
    fn test_cause_chain() {
        assert_eq!(MefsError::MissingPrivateKey.cause(), None);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let expected = json_err.to_string();
        let err = MefsError::from(json_err);
        assert_eq!(err.name(), "SerializationError");
        assert_eq!(err.cause(), Some(expected));
    }
}
