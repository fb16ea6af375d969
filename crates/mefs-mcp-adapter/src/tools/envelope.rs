/*
[INPUT]:  Tool results and MefsError values
[OUTPUT]: Uniform JSON tool responses with an explicit error flag
[POS]:    Tool layer - the single place errors become payloads
[UPDATE]: When the tool response shape or error envelope changes
*/

use serde::{Deserialize, Serialize};

use crate::http::MefsError;

/// One content item of a tool response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Result of a tool invocation, as handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// JSON body of a failed tool response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub name: String,
    pub message: String,
    pub cause: Option<String>,
}

impl From<&MefsError> for ErrorEnvelope {
    fn from(err: &MefsError) -> Self {
        Self {
            name: err.name().to_string(),
            message: err.to_string(),
            cause: err.cause(),
        }
    }
}

impl ToolResponse {
    /// Serialize `payload` as the single content item
    pub fn success<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(text) => Self {
                content: vec![ToolContent::text(text)],
                is_error: false,
            },
            Err(err) => Self::error(&MefsError::from(err)),
        }
    }

    pub fn error(err: &MefsError) -> Self {
        let envelope = ErrorEnvelope::from(err);
        // ErrorEnvelope holds only strings, so this cannot fail in practice
        let text = serde_json::to_string(&envelope).unwrap_or_else(|_| {
            format!(r#"{{"name":"{}","message":"","cause":null}}"#, envelope.name)
        });
        Self {
            content: vec![ToolContent::text(text)],
            is_error: true,
        }
    }

    pub fn from_result<T: Serialize>(result: Result<T, MefsError>) -> Self {
        match result {
            Ok(payload) => Self::success(&payload),
            Err(err) => Self::error(&err),
        }
    }

    /// Parse the first content item back into JSON
    pub fn payload(&self) -> Option<serde_json::Value> {
        let first = self.content.first()?;
        serde_json::from_str(&first.text).ok()
    }

    /// Decode the error envelope, if this is an error response
    pub fn error_envelope(&self) -> Option<ErrorEnvelope> {
        if !self.is_error {
            return None;
        }
        let first = self.content.first()?;
        serde_json::from_str(&first.text).ok()
    }
}
