/*
[INPUT]:  Tool name + JSON arguments, AuthSession and Identity
[OUTPUT]: ToolResponse (JSON payload or error envelope)
[POS]:    Tool layer - validation, authenticated execution, result shaping
[UPDATE]: When adding tools or changing validation/error rules
*/

pub mod envelope;
pub mod retrieve;
pub mod upload;

use std::future::Future;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::AuthSession;
use crate::config::{Identity, MefsConfig};
use crate::http::{MefsClient, MefsError, Result};

pub use envelope::{ErrorEnvelope, ToolContent, ToolResponse};
pub use retrieve::{RetrieveArgs, RetrieveOutput};
pub use upload::{UploadArgs, UploadOutput};

/// Declared tool, for mounting into an external dispatcher
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: upload::NAME,
            description: upload::DESCRIPTION,
            input_schema: upload::input_schema(),
        },
        ToolDefinition {
            name: retrieve::NAME,
            description: retrieve::DESCRIPTION,
            input_schema: retrieve::input_schema(),
        },
    ]
}

/// Upload/retrieve tools bound to one identity and one auth session
#[derive(Debug, Clone)]
pub struct MefsTools {
    session: AuthSession,
    identity: Identity,
}

impl MefsTools {
    pub fn new(config: &MefsConfig) -> Result<Self> {
        let client = MefsClient::new(config)?;
        let identity = config.identity()?;
        Ok(Self::with_session(AuthSession::new(client), identity))
    }

    pub fn with_session(session: AuthSession, identity: Identity) -> Self {
        Self { session, identity }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Invoke a tool by name; failures come back as an error envelope
    pub async fn call(&self, name: &str, arguments: Value) -> ToolResponse {
        info!(tool = name, "tool invocation");
        let response = match name {
            upload::NAME => ToolResponse::from_result(self.upload_value(arguments).await),
            retrieve::NAME => ToolResponse::from_result(self.retrieve_value(arguments).await),
            other => ToolResponse::error(&MefsError::ValidationFailed(format!(
                "unknown tool: {other}"
            ))),
        };
        if response.is_error {
            warn!(tool = name, "tool invocation failed");
        }
        response
    }

    async fn upload_value(&self, arguments: Value) -> Result<UploadOutput> {
        self.upload(upload::parse_args(arguments)?).await
    }

    async fn retrieve_value(&self, arguments: Value) -> Result<RetrieveOutput> {
        self.retrieve(retrieve::parse_args(arguments)?).await
    }

    pub async fn upload(&self, args: UploadArgs) -> Result<UploadOutput> {
        let upload::UploadRequest {
            bytes,
            filename,
            options,
        } = upload::prepare(args)?;
        let size = bytes.len();
        let client = self.session.client();
        let name = filename.clone();

        let uploaded = self
            .authorized(|token| async move {
                client.upload(&token, bytes, &name, &options).await
            })
            .await?;

        Ok(UploadOutput {
            cid: uploaded.cid,
            filename,
            size,
        })
    }

    pub async fn retrieve(&self, args: RetrieveArgs) -> Result<RetrieveOutput> {
        let request = retrieve::prepare(args)?;
        let client = self.session.client();
        let cid = request.cid.clone();

        let downloaded = self
            .authorized(|token| async move {
                client
                    .download(&token, &request.cid, request.key.as_deref())
                    .await
            })
            .await?;

        Ok(RetrieveOutput::new(cid, downloaded))
    }

    /// Run `op` with an access token, dropping the cached tokens if the
    /// storage service rejects them. Nothing is retried here.
    async fn authorized<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = self.session.access_token(&self.identity).await?;
        let result = op(token).await;
        if let Err(err) = &result {
            if err.is_auth_error() {
                warn!(
                    status = ?err.status(),
                    "storage rejected access token; invalidating session"
                );
                self.session.invalidate();
            }
        }
        result
    }
}

/// Decode standard base64, rejecting anything that does not re-encode to the same text
pub(crate) fn decode_base64_strict(field: &str, value: &str) -> Result<Vec<u8>> {
    let invalid = || MefsError::InvalidEncoding {
        field: field.to_string(),
    };
    let bytes = BASE64.decode(value).map_err(|_| invalid())?;
    if BASE64.encode(&bytes) != value {
        return Err(invalid());
    }
    Ok(bytes)
}

/// Reject blank values; accepted values are returned exactly as given
pub(crate) fn non_empty(field: &str, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(MefsError::ValidationFailed(format!(
            "{field} must not be empty"
        )));
    }
    Ok(value.to_string())
}
