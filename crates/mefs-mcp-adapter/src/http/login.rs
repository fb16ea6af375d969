/*
[INPUT]:  Challenge message and its wallet signature
[OUTPUT]: Access/refresh token pair and new-account flag
[POS]:    HTTP layer - second step of the challenge/login flow
[UPDATE]: When the login endpoint or its response shape changes
*/

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::error::failure_parts;
use crate::http::{MefsClient, MefsError, Result};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    message: &'a str,
    signature: &'a str,
}

/// Response from login endpoint
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "newAccount", default)]
    pub new_account: bool,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("new_account", &self.new_account)
            .finish_non_exhaustive()
    }
}

impl MefsClient {
    /// Exchange a signed challenge for a token pair
    ///
    /// POST /login
    pub async fn login(&self, message: &str, signature: &str) -> Result<LoginResponse> {
        debug!("submitting signed challenge");
        let response = self
            .request(Method::POST, &["login"])?
            .json(&LoginRequest { message, signature })
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, status_text, body) = failure_parts(response).await;
            return Err(MefsError::LoginFailed {
                status,
                status_text,
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| MefsError::InvalidResponse(format!("login response: {e}")))
    }
}
