/*
[INPUT]:  Wallet address, chain id and configured Origin header
[OUTPUT]: One-time challenge message to be signed
[POS]:    HTTP layer - first step of the challenge/login flow
[UPDATE]: When the challenge endpoint or its parameters change
*/

use reqwest::Method;
use reqwest::header::ORIGIN;
use tracing::debug;

use crate::http::error::failure_parts;
use crate::http::{MefsClient, MefsError, Result};

impl MefsClient {
    /// Fetch a one-time challenge for `address`
    ///
    /// GET /challenge?address={address}&chainid={chain_id}
    ///
    /// The body is returned verbatim; it must be signed without normalization.
    pub async fn get_challenge(
        &self,
        address: Option<&str>,
        chain_id: Option<u64>,
    ) -> Result<String> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(address) = address {
            query.push(("address", address.to_string()));
        }
        if let Some(chain_id) = chain_id {
            query.push(("chainid", chain_id.to_string()));
        }

        debug!(address = ?address, chain_id = ?chain_id, "requesting challenge");
        let response = self
            .request(Method::GET, &["challenge"])?
            .header(ORIGIN, self.origin())
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, status_text, body) = failure_parts(response).await;
            return Err(MefsError::ChallengeRequestFailed {
                status,
                status_text,
                body,
            });
        }

        Ok(response.text().await?)
    }
}
