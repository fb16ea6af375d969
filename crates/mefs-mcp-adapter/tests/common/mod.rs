/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for mefs-mcp-adapter tests

#![allow(dead_code)]

use std::time::Duration;

use mefs_mcp_adapter::{AuthSession, ClientConfig, Identity, MefsClient, MefsTools};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Well-known development key and its derived address
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const TEST_ORIGIN: &str = "https://app.example.com";
pub const TEST_CHAIN_ID: u64 = 985;
pub const TEST_CHALLENGE: &str =
    "app.example.com wants you to sign in with your account\nNonce: 8f2c";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn test_identity() -> Identity {
    Identity {
        address: TEST_ADDRESS.to_string(),
        chain_id: TEST_CHAIN_ID,
        private_key: Some(TEST_PRIVATE_KEY.to_string()),
    }
}

pub fn test_client(server: &MockServer) -> MefsClient {
    MefsClient::with_config_and_base_url(ClientConfig::default(), &server.uri(), TEST_ORIGIN)
        .expect("mock server uri is a valid base url")
}

pub fn test_session(server: &MockServer) -> AuthSession {
    AuthSession::new(test_client(server))
}

pub fn test_tools(server: &MockServer) -> MefsTools {
    MefsTools::with_session(test_session(server), test_identity())
}

/// Mount GET /challenge, answering after `delay`
pub async fn mount_challenge(server: &MockServer, delay: Duration, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/challenge"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(TEST_CHALLENGE)
                .set_delay(delay),
        )
        .expect(expected)
        .mount(server)
        .await;
}

/// Mount POST /login returning `access_token`
pub async fn mount_login(server: &MockServer, access_token: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": access_token,
            "refreshToken": "refresh-token",
            "newAccount": false,
        })))
        .expect(expected)
        .mount(server)
        .await;
}
