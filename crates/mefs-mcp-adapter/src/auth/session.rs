/*
[INPUT]:  Identity (address, chain id, private key) and MEFS HTTP client
[OUTPUT]: Cached token pair, shared by concurrent callers
[POS]:    Auth layer - orchestrates challenge -> sign -> login -> cache
[UPDATE]: When auth flow steps or caching rules change
*/

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};

use crate::auth::sign;
use crate::config::Identity;
use crate::http::{MefsClient, MefsError, Result};

/// Tokens issued by the login endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

type PendingAuth = Shared<BoxFuture<'static, Result<TokenPair>>>;

#[derive(Default)]
struct SessionState {
    tokens: Option<TokenPair>,
    in_flight: Option<PendingAuth>,
}

/// Caches one token pair and runs at most one authentication at a time
///
/// Callers that find the cache empty while an authentication is running
/// attach to it and receive its result instead of starting another one.
#[derive(Clone)]
pub struct AuthSession {
    client: MefsClient,
    state: Arc<Mutex<SessionState>>,
}

impl AuthSession {
    pub fn new(client: MefsClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub fn client(&self) -> &MefsClient {
        &self.client
    }

    /// Return cached tokens, authenticating first if there are none
    pub async fn get_tokens(&self, identity: &Identity) -> Result<TokenPair> {
        if !identity.can_authenticate() {
            return Err(MefsError::MissingPrivateKey);
        }

        let pending = {
            let mut state = lock(&self.state);
            if let Some(tokens) = &state.tokens {
                return Ok(tokens.clone());
            }
            match &state.in_flight {
                Some(pending) => {
                    debug!(address = %identity.address, "joining in-flight authentication");
                    pending.clone()
                }
                None => {
                    let pending = run_authentication(
                        self.client.clone(),
                        identity.clone(),
                        Arc::clone(&self.state),
                    )
                    .boxed()
                    .shared();
                    state.in_flight = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Access token only, for callers that do not need the refresh token
    pub async fn access_token(&self, identity: &Identity) -> Result<String> {
        Ok(self.get_tokens(identity).await?.access_token)
    }

    /// Drop the cached tokens; the next `get_tokens` authenticates again
    pub fn invalidate(&self) {
        let mut state = lock(&self.state);
        if state.tokens.take().is_some() {
            info!("cached tokens invalidated");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.state).tokens.is_some()
    }

    pub fn state(&self) -> AuthState {
        let state = lock(&self.state);
        if state.tokens.is_some() {
            AuthState::Authenticated
        } else if state.in_flight.is_some() {
            AuthState::Authenticating
        } else {
            AuthState::Unauthenticated
        }
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("client", &self.client)
            .field("state", &self.state())
            .finish()
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run one authentication round and settle the shared state.
///
/// The cache is written only on success; on failure the previous contents
/// (if any) are left as they were.
async fn run_authentication(
    client: MefsClient,
    identity: Identity,
    state: Arc<Mutex<SessionState>>,
) -> Result<TokenPair> {
    let result = authenticate(&client, &identity).await;

    let mut guard = lock(&state);
    guard.in_flight = None;
    match &result {
        Ok(tokens) => guard.tokens = Some(tokens.clone()),
        Err(err) => warn!(address = %identity.address, error = %err, "authentication failed"),
    }
    result
}

/// Complete authentication flow
///
/// 1. Fetch challenge
/// 2. Sign challenge verbatim with the identity's key
/// 3. Login to get the token pair
async fn authenticate(client: &MefsClient, identity: &Identity) -> Result<TokenPair> {
    let challenge = client
        .get_challenge(Some(&identity.address), Some(identity.chain_id))
        .await?;

    let signature = sign(identity.private_key.as_deref(), &challenge)?;

    let login = client.login(&challenge, &signature).await?;
    info!(
        address = %identity.address,
        new_account = login.new_account,
        "authenticated with storage service"
    );

    Ok(TokenPair {
        access_token: login.access_token,
        refresh_token: login.refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::http::ClientConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PK: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn identity() -> Identity {
        Identity {
            address: ADDRESS.to_string(),
            chain_id: 985,
            private_key: Some(PK.to_string()),
        }
    }

    fn session(server: &MockServer) -> AuthSession {
        let client = MefsClient::with_config_and_base_url(
            ClientConfig::default(),
            &server.uri(),
            "https://app.example.com",
        )
        .unwrap();
        AuthSession::new(client)
    }

    async fn mount_challenge(server: &MockServer, expected: u64) {
        Mock::given(method("GET"))
            .and(path("/challenge"))
            .respond_with(ResponseTemplate::new(200).set_body_string("sign me"))
            .expect(expected)
            .mount(server)
            .await;
    }

    async fn mount_login(server: &MockServer, access: &str, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": access,
                "refreshToken": "refresh",
                "newAccount": false,
            })))
            .expect(expected)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_missing_private_key_makes_no_network_call() {
        let server = MockServer::start().await;
        mount_challenge(&server, 0).await;
        mount_login(&server, "access", 0).await;

        let session = session(&server);
        let identity = Identity {
            private_key: None,
            ..identity()
        };

        let err = session.get_tokens(&identity).await.unwrap_err();
        assert!(matches!(err, MefsError::MissingPrivateKey));
        assert_eq!(session.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reauthentication() {
        let server = MockServer::start().await;
        mount_challenge(&server, 2).await;
        mount_login(&server, "access", 2).await;

        let session = session(&server);
        session.get_tokens(&identity()).await.unwrap();
        assert_eq!(session.state(), AuthState::Authenticated);

        session.invalidate();
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(!session.is_authenticated());

        session.get_tokens(&identity()).await.unwrap();
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_cache_empty() {
        let server = MockServer::start().await;
        mount_challenge(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad signature"))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server);
        let err = session.get_tokens(&identity()).await.unwrap_err();
        assert!(matches!(err, MefsError::LoginFailed { status: 400, .. }));
        assert_eq!(session.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_invalid_key_surfaces_signer_error() {
        let server = MockServer::start().await;
        mount_challenge(&server, 1).await;
        mount_login(&server, "access", 0).await;

        let session = session(&server);
        let identity = Identity {
            private_key: Some("not-hex".to_string()),
            ..identity()
        };
        let err = session.get_tokens(&identity).await.unwrap_err();
        assert!(matches!(err, MefsError::InvalidKeyFormat(_)));
    }

    #[test]
    fn test_token_pair_debug_hides_tokens() {
        let tokens = TokenPair {
            access_token: "secret-access".to_string(),
            refresh_token: "secret-refresh".to_string(),
        };
        assert!(!format!("{tokens:?}").contains("secret"));
    }
}
