/*
[INPUT]:  Configuration values supplied by the bootstrap layer
[OUTPUT]: Validated MefsConfig and the signing Identity derived from it
[POS]:    Configuration layer - explicit settings passed into clients
[UPDATE]: When adding configuration options or identity rules
*/

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::auth::EvmWalletSigner;
use crate::http::{MefsError, Result};

/// Settings for talking to the MEFS storage service
#[derive(Clone, Deserialize)]
pub struct MefsConfig {
    /// Base API URL; `/challenge`, `/login` and `/mefs/` hang off it
    pub api_base_url: String,
    /// Value sent in the `Origin` header of challenge requests
    pub origin: String,
    /// Chain id reported when requesting a challenge
    pub chain_id: u64,
    /// Hex-encoded wallet private key
    #[serde(default)]
    pub private_key: Option<String>,
    /// Wallet address; derived from the private key when omitted
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl MefsConfig {
    pub fn new(api_base_url: impl Into<String>, origin: impl Into<String>, chain_id: u64) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            origin: origin.into(),
            chain_id,
            private_key: None,
            address: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Check the settings that every request depends on
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        if url.cannot_be_a_base() {
            return Err(MefsError::Config(format!(
                "api_base_url cannot be used as a base: {}",
                self.api_base_url
            )));
        }
        if self.origin.trim().is_empty() {
            return Err(MefsError::Config("origin must not be empty".to_string()));
        }
        if self.chain_id == 0 {
            return Err(MefsError::Config("chain_id must be positive".to_string()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(self.api_base_url.trim()).map_err(MefsError::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Build the identity used for authentication.
    ///
    /// The address comes from config when set and is otherwise derived from
    /// the private key. Both set but disagreeing is a configuration error.
    pub fn identity(&self) -> Result<Identity> {
        let private_key = self
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());

        let derived = private_key.map(EvmWalletSigner::new).transpose()?;
        let configured = self
            .address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(normalize_evm_address)
            .transpose()?;

        let address = match (configured, derived.as_ref()) {
            (Some(configured), Some(wallet)) => {
                if configured != wallet.address() {
                    return Err(MefsError::Config(format!(
                        "Wallet address mismatch: provided {configured}, derived {}",
                        wallet.address()
                    )));
                }
                configured
            }
            (Some(configured), None) => configured,
            (None, Some(wallet)) => wallet.address().to_string(),
            (None, None) => {
                return Err(MefsError::Config(
                    "either address or private_key must be configured".to_string(),
                ));
            }
        };

        Ok(Identity {
            address,
            chain_id: self.chain_id,
            private_key: private_key.map(str::to_string),
        })
    }
}

impl std::fmt::Debug for MefsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MefsConfig")
            .field("api_base_url", &self.api_base_url)
            .field("origin", &self.origin)
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("address", &self.address)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Wallet identity presented to the storage service
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Lowercase `0x`-prefixed 20-byte address
    pub address: String,
    pub chain_id: u64,
    /// Without a private key the identity can be named but not authenticated
    pub private_key: Option<String>,
}

impl Identity {
    pub fn can_authenticate(&self) -> bool {
        self.private_key.is_some()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Length of a hex-encoded 20-byte address, without `0x`
const ADDRESS_HEX_LEN: usize = 40;

fn normalize_evm_address(address: &str) -> Result<String> {
    let address = address.trim();
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    if hex.len() != ADDRESS_HEX_LEN || hex::decode(hex).is_err() {
        return Err(MefsError::Config(format!(
            "address must be {ADDRESS_HEX_LEN} hex characters: {address}"
        )));
    }
    Ok(format!("0x{}", hex.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PK: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn base_config() -> MefsConfig {
        MefsConfig::new(
            "https://storage.example.com/api",
            "https://app.example.com",
            985,
        )
    }

    #[test]
    fn test_validate_accepts_good_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = base_config();
        config.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.origin = "  ".to_string();
        assert!(matches!(config.validate(), Err(MefsError::Config(_))));

        let mut config = base_config();
        config.chain_id = 0;
        assert!(matches!(config.validate(), Err(MefsError::Config(_))));
    }

    #[test]
    fn test_identity_derives_address_from_key() {
        let identity = base_config().with_private_key(PK).identity().unwrap();
        assert_eq!(identity.address, ADDRESS);
        assert_eq!(identity.chain_id, 985);
        assert!(identity.can_authenticate());
    }

    #[test]
    fn test_identity_accepts_checksummed_matching_address() {
        let identity = base_config()
            .with_private_key(PK)
            .with_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
            .identity()
            .unwrap();
        assert_eq!(identity.address, ADDRESS);
    }

    #[test]
    fn test_identity_address_mismatch() {
        let err = base_config()
            .with_private_key(PK)
            .with_address("0x0000000000000000000000000000000000000000")
            .identity()
            .unwrap_err();
        match err {
            MefsError::Config(msg) => {
                assert!(msg.to_ascii_lowercase().contains("address mismatch"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_identity_without_key() {
        let identity = base_config().with_address(ADDRESS).identity().unwrap();
        assert!(!identity.can_authenticate());
        assert!(base_config().identity().is_err());
    }

    #[test]
    fn test_identity_rejects_malformed_address() {
        for bad in ["banana", "0x1234", "0xf39fd6e51aad88f6f4ce6ab8827279cfffb9226z"] {
            let err = base_config().with_address(bad).identity().unwrap_err();
            assert!(matches!(err, MefsError::Config(_)), "{bad:?} gave {err:?}");
        }
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = base_config().with_private_key(PK);
        let identity = config.identity().unwrap();
        assert!(!format!("{config:?}").contains(&PK[2..]));
        assert!(!format!("{identity:?}").contains(&PK[2..]));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: MefsConfig = serde_json::from_value(serde_json::json!({
            "api_base_url": "https://storage.example.com/api",
            "origin": "https://app.example.com",
            "chain_id": 985,
        }))
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.private_key.is_none());
    }
}
