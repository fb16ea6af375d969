/*
[INPUT]:  EVM private key (hex string) and challenge message
[OUTPUT]: Personal-message signatures and the wallet address
[POS]:    Auth layer - EVM wallet signing for challenge login
[UPDATE]: When signing logic or key validation changes
*/

use std::str::FromStr;

use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::http::{MefsError, Result};

/// Length of a hex-encoded 32-byte private key, without `0x`
const PRIVATE_KEY_HEX_LEN: usize = 64;

/// Signer for EVM wallets using the personal-message (EIP-191) scheme
pub struct EvmWalletSigner {
    signer: PrivateKeySigner,
    address: String,
}

impl EvmWalletSigner {
    /// Create a new EVM wallet signer from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    /// The key is taken as given; surrounding whitespace is not stripped.
    pub fn new(private_key_hex: &str) -> Result<Self> {
        if private_key_hex.is_empty() {
            return Err(MefsError::EmptyInput {
                field: "private key",
            });
        }

        let stripped = private_key_hex
            .strip_prefix("0x")
            .or_else(|| private_key_hex.strip_prefix("0X"))
            .unwrap_or(private_key_hex);
        if stripped.len() != PRIVATE_KEY_HEX_LEN || hex::decode(stripped).is_err() {
            return Err(MefsError::InvalidKeyFormat(format!(
                "expected {PRIVATE_KEY_HEX_LEN} hex characters"
            )));
        }

        let signer = PrivateKeySigner::from_str(stripped)
            .map_err(|e| MefsError::InvalidKeyFormat(e.to_string()))?;
        let address = signer.address().to_checksum(None).to_ascii_lowercase();

        Ok(Self { signer, address })
    }

    /// Lowercase `0x`-prefixed wallet address derived from the key
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign `message` verbatim and return the 65-byte `[r, s, v]` signature as `0x` hex
    pub fn sign_message(&self, message: &str) -> Result<String> {
        if message.is_empty() {
            return Err(MefsError::EmptyInput { field: "message" });
        }

        let signature = self
            .signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| MefsError::Signing(e.to_string()))?;

        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

impl std::fmt::Debug for EvmWalletSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWalletSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Sign `message` with `private_key`.
///
/// A missing or empty key and an empty message fail with `EmptyInput`;
/// anything that is not 64 hex characters (after an optional `0x`) fails
/// with `InvalidKeyFormat`.
pub fn sign(private_key: Option<&str>, message: &str) -> Result<String> {
    let private_key = private_key.ok_or(MefsError::EmptyInput {
        field: "private key",
    })?;
    if message.is_empty() {
        return Err(MefsError::EmptyInput { field: "message" });
    }
    EvmWalletSigner::new(private_key)?.sign_message(message)
}
