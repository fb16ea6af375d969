/*
[INPUT]:  Wallet identity and MEFS HTTP client
[OUTPUT]: Cached access/refresh tokens and message signatures
[POS]:    Auth layer - handles MEFS challenge/login authentication
[UPDATE]: When auth flow or signature methods change
*/

pub mod session;
pub mod signer;

pub use session::{AuthSession, AuthState, TokenPair};
pub use signer::{EvmWalletSigner, sign};
