/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public MEFS MCP adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod http;
pub mod tools;

// Re-export commonly used types from auth
pub use auth::{AuthSession, AuthState, EvmWalletSigner, TokenPair, sign};

pub use config::{Identity, MefsConfig};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    DownloadedFile,
    LoginResponse,
    MefsClient,
    MefsError,
    Result,
    UploadOptions,
    UploadResult,
};

// Re-export commonly used types from tools
pub use tools::{
    ErrorEnvelope,
    MefsTools,
    RetrieveArgs,
    RetrieveOutput,
    ToolDefinition,
    ToolResponse,
    UploadArgs,
    UploadOutput,
    tool_definitions,
};
