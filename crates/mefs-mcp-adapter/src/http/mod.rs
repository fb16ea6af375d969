/*
[INPUT]:  HTTP client configuration and MEFS API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod challenge;
pub mod client;
pub mod error;
pub mod login;
pub mod storage;

pub use error::{MefsError, Result};

pub use client::{ClientConfig, MefsClient};
pub use login::LoginResponse;
pub use storage::{DownloadedFile, UNKNOWN_FILENAME, UploadOptions, UploadResult};
