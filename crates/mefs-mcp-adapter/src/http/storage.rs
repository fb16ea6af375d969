/*
[INPUT]:  Access token, file bytes, CID and upload options
[OUTPUT]: Upload CIDs and downloaded file contents with metadata
[POS]:    HTTP layer - authenticated storage endpoints
[UPDATE]: When storage endpoints, form fields or response headers change
*/

use reqwest::Method;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::client::STORAGE_SEGMENT;
use crate::http::error::failure_parts;
use crate::http::{MefsClient, MefsError, Result};

/// Filename reported when the response does not name the file
pub const UNKNOWN_FILENAME: &str = "unknown";

/// Optional fields sent alongside an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Encryption key, sent as form field `key`
    pub encryption_key: Option<String>,
    /// Sent as form field `public`
    pub is_public: Option<bool>,
    /// Sent as form field `user`
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResult {
    #[serde(rename = "Mid")]
    pub cid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

impl MefsClient {
    /// Upload a file
    ///
    /// POST /mefs/ (multipart: file, key?, public?, user?)
    pub async fn upload(
        &self,
        access_token: &str,
        file_bytes: Vec<u8>,
        filename: &str,
        options: &UploadOptions,
    ) -> Result<UploadResult> {
        let size = file_bytes.len();
        let mut form = Form::new().part(
            "file",
            Part::bytes(file_bytes).file_name(filename.to_string()),
        );
        if let Some(key) = &options.encryption_key {
            form = form.text("key", key.clone());
        }
        if let Some(is_public) = options.is_public {
            form = form.text("public", is_public.to_string());
        }
        if let Some(user) = &options.user {
            form = form.text("user", user.clone());
        }

        debug!(filename, size, "uploading file");
        let response = self
            .request(Method::POST, &[STORAGE_SEGMENT, ""])?
            .bearer_auth(access_token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, status_text, body) = failure_parts(response).await;
            return Err(MefsError::UploadFailed {
                status,
                status_text,
                body,
            });
        }

        let body = response.text().await?;
        let result: UploadResult = serde_json::from_str(&body)
            .map_err(|e| MefsError::InvalidResponse(format!("upload response: {e}")))?;
        info!(cid = %result.cid, filename, size, "file uploaded");
        Ok(result)
    }

    /// Download a file by CID
    ///
    /// GET /mefs/{cid}?key={key}
    pub async fn download(
        &self,
        access_token: &str,
        cid: &str,
        key: Option<&str>,
    ) -> Result<DownloadedFile> {
        let mut builder = self
            .request(Method::GET, &[STORAGE_SEGMENT, cid])?
            .bearer_auth(access_token);
        if let Some(key) = key {
            builder = builder.query(&[("key", key)]);
        }

        debug!(cid, "downloading file");
        let response = builder.send().await?;

        if !response.status().is_success() {
            let (status, status_text, body) = failure_parts(response).await;
            return Err(MefsError::DownloadFailed {
                status,
                status_text,
                body,
            });
        }

        let (filename, content_type) = file_metadata(response.headers());
        let data = response.bytes().await?.to_vec();
        info!(cid, filename = %filename, size = data.len(), "file downloaded");

        Ok(DownloadedFile {
            data,
            filename,
            content_type,
        })
    }
}

fn file_metadata(headers: &HeaderMap) -> (String, Option<String>) {
    let filename = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| UNKNOWN_FILENAME.to_string());
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    (filename, content_type)
}

/// Extract `filename="..."` (or unquoted `filename=...`) from a Content-Disposition value
pub(crate) fn filename_from_disposition(value: &str) -> Option<String> {
    const NEEDLE: &str = "filename=";
    // ASCII lowercasing keeps byte offsets aligned with `value`
    let lower = value.to_ascii_lowercase();
    let start = lower.find(NEEDLE)? + NEEDLE.len();
    let rest = value[start..].trim_start();

    let name = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or_default(),
        None => rest
            .split(|c: char| c == ';' || c.is_whitespace())
            .next()
            .unwrap_or_default(),
    };

    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
