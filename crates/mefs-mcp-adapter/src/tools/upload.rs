/*
[INPUT]:  Tool arguments {file (base64), name, key?, public?}
[OUTPUT]: {cid, filename, size}
[POS]:    Tool layer - upload tool
[UPDATE]: When upload arguments or output fields change
*/

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::http::{MefsError, Result, UploadOptions};
use crate::tools::{decode_base64_strict, non_empty};

pub const NAME: &str = "upload";
pub const DESCRIPTION: &str = "Upload a base64-encoded file to MEFS storage and return its CID";

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadArgs {
    /// File contents, standard base64
    pub file: String,
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutput {
    pub cid: String,
    pub filename: String,
    pub size: usize,
}

/// Validated upload, ready to send
pub(crate) struct UploadRequest {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub options: UploadOptions,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "file": {
                "type": "string",
                "description": "File contents encoded as standard base64",
            },
            "name": {
                "type": "string",
                "description": "Filename to store the content under",
                "minLength": 1,
            },
            "key": {
                "type": "string",
                "description": "Optional encryption key",
            },
            "public": {
                "type": "boolean",
                "description": "Whether the object is publicly retrievable",
            },
        },
        "required": ["file", "name"],
        "additionalProperties": false,
    })
}

pub fn parse_args(arguments: Value) -> Result<UploadArgs> {
    serde_json::from_value(arguments)
        .map_err(|e| MefsError::ValidationFailed(format!("invalid {NAME} arguments: {e}")))
}

/// Check arguments and decode the payload; runs before any network call
pub(crate) fn prepare(args: UploadArgs) -> Result<UploadRequest> {
    let filename = non_empty("name", &args.name)?;
    let bytes = decode_base64_strict("file", &args.file)?;

    Ok(UploadRequest {
        bytes,
        filename,
        options: UploadOptions {
            encryption_key: args.key.filter(|key| !key.is_empty()),
            is_public: args.public,
            user: None,
        },
    })
}
