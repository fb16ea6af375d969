/*
[INPUT]:  Tool arguments {cid, key?}
[OUTPUT]: {cid, filename, file (base64), size, contentType?}
[POS]:    Tool layer - retrieve tool
[UPDATE]: When retrieve arguments or output fields change
*/

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::http::{DownloadedFile, MefsError, Result};
use crate::tools::non_empty;

pub const NAME: &str = "retrieve";
pub const DESCRIPTION: &str = "Retrieve a file from MEFS storage by CID as base64";

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrieveArgs {
    pub cid: String,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveOutput {
    pub cid: String,
    pub filename: String,
    /// File contents, standard base64
    pub file: String,
    pub size: usize,
    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl RetrieveOutput {
    pub fn new(cid: String, downloaded: DownloadedFile) -> Self {
        Self {
            cid,
            filename: downloaded.filename,
            size: downloaded.data.len(),
            file: BASE64.encode(&downloaded.data),
            content_type: downloaded.content_type,
        }
    }
}

pub(crate) struct RetrieveRequest {
    pub cid: String,
    pub key: Option<String>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "cid": {
                "type": "string",
                "description": "Content identifier returned by upload",
                "minLength": 1,
            },
            "key": {
                "type": "string",
                "description": "Decryption key, if the file was uploaded with one",
            },
        },
        "required": ["cid"],
        "additionalProperties": false,
    })
}

pub fn parse_args(arguments: Value) -> Result<RetrieveArgs> {
    serde_json::from_value(arguments)
        .map_err(|e| MefsError::ValidationFailed(format!("invalid {NAME} arguments: {e}")))
}

pub(crate) fn prepare(args: RetrieveArgs) -> Result<RetrieveRequest> {
    Ok(RetrieveRequest {
        cid: non_empty("cid", &args.cid)?,
        key: args.key.filter(|key| !key.is_empty()),
    })
}
