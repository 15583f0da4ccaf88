//! JSON payloads exchanged with the imaging backend.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PanelError;
use crate::roi::{Roi, RoiSet};

pub const CAPTURE_PATH: &str = "api/capture";
pub const OPEN_CSV_PATH: &str = "api/open_csv";
pub const EXTRACT_PATH: &str = "api/extract";
pub const DOWNLOAD_PATH: &str = "download/";

/// Multipart field carrying the uploaded CSV frame.
pub const CSV_FIELD: &str = "file";

/// Body of a successful capture or CSV import.
#[derive(Debug, Clone, Deserialize)]
pub struct FramePayload {
    pub image_b64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractRequest {
    pub rois: [Roi; 4],
}

impl From<&RoiSet> for ExtractRequest {
    fn from(rois: &RoiSet) -> Self {
        Self {
            rois: *rois.as_array(),
        }
    }
}

/// Every backend reply carries `ok`; failures add `error`, successes the payload fields.
pub fn open_envelope<T: DeserializeOwned>(body: Value) -> Result<T, PanelError> {
    let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
    if !ok {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty())
            .unwrap_or("unknown");
        return Err(PanelError::Rejected(message.to_string()));
    }
    serde_json::from_value(body).map_err(|err| PanelError::Malformed(err.to_string()))
}
