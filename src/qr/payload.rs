use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::entities::sea_orm_active_enums::{ChildGender, Gender};

/// Everything a registration carries except its QR artifact and attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: Gender,
    pub address: String,
    pub has_children: bool,
    pub children: Vec<PayloadChild>,
    /// Creation instant, Unix epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadChild {
    pub id: String,
    pub name: String,
    pub gender: ChildGender,
    pub age: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("not a registration payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl QrPayload {
    pub fn encode(&self) -> Result<String, PayloadError> {
        let json = serde_json::to_string(self)?;
        Ok(STANDARD.encode(json))
    }

    /// Reverses [`QrPayload::encode`]. Surrounding whitespace from a pasted
    /// code is ignored.
    pub fn decode(text: &str) -> Result<Self, PayloadError> {
        let bytes = STANDARD.decode(text.trim())?;
        let json = String::from_utf8(bytes)?;
        Ok(serde_json::from_str(&json)?)
    }
}
