use serde::{Deserialize, Serialize};

use crate::constants::CODE_OK;

/// Envelope wrapping every JSON body served by the backend.
///
/// The `data` field uses `serde_json::value::RawValue` to defer
/// deserialization until the caller knows the expected payload type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<serde_json::value::RawValue>>,
    /// Validation detail some handlers attach next to `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Creates an envelope carrying `data`.
    pub fn new<T: Serialize>(
        code: i32,
        message: impl Into<String>,
        data: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        let raw = match data {
            Some(d) => {
                let json = serde_json::to_string(d)?;
                Some(serde_json::value::RawValue::from_string(json)?)
            }
            None => None,
        };
        Ok(Self {
            code,
            message: message.into(),
            data: raw,
            error: None,
        })
    }

    /// Returns `true` when the backend reported success.
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Deserializes the payload into the given type.
    pub fn parse_data<T: for<'de> Deserialize<'de>>(&self) -> Result<Option<T>, serde_json::Error> {
        match &self.data {
            Some(raw) if raw.get() != "null" => Ok(Some(serde_json::from_str(raw.get())?)),
            _ => Ok(None),
        }
    }

    /// Returns the payload as a generic JSON value, if present.
    pub fn data_value(&self) -> Option<serde_json::Value> {
        self.data
            .as_ref()
            .and_then(|raw| serde_json::from_str(raw.get()).ok())
            .filter(|v: &serde_json::Value| !v.is_null())
    }
}
