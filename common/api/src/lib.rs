use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire envelope the upstream API speaks and the gateway preserves:
/// `{status, message, data}`.
///
/// Deserialization is lenient about the upstream omitting `message` or
/// `data`; `status` is the one field that must be present for a body to be
/// treated as an envelope at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            status: true,
            message: message.into(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: Value::Null,
        }
    }

    /// Tagged projection of the envelope: callers branch on `Ok(data)` or
    /// `Err(message)` instead of inspecting the raw shape.
    pub fn into_result(self) -> Result<Value, String> {
        if self.status {
            Ok(self.data)
        } else {
            Err(self.message)
        }
    }
}
