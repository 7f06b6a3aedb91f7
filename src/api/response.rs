//! Response envelope
//!
//! Every operation answers with one of:
//! - `{"status":"success"}`
//! - `{"status":"success","data":<value>}`
//! - `{"status":"error","error":{"message":<text>}}`
//! - `{"status":"error","error":{"class":<kind>,"message":<text>}}` for storage failures

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ErrorKind, StoreError};

/// Error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub message: String,
}

/// Uniform response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Error {
        error: ErrorBody,
    },
}

impl Envelope {
    /// Success without payload
    pub fn ok() -> Self {
        Envelope::Success { data: None }
    }

    /// Success with payload
    pub fn success(data: Value) -> Self {
        Envelope::Success { data: Some(data) }
    }

    /// Error envelope; the collaborator class is carried only for storage failures
    pub fn error(err: &StoreError) -> Self {
        let class = match err.kind() {
            ErrorKind::Collaborator => err.class().map(str::to_string),
            _ => None,
        };
        Envelope::Error {
            error: ErrorBody {
                class,
                message: sanitize_message(err.message()),
            },
        }
    }

    /// Check if this is a success envelope
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    /// Returns the success payload, if any
    pub fn data(&self) -> Option<&Value> {
        match self {
            Envelope::Success { data } => data.as_ref(),
            Envelope::Error { .. } => None,
        }
    }
}

impl From<&StoreError> for Envelope {
    fn from(err: &StoreError) -> Self {
        Envelope::error(err)
    }
}

/// Replaces newlines, carriage returns and tabs with spaces
pub fn sanitize_message(message: &str) -> String {
    message.replace(['\n', '\r', '\t'], " ")
}
