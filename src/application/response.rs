//! The `{ error, data, message }` envelope every API answer is wrapped in.

use serde::{Deserialize, Serialize};

use crate::domain::FieldError;

use super::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseMessage {
    Text(String),
    Fields(Vec<FieldError>),
}

impl From<&str> for ResponseMessage {
    fn from(text: &str) -> Self {
        ResponseMessage::Text(text.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// HTTP status this envelope is sent with
    #[serde(skip)]
    pub status: u16,
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<ResponseMessage>) -> Self {
        Self {
            status: 200,
            error: false,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    pub fn created(data: T, message: impl Into<ResponseMessage>) -> Self {
        Self {
            status: 201,
            ..Self::ok(data, message)
        }
    }

    pub fn failure(error: &AppError) -> Self {
        Self {
            status: error.status_code(),
            error: true,
            data: None,
            message: Some(error.message()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
