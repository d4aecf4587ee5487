//! Uniform success envelope for API responses.

use serde::Serialize;

/// Success envelope: `{"success": true, "message": ..., "data": ...}`.
/// Failures use the error taxonomy's own body and never go through this type.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success with data and the default message.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: "Request processed successfully".to_string(),
            data: Some(data),
        }
    }

    /// Success with a custom message and data.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success with a message and no data.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}
