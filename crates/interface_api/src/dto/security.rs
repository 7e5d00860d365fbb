//! Security DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Set PIN request
#[derive(Debug, Deserialize, Validate)]
pub struct SetPinRequest {
    #[validate(length(min = 4, max = 4))]
    pub pin: String,
}

/// Change PIN request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePinRequest {
    #[validate(length(min = 4, max = 4))]
    pub old_pin: String,
    #[validate(length(min = 4, max = 4))]
    pub new_pin: String,
}

/// Reset PIN request (caller re-authenticated via the identity provider)
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPinRequest {
    #[validate(length(min = 4, max = 4))]
    pub new_pin: String,
}

/// Simple acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
