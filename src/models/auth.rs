use garde::Validate;
use serde::{Deserialize, Serialize};

/// Request to create a portal account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(length(min = 1, max = 100))]
    pub username: String,

    #[garde(length(min = 3, max = 254))]
    pub email: String,

    #[garde(length(min = 8, max = 128))]
    pub password: String,
}

/// First login step: credentials only.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(length(min = 3, max = 254))]
    pub email: String,

    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// Second login step: the emailed one-time code.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[garde(length(min = 3, max = 254))]
    pub email: String,

    #[garde(length(min = 6, max = 6))]
    pub code: String,
}

/// Acknowledgement that a verification code was dispatched.
#[derive(Debug, Serialize)]
pub struct LoginAck {
    pub message: String,
}

/// Session token handed out after successful verification.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}
