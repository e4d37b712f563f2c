use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a portal session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account email.
    pub sub: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Issues and checks HS256 session tokens with a fixed validity window.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token issuance failed: {0}")]
    Issue(jsonwebtoken::errors::Error),

    #[error("invalid session token")]
    Invalid,
}

impl TokenService {
    pub fn new(secret: &str, validity_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity: Duration::minutes(validity_minutes),
        }
    }

    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        let claims = Claims {
            sub: email.to_string(),
            exp: (Utc::now() + self.validity).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Issue)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}
