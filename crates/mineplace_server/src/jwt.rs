use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mineplace_core::prelude::{AuthError, AuthProvider, Caller};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Mints and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_seconds: u64,
}

impl JwtService {
    pub fn new(secret: &str, lifetime_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_seconds,
        }
    }

    pub fn lifetime_seconds(&self) -> u64 {
        self.lifetime_seconds
    }

    pub fn mint(&self, user: Uuid) -> Result<String, anyhow::Error> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            sub: user.to_string(),
            iat: now as usize,
            exp: (now + self.lifetime_seconds) as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> Result<Caller, AuthError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        let id = token_data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(Caller { id })
    }
}

impl AuthProvider for JwtService {
    async fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        self.verify_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_verify_with_the_same_secret_only() {
        let user = Uuid::new_v4();
        let service = JwtService::new("secret", 60);
        let token = service.mint(user).unwrap();

        assert_eq!(service.verify_token(&token).unwrap().id, user);
        assert!(JwtService::new("other", 60).verify_token(&token).is_err());
        assert!(service.verify_token("garbage").is_err());
    }
}
