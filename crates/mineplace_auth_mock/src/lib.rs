use mineplace_core::prelude::*;
use uuid::Uuid;

/// Accepts any non-empty token as the same fixed user.
#[derive(Clone, Debug)]
pub struct FixedIdentityAuth {
    pub user: Uuid,
}

impl FixedIdentityAuth {
    pub fn new(user: Uuid) -> Self {
        Self { user }
    }
}

impl AuthProvider for FixedIdentityAuth {
    async fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(Caller { id: self.user })
    }
}
