use mineplace_core::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::db::{Database, conflict_on_unique};

impl Database {
    /// Insert a registered user. `user` must already be normalized.
    pub async fn create_user(&self, user: &NewUser, password_hash: &str) -> MarketResult<User> {
        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
                .bind(&user.email)
                .fetch_one(self.pool())
                .await?;
        if email_taken {
            return Err(MarketError::conflict("Email already registered"));
        }

        let username_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
                .bind(&user.username)
                .fetch_one(self.pool())
                .await?;
        if username_taken {
            return Err(MarketError::conflict("Username already registered"));
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: password_hash.to_string(),
            profile_picture: None,
            created_at: Database::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, profile_picture, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(created.id)
        .bind(&created.username)
        .bind(&created.email)
        .bind(&created.password_hash)
        .bind(&created.profile_picture)
        .bind(created.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "Username or email already registered"))?;

        info!("New user registered: {}", created.email);
        Ok(created)
    }

    pub async fn find_user_by_email(&self, email: &str) -> MarketResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> MarketResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found("User not found"))
    }

    pub async fn user_exists(&self, id: Uuid) -> MarketResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(exists)
    }
}
