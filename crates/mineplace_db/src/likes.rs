use mineplace_core::prelude::*;
use uuid::Uuid;

use crate::db::{Database, conflict_on_unique};

const ALREADY_LIKED: &str = "You've already given this addon a like.";

impl Database {
    pub async fn like_addon(&self, user: Uuid, addon: Uuid) -> MarketResult<UserLike> {
        if !self.addon_exists(addon).await? {
            return Err(MarketError::not_found("Addon not found."));
        }
        if !self.user_exists(user).await? {
            return Err(MarketError::not_found("User not found"));
        }

        let liked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_likes WHERE user_id = ? AND addon_id = ?)",
        )
        .bind(user)
        .bind(addon)
        .fetch_one(self.pool())
        .await?;
        if liked {
            return Err(MarketError::conflict(ALREADY_LIKED));
        }

        let like = UserLike {
            id: Uuid::new_v4(),
            user_id: user,
            addon_id: addon,
            created_at: Database::now(),
        };
        sqlx::query("INSERT INTO user_likes (id, user_id, addon_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(like.id)
            .bind(like.user_id)
            .bind(like.addon_id)
            .bind(like.created_at)
            .execute(self.pool())
            .await
            .map_err(|e| conflict_on_unique(e, ALREADY_LIKED))?;

        Ok(like)
    }

    pub async fn unlike_addon(&self, user: Uuid, addon: Uuid) -> MarketResult<()> {
        if !self.addon_exists(addon).await? {
            return Err(MarketError::not_found("Addon not found."));
        }

        let removed = sqlx::query("DELETE FROM user_likes WHERE user_id = ? AND addon_id = ?")
            .bind(user)
            .bind(addon)
            .execute(self.pool())
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(MarketError::invalid("You didn't give this addon a like."));
        }
        Ok(())
    }

    pub async fn likes_count(&self, addon: Uuid) -> MarketResult<i64> {
        if !self.addon_exists(addon).await? {
            return Err(MarketError::not_found("Addon not found."));
        }
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM user_likes WHERE addon_id = ?")
            .bind(addon)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
