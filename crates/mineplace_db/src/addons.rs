use mineplace_core::prelude::*;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::{Database, conflict_on_unique};

const DUPLICATE_NAME: &str = "An addon with the same name already exists.";

/// Single add-on lookup with owner and aggregated likes.
const LISTING_BY_ID: &str = r#"
SELECT a.*, u.username, COUNT(l.id) AS likes_count, NULL AS relevance_score
FROM addons a
JOIN users u ON u.id = a.user_id
LEFT JOIN user_likes l ON l.addon_id = a.id
WHERE a.id = ?
GROUP BY a.id
"#;

impl Database {
    pub async fn create_addon(&self, owner: Uuid, new: &NewAddOn) -> MarketResult<AddOnListing> {
        new.validate()?;

        let owner_name: String = sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
            .bind(owner)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found("User not found"))?;

        if self.addon_name_taken(&new.name, None).await? {
            return Err(MarketError::conflict(DUPLICATE_NAME));
        }

        let now = Database::now();
        let addon = AddOn {
            id: Uuid::new_v4(),
            user_id: owner,
            name: new.name.clone(),
            addon_type: new.addon_type,
            short_description: new.short_description.clone(),
            description: new.description.clone(),
            downloads: 0,
            publish_date: now,
            update_date: now,
        };

        sqlx::query(
            r#"
            INSERT INTO addons (
                id, user_id, name, addon_type, short_description, description,
                name_folded, short_description_folded, description_folded,
                downloads, publish_date, update_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(addon.id)
        .bind(addon.user_id)
        .bind(&addon.name)
        .bind(addon.addon_type)
        .bind(&addon.short_description)
        .bind(&addon.description)
        .bind(fold_case(&addon.name))
        .bind(fold_case(&addon.short_description))
        .bind(fold_case(&addon.description))
        .bind(addon.downloads)
        .bind(addon.publish_date)
        .bind(addon.update_date)
        .execute(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

        info!("Add-on '{}' published by {owner}", addon.name);
        Ok(AddOnListing {
            addon,
            username: owner_name,
            likes_count: 0,
            relevance_score: None,
        })
    }

    pub async fn get_addon(&self, id: Uuid) -> MarketResult<AddOn> {
        sqlx::query_as::<_, AddOn>("SELECT * FROM addons WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found("Addon not found."))
    }

    pub async fn get_addon_listing(&self, id: Uuid) -> MarketResult<AddOnListing> {
        sqlx::query_as::<_, AddOnListing>(LISTING_BY_ID)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found("Addon not found."))
    }

    pub async fn addon_exists(&self, id: Uuid) -> MarketResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM addons WHERE id = ?)")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(exists)
    }

    async fn addon_name_taken(&self, name: &str, except: Option<Uuid>) -> MarketResult<bool> {
        let taken = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM addons WHERE name_folded = ?1 AND (?2 IS NULL OR id != ?2))",
        )
        .bind(fold_case(name))
        .bind(except)
        .fetch_one(self.pool())
        .await?;
        Ok(taken)
    }

    /// Owner-only partial update. Bumps `update_date`.
    pub async fn update_addon(
        &self,
        id: Uuid,
        caller: Uuid,
        update: &AddOnUpdate,
    ) -> MarketResult<AddOnListing> {
        update.validate()?;

        let addon = self.get_addon(id).await?;
        if addon.user_id != caller {
            return Err(MarketError::forbidden(
                "You are not authorized to update this addon.",
            ));
        }

        if let Some(name) = &update.name {
            let renamed = fold_case(name) != fold_case(&addon.name);
            if renamed && self.addon_name_taken(name, Some(id)).await? {
                return Err(MarketError::conflict(DUPLICATE_NAME));
            }
        }

        if !update.is_empty() {
            sqlx::query(
                r#"
                UPDATE addons SET
                    name = COALESCE(?1, name),
                    addon_type = COALESCE(?2, addon_type),
                    short_description = COALESCE(?3, short_description),
                    description = COALESCE(?4, description),
                    name_folded = COALESCE(?5, name_folded),
                    short_description_folded = COALESCE(?6, short_description_folded),
                    description_folded = COALESCE(?7, description_folded),
                    update_date = ?8
                WHERE id = ?9
                "#,
            )
            .bind(&update.name)
            .bind(update.addon_type)
            .bind(&update.short_description)
            .bind(&update.description)
            .bind(update.name.as_deref().map(fold_case))
            .bind(update.short_description.as_deref().map(fold_case))
            .bind(update.description.as_deref().map(fold_case))
            .bind(Database::now())
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;
        }

        self.get_addon_listing(id).await
    }

    /// Owner-only delete. Versions and likes go with the row; stored files are removed afterwards.
    pub async fn delete_addon<S: BlobStorage>(
        &self,
        storage: &S,
        id: Uuid,
        caller: Uuid,
    ) -> MarketResult<()> {
        let addon = self.get_addon(id).await?;
        if addon.user_id != caller {
            return Err(MarketError::forbidden(
                "You are not authorized to delete this addon.",
            ));
        }

        let files: Vec<String> =
            sqlx::query_scalar("SELECT file_name FROM versions WHERE addon_id = ?")
                .bind(id)
                .fetch_all(self.pool())
                .await?;

        sqlx::query("DELETE FROM addons WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        for file in &files {
            if let Err(e) = storage.delete_blob(file).await {
                error!("Failed to delete file {file} of removed addon {id}: {e}");
            }
        }

        info!("Add-on '{}' deleted with {} version file(s)", addon.name, files.len());
        Ok(())
    }

    pub async fn increment_downloads(&self, id: Uuid) -> MarketResult<i64> {
        sqlx::query_scalar("UPDATE addons SET downloads = downloads + 1 WHERE id = ? RETURNING downloads")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found("Addon not found."))
    }
}
