use mineplace_core::prelude::*;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::Database;

pub(crate) const VERSION_NOT_FOUND: &str = "Addon version not found";

impl Database {
    /// Versions of an add-on, newest first by default.
    pub async fn list_versions(
        &self,
        addon: Uuid,
        pagination: Pagination,
        order: SortOrder,
    ) -> MarketResult<Page<Version>> {
        if !self.addon_exists(addon).await? {
            return Err(MarketError::not_found("Addon not found."));
        }

        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM versions WHERE addon_id = ?")
            .bind(addon)
            .fetch_one(self.pool())
            .await?;

        let sql = format!(
            "SELECT * FROM versions WHERE addon_id = ? ORDER BY created_at {}, id ASC LIMIT ? OFFSET ?",
            order.as_sql()
        );
        let items = sqlx::query_as::<_, Version>(&sql)
            .bind(addon)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(self.pool())
            .await?;

        Ok(Page {
            items,
            total_count,
            page: pagination.page(),
            per_page: pagination.per_page(),
        })
    }

    pub async fn get_version(&self, addon: Uuid, version: Uuid) -> MarketResult<Version> {
        sqlx::query_as::<_, Version>("SELECT * FROM versions WHERE id = ? AND addon_id = ?")
            .bind(version)
            .bind(addon)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found(VERSION_NOT_FOUND))
    }

    pub async fn latest_version(&self, addon: Uuid) -> MarketResult<Version> {
        if !self.addon_exists(addon).await? {
            return Err(MarketError::not_found("Addon not found."));
        }
        sqlx::query_as::<_, Version>(
            "SELECT * FROM versions WHERE addon_id = ? ORDER BY created_at DESC, id ASC LIMIT 1",
        )
        .bind(addon)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| MarketError::not_found("There are no versions available for this addon."))
    }

    /// Case-insensitive check within one add-on.
    pub async fn version_label_taken(&self, addon: Uuid, label: &str) -> MarketResult<bool> {
        let taken = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM versions WHERE addon_id = ? AND version_folded = ?)",
        )
        .bind(addon)
        .bind(fold_case(label))
        .fetch_one(self.pool())
        .await?;
        Ok(taken)
    }

    pub async fn file_hash_taken(&self, hash: &str) -> MarketResult<bool> {
        let taken = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM versions WHERE file_hash = ?)")
            .bind(hash)
            .fetch_one(self.pool())
            .await?;
        Ok(taken)
    }

    pub async fn download_url_taken(&self, url: &str) -> MarketResult<bool> {
        let taken =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM versions WHERE download_url = ?)")
                .bind(url)
                .fetch_one(self.pool())
                .await?;
        Ok(taken)
    }

    /// Owner-only removal of one version and its stored file.
    pub async fn delete_version<S: BlobStorage>(
        &self,
        storage: &S,
        addon: Uuid,
        version: Uuid,
        caller: Uuid,
    ) -> MarketResult<()> {
        let owner = self.get_addon(addon).await?.user_id;
        let row = self.get_version(addon, version).await?;
        if owner != caller {
            return Err(MarketError::forbidden(
                "Insufficient rights: You are not the author of this addon.",
            ));
        }

        sqlx::query("DELETE FROM versions WHERE id = ?")
            .bind(row.id)
            .execute(self.pool())
            .await?;

        if let Err(e) = storage.delete_blob(&row.file_name).await {
            error!("Failed to delete file {} of version {}: {e}", row.file_name, row.id);
        }
        info!("Version '{}' of add-on {addon} deleted", row.version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addons::tests::{new_addon, user};
    use bytes::Bytes;
    use mineplace_fs::FileSystemStorage;

    fn upload(version: &str, data: &'static [u8]) -> VersionUpload {
        VersionUpload {
            version: version.into(),
            description: "Release notes here".into(),
            file_name: Some("pack.zip".into()),
            data: Bytes::from_static(data),
        }
    }

    #[tokio::test]
    async fn listing_latest_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path());
        let db = Database::in_memory().await.unwrap();
        let steve = user(&db, "steve").await;
        let alex = user(&db, "alex").await;
        let addon = db
            .create_addon(steve, &new_addon("Faithful", "Texture pack", "Classic looking textures"))
            .await
            .unwrap()
            .addon
            .id;

        assert!(matches!(
            db.latest_version(addon).await,
            Err(MarketError::NotFound(_))
        ));

        let first = db.publish_version(&storage, addon, steve, upload("1.0", b"one")).await.unwrap();
        let second = db.publish_version(&storage, addon, steve, upload("1.1", b"two")).await.unwrap();

        assert_eq!(db.latest_version(addon).await.unwrap().id, second.id);
        let page = db
            .list_versions(addon, Pagination::default(), SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items[0].id, first.id);

        assert!(matches!(
            db.delete_version(&storage, addon, first.id, alex).await,
            Err(MarketError::Forbidden(_))
        ));
        db.delete_version(&storage, addon, first.id, steve).await.unwrap();
        assert!(!storage.exists(&first.file_name).await.unwrap());
        assert!(storage.exists(&second.file_name).await.unwrap());
        assert!(matches!(
            db.get_version(addon, first.id).await,
            Err(MarketError::NotFound(_))
        ));

        // a version id under the wrong add-on is not found
        let other = db
            .create_addon(alex, &new_addon("Lithium", "Game logic", "General purpose optimizations"))
            .await
            .unwrap()
            .addon
            .id;
        assert!(matches!(
            db.get_version(other, second.id).await,
            Err(MarketError::NotFound(_))
        ));
    }
}
