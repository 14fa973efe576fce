//! Publishing a new version: validated, content addressed and stored
//! alongside its database row.
//!
//! The file is written before the row is inserted. If anything fails after
//! the write, a file this call created is removed again unless a committed
//! row already points at its URL, so neither orphan files nor dangling rows
//! survive a failed upload.

use mineplace_core::prelude::*;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::Database;

const NOT_AUTHOR: &str = "Insufficient rights: You are not the author of this addon.";
const DUPLICATE_HASH: &str = "A file with this hash has already been uploaded.";
const DUPLICATE_URL: &str = "The URL for the download is already in use.";

fn duplicate_label(label: &str) -> MarketError {
    MarketError::conflict(format!("Version '{label}' already exists for this addon."))
}

/// Maps constraint failures of the version insert back to request errors.
fn insert_error(err: sqlx::Error, label: &str) -> MarketError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let message = db.message();
            return if message.contains("file_hash") {
                MarketError::conflict(DUPLICATE_HASH)
            } else if message.contains("download_url") {
                MarketError::conflict(DUPLICATE_URL)
            } else {
                duplicate_label(label)
            };
        }
        if db.is_foreign_key_violation() {
            return MarketError::not_found("Addon not found.");
        }
    }
    err.into()
}

impl Database {
    /// Uploads a new version of `addon_id` on behalf of `caller`.
    ///
    /// Checks run cheapest first: field shapes, add-on existence, ownership
    /// and label uniqueness are all decided before the file is touched.
    pub async fn publish_version<S: BlobStorage>(
        &self,
        storage: &S,
        addon_id: Uuid,
        caller: Uuid,
        upload: VersionUpload,
    ) -> MarketResult<Version> {
        upload.validate_fields()?;

        let addon = self.get_addon(addon_id).await?;
        if addon.user_id != caller {
            return Err(MarketError::forbidden(NOT_AUTHOR));
        }
        if self.version_label_taken(addon_id, &upload.version).await? {
            return Err(duplicate_label(&upload.version));
        }

        upload.validate_size()?;
        let address = ContentAddress::compute(&upload.data, upload.file_name.as_deref());
        let download_url = storage.public_url(&address.file_name);

        if self.file_hash_taken(&address.hash).await? {
            return Err(MarketError::conflict(DUPLICATE_HASH));
        }
        if self.download_url_taken(&download_url).await? {
            return Err(MarketError::conflict(DUPLICATE_URL));
        }

        let created = storage.write_blob(&address.file_name, upload.data).await?;
        if !created {
            warn!("Reusing stored file {} with no version row", address.file_name);
        }

        let version = Version {
            id: Uuid::new_v4(),
            addon_id,
            version: upload.version,
            description: upload.description,
            download_url,
            file_hash: address.hash,
            file_name: address.file_name,
            created_at: Database::now(),
        };

        match self.insert_version(&version).await {
            Ok(()) => {
                info!(
                    "Version '{}' of add-on '{}' published as {}",
                    version.version, addon.name, version.file_name
                );
                Ok(version)
            }
            Err(e) => {
                if created {
                    self.discard_blob(storage, &version.file_name, &version.download_url)
                        .await;
                }
                Err(e)
            }
        }
    }

    /// Inserts the row and bumps the add-on's `update_date` atomically.
    async fn insert_version(&self, version: &Version) -> MarketResult<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO versions (
                id, addon_id, version, version_folded, description,
                download_url, file_hash, file_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(version.id)
        .bind(version.addon_id)
        .bind(&version.version)
        .bind(fold_case(&version.version))
        .bind(&version.description)
        .bind(&version.download_url)
        .bind(&version.file_hash)
        .bind(&version.file_name)
        .bind(version.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_error(e, &version.version))?;

        sqlx::query("UPDATE addons SET update_date = ? WHERE id = ?")
            .bind(version.created_at)
            .bind(version.addon_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Removes a file written by a failed publish, unless a committed row references it.
    async fn discard_blob<S: BlobStorage>(&self, storage: &S, file_name: &str, url: &str) {
        match self.download_url_taken(url).await {
            Ok(true) => {
                info!("Keeping {file_name}: referenced by a concurrently published version");
                return;
            }
            Ok(false) => {}
            Err(e) => warn!("Could not check references of {file_name}: {e}"),
        }

        if let Err(e) = storage.delete_blob(file_name).await {
            error!("Failed to remove {file_name} after a failed publish: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addons::tests::{new_addon, user};
    use bytes::Bytes;
    use mineplace_fs::FileSystemStorage;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        storage: FileSystemStorage,
        db: Database,
        owner: Uuid,
        addon: Uuid,
    }

    impl Fixture {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let storage = FileSystemStorage::new(dir.path());
            let db = Database::in_memory().await.unwrap();
            let owner = user(&db, "steve").await;
            let addon = db
                .create_addon(owner, &new_addon("Sodium", "Fast renderer", "A modern rendering engine"))
                .await
                .unwrap()
                .addon
                .id;
            Self {
                dir,
                storage,
                db,
                owner,
                addon,
            }
        }

        fn files(&self) -> usize {
            std::fs::read_dir(self.dir.path()).unwrap().count()
        }

        async fn publish(&self, version: &str, data: &'static [u8]) -> MarketResult<Version> {
            let upload = VersionUpload {
                version: version.into(),
                description: "Release notes here".into(),
                file_name: Some("sodium.jar".into()),
                data: Bytes::from_static(data),
            };
            self.db
                .publish_version(&self.storage, self.addon, self.owner, upload)
                .await
        }
    }

    #[tokio::test]
    async fn publish_stores_content_addressed_file() {
        let fx = Fixture::new().await;
        let before = fx.db.get_addon(fx.addon).await.unwrap().update_date;

        let version = fx.publish("1.0", b"hello").await.unwrap();
        let hash = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(version.file_hash, hash);
        assert_eq!(version.file_name, format!("{hash}.jar"));
        assert_eq!(version.download_url, format!("/files/{hash}.jar"));
        assert_eq!(
            fx.storage.read_blob(&version.file_name).await.unwrap(),
            Bytes::from_static(b"hello")
        );
        assert!(fx.db.get_addon(fx.addon).await.unwrap().update_date > before);
    }

    #[tokio::test]
    async fn rejections_happen_before_any_write() {
        let fx = Fixture::new().await;
        fx.publish("1.0", b"first").await.unwrap();

        let err = fx.publish("1.0", b"second").await.unwrap_err();
        assert_eq!(err.to_string(), "Version '1.0' already exists for this addon.");

        // same bytes under another label
        let err = fx.publish("2.0", b"first").await.unwrap_err();
        assert_eq!(err.to_string(), DUPLICATE_HASH);

        assert!(matches!(fx.publish("3.0", b"").await, Err(MarketError::InvalidInput(_))));

        let stranger = user(&fx.db, "alex").await;
        let upload = VersionUpload {
            version: "4.0".into(),
            description: "Release notes here".into(),
            file_name: None,
            data: Bytes::from_static(b"other"),
        };
        let err = fx
            .db
            .publish_version(&fx.storage, fx.addon, stranger, upload.clone())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), NOT_AUTHOR);
        assert!(matches!(
            fx.db.publish_version(&fx.storage, Uuid::new_v4(), fx.owner, upload).await,
            Err(MarketError::NotFound(_))
        ));

        assert_eq!(fx.files(), 1);
    }

    #[tokio::test]
    async fn labels_conflict_ignoring_case() {
        let fx = Fixture::new().await;
        fx.publish("1.0-Beta", b"first").await.unwrap();
        let err = fx.publish("1.0-BETA", b"second").await.unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
        assert_eq!(fx.files(), 1);
    }

    #[tokio::test]
    async fn non_ascii_labels_conflict_ignoring_case() {
        let fx = Fixture::new().await;
        fx.publish("Бета-1", b"first").await.unwrap();

        let err = fx.publish("БЕТА-1", b"second").await.unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
        assert!(fx.db.version_label_taken(fx.addon, "бета-1").await.unwrap());
        assert_eq!(fx.files(), 1);
    }

    #[tokio::test]
    async fn failed_insert_removes_the_file() {
        let fx = Fixture::new().await;
        sqlx::raw_sql(
            "CREATE TRIGGER fail_versions BEFORE INSERT ON versions BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        )
        .execute(fx.db.pool())
        .await
        .unwrap();

        let err = fx.publish("1.0", b"hello").await.unwrap_err();
        assert!(err.is_internal(), "{err}");
        assert_eq!(fx.files(), 0);
        assert!(fx.db.latest_version(fx.addon).await.is_err());
    }

    #[tokio::test]
    async fn hash_race_maps_to_conflict_and_cleans_up() {
        let fx = Fixture::new().await;
        // a row with the same hash slips in between the checks and the insert
        sqlx::raw_sql(
            r#"
            CREATE TRIGGER race_versions BEFORE INSERT ON versions
            BEGIN
                INSERT INTO versions (
                    id, addon_id, version, version_folded, description,
                    download_url, file_hash, file_name, created_at
                ) VALUES (
                    randomblob(16), NEW.addon_id, 'raced', 'raced', 'inserted concurrently',
                    '/files/raced', NEW.file_hash, 'raced', NEW.created_at
                );
            END;
            "#,
        )
        .execute(fx.db.pool())
        .await
        .unwrap();

        let err = fx.publish("1.0", b"hello").await.unwrap_err();
        assert_eq!(err.to_string(), DUPLICATE_HASH);
        assert_eq!(fx.files(), 0);
    }

    #[tokio::test]
    async fn orphaned_file_is_reused() {
        let fx = Fixture::new().await;
        let address = ContentAddress::compute(b"hello", Some("sodium.jar"));
        fx.storage
            .write_blob(&address.file_name, Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let version = fx.publish("1.0", b"hello").await.unwrap();
        assert_eq!(version.file_name, address.file_name);
        assert_eq!(fx.files(), 1);
    }
}
