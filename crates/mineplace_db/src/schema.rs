/// SQL schema for the marketplace database
pub const SCHEMA: &str = r#"
PRAGMA user_version = 1;

CREATE TABLE IF NOT EXISTS users (
    id BLOB PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    profile_picture TEXT,
    created_at TEXT NOT NULL
);

-- addons: name is unique regardless of case
-- *_folded columns hold the Unicode lower-cased text, written by the application
CREATE TABLE IF NOT EXISTS addons (
    id BLOB PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    addon_type TEXT NOT NULL,
    short_description TEXT NOT NULL,
    description TEXT NOT NULL,
    name_folded TEXT NOT NULL,
    short_description_folded TEXT NOT NULL,
    description_folded TEXT NOT NULL,
    downloads INTEGER NOT NULL DEFAULT 0 CHECK (downloads >= 0),
    publish_date TEXT NOT NULL,
    update_date TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_addons_name_folded ON addons(name_folded);
CREATE INDEX IF NOT EXISTS idx_addons_user ON addons(user_id);
CREATE INDEX IF NOT EXISTS idx_addons_type ON addons(addon_type);

-- versions: content addressed, hash and url are globally unique
CREATE TABLE IF NOT EXISTS versions (
    id BLOB PRIMARY KEY,
    addon_id BLOB NOT NULL REFERENCES addons(id) ON DELETE CASCADE,
    version TEXT NOT NULL,
    version_folded TEXT NOT NULL,
    description TEXT NOT NULL,
    download_url TEXT NOT NULL UNIQUE,
    file_hash TEXT NOT NULL UNIQUE,
    file_name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_versions_addon_label ON versions(addon_id, version_folded);
CREATE INDEX IF NOT EXISTS idx_versions_created ON versions(addon_id, created_at DESC);

CREATE TABLE IF NOT EXISTS user_likes (
    id BLOB PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    addon_id BLOB NOT NULL REFERENCES addons(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, addon_id)
);

CREATE INDEX IF NOT EXISTS idx_user_likes_addon ON user_likes(addon_id);
"#;
