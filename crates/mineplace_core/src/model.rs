use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MarketError;

/// Category of a published add-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum AddOnType {
    Mod,
    ResourcePack,
    DataPack,
    Shader,
    Plugins,
}

impl AddOnType {
    pub const ALL: [AddOnType; 5] = [
        AddOnType::Mod,
        AddOnType::ResourcePack,
        AddOnType::DataPack,
        AddOnType::Shader,
        AddOnType::Plugins,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AddOnType::Mod => "mod",
            AddOnType::ResourcePack => "resource_pack",
            AddOnType::DataPack => "data_pack",
            AddOnType::Shader => "shader",
            AddOnType::Plugins => "plugins",
        }
    }
}

impl fmt::Display for AddOnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddOnType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddOnType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<_> = AddOnType::ALL.iter().map(|t| t.as_str()).collect();
                MarketError::invalid(format!(
                    "Unknown add-on type '{s}'. Available types: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub uuid: Uuid,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            uuid: user.id,
            username: user.username,
            email: user.email,
            profile_picture: user.profile_picture,
            created_at: user.created_at,
        }
    }
}

/// A row from the `addons` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AddOn {
    #[serde(rename = "uuid")]
    pub id: Uuid,
    #[serde(rename = "user_uuid")]
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub addon_type: AddOnType,
    pub short_description: String,
    pub description: String,
    pub downloads: i64,
    pub publish_date: DateTime<Utc>,
    pub update_date: DateTime<Utc>,
}

/// An add-on joined with its owner's username and aggregated like count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AddOnListing {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub addon: AddOn,
    pub username: String,
    pub likes_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<i64>,
}

/// A row from the `versions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Version {
    #[serde(rename = "uuid")]
    pub id: Uuid,
    #[serde(rename = "addon_uuid")]
    pub addon_id: Uuid,
    pub version: String,
    pub description: String,
    pub download_url: String,
    pub file_hash: String,
    /// Name of the stored blob.
    #[serde(skip)]
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `user_likes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserLike {
    #[serde(rename = "uuid")]
    pub id: Uuid,
    #[serde(rename = "user_uuid")]
    pub user_id: Uuid,
    #[serde(rename = "addon_uuid")]
    pub addon_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A page of results plus the size of the whole filtered set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: u32,
    pub per_page: u32,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewAddOn {
    pub name: String,
    #[serde(rename = "type")]
    pub addon_type: AddOnType,
    pub short_description: String,
    pub description: String,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddOnUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub addon_type: Option<AddOnType>,
    pub short_description: Option<String>,
    pub description: Option<String>,
}

pub const ADDON_NAME_LEN: (usize, usize) = (3, 128);
pub const ADDON_SHORT_DESCRIPTION_LEN: (usize, usize) = (10, 256);
pub const ADDON_DESCRIPTION_MIN_LEN: usize = 20;

fn check_len(field: &str, value: &str, min: usize, max: Option<usize>) -> Result<(), MarketError> {
    let len = value.chars().count();
    if len < min {
        return Err(MarketError::invalid(format!(
            "{field} must be at least {min} characters long"
        )));
    }
    if let Some(max) = max.filter(|max| len > *max) {
        return Err(MarketError::invalid(format!(
            "{field} must be at most {max} characters long"
        )));
    }
    Ok(())
}

impl NewAddOn {
    pub fn validate(&self) -> Result<(), MarketError> {
        check_len("name", &self.name, ADDON_NAME_LEN.0, Some(ADDON_NAME_LEN.1))?;
        check_len(
            "short_description",
            &self.short_description,
            ADDON_SHORT_DESCRIPTION_LEN.0,
            Some(ADDON_SHORT_DESCRIPTION_LEN.1),
        )?;
        check_len("description", &self.description, ADDON_DESCRIPTION_MIN_LEN, None)
    }
}

impl AddOnUpdate {
    pub fn validate(&self) -> Result<(), MarketError> {
        if let Some(name) = &self.name {
            check_len("name", name, ADDON_NAME_LEN.0, Some(ADDON_NAME_LEN.1))?;
        }
        if let Some(short) = &self.short_description {
            check_len(
                "short_description",
                short,
                ADDON_SHORT_DESCRIPTION_LEN.0,
                Some(ADDON_SHORT_DESCRIPTION_LEN.1),
            )?;
        }
        if let Some(description) = &self.description {
            check_len("description", description, ADDON_DESCRIPTION_MIN_LEN, None)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.addon_type.is_none()
            && self.short_description.is_none()
            && self.description.is_none()
    }
}

pub const USERNAME_LEN: (usize, usize) = (3, 50);
pub const PASSWORD_LEN: (usize, usize) = (8, 32);

/// Registration payload, normalized by [`NewUser::normalize`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Trims the username, lower-cases the email and checks every field.
    pub fn normalize(mut self) -> Result<Self, MarketError> {
        self.username = self.username.trim().to_string();
        self.email = normalize_email(&self.email)?;

        check_len("username", &self.username, USERNAME_LEN.0, Some(USERNAME_LEN.1))?;
        if !self
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(MarketError::invalid(
                "Username can only contain letters, numbers, underscores and dashes",
            ));
        }

        check_len("password", &self.password, PASSWORD_LEN.0, Some(PASSWORD_LEN.1))?;
        let alnum = self.password.chars().all(|c| c.is_ascii_alphanumeric());
        let letter = self.password.chars().any(|c| c.is_ascii_alphabetic());
        let digit = self.password.chars().any(|c| c.is_ascii_digit());
        if !(alnum && letter && digit) {
            return Err(MarketError::invalid(
                "Password must contain at least one letter and one number",
            ));
        }
        Ok(self)
    }
}

pub fn normalize_email(email: &str) -> Result<String, MarketError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(MarketError::invalid("value is not a valid email address"))
    }
}
