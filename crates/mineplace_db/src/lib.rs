//! # Mineplace Database
//!
//! SQLite store for users, add-ons, versions and likes, built on `sqlx`.
//!
//! Every operation is an inherent method on [`Database`], grouped by concern:
//! users, add-ons, likes, versions, the catalog listing and version publishing.
//! Referential integrity is left to foreign keys with `ON DELETE CASCADE`;
//! stored version files are removed explicitly through a [`BlobStorage`].
//!
//! [`BlobStorage`]: mineplace_core::traits::BlobStorage

mod addons;
mod catalog;
mod db;
mod likes;
mod publish;
mod schema;
mod users;
mod versions;

pub use db::Database;
pub use schema::SCHEMA;

pub mod prelude {
    pub use crate::Database;
}
