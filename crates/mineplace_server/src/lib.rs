//! # Mineplace Server
//!
//! The HTTP surface of the marketplace: an [`axum`] router over a
//! [`Database`](mineplace_db::Database), a [`BlobStorage`] and an
//! [`AuthProvider`].
//!
//! ```no_run
//! use mineplace_server::prelude::*;
//! # async fn run(db: mineplace_db::Database, storage: impl mineplace_core::traits::BlobStorage) {
//! let app = MineplaceServer::default().build(db, storage);
//! # }
//! ```
//!
//! [`BlobStorage`]: mineplace_core::traits::BlobStorage
//! [`AuthProvider`]: mineplace_core::traits::AuthProvider

mod api;
mod error;
mod server;

pub mod auth;
pub mod config;
pub mod jwt;
pub mod password;
pub mod state;

pub use error::ApiError;
pub use server::{MineplaceServer, MineplaceServerConfig};

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::auth::*;
    pub use crate::jwt::*;
    pub use crate::state::*;
    pub use crate::{ApiError, MineplaceServer, MineplaceServerConfig};
}
