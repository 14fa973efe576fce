pub use mineplace_core::*;

#[cfg(feature = "server")]
pub mod server {
    pub use mineplace_server::*;
}

#[cfg(feature = "db")]
pub mod db {
    pub use mineplace_db::*;
}

#[cfg(feature = "fs")]
pub mod fs {
    pub use mineplace_fs::*;
}

#[cfg(feature = "mock_auth")]
pub mod auth_mock {
    pub use mineplace_auth_mock::*;
}

pub mod prelude {
    pub use mineplace_core::prelude::*;

    #[cfg(feature = "server")]
    pub use mineplace_server::prelude::*;

    #[cfg(feature = "db")]
    pub use mineplace_db::Database;

    #[cfg(feature = "fs")]
    pub use mineplace_fs::FileSystemStorage;

    #[cfg(feature = "mock_auth")]
    pub use mineplace_auth_mock::FixedIdentityAuth;
}
