use crate::jwt::JwtService;
use mineplace_core::traits::{AuthProvider, BlobStorage};
use mineplace_db::Database;

#[derive(Clone)]
pub struct AppState<S: BlobStorage + Clone, A: AuthProvider + Clone> {
    pub db: Database,
    pub storage: S,
    pub auth: A,
    pub jwt_service: JwtService,
}
