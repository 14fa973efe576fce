pub mod catalog;
pub mod error;
pub mod model;
pub mod traits;
pub mod upload;

pub mod prelude {
    pub use super::catalog::*;
    pub use super::error::*;
    pub use super::model::*;
    pub use super::traits::*;
    pub use super::upload::*;
}
