pub mod error;
pub mod health;
pub mod posts;

pub use error::AppError;
