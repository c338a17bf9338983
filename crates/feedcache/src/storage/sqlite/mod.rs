//! SQLite storage backend implementation.
//!
//! Uses `rusqlite` for the synchronous driver and `tokio-rusqlite` to run it
//! on a dedicated thread.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::SqliteRepository;
