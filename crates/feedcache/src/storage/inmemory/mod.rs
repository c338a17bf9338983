//! In-memory storage backend.
//!
//! All data lives in HashMaps behind a single `Arc<RwLock<_>>`, so every
//! mutation is atomic with respect to feed reads. Nothing is persisted.

mod repository;

pub use repository::InMemoryRepository;
